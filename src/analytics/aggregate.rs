// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Sums, groupings and budget utilization over an already-filtered
//! transaction set. All money math stays in [`Decimal`]; nothing is rounded
//! here except budget percentages.

use super::AnalyticsError;
use super::period::DateRange;
use crate::models::{Budget, Category, Transaction, TxType};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const UNCATEGORIZED: &str = "uncategorized";
pub const TOP_CATEGORIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category_id: Option<String>,
    pub category_name: String,
    pub spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub id: String,
    pub category_id: String,
    pub category_name: String,
    pub limit_amount: Decimal,
    pub spent_amount: Decimal,
    pub percentage: u64,
    pub is_over_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_balance: Decimal,
    /// Expense as a percentage of income, 0 when there is no income.
    pub expense_ratio: Decimal,
    pub transaction_count: usize,
    /// Every expense bucket, largest first.
    pub category_spending: Vec<CategorySpending>,
    pub budget_status: Vec<BudgetStatus>,
}

impl AggregateResult {
    pub fn top_categories(&self, n: usize) -> &[CategorySpending] {
        &self.category_spending[..n.min(self.category_spending.len())]
    }
}

/// `transactions` must already be restricted to `period`.
pub fn aggregate(
    transactions: &[Transaction],
    categories: &[Category],
    budgets: &[Budget],
    period: &DateRange,
) -> Result<AggregateResult, AnalyticsError> {
    let (total_income, total_expense) = totals(transactions)?;
    Ok(AggregateResult {
        total_income,
        total_expense,
        // both sides are non-negative, so this cannot overflow
        net_balance: total_income - total_expense,
        expense_ratio: percent_of(total_expense, total_income)?,
        transaction_count: transactions.len(),
        category_spending: category_spending(transactions, categories)?,
        budget_status: budget_status(budgets, transactions, categories, period)?,
    })
}

/// Turns a `checked_*` result into [`AnalyticsError::Overflow`].
pub fn checked(v: Option<Decimal>, what: &'static str) -> Result<Decimal, AnalyticsError> {
    v.ok_or_else(|| {
        tracing::error!(what, "decimal overflow");
        AnalyticsError::Overflow(what)
    })
}

/// Returns `(income, expense)`.
pub fn totals(transactions: &[Transaction]) -> Result<(Decimal, Decimal), AnalyticsError> {
    transactions
        .iter()
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(inc, exp), t| match t.r#type {
            TxType::Income => Ok((checked(inc.checked_add(t.amount), "total income")?, exp)),
            TxType::Expense => Ok((inc, checked(exp.checked_add(t.amount), "total expense")?)),
        })
}

/// `numerator / denominator * 100`, defined as 0 for a zero denominator.
pub fn percent_of(numerator: Decimal, denominator: Decimal) -> Result<Decimal, AnalyticsError> {
    if denominator.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let ratio = checked(numerator.checked_div(denominator), "percentage")?;
    checked(ratio.checked_mul(Decimal::ONE_HUNDRED), "percentage")
}

/// Groups expenses by category. Ids that are missing or do not resolve to a
/// known category share the [`UNCATEGORIZED`] bucket. Sorted by `spent`
/// descending, then by name.
pub fn category_spending(
    transactions: &[Transaction],
    categories: &[Category],
) -> Result<Vec<CategorySpending>, AnalyticsError> {
    let by_id: HashMap<&str, &Category> =
        categories.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut buckets: BTreeMap<Option<&str>, Decimal> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.r#type == TxType::Expense) {
        let key = match t.category_id.as_deref() {
            Some(id) => match by_id.get(id) {
                Some(cat) => {
                    if cat.r#type != t.r#type {
                        tracing::debug!(
                            transaction = %t.id,
                            category = %cat.id,
                            "expense filed under an income category"
                        );
                    }
                    Some(id)
                }
                None => {
                    tracing::debug!(transaction = %t.id, category = id, "unknown category");
                    None
                }
            },
            None => None,
        };
        let spent = buckets.entry(key).or_insert(Decimal::ZERO);
        *spent = checked(spent.checked_add(t.amount), "category spending")?;
    }

    let mut out: Vec<CategorySpending> = buckets
        .into_iter()
        .map(|(id, spent)| CategorySpending {
            category_name: id
                .and_then(|id| by_id.get(id))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            category_id: id.map(str::to_string),
            spent,
        })
        .collect();
    out.sort_by(|a, b| {
        b.spent
            .cmp(&a.spent)
            .then_with(|| a.category_name.cmp(&b.category_name))
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    Ok(out)
}

/// Utilization of each active budget whose range overlaps `period`. Spend is
/// counted over the overlap only. Input order is preserved.
pub fn budget_status(
    budgets: &[Budget],
    transactions: &[Transaction],
    categories: &[Category],
    period: &DateRange,
) -> Result<Vec<BudgetStatus>, AnalyticsError> {
    let mut out = Vec::new();
    for b in budgets.iter().filter(|b| b.is_active) {
        if b.limit_amount <= Decimal::ZERO {
            tracing::error!(
                budget = %b.id,
                limit = %b.limit_amount,
                "budget limit must be positive"
            );
            return Err(AnalyticsError::InvalidBudget {
                id: b.id.clone(),
                limit: b.limit_amount,
            });
        }
        let Some(window) = DateRange::from_dates(b.start_date, b.end_date).intersect(period)
        else {
            continue;
        };
        let spent = transactions
            .iter()
            .filter(|t| {
                t.r#type == TxType::Expense
                    && t.category_id.as_deref() == Some(b.category_id.as_str())
                    && window.contains(t.occurred_at)
            })
            .try_fold(Decimal::ZERO, |acc, t| {
                checked(acc.checked_add(t.amount), "budget spending")
            })?;
        let category_name = categories
            .iter()
            .find(|c| c.id == b.category_id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        out.push(BudgetStatus {
            id: b.id.clone(),
            category_id: b.category_id.clone(),
            category_name,
            limit_amount: b.limit_amount,
            spent_amount: spent,
            percentage: rounded_percentage(spent, b.limit_amount)?,
            is_over_budget: spent > b.limit_amount,
        });
    }
    Ok(out)
}

fn rounded_percentage(spent: Decimal, limit: Decimal) -> Result<u64, AnalyticsError> {
    Ok(percent_of(spent, limit)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::period::Period;
    use chrono::{NaiveDate, NaiveDateTime};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tx(id: &str, amount: Decimal, kind: TxType, cat: Option<&str>, when: &str) -> Transaction {
        Transaction {
            id: id.into(),
            user_id: "u1".into(),
            title: format!("tx {id}"),
            amount,
            r#type: kind,
            category_id: cat.map(str::to_string),
            occurred_at: at(when),
        }
    }

    fn cat(id: &str, name: &str, kind: TxType) -> Category {
        Category {
            id: id.into(),
            name: name.into(),
            r#type: kind,
        }
    }

    fn budget(id: &str, cat: &str, limit: Decimal, start: &str, end: Option<&str>) -> Budget {
        Budget {
            id: id.into(),
            user_id: "u1".into(),
            category_id: cat.into(),
            limit_amount: limit,
            start_date: day(start),
            end_date: end.map(day),
            is_active: true,
        }
    }

    fn august() -> DateRange {
        Period::Month.bounds(at("2025-08-15 12:00:00")).unwrap()
    }

    #[test]
    fn income_expense_and_net() {
        let txs = vec![
            tx("1", d("100"), TxType::Income, None, "2025-08-01 10:00:00"),
            tx("2", d("30"), TxType::Expense, None, "2025-08-02 10:00:00"),
            tx("3", d("20"), TxType::Expense, None, "2025-08-03 10:00:00"),
        ];
        let agg = aggregate(&txs, &[], &[], &august()).unwrap();
        assert_eq!(agg.total_income, d("100"));
        assert_eq!(agg.total_expense, d("50"));
        assert_eq!(agg.net_balance, d("50"));
        assert_eq!(agg.expense_ratio, d("50"));
        assert_eq!(agg.transaction_count, 3);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let agg = aggregate(&[], &[], &[], &august()).unwrap();
        assert!(agg.net_balance.is_zero());
        assert!(agg.expense_ratio.is_zero());
        assert!(agg.category_spending.is_empty());
    }

    #[test]
    fn percent_of_zero_over_zero_is_zero() {
        assert_eq!(percent_of(Decimal::ZERO, Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(percent_of(d("40"), Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn decimal_sums_do_not_drift() {
        let txs: Vec<_> = (0..10_000)
            .map(|i| {
                let id = i.to_string();
                tx(&id, d("0.10"), TxType::Expense, Some("c1"), "2025-08-05 00:00:00")
            })
            .collect();
        let cats = vec![cat("c1", "Food", TxType::Expense)];
        let agg = aggregate(&txs, &cats, &[], &august()).unwrap();
        assert_eq!(agg.total_expense, d("1000.00"));
        assert_eq!(agg.category_spending[0].spent, agg.total_expense);
    }

    #[test]
    fn category_spending_sorts_by_spend_then_name() {
        let cats = vec![
            cat("1", "Rent", TxType::Expense),
            cat("2", "Food", TxType::Expense),
            cat("3", "Books", TxType::Expense),
        ];
        let txs = vec![
            tx("a", d("50"), TxType::Expense, Some("2"), "2025-08-01 00:00:00"),
            tx("b", d("500"), TxType::Expense, Some("1"), "2025-08-01 00:00:00"),
            tx("c", d("50"), TxType::Expense, Some("3"), "2025-08-01 00:00:00"),
            tx("d", d("7"), TxType::Expense, None, "2025-08-01 00:00:00"),
            tx("e", d("3"), TxType::Expense, Some("999"), "2025-08-01 00:00:00"),
            tx("f", d("1000"), TxType::Income, Some("1"), "2025-08-01 00:00:00"),
        ];
        let rows = category_spending(&txs, &cats).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.category_name.as_str()).collect();
        assert_eq!(names, ["Rent", "Books", "Food", UNCATEGORIZED]);
        assert_eq!(rows[3].spent, d("10"));
        assert_eq!(rows[3].category_id, None);
        let sum: Decimal = rows.iter().map(|r| r.spent).sum();
        assert_eq!(sum, totals(&txs).unwrap().1);
    }

    #[test]
    fn mismatched_category_type_is_still_counted() {
        let cats = vec![cat("1", "Salary", TxType::Income)];
        let txs = vec![tx("a", d("12"), TxType::Expense, Some("1"), "2025-08-01 00:00:00")];
        let rows = category_spending(&txs, &cats).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category_name, "Salary");
        assert_eq!(rows[0].spent, d("12"));
    }

    #[test]
    fn top_categories_caps_at_five() {
        let cats: Vec<_> = (1..=7)
            .map(|i| cat(&i.to_string(), &format!("C{i}"), TxType::Expense))
            .collect();
        let txs: Vec<_> = (1..=7)
            .map(|i| {
                let id = i.to_string();
                tx(&id, Decimal::from(i), TxType::Expense, Some(&id), "2025-08-01 00:00:00")
            })
            .collect();
        let agg = aggregate(&txs, &cats, &[], &august()).unwrap();
        assert_eq!(agg.category_spending.len(), 7);
        let top = agg.top_categories(TOP_CATEGORIES);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].category_name, "C7");
        assert_eq!(agg.top_categories(10).len(), 7);
    }

    #[test]
    fn over_budget_scenario() {
        let cats = vec![cat("1", "Food", TxType::Expense)];
        let budgets = vec![budget("b1", "1", d("200"), "2025-08-01", None)];
        let txs = vec![
            tx("a", d("150"), TxType::Expense, Some("1"), "2025-08-02 00:00:00"),
            tx("b", d("100"), TxType::Expense, Some("1"), "2025-08-20 00:00:00"),
        ];
        let status = budget_status(&budgets, &txs, &cats, &august()).unwrap();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].spent_amount, d("250"));
        assert_eq!(status[0].percentage, 125);
        assert!(status[0].is_over_budget);
        assert_eq!(status[0].category_name, "Food");
    }

    #[test]
    fn budget_spend_is_limited_to_its_own_range() {
        let cats = vec![cat("1", "Food", TxType::Expense)];
        let budgets = vec![budget("b1", "1", d("300"), "2025-08-10", Some("2025-08-20"))];
        let txs = vec![
            tx("a", d("100"), TxType::Expense, Some("1"), "2025-08-09 23:59:59"),
            tx("b", d("100"), TxType::Expense, Some("1"), "2025-08-10 00:00:00"),
            tx("c", d("50"), TxType::Expense, Some("1"), "2025-08-20 18:00:00"),
            tx("d", d("70"), TxType::Expense, Some("1"), "2025-08-21 00:00:00"),
            tx("e", d("90"), TxType::Income, Some("1"), "2025-08-15 00:00:00"),
        ];
        let status = budget_status(&budgets, &txs, &cats, &august()).unwrap();
        assert_eq!(status[0].spent_amount, d("150"));
        assert_eq!(status[0].percentage, 50);
        assert!(!status[0].is_over_budget);
    }

    #[test]
    fn inactive_and_non_overlapping_budgets_are_skipped() {
        let mut inactive = budget("b1", "1", d("100"), "2025-08-01", None);
        inactive.is_active = false;
        let past = budget("b2", "1", d("100"), "2025-06-01", Some("2025-06-30"));
        let status = budget_status(&[inactive, past], &[], &[], &august()).unwrap();
        assert!(status.is_empty());
    }

    #[test]
    fn zero_limit_is_a_configuration_error() {
        let b = budget("b9", "1", Decimal::ZERO, "2025-08-01", None);
        let err = budget_status(&[b], &[], &[], &august()).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidBudget { ref id, .. } if id == "b9"));
    }

    #[test]
    fn percentage_rounds_half_up_and_tracks_over_budget() {
        assert_eq!(rounded_percentage(d("1"), d("8")).unwrap(), 13); // 12.5
        assert_eq!(rounded_percentage(d("0"), d("8")).unwrap(), 0);
        let cats = vec![cat("1", "Food", TxType::Expense)];
        let budgets = vec![budget("b1", "1", d("100"), "2025-08-01", None)];
        for (spent, over) in [(d("99"), false), (d("100"), false), (d("102"), true)] {
            let txs = vec![tx("a", spent, TxType::Expense, Some("1"), "2025-08-02 00:00:00")];
            let s = &budget_status(&budgets, &txs, &cats, &august()).unwrap()[0];
            assert_eq!(s.is_over_budget, over);
            assert_eq!(s.is_over_budget, s.percentage > 100);
        }
    }

    #[test]
    fn over_budget_flag_can_disagree_with_rounded_percentage() {
        let cats = vec![cat("1", "Food", TxType::Expense)];
        let budgets = vec![budget("b1", "1", d("100"), "2025-08-01", None)];
        let txs = vec![tx("a", d("100.4"), TxType::Expense, Some("1"), "2025-08-02 00:00:00")];
        let s = &budget_status(&budgets, &txs, &cats, &august()).unwrap()[0];
        assert_eq!(s.percentage, 100);
        assert!(s.is_over_budget);
    }

    #[test]
    fn tiny_limit_overflow_is_reported() {
        let cats = vec![cat("1", "Food", TxType::Expense)];
        let budgets = vec![budget("b1", "1", d("0.0000001"), "2025-08-01", None)];
        let spent = d("100000000000000000000000");
        let txs = vec![tx("a", spent, TxType::Expense, Some("1"), "2025-08-02 00:00:00")];
        let err = budget_status(&budgets, &txs, &cats, &august()).unwrap_err();
        assert!(matches!(err, AnalyticsError::Overflow(_)));
    }

    #[test]
    fn huge_totals_overflow_is_reported() {
        let txs = vec![
            tx("a", Decimal::MAX, TxType::Expense, Some("1"), "2025-08-02 00:00:00"),
            tx("b", Decimal::MAX, TxType::Expense, Some("1"), "2025-08-03 00:00:00"),
        ];
        let err = aggregate(&txs, &[], &[], &august()).unwrap_err();
        assert!(matches!(err, AnalyticsError::Overflow(_)));

        let income = vec![
            tx("c", Decimal::MAX, TxType::Income, None, "2025-08-02 00:00:00"),
            tx("d", Decimal::MAX, TxType::Income, None, "2025-08-03 00:00:00"),
        ];
        assert!(matches!(totals(&income), Err(AnalyticsError::Overflow(_))));
    }
}

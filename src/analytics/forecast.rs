// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Next-month projection from a trailing daily average.
//!
//! The trailing sums are always divided by the window length, not by the
//! number of days that actually saw activity, so a sparse history yields a
//! conservative forecast.

use super::AnalyticsError;
use super::aggregate::checked;
use crate::models::{Goal, Transaction, TxType};
use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

pub const DEFAULT_TRAILING_DAYS: u32 = 30;
/// Days in a projected month.
pub const FORECAST_DAYS: u32 = 30;
/// An emergency fund is this many days of average income.
pub const EMERGENCY_FUND_DAYS: u32 = 90;

const LOW_SAVINGS_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
const HIGH_SAVINGS_RATE: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub trailing_days: u32,
    pub avg_daily_income: Decimal,
    pub avg_daily_expense: Decimal,
    pub forecast_income: Decimal,
    pub forecast_expense: Decimal,
    pub forecast_balance: Decimal,
    pub savings_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Warning,
    Success,
    Danger,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub months_to_goal: Vec<GoalEta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsTarget {
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalEta {
    pub label: String,
    pub amount: Decimal,
    pub months: u64,
}

/// Projects the next month from transactions in `[now - trailing_days, now]`.
pub fn forecast(
    transactions: &[Transaction],
    now: NaiveDateTime,
    trailing_days: u32,
) -> Result<ForecastResult, AnalyticsError> {
    if trailing_days == 0 {
        return Err(AnalyticsError::InvalidPeriod("trailing window of 0 days".into()));
    }
    let window_start = now
        .checked_sub_signed(Duration::days(i64::from(trailing_days)))
        .ok_or_else(|| {
            AnalyticsError::InvalidPeriod(format!("trailing window of {trailing_days} days"))
        })?;
    let (income, expense) = transactions
        .iter()
        .filter(|t| t.occurred_at >= window_start && t.occurred_at <= now)
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(inc, exp), t| {
            Ok::<_, AnalyticsError>(match t.r#type {
                TxType::Income => (checked(inc.checked_add(t.amount), "trailing income")?, exp),
                TxType::Expense => (inc, checked(exp.checked_add(t.amount), "trailing expense")?),
            })
        })?;

    let days = Decimal::from(trailing_days);
    let horizon = Decimal::from(FORECAST_DAYS);
    // Scale the sums before dividing so a 30-day window projects exactly.
    let forecast_income = project(income, horizon, days, "forecast income")?;
    let forecast_expense = project(expense, horizon, days, "forecast expense")?;
    let savings_rate = if income > Decimal::ZERO {
        let saved = checked(income.checked_sub(expense), "savings rate")?;
        checked(
            saved
                .checked_div(income)
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED)),
            "savings rate",
        )?
    } else {
        Decimal::ZERO
    };

    Ok(ForecastResult {
        trailing_days,
        avg_daily_income: checked(income.checked_div(days), "average daily income")?,
        avg_daily_expense: checked(expense.checked_div(days), "average daily expense")?,
        forecast_income,
        forecast_expense,
        forecast_balance: checked(
            forecast_income.checked_sub(forecast_expense),
            "forecast balance",
        )?,
        savings_rate,
    })
}

fn project(
    sum: Decimal,
    scale: Decimal,
    days: Decimal,
    what: &'static str,
) -> Result<Decimal, AnalyticsError> {
    checked(sum.checked_mul(scale).and_then(|v| v.checked_div(days)), what)
}

/// An emergency fund first, then every goal that is not yet reached.
pub fn savings_targets(
    forecast: &ForecastResult,
    goals: &[Goal],
) -> Result<Vec<SavingsTarget>, AnalyticsError> {
    let mut out = vec![SavingsTarget {
        label: "emergency fund".into(),
        amount: project(
            forecast.forecast_income,
            Decimal::from(EMERGENCY_FUND_DAYS),
            Decimal::from(FORECAST_DAYS),
            "emergency fund",
        )?,
    }];
    out.extend(
        goals
            .iter()
            .filter(|g| g.target_amount > Decimal::ZERO && g.current_amount < g.target_amount)
            .map(|g| SavingsTarget {
                label: g.title.clone(),
                amount: g.target_amount,
            }),
    );
    Ok(out)
}

type Rule = fn(&ForecastResult, &[SavingsTarget]) -> Option<Recommendation>;

const RULES: [Rule; 4] = [low_savings, high_savings, overspending, goals_reachable];

/// Evaluates the advice rules in a fixed order; each yields at most one entry.
pub fn recommendations(
    forecast: &ForecastResult,
    targets: &[SavingsTarget],
) -> Vec<Recommendation> {
    RULES
        .iter()
        .filter_map(|rule| rule(forecast, targets))
        .collect()
}

fn advice(kind: RecommendationKind, title: &str, message: String) -> Recommendation {
    Recommendation {
        kind,
        title: title.to_string(),
        message,
        months_to_goal: Vec::new(),
    }
}

// Without income the rate is a placeholder 0, not a signal.
fn low_savings(f: &ForecastResult, _: &[SavingsTarget]) -> Option<Recommendation> {
    (f.avg_daily_income > Decimal::ZERO && f.savings_rate < LOW_SAVINGS_RATE).then(|| {
        advice(
            RecommendationKind::Warning,
            "Low savings rate",
            "You are saving less than 10% of income; aim for at least 10-20%.".into(),
        )
    })
}

fn high_savings(f: &ForecastResult, _: &[SavingsTarget]) -> Option<Recommendation> {
    (f.savings_rate > HIGH_SAVINGS_RATE).then(|| {
        advice(
            RecommendationKind::Success,
            "Strong financial discipline",
            format!("You are saving {}% of income. Keep it up!", f.savings_rate.round()),
        )
    })
}

fn overspending(f: &ForecastResult, _: &[SavingsTarget]) -> Option<Recommendation> {
    (f.avg_daily_expense > f.avg_daily_income).then(|| {
        advice(
            RecommendationKind::Danger,
            "Spending exceeds income",
            "Cut expenses or find additional income.".into(),
        )
    })
}

fn goals_reachable(f: &ForecastResult, targets: &[SavingsTarget]) -> Option<Recommendation> {
    if f.forecast_balance <= Decimal::ZERO || f.savings_rate < LOW_SAVINGS_RATE {
        return None;
    }
    let etas: Vec<GoalEta> = targets
        .iter()
        .filter_map(|t| {
            months_to_reach(t.amount, f.forecast_balance).map(|months| GoalEta {
                label: t.label.clone(),
                amount: t.amount,
                months,
            })
        })
        .collect();
    if etas.is_empty() {
        return None;
    }
    let summary = etas
        .iter()
        .map(|e| format!("{} in {} mo.", e.label, e.months))
        .collect::<Vec<_>>()
        .join(", ");
    let mut rec = advice(
        RecommendationKind::Info,
        "Goals within reach",
        format!("At the current pace: {summary}."),
    );
    rec.months_to_goal = etas;
    Some(rec)
}

/// `ceil(amount / monthly_surplus)`; `None` when the surplus is not positive
/// or the month count does not fit.
pub fn months_to_reach(amount: Decimal, monthly_surplus: Decimal) -> Option<u64> {
    if monthly_surplus <= Decimal::ZERO || amount <= Decimal::ZERO {
        return None;
    }
    amount.checked_div(monthly_surplus)?.ceil().to_u64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn tx(amount: &str, kind: TxType, when: &str) -> Transaction {
        Transaction {
            id: when.into(),
            user_id: "u1".into(),
            title: "t".into(),
            amount: d(amount),
            r#type: kind,
            category_id: None,
            occurred_at: at(when),
        }
    }

    fn kinds(recs: &[Recommendation]) -> Vec<RecommendationKind> {
        recs.iter().map(|r| r.kind).collect()
    }

    const NOW: &str = "2025-08-31 12:00:00";

    #[test]
    fn empty_window_is_all_zero_without_alarms() {
        let f = forecast(&[], at(NOW), DEFAULT_TRAILING_DAYS).unwrap();
        assert!(f.avg_daily_income.is_zero());
        assert!(f.avg_daily_expense.is_zero());
        assert!(f.savings_rate.is_zero());
        let recs = recommendations(&f, &savings_targets(&f, &[]).unwrap());
        assert!(recs.is_empty());
    }

    #[test]
    fn zero_income_gives_zero_rate_and_danger_only() {
        let txs = vec![
            tx("40", TxType::Expense, "2025-08-20 10:00:00"),
            tx("40", TxType::Expense, "2025-08-25 10:00:00"),
        ];
        let f = forecast(&txs, at(NOW), DEFAULT_TRAILING_DAYS).unwrap();
        assert!(f.avg_daily_income.is_zero());
        assert!(f.savings_rate.is_zero());
        assert_eq!(f.forecast_expense, d("80"));
        let recs = recommendations(&f, &[]);
        assert_eq!(kinds(&recs), [RecommendationKind::Danger]);
    }

    #[test]
    fn divides_by_window_not_by_active_days() {
        let txs = vec![
            tx("3000", TxType::Income, "2025-08-30 09:00:00"),
            tx("600", TxType::Expense, "2025-08-30 10:00:00"),
        ];
        let f = forecast(&txs, at(NOW), 30).unwrap();
        assert_eq!(f.avg_daily_income, d("100"));
        assert_eq!(f.avg_daily_expense, d("20"));
        assert_eq!(f.forecast_income, d("3000"));
        assert_eq!(f.forecast_balance, d("2400"));
        assert_eq!(f.savings_rate, d("80"));
    }

    #[test]
    fn window_includes_its_start_and_excludes_older_and_future_entries() {
        let txs = vec![
            tx("150", TxType::Income, "2025-08-01 11:59:59"),
            tx("300", TxType::Income, "2025-08-01 12:00:00"), // exactly 30 days back
            tx("300", TxType::Income, "2025-08-01 12:00:01"),
            tx("900", TxType::Income, "2025-09-02 00:00:00"),
        ];
        let f = forecast(&txs, at(NOW), 30).unwrap();
        assert_eq!(f.avg_daily_income, d("20"));
    }

    #[test]
    fn rules_fire_in_fixed_order() {
        // 5% savings: warning, plus nothing else.
        let low = forecast(
            &[
                tx("1000", TxType::Income, "2025-08-30 00:00:00"),
                tx("950", TxType::Expense, "2025-08-30 00:00:00"),
            ],
            at(NOW),
            30,
        )
        .unwrap();
        assert_eq!(kinds(&recommendations(&low, &[])), [RecommendationKind::Warning]);

        // 50% savings: success then info.
        let high = forecast(
            &[
                tx("1000", TxType::Income, "2025-08-30 00:00:00"),
                tx("500", TxType::Expense, "2025-08-30 00:00:00"),
            ],
            at(NOW),
            30,
        )
        .unwrap();
        let targets = savings_targets(&high, &[]).unwrap();
        assert_eq!(
            kinds(&recommendations(&high, &targets)),
            [RecommendationKind::Success, RecommendationKind::Info]
        );

        // Overspending: warning (negative rate) and danger.
        let over = forecast(
            &[
                tx("100", TxType::Income, "2025-08-30 00:00:00"),
                tx("150", TxType::Expense, "2025-08-30 00:00:00"),
            ],
            at(NOW),
            30,
        )
        .unwrap();
        assert_eq!(
            kinds(&recommendations(&over, &[])),
            [RecommendationKind::Warning, RecommendationKind::Danger]
        );
    }

    #[test]
    fn info_lists_months_per_target() {
        let f = forecast(
            &[
                tx("3000", TxType::Income, "2025-08-30 00:00:00"),
                tx("1000", TxType::Expense, "2025-08-30 00:00:00"),
            ],
            at(NOW),
            30,
        )
        .unwrap();
        let goal = Goal {
            id: "g1".into(),
            user_id: "u1".into(),
            title: "vacation".into(),
            target_amount: d("5000"),
            current_amount: d("0"),
            deadline: None,
            created_at: at("2025-01-01 00:00:00"),
        };
        let targets = savings_targets(&f, &[goal]).unwrap();
        let info = recommendations(&f, &targets)
            .into_iter()
            .find(|r| r.kind == RecommendationKind::Info)
            .unwrap();
        // emergency fund = 100/day * 90 = 9000, balance 2000/month
        assert_eq!(info.months_to_goal[0].months, 5);
        assert_eq!(info.months_to_goal[1].label, "vacation");
        assert_eq!(info.months_to_goal[1].months, 3);
    }

    #[test]
    fn months_to_reach_guards_zero_surplus() {
        assert_eq!(months_to_reach(d("100"), Decimal::ZERO), None);
        assert_eq!(months_to_reach(d("100"), d("-5")), None);
        assert_eq!(months_to_reach(d("100"), d("30")), Some(4));
        assert_eq!(months_to_reach(d("90"), d("30")), Some(3));
        assert_eq!(months_to_reach(Decimal::MAX, d("0.0000001")), None);
    }

    #[test]
    fn oversized_history_reports_overflow() {
        let txs = vec![
            tx("79228162514264337593543950335", TxType::Income, "2025-08-30 00:00:00"),
            tx("79228162514264337593543950335", TxType::Income, "2025-08-30 01:00:00"),
        ];
        assert!(matches!(
            forecast(&txs, at(NOW), 30),
            Err(AnalyticsError::Overflow(_))
        ));

        // Projects to 30 days but not to a 90-day emergency fund.
        let one = [tx("1980704062856608439838598758", TxType::Income, "2025-08-30 00:00:00")];
        let f = forecast(&one, at(NOW), 30).unwrap();
        assert!(matches!(
            savings_targets(&f, &[]),
            Err(AnalyticsError::Overflow(_))
        ));
    }

    #[test]
    fn zero_day_window_is_rejected() {
        assert!(matches!(
            forecast(&[], at(NOW), 0),
            Err(AnalyticsError::InvalidPeriod(_))
        ));
    }
}

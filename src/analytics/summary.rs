// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::aggregate::{self, AggregateResult, BudgetStatus, CategorySpending, TOP_CATEGORIES};
use super::forecast::{self, ForecastResult, Recommendation, DEFAULT_TRAILING_DAYS};
use super::period::{self, DateRange, Period};
use super::store::{self, RecordKinds, RecordStore};
use super::AnalyticsError;
use crate::models::{Category, Debt, DebtDirection, Transaction, TxType};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub const RECENT_LIMIT: usize = 10;
pub const PENDING_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    pub total_balance: Decimal,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_balance: Decimal,
    /// `YYYY-MM`
    pub current_month: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransaction {
    pub id: String,
    pub title: String,
    pub amount: Decimal,
    pub r#type: TxType,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub occurred_at: NaiveDateTime,
}

impl RecentTransaction {
    pub fn new(t: &Transaction, categories: &HashMap<&str, &Category>) -> Self {
        RecentTransaction {
            id: t.id.clone(),
            title: t.title.clone(),
            amount: t.amount,
            r#type: t.r#type,
            category_id: t.category_id.clone(),
            category_name: t
                .category_id
                .as_deref()
                .and_then(|id| categories.get(id))
                .map(|c| c.name.clone()),
            occurred_at: t.occurred_at,
        }
    }
}

/// An open obligation shown next to the dashboard figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingItem {
    pub id: String,
    pub person_name: String,
    pub amount: Decimal,
    pub direction: DebtDirection,
    pub due_date: Option<NaiveDate>,
}

impl From<&Debt> for PendingItem {
    fn from(d: &Debt) -> Self {
        PendingItem {
            id: d.id.clone(),
            person_name: d.person_name.clone(),
            amount: d.amount,
            direction: d.direction,
            due_date: d.due_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub summary: SummaryTotals,
    pub category_spending: Vec<CategorySpending>,
    pub budget_status: Vec<BudgetStatus>,
    pub recent_transactions: Vec<RecentTransaction>,
    pub pending_transfers: Vec<PendingItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<ForecastResult>,
}

/// Pure assembly. `recent` must already be newest first; it is capped to
/// [`RECENT_LIMIT`] without reordering.
pub fn compose(
    aggregate: &AggregateResult,
    forecast: Option<&ForecastResult>,
    total_balance: Decimal,
    current_month: String,
    recent: &[RecentTransaction],
    pending: &[PendingItem],
) -> DashboardSummary {
    DashboardSummary {
        summary: SummaryTotals {
            total_balance,
            total_income: aggregate.total_income,
            total_expense: aggregate.total_expense,
            net_balance: aggregate.net_balance,
            current_month,
        },
        category_spending: aggregate.top_categories(TOP_CATEGORIES).to_vec(),
        budget_status: aggregate.budget_status.clone(),
        recent_transactions: recent.iter().take(RECENT_LIMIT).cloned().collect(),
        pending_transfers: pending.iter().take(PENDING_LIMIT).cloned().collect(),
        forecast: forecast.cloned(),
    }
}

/// Unpaid debts, earliest due date first with undated ones last.
pub fn pending_items(debts: &[Debt]) -> Vec<PendingItem> {
    let mut open: Vec<&Debt> = debts.iter().filter(|d| !d.is_paid).collect();
    open.sort_by(|a, b| match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
    open.into_iter().map(PendingItem::from).collect()
}

/// Fetch, filter to the current month, aggregate, forecast and compose.
/// Any failure along the way fails the whole call.
pub fn build_dashboard<S>(
    store: &S,
    user_id: &str,
    now: NaiveDateTime,
) -> Result<DashboardSummary, AnalyticsError>
where
    S: RecordStore + ?Sized,
{
    let records = store::fetch_records(store, user_id, RecordKinds::ALL)?;
    let month = Period::Month.bounds(now)?;
    let in_month = period::filter_by_range(&records.transactions, &month);

    let agg = aggregate::aggregate(&in_month, &records.categories, &records.budgets, &month)?;
    let projection = forecast::forecast(&records.transactions, now, DEFAULT_TRAILING_DAYS)?;

    let (lifetime_income, lifetime_expense) = aggregate::totals(&records.transactions)?;
    let by_id: HashMap<&str, &Category> = records
        .categories
        .iter()
        .map(|c| (c.id.as_str(), c))
        .collect();
    let recent: Vec<RecentTransaction> = records
        .transactions
        .iter()
        .take(RECENT_LIMIT)
        .map(|t| RecentTransaction::new(t, &by_id))
        .collect();

    let summary = compose(
        &agg,
        Some(&projection),
        lifetime_income - lifetime_expense,
        month.start.format("%Y-%m").to_string(),
        &recent,
        &pending_items(&records.debts),
    );
    tracing::info!(
        user_id,
        month = %summary.summary.current_month,
        transactions = agg.transaction_count,
        budgets = summary.budget_status.len(),
        "dashboard composed"
    );
    Ok(summary)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub period: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_balance: Decimal,
    pub transaction_count: usize,
}

pub fn period_stats(
    transactions: &[Transaction],
    period: &Period,
    now: NaiveDateTime,
) -> Result<PeriodStats, AnalyticsError> {
    let range: DateRange = period.bounds(now)?;
    let within = period::filter_by_range(transactions, &range);
    let (income, expense) = aggregate::totals(&within)?;
    Ok(PeriodStats {
        period: period.to_string(),
        start_date: range.start,
        end_date: range.end,
        total_income: income,
        total_expense: expense,
        net_balance: income - expense,
        transaction_count: within.len(),
    })
}

pub fn build_period_stats<S>(
    store: &S,
    user_id: &str,
    period: &Period,
    now: NaiveDateTime,
) -> Result<PeriodStats, AnalyticsError>
where
    S: RecordStore + ?Sized,
{
    let records = store::fetch_records(store, user_id, RecordKinds::TRANSACTIONS)?;
    period_stats(&records.transactions, period, now)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningReport {
    pub forecast: ForecastResult,
    pub recommendations: Vec<Recommendation>,
}

pub fn build_planning<S>(
    store: &S,
    user_id: &str,
    now: NaiveDateTime,
    trailing_days: u32,
) -> Result<PlanningReport, AnalyticsError>
where
    S: RecordStore + ?Sized,
{
    let records = store::fetch_records(
        store,
        user_id,
        RecordKinds::TRANSACTIONS | RecordKinds::GOALS,
    )?;
    let projection = forecast::forecast(&records.transactions, now, trailing_days)?;
    let targets = forecast::savings_targets(&projection, &records.goals)?;
    let recommendations = forecast::recommendations(&projection, &targets);
    Ok(PlanningReport {
        forecast: projection,
        recommendations,
    })
}

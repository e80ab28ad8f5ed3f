// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read side of the storage layer.
//!
//! Every accessor is scoped by user id and returns typed records. Stored
//! numbers may come back from SQLite as TEXT, INTEGER or REAL; they are all
//! coerced to [`Decimal`] here, and anything that cannot be coerced fails the
//! whole read with [`AnalyticsError::DataIntegrity`].

use super::AnalyticsError;
use crate::db::{DATE_FMT, TIMESTAMP_FMT};
use crate::models::{Budget, Category, Debt, DebtDirection, Goal, Transaction, TxType};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, params};
use rust_decimal::Decimal;
use std::ops::BitOr;
use std::path::PathBuf;
use std::thread::ScopedJoinHandle;

/// Read accessors the aggregation pipeline consumes.
pub trait RecordStore: Sync {
    /// Newest first.
    fn transactions(&self, user_id: &str) -> Result<Vec<Transaction>, AnalyticsError>;
    fn categories(&self, user_id: &str) -> Result<Vec<Category>, AnalyticsError>;
    fn goals(&self, user_id: &str) -> Result<Vec<Goal>, AnalyticsError>;
    fn debts(&self, user_id: &str) -> Result<Vec<Debt>, AnalyticsError>;
    fn budgets(&self, user_id: &str) -> Result<Vec<Budget>, AnalyticsError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordKinds(u8);

impl RecordKinds {
    pub const TRANSACTIONS: RecordKinds = RecordKinds(1);
    pub const CATEGORIES: RecordKinds = RecordKinds(1 << 1);
    pub const GOALS: RecordKinds = RecordKinds(1 << 2);
    pub const DEBTS: RecordKinds = RecordKinds(1 << 3);
    pub const BUDGETS: RecordKinds = RecordKinds(1 << 4);
    pub const ALL: RecordKinds = RecordKinds(0b1_1111);

    pub fn contains(self, other: RecordKinds) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RecordKinds {
    type Output = RecordKinds;

    fn bitor(self, rhs: RecordKinds) -> RecordKinds {
        RecordKinds(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub goals: Vec<Goal>,
    pub debts: Vec<Debt>,
    pub budgets: Vec<Budget>,
}

/// Runs the selected reads concurrently and joins them. The first failing
/// read fails the whole fetch; no partial record set is returned.
pub fn fetch_records<S>(
    store: &S,
    user_id: &str,
    kinds: RecordKinds,
) -> Result<RecordSet, AnalyticsError>
where
    S: RecordStore + ?Sized,
{
    std::thread::scope(|s| {
        let transactions = kinds
            .contains(RecordKinds::TRANSACTIONS)
            .then(|| s.spawn(|| store.transactions(user_id)));
        let categories = kinds
            .contains(RecordKinds::CATEGORIES)
            .then(|| s.spawn(|| store.categories(user_id)));
        let goals = kinds
            .contains(RecordKinds::GOALS)
            .then(|| s.spawn(|| store.goals(user_id)));
        let debts = kinds
            .contains(RecordKinds::DEBTS)
            .then(|| s.spawn(|| store.debts(user_id)));
        let budgets = kinds
            .contains(RecordKinds::BUDGETS)
            .then(|| s.spawn(|| store.budgets(user_id)));

        let set = RecordSet {
            transactions: join(transactions)?,
            categories: join(categories)?,
            goals: join(goals)?,
            debts: join(debts)?,
            budgets: join(budgets)?,
        };
        tracing::debug!(
            user_id,
            transactions = set.transactions.len(),
            categories = set.categories.len(),
            goals = set.goals.len(),
            debts = set.debts.len(),
            budgets = set.budgets.len(),
            "records fetched"
        );
        Ok(set)
    })
}

fn join<T: Default>(
    handle: Option<ScopedJoinHandle<'_, Result<T, AnalyticsError>>>,
) -> Result<T, AnalyticsError> {
    match handle {
        Some(h) => h
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
        None => Ok(T::default()),
    }
}

/// SQLite-backed store. Each read opens its own read-only connection so the
/// reads in [`fetch_records`] can run side by side.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqliteStore { path: path.into() }
    }

    fn connect(&self) -> Result<Connection, AnalyticsError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }
}

impl RecordStore for SqliteStore {
    fn transactions(&self, user_id: &str) -> Result<Vec<Transaction>, AnalyticsError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, amount, type, category_id, occurred_at
             FROM transactions WHERE user_id=?1
             ORDER BY occurred_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Value>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, Value>(5)?,
                r.get::<_, String>(6)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, title, amount, kind, category_id, occurred_at) = row?;
            let id = id.to_string();
            out.push(Transaction {
                amount: amount_field("transaction", &id, "amount", amount)?,
                r#type: tx_type_field("transaction", &id, &kind)?,
                occurred_at: timestamp_field("transaction", &id, "occurred_at", &occurred_at)?,
                category_id: ref_field("transaction", &id, "category_id", category_id)?
                    .map(|c| c.to_string()),
                id,
                user_id,
                title,
            });
        }
        Ok(out)
    }

    fn categories(&self, user_id: &str) -> Result<Vec<Category>, AnalyticsError> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT id, name, type FROM categories WHERE user_id=?1 ORDER BY name")?;
        let rows = stmt.query_map(params![user_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, kind) = row?;
            let id = id.to_string();
            out.push(Category {
                r#type: tx_type_field("category", &id, &kind)?,
                id,
                name,
            });
        }
        Ok(out)
    }

    fn goals(&self, user_id: &str) -> Result<Vec<Goal>, AnalyticsError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, target_amount, current_amount, deadline, created_at
             FROM goals WHERE user_id=?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Value>(3)?,
                r.get::<_, Value>(4)?,
                r.get::<_, Option<String>>(5)?,
                r.get::<_, String>(6)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, title, target, current, deadline, created_at) = row?;
            let id = id.to_string();
            out.push(Goal {
                target_amount: amount_field("goal", &id, "target_amount", target)?,
                current_amount: amount_field("goal", &id, "current_amount", current)?,
                deadline: deadline
                    .map(|d| date_field("goal", &id, "deadline", &d))
                    .transpose()?,
                created_at: timestamp_field("goal", &id, "created_at", &created_at)?,
                id,
                user_id,
                title,
            });
        }
        Ok(out)
    }

    fn debts(&self, user_id: &str) -> Result<Vec<Debt>, AnalyticsError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, person_name, amount, direction, description, due_date, is_paid
             FROM debts WHERE user_id=?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Value>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, Option<String>>(5)?,
                r.get::<_, Option<String>>(6)?,
                r.get::<_, Value>(7)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, person_name, amount, direction, description, due, is_paid) = row?;
            let id = id.to_string();
            let direction = direction
                .parse::<DebtDirection>()
                .map_err(|_| AnalyticsError::data_integrity("debt", &id, "direction", direction))?;
            let is_paid = flag_field("debt", &id, "is_paid", is_paid)?;
            out.push(Debt {
                amount: amount_field("debt", &id, "amount", amount)?,
                due_date: due
                    .map(|d| date_field("debt", &id, "due_date", &d))
                    .transpose()?,
                id,
                user_id,
                person_name,
                direction,
                description,
                is_paid,
            });
        }
        Ok(out)
    }

    fn budgets(&self, user_id: &str) -> Result<Vec<Budget>, AnalyticsError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, category_id, limit_amount, start_date, end_date, is_active
             FROM budgets WHERE user_id=?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Value>(2)?,
                r.get::<_, Value>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, Option<String>>(5)?,
                r.get::<_, Value>(6)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, category_id, limit, start, end, is_active) = row?;
            let id = id.to_string();
            // Non-positive limits are reported by the aggregator, not here.
            out.push(Budget {
                limit_amount: decimal_field("budget", &id, "limit_amount", limit)?,
                start_date: date_field("budget", &id, "start_date", &start)?,
                end_date: end
                    .map(|d| date_field("budget", &id, "end_date", &d))
                    .transpose()?,
                category_id: ref_field("budget", &id, "category_id", category_id)?
                    .ok_or_else(|| {
                        AnalyticsError::data_integrity("budget", &id, "category_id", "NULL")
                    })?
                    .to_string(),
                is_active: flag_field("budget", &id, "is_active", is_active)?,
                id,
                user_id,
            });
        }
        Ok(out)
    }
}

/// Coerces a stored numeric cell to [`Decimal`], whatever SQLite type it came back as.
pub fn decimal_field(
    entity: &'static str,
    id: &str,
    field: &'static str,
    value: Value,
) -> Result<Decimal, AnalyticsError> {
    let parsed = match &value {
        Value::Text(s) => s.trim().parse::<Decimal>().ok(),
        Value::Integer(i) => Some(Decimal::from(*i)),
        Value::Real(f) => Decimal::try_from(*f).ok(),
        Value::Null | Value::Blob(_) => None,
    };
    parsed.ok_or_else(|| AnalyticsError::data_integrity(entity, id, field, describe(&value)))
}

/// Like [`decimal_field`], but also rejects negative magnitudes.
pub fn amount_field(
    entity: &'static str,
    id: &str,
    field: &'static str,
    value: Value,
) -> Result<Decimal, AnalyticsError> {
    let d = decimal_field(entity, id, field, value)?;
    if d.is_sign_negative() && !d.is_zero() {
        return Err(AnalyticsError::data_integrity(entity, id, field, d.to_string()));
    }
    Ok(d)
}

pub fn timestamp_field(
    entity: &'static str,
    id: &str,
    field: &'static str,
    raw: &str,
) -> Result<NaiveDateTime, AnalyticsError> {
    let s = raw.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FMT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(s, DATE_FMT).map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| AnalyticsError::data_integrity(entity, id, field, raw))
}

pub fn date_field(
    entity: &'static str,
    id: &str,
    field: &'static str,
    raw: &str,
) -> Result<NaiveDate, AnalyticsError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FMT)
        .map_err(|_| AnalyticsError::data_integrity(entity, id, field, raw))
}

/// Coerces a row reference. NULL is no reference; whole numbers stored as
/// TEXT or REAL are accepted.
pub fn ref_field(
    entity: &'static str,
    id: &str,
    field: &'static str,
    value: Value,
) -> Result<Option<i64>, AnalyticsError> {
    let parsed = match &value {
        Value::Null => return Ok(None),
        Value::Integer(i) => Some(*i),
        Value::Text(s) => s.trim().parse::<i64>().ok(),
        Value::Real(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
        Value::Real(_) | Value::Blob(_) => None,
    };
    match parsed {
        Some(i) => Ok(Some(i)),
        None => Err(AnalyticsError::data_integrity(entity, id, field, describe(&value))),
    }
}

/// Coerces a 0/1 flag, also accepting `true`/`false` text.
pub fn flag_field(
    entity: &'static str,
    id: &str,
    field: &'static str,
    value: Value,
) -> Result<bool, AnalyticsError> {
    let parsed = match &value {
        Value::Integer(0) => Some(false),
        Value::Integer(1) => Some(true),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "false" => Some(false),
            "1" | "true" => Some(true),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| AnalyticsError::data_integrity(entity, id, field, describe(&value)))
}

fn tx_type_field(entity: &'static str, id: &str, raw: &str) -> Result<TxType, AnalyticsError> {
    raw.parse::<TxType>()
        .map_err(|_| AnalyticsError::data_integrity(entity, id, "type", raw))
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "NULL".into(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} byte blob>", b.len()),
    }
}

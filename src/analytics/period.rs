// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Time windows for dashboard figures.
//!
//! Every period resolves to a half-open range `[start, end)`. Calendar periods
//! end at the instant the next one starts, so a timestamp at exactly midnight
//! on a boundary belongs to the period starting there.

use super::AnalyticsError;
use crate::models::Transaction;
use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, AnalyticsError> {
        if end <= start {
            return Err(AnalyticsError::InvalidPeriod(format!("{start}..{end}")));
        }
        Ok(DateRange { start, end })
    }

    /// Whole calendar days, `end` inclusive; open-ended when `end` is absent.
    pub fn from_dates(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        let end = end
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .map(midnight)
            .unwrap_or(NaiveDateTime::MAX);
        DateRange {
            start: midnight(start),
            end,
        }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }

    pub fn intersect(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(DateRange { start, end })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    /// Sunday through Saturday.
    Week,
    Month,
    Year,
    Custom(DateRange),
}

impl Period {
    pub fn bounds(&self, now: NaiveDateTime) -> Result<DateRange, AnalyticsError> {
        let today = now.date();
        let overflow = || AnalyticsError::InvalidPeriod(format!("{self} around {now}"));
        let (start, end) = match self {
            Period::Custom(range) => return Ok(*range),
            Period::Day => {
                let end = today.checked_add_days(Days::new(1)).ok_or_else(overflow)?;
                (today, end)
            }
            Period::Week => {
                let back = Days::new(u64::from(today.weekday().num_days_from_sunday()));
                let start = today.checked_sub_days(back).ok_or_else(overflow)?;
                let end = start.checked_add_days(Days::new(7)).ok_or_else(overflow)?;
                (start, end)
            }
            Period::Month => {
                let start = today.with_day(1).ok_or_else(overflow)?;
                let end = start.checked_add_months(Months::new(1)).ok_or_else(overflow)?;
                (start, end)
            }
            Period::Year => {
                let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).ok_or_else(overflow)?;
                let end = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).ok_or_else(overflow)?;
                (start, end)
            }
        };
        Ok(DateRange {
            start: midnight(start),
            end: midnight(end),
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Day => f.write_str("day"),
            Period::Week => f.write_str("week"),
            Period::Month => f.write_str("month"),
            Period::Year => f.write_str("year"),
            Period::Custom(r) => write!(f, "{}..{}", r.start, r.end),
        }
    }
}

impl FromStr for Period {
    type Err = AnalyticsError;

    /// `day`, `week`, `month`, `year`, or `START..END` where both ends are
    /// dates (`YYYY-MM-DD`) or timestamps; `END` is exclusive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        match token.to_lowercase().as_str() {
            "day" => return Ok(Period::Day),
            "week" => return Ok(Period::Week),
            "month" => return Ok(Period::Month),
            "year" => return Ok(Period::Year),
            _ => {}
        }
        let invalid = || AnalyticsError::InvalidPeriod(s.to_string());
        let (a, b) = token.split_once("..").ok_or_else(invalid)?;
        let start = parse_instant(a).ok_or_else(invalid)?;
        let end = parse_instant(b).ok_or_else(invalid)?;
        DateRange::new(start, end)
            .map(Period::Custom)
            .map_err(|_| invalid())
    }
}

fn parse_instant(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(midnight)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

fn midnight(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::MIN)
}

/// Anything that can be placed on the timeline.
pub trait Timestamped {
    fn timestamp(&self) -> NaiveDateTime;
}

impl Timestamped for Transaction {
    fn timestamp(&self) -> NaiveDateTime {
        self.occurred_at
    }
}

/// Keeps the records whose timestamp falls in `period`, preserving order.
pub fn filter_by_period<T>(
    records: &[T],
    period: &Period,
    now: NaiveDateTime,
) -> Result<Vec<T>, AnalyticsError>
where
    T: Timestamped + Clone,
{
    let range = period.bounds(now)?;
    Ok(filter_by_range(records, &range))
}

pub fn filter_by_range<T>(records: &[T], range: &DateRange) -> Vec<T>
where
    T: Timestamped + Clone,
{
    records
        .iter()
        .filter(|r| range.contains(r.timestamp()))
        .cloned()
        .collect()
}

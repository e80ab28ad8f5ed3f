// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Failures surfaced by the aggregation pipeline. A dashboard call either
/// succeeds completely or returns exactly one of these.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("invalid {field} '{value}' on {entity} {id}")]
    DataIntegrity {
        entity: &'static str,
        id: String,
        field: &'static str,
        value: String,
    },
    #[error("invalid period '{0}', expected day|week|month|year|YYYY-MM-DD..YYYY-MM-DD")]
    InvalidPeriod(String),
    #[error("budget {id} has non-positive limit {limit}")]
    InvalidBudget { id: String, limit: Decimal },
    #[error("amount overflow while computing {0}")]
    Overflow(&'static str),
    #[error("exchange rate feed unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl AnalyticsError {
    /// Builds a [`AnalyticsError::DataIntegrity`] and logs it where it was detected.
    pub fn data_integrity(
        entity: &'static str,
        id: impl Into<String>,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let value = value.into();
        tracing::error!(entity, %id, field, %value, "unusable value in stored record");
        AnalyticsError::DataIntegrity {
            entity,
            id,
            field,
            value,
        }
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Dashboard aggregation engine.
//!
//! Data flows store -> period filter -> aggregator / forecaster -> summary.
//! Everything after the store is pure and synchronous over an in-memory
//! snapshot, so a request either yields a complete [`DashboardSummary`] or a
//! single [`AnalyticsError`].

pub mod aggregate;
mod error;
pub mod forecast;
pub mod period;
pub mod store;
pub mod summary;

pub use error::AnalyticsError;
pub use period::{DateRange, Period};
pub use store::{RecordKinds, RecordSet, RecordStore, SqliteStore, fetch_records};
pub use summary::{DashboardSummary, build_dashboard, build_period_stats, build_planning};

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budgets;
pub mod categories;
pub mod currencies;
pub mod debts;
pub mod exporter;
pub mod goals;
pub mod notes;
pub mod stats;
pub mod templates;
pub mod transactions;

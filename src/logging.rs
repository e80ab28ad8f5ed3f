// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

static TRACING_INIT: Once = Once::new();

pub const LOG_ENV: &str = "MONEYDASH_LOG";

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "moneydash=warn",
        1 => "moneydash=info",
        _ => "moneydash=debug",
    }
}

/// Installs the global subscriber once. Logs go to stderr so JSON output on
/// stdout stays machine readable.
pub fn init(verbosity: u8) {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Moneydash", "moneydash"));

pub const DB_ENV: &str = "MONEYDASH_DB";
pub const USER_ENV: &str = "MONEYDASH_USER";
pub const FX_URL_ENV: &str = "MONEYDASH_FX_URL";
pub const DEFAULT_USER: &str = "local";
pub const DEFAULT_FX_URL: &str = "https://open.er-api.com/v6/latest";

/// Resolved runtime settings: flags win over environment, environment over defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    /// Authenticated caller; every read and write is scoped by it.
    pub user: String,
    pub fx_url: String,
    pub verbosity: u8,
}

impl Settings {
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Self> {
        let db_path = match m.get_one::<String>("db") {
            Some(p) => PathBuf::from(p),
            None => match env::var(DB_ENV) {
                Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
                _ => default_db_path()?,
            },
        };
        let user = m
            .get_one::<String>("user")
            .cloned()
            .or_else(|| env::var(USER_ENV).ok())
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        let fx_url = env::var(FX_URL_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FX_URL.to_string());
        Ok(Settings {
            db_path,
            user,
            fx_url,
            verbosity: m.get_count("verbose"),
        })
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    Ok(proj.data_dir().join("moneydash.sqlite"))
}

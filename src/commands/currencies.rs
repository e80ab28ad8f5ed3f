// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::AnalyticsError;
use crate::models::Currency;
use crate::utils::{
    get_base_currency, http_client, maybe_print_json, parse_amount, parse_decimal, pretty_table,
    set_base_currency,
};
use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub fn handle(conn: &Connection, fx_url: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let code = sub.get_one::<String>("code").unwrap().trim().to_uppercase();
            let name = sub.get_one::<String>("name").unwrap().trim();
            let symbol = sub.get_one::<String>("symbol").unwrap().trim();
            let rate = match sub.get_one::<String>("rate") {
                Some(s) => parse_amount(s)?,
                None => Decimal::ONE,
            };
            conn.execute(
                "INSERT INTO currencies(code, name, symbol, exchange_rate) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(code) DO UPDATE SET name=excluded.name, symbol=excluded.symbol,
                 exchange_rate=excluded.exchange_rate",
                params![code, name, symbol, rate.to_string()],
            )?;
            println!("Currency {} ({}) saved at rate {}", code, symbol, rate);
        }
        Some(("list", sub)) => {
            let rows = list(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .into_iter()
                    .map(|c| {
                        vec![
                            c.code,
                            c.name,
                            c.symbol,
                            c.exchange_rate.to_string(),
                            c.updated_at.unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Code", "Name", "Symbol", "Rate", "Updated"], data)
                );
            }
        }
        Some(("set-base", sub)) => {
            let code = sub.get_one::<String>("code").unwrap().trim().to_uppercase();
            set_base_currency(conn, &code)?;
            println!("Base currency set to {}", code);
        }
        Some(("convert", sub)) => {
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let from = sub.get_one::<String>("from").unwrap().trim().to_uppercase();
            let to = sub.get_one::<String>("to").unwrap().trim().to_uppercase();
            let res = convert(conn, amount, &from, &to)?;
            println!("{} {} -> {:.4} {}", amount, from, res, to);
        }
        Some(("refresh", _)) => {
            let n = refresh(conn, fx_url)?;
            println!("Updated {} exchange rates", n);
        }
        Some(("watch", sub)) => {
            let interval = *sub.get_one::<u64>("interval").unwrap();
            let iterations = sub.get_one::<u64>("iterations").copied();
            watch(conn, fx_url, Duration::from_secs(interval), iterations);
        }
        _ => {}
    }
    Ok(())
}

pub fn list(conn: &Connection) -> Result<Vec<Currency>> {
    let mut stmt = conn.prepare(
        "SELECT id, code, name, symbol, exchange_rate, updated_at
         FROM currencies WHERE is_active=1 ORDER BY code",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<String>>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, code, name, symbol, rate, updated_at) = row?;
        out.push(Currency {
            id,
            code,
            name,
            symbol,
            exchange_rate: parse_decimal(&rate)?,
            updated_at,
        });
    }
    Ok(out)
}

/// Base-currency units per one unit of `code`. The base currency itself is 1.
pub fn rate_for(conn: &Connection, code: &str) -> Result<Decimal> {
    if code == get_base_currency(conn)? {
        return Ok(Decimal::ONE);
    }
    let rate: Option<String> = conn
        .query_row(
            "SELECT exchange_rate FROM currencies WHERE code=?1",
            params![code],
            |r| r.get(0),
        )
        .optional()?;
    let rate = rate.with_context(|| format!("Unknown currency '{}'", code))?;
    parse_decimal(&rate)
}

/// Converts through the base currency using the stored rates, however stale.
pub fn convert(conn: &Connection, amount: Decimal, from: &str, to: &str) -> Result<Decimal> {
    if from == to {
        return Ok(amount);
    }
    let from_rate = rate_for(conn, from)?;
    let to_rate = rate_for(conn, to)?;
    if to_rate.is_zero() {
        bail!("Currency {} has a zero exchange rate", to);
    }
    Ok(amount * from_rate / to_rate)
}

#[derive(Debug, Deserialize)]
struct Latest {
    rates: HashMap<String, f64>,
}

/// Fetches `{rates: {CODE: number}}` quoted against `base`. A feed with no
/// quotes at all counts as unavailable.
pub fn fetch_latest(
    client: &reqwest::blocking::Client,
    url: &str,
    base: &str,
) -> Result<HashMap<String, f64>, AnalyticsError> {
    let url = format!("{}/{}", url.trim_end_matches('/'), base);
    let resp = client
        .get(&url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| AnalyticsError::UpstreamUnavailable(e.to_string()))?;
    let body: Latest = resp
        .json()
        .map_err(|e| AnalyticsError::UpstreamUnavailable(format!("bad payload: {}", e)))?;
    if body.rates.is_empty() {
        return Err(AnalyticsError::UpstreamUnavailable(format!(
            "feed quoted no rates for {}",
            base
        )));
    }
    Ok(body.rates)
}

/// Stores `1 / rate` for every active currency the feed quotes and returns
/// how many rows changed. The base currency and unquoted codes are left alone.
pub fn apply_rates(conn: &Connection, base: &str, rates: &HashMap<String, f64>) -> Result<usize> {
    let codes: Vec<String> = {
        let mut stmt = conn.prepare("SELECT code FROM currencies WHERE is_active=1")?;
        stmt.query_map([], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<_>>()?
    };
    let mut updated = 0;
    for code in codes {
        if code == base {
            continue;
        }
        let Some(&quote) = rates.get(&code) else {
            tracing::debug!(%code, "feed has no quote");
            continue;
        };
        let local = match Decimal::try_from(quote)
            .ok()
            .filter(|q| *q > Decimal::ZERO)
            .and_then(|q| Decimal::ONE.checked_div(q))
        {
            Some(v) => v.round_dp(10),
            None => {
                tracing::warn!(%code, quote, "unusable quote skipped");
                continue;
            }
        };
        updated += conn.execute(
            "UPDATE currencies SET exchange_rate=?1, updated_at=datetime('now') WHERE code=?2",
            params![local.to_string(), code],
        )?;
        tracing::info!(%code, rate = %local, "exchange rate updated");
    }
    Ok(updated)
}

pub fn refresh(conn: &Connection, fx_url: &str) -> Result<usize> {
    let base = get_base_currency(conn)?;
    let client = http_client()?;
    let rates = fetch_latest(&client, fx_url, &base)?;
    apply_rates(conn, &base, &rates)
}

/// Refreshes on a fixed timer. Failures are logged and retried on the next tick.
pub fn watch(conn: &Connection, fx_url: &str, every: Duration, iterations: Option<u64>) {
    let mut done = 0u64;
    loop {
        match refresh(conn, fx_url) {
            Ok(n) => tracing::info!(updated = n, "exchange rates refreshed"),
            Err(e) => tracing::warn!(error = %e, "exchange rate refresh failed"),
        }
        done += 1;
        if iterations.is_some_and(|max| done >= max) {
            break;
        }
        std::thread::sleep(every);
    }
}

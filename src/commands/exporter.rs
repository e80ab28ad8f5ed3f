// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{Connection, params};
use serde_json::json;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, user, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT t.occurred_at, t.title, t.type, t.amount, c.name as category
         FROM transactions t
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.user_id=?1
         ORDER BY t.occurred_at, t.id",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut count = 0usize;
    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["occurred_at", "title", "type", "amount", "category"])?;
            for row in rows {
                let (at, title, kind, amt, cat) = row?;
                wtr.write_record([at, title, kind, amt, cat.unwrap_or_default()])?;
                count += 1;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (at, title, kind, amt, cat) = row?;
                items.push(json!({
                    "occurred_at": at, "title": title, "type": kind, "amount": amt, "category": cat
                }));
            }
            count = items.len();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        _ => anyhow::bail!("Unknown format: {} (use csv|json)", fmt),
    }
    tracing::info!(user, count, path = %out, "transactions exported");
    println!("Exported {} transactions to {}", count, out);
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions;
use crate::models::TxType;
use crate::utils::{
    ensure_owned, fmt_money, maybe_print_json, now_local, optional_category, parse_amount,
    parse_decimal, parse_timestamp, pretty_table,
};
use anyhow::{Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            let kind: TxType = sub.get_one::<String>("type").unwrap().parse()?;
            let category_id = optional_category(conn, user, sub.get_one::<String>("category"))?;
            conn.execute(
                "INSERT INTO templates(user_id, name, amount, type, category_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user, name, amount.to_string(), kind.as_str(), category_id],
            )?;
            println!("Added template '{}'", name);
        }
        Some(("list", sub)) => {
            let rows = list(conn, user)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .into_iter()
                    .map(|t| {
                        vec![
                            t.id.to_string(),
                            t.name,
                            t.r#type,
                            fmt_money(&t.amount),
                            t.category.unwrap_or_default(),
                            t.usage_count.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Type", "Amount", "Category", "Used"], data)
                );
            }
        }
        Some(("use", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let at = match sub.get_one::<String>("at") {
                Some(s) => parse_timestamp(s)?,
                None => now_local(),
            };
            let tx_id = apply(conn, user, id, at)?;
            println!("Recorded transaction {} from template {}", tx_id, id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "DELETE FROM templates WHERE id=?1 AND user_id=?2",
                params![id, user],
            )?;
            ensure_owned(n, "Template", id, user)?;
            println!("Removed template {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// Records a transaction from template `id` and bumps its usage counter.
pub fn apply(conn: &Connection, user: &str, id: i64, at: chrono::NaiveDateTime) -> Result<i64> {
    let row: Option<(String, String, String, Option<i64>)> = conn
        .query_row(
            "SELECT name, amount, type, category_id FROM templates WHERE id=?1 AND user_id=?2",
            params![id, user],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .optional()?;
    let Some((name, amount, kind, category_id)) = row else {
        bail!("Template {} not found for user '{}'", id, user);
    };
    let amount = parse_amount(&amount)?;
    let kind: TxType = kind.parse()?;

    let tx = conn.unchecked_transaction()?;
    let tx_id = transactions::insert(&tx, user, &name, amount, kind, category_id, at)?;
    tx.execute(
        "UPDATE templates SET usage_count = usage_count + 1 WHERE id=?1",
        params![id],
    )?;
    tx.commit()?;
    Ok(tx_id)
}

#[derive(Debug, Serialize)]
pub struct TemplateRow {
    pub id: i64,
    pub name: String,
    pub r#type: String,
    pub amount: Decimal,
    pub category: Option<String>,
    pub usage_count: i64,
}

/// Most used first.
pub fn list(conn: &Connection, user: &str) -> Result<Vec<TemplateRow>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.type, t.amount, c.name, t.usage_count
         FROM templates t LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.user_id=?1 ORDER BY t.usage_count DESC, t.name",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, i64>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, name, r#type, amount, category, usage_count) = row?;
        out.push(TemplateRow {
            id,
            name,
            r#type,
            amount: parse_decimal(&amount)?,
            category,
            usage_count,
        });
    }
    Ok(out)
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    ensure_owned, fmt_money, id_for_category, maybe_print_json, parse_amount, parse_date,
    parse_decimal, pretty_table,
};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, sub)?,
        Some(("list", sub)) => {
            let rows = list(conn, user)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .into_iter()
                    .map(|b| {
                        vec![
                            b.id.to_string(),
                            b.category,
                            fmt_money(&b.limit_amount),
                            b.start_date,
                            b.end_date.unwrap_or_else(|| "open".into()),
                            if b.is_active { "yes".into() } else { "no".into() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Category", "Limit", "From", "To", "Active"], data)
                );
            }
        }
        Some(("edit", sub)) => edit(conn, user, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "DELETE FROM budgets WHERE id=?1 AND user_id=?2",
                params![id, user],
            )?;
            ensure_owned(n, "Budget", id, user)?;
            println!("Removed budget {}", id);
        }
        _ => {}
    }
    Ok(())
}

struct BudgetInput {
    category_id: i64,
    limit: Decimal,
    start: NaiveDate,
    end: Option<NaiveDate>,
}

fn read_input(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<BudgetInput> {
    let cat = sub.get_one::<String>("category").unwrap();
    let category_id = id_for_category(conn, user, cat.trim())?;
    let limit = parse_amount(sub.get_one::<String>("limit").unwrap())?;
    let start = parse_date(sub.get_one::<String>("start").unwrap())?;
    let end = sub
        .get_one::<String>("end")
        .map(|s| parse_date(s))
        .transpose()?;
    if let Some(end) = end {
        if end < start {
            bail!("Budget ends ({}) before it starts ({})", end, start);
        }
    }
    Ok(BudgetInput {
        category_id,
        limit,
        start,
        end,
    })
}

fn add(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let b = read_input(conn, user, sub)?;
    conn.execute(
        "INSERT INTO budgets(user_id, category_id, limit_amount, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user,
            b.category_id,
            b.limit.to_string(),
            b.start.to_string(),
            b.end.map(|d| d.to_string())
        ],
    )?;
    println!(
        "Budget of {} set for '{}' from {}",
        b.limit,
        sub.get_one::<String>("category").unwrap(),
        b.start
    );
    Ok(())
}

fn edit(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let b = read_input(conn, user, sub)?;
    let n = conn.execute(
        "UPDATE budgets SET category_id=?1, limit_amount=?2, start_date=?3, end_date=?4,
         is_active=?5 WHERE id=?6 AND user_id=?7",
        params![
            b.category_id,
            b.limit.to_string(),
            b.start.to_string(),
            b.end.map(|d| d.to_string()),
            !sub.get_flag("inactive"),
            id,
            user
        ],
    )?;
    ensure_owned(n, "Budget", id, user)?;
    println!("Updated budget {}", id);
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct BudgetRow {
    pub id: i64,
    pub category: String,
    pub limit_amount: Decimal,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_active: bool,
}

pub fn list(conn: &Connection, user: &str) -> Result<Vec<BudgetRow>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, c.name, b.limit_amount, b.start_date, b.end_date, b.is_active
         FROM budgets b JOIN categories c ON b.category_id=c.id
         WHERE b.user_id=?1 ORDER BY b.start_date DESC, c.name",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, bool>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, category, limit, start_date, end_date, is_active) = row?;
        out.push(BudgetRow {
            id,
            category,
            limit_amount: parse_decimal(&limit)?,
            start_date,
            end_date,
            is_active,
        });
    }
    Ok(out)
}

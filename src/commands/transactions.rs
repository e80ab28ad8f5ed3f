// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::Period;
use crate::db::TIMESTAMP_FMT;
use crate::models::TxType;
use crate::utils::{
    ensure_owned, fmt_money, maybe_print_json, now_local, optional_category, parse_amount,
    parse_timestamp, pretty_table,
};
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, sub)?,
        Some(("list", sub)) => list(conn, user, sub)?,
        Some(("edit", sub)) => edit(conn, user, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
                params![id, user],
            )?;
            ensure_owned(n, "Transaction", id, user)?;
            println!("Removed transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let title = sub.get_one::<String>("title").unwrap().trim();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let kind: TxType = sub.get_one::<String>("type").unwrap().parse()?;
    let category_id = optional_category(conn, user, sub.get_one::<String>("category"))?;
    let at = match sub.get_one::<String>("at") {
        Some(s) => parse_timestamp(s)?,
        None => now_local(),
    };
    let id = insert(conn, user, title, amount, kind, category_id, at)?;
    println!("Recorded {} {} '{}' on {} (id {})", kind, amount, title, at, id);
    Ok(())
}

/// Stores one transaction and returns its id. `amount` is a positive magnitude.
pub fn insert(
    conn: &Connection,
    user: &str,
    title: &str,
    amount: Decimal,
    kind: TxType,
    category_id: Option<i64>,
    at: NaiveDateTime,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions(user_id, title, amount, type, category_id, occurred_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user,
            title,
            amount.to_string(),
            kind.as_str(),
            category_id,
            at.format(TIMESTAMP_FMT).to_string()
        ],
    )?;
    tracing::debug!(user, %amount, kind = kind.as_str(), "transaction recorded");
    Ok(conn.last_insert_rowid())
}

fn edit(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let title = sub.get_one::<String>("title").unwrap().trim();
    let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let category_id = optional_category(conn, user, sub.get_one::<String>("category"))?;
    let n = conn.execute(
        "UPDATE transactions SET title=?1, amount=?2, category_id=?3 WHERE id=?4 AND user_id=?5",
        params![title, amount.to_string(), category_id, id, user],
    )?;
    ensure_owned(n, "Transaction", id, user)?;
    println!("Updated transaction {}", id);
    Ok(())
}

fn list(conn: &Connection, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, user, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.occurred_at.clone(),
                    r.title.clone(),
                    r.r#type.clone(),
                    fmt_money(&r.amount),
                    r.category.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "When", "Title", "Type", "Amount", "Category"], rows)
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub occurred_at: String,
    pub title: String,
    pub r#type: String,
    pub amount: Decimal,
    pub category: String,
}

/// Newest first, optionally narrowed by `--period`, `--category` and `--limit`.
pub fn query_rows(
    conn: &Connection,
    user: &str,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.occurred_at, t.title, t.type, t.amount, c.name
         FROM transactions t LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.user_id=?",
    );
    let mut params_vec: Vec<String> = vec![user.to_string()];

    if let Some(p) = sub.get_one::<String>("period") {
        let period: Period = p.parse()?;
        let now = match sub.get_one::<String>("now") {
            Some(s) => parse_timestamp(s)?,
            None => now_local(),
        };
        let range = period.bounds(now)?;
        sql.push_str(" AND t.occurred_at >= ? AND t.occurred_at < ?");
        params_vec.push(range.start.format(TIMESTAMP_FMT).to_string());
        params_vec.push(range.end.format(TIMESTAMP_FMT).to_string());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND c.name=?");
        params_vec.push(cat.into());
    }
    sql.push_str(" ORDER BY t.occurred_at DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let amount: String = r.get(4)?;
        let category: Option<String> = r.get(5)?;
        data.push(TransactionRow {
            id: r.get(0)?,
            occurred_at: r.get(1)?,
            title: r.get(2)?,
            r#type: r.get(3)?,
            amount: crate::utils::parse_decimal(&amount)?,
            category: category.unwrap_or_default(),
        });
    }
    Ok(data)
}

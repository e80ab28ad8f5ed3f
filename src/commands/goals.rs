// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{
    ensure_owned, fmt_money, maybe_print_json, parse_amount, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let title = sub.get_one::<String>("title").unwrap().trim();
            let target = parse_amount(sub.get_one::<String>("target").unwrap())?;
            let current = match sub.get_one::<String>("current") {
                Some(s) => non_negative(s)?,
                None => Decimal::ZERO,
            };
            let deadline = sub
                .get_one::<String>("deadline")
                .map(|s| parse_date(s))
                .transpose()?;
            conn.execute(
                "INSERT INTO goals(user_id, title, target_amount, current_amount, deadline)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user,
                    title,
                    target.to_string(),
                    current.to_string(),
                    deadline.map(|d| d.to_string())
                ],
            )?;
            println!("Added goal '{}' (target {})", title, target);
        }
        Some(("list", sub)) => {
            let rows = list(conn, user)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .into_iter()
                    .map(|g| {
                        vec![
                            g.id.to_string(),
                            g.title,
                            fmt_money(&g.current_amount),
                            fmt_money(&g.target_amount),
                            format!("{}%", g.progress),
                            g.deadline.unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Goal", "Saved", "Target", "Progress", "Deadline"], data)
                );
            }
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let title = sub.get_one::<String>("title").unwrap().trim();
            let target = parse_amount(sub.get_one::<String>("target").unwrap())?;
            let current = non_negative(sub.get_one::<String>("current").unwrap())?;
            let deadline = sub
                .get_one::<String>("deadline")
                .map(|s| parse_date(s))
                .transpose()?;
            let n = conn.execute(
                "UPDATE goals SET title=?1, target_amount=?2, current_amount=?3, deadline=?4
                 WHERE id=?5 AND user_id=?6",
                params![
                    title,
                    target.to_string(),
                    current.to_string(),
                    deadline.map(|d| d.to_string()),
                    id,
                    user
                ],
            )?;
            ensure_owned(n, "Goal", id, user)?;
            println!("Updated goal {}", id);
        }
        Some(("contribute", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            let total = contribute(conn, user, id, amount)?;
            println!("Goal {} now at {}", id, total);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "DELETE FROM goals WHERE id=?1 AND user_id=?2",
                params![id, user],
            )?;
            ensure_owned(n, "Goal", id, user)?;
            println!("Removed goal {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn non_negative(s: &str) -> Result<Decimal> {
    let d = parse_decimal(s)?;
    if d < Decimal::ZERO {
        bail!("Saved amount cannot be negative, got {}", d);
    }
    Ok(d)
}

/// Adds a positive `amount` to the goal and returns the new saved total.
pub fn contribute(conn: &Connection, user: &str, id: i64, amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        bail!("Contribution must be positive, got {}", amount);
    }
    let current: Option<String> = conn
        .query_row(
            "SELECT current_amount FROM goals WHERE id=?1 AND user_id=?2",
            params![id, user],
            |r| r.get(0),
        )
        .optional()?;
    let Some(current) = current else {
        bail!("Goal {} not found for user '{}'", id, user);
    };
    let current = current
        .parse::<Decimal>()
        .with_context(|| format!("Invalid saved amount '{}' on goal {}", current, id))?;
    let total = current
        .checked_add(amount)
        .with_context(|| format!("Contribution overflows goal {}", id))?;
    conn.execute(
        "UPDATE goals SET current_amount=?1 WHERE id=?2 AND user_id=?3",
        params![total.to_string(), id, user],
    )?;
    tracing::info!(goal = id, %amount, %total, "goal contribution");
    Ok(total)
}

#[derive(Debug, Serialize)]
pub struct GoalRow {
    pub id: i64,
    pub title: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    /// Whole percent of the target already saved, capped at 100.
    pub progress: u64,
    pub deadline: Option<String>,
}

pub fn list(conn: &Connection, user: &str) -> Result<Vec<GoalRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, target_amount, current_amount, deadline
         FROM goals WHERE user_id=?1 ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, title, target, current, deadline) = row?;
        let target_amount = parse_decimal(&target)?;
        let current_amount = parse_decimal(&current)?;
        let progress = crate::analytics::aggregate::percent_of(current_amount, target_amount)?
            .min(Decimal::ONE_HUNDRED)
            .floor()
            .to_u64()
            .unwrap_or(0);
        out.push(GoalRow {
            id,
            title,
            target_amount,
            current_amount,
            progress,
            deadline,
        });
    }
    Ok(out)
}

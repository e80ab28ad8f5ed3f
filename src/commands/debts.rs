// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::DebtDirection;
use crate::utils::{
    ensure_owned, fmt_money, maybe_print_json, parse_amount, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let person = sub.get_one::<String>("person").unwrap().trim();
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            let direction: DebtDirection = sub.get_one::<String>("direction").unwrap().parse()?;
            let due = sub
                .get_one::<String>("due")
                .map(|s| parse_date(s))
                .transpose()?;
            let description = sub.get_one::<String>("description");
            conn.execute(
                "INSERT INTO debts(user_id, person_name, amount, direction, description, due_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user,
                    person,
                    amount.to_string(),
                    direction.as_str(),
                    description,
                    due.map(|d| d.to_string())
                ],
            )?;
            println!("Added debt: {} {} ({})", person, amount, direction);
        }
        Some(("list", sub)) => {
            let rows = list(conn, user, sub.get_flag("unpaid"))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .into_iter()
                    .map(|d| {
                        vec![
                            d.id.to_string(),
                            d.person_name,
                            d.direction,
                            fmt_money(&d.amount),
                            d.due_date.unwrap_or_default(),
                            if d.is_paid { "yes".into() } else { "no".into() },
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Person", "Direction", "Amount", "Due", "Paid"], data)
                );
            }
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let person = sub.get_one::<String>("person").unwrap().trim();
            let amount = parse_amount(sub.get_one::<String>("amount").unwrap())?;
            let direction: DebtDirection = sub.get_one::<String>("direction").unwrap().parse()?;
            let due = sub
                .get_one::<String>("due")
                .map(|s| parse_date(s))
                .transpose()?;
            let n = conn.execute(
                "UPDATE debts SET person_name=?1, amount=?2, direction=?3, description=?4,
                 due_date=?5, is_paid=?6 WHERE id=?7 AND user_id=?8",
                params![
                    person,
                    amount.to_string(),
                    direction.as_str(),
                    sub.get_one::<String>("description"),
                    due.map(|d| d.to_string()),
                    sub.get_flag("paid"),
                    id,
                    user
                ],
            )?;
            ensure_owned(n, "Debt", id, user)?;
            println!("Updated debt {}", id);
        }
        Some(("pay", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "UPDATE debts SET is_paid=1 WHERE id=?1 AND user_id=?2",
                params![id, user],
            )?;
            ensure_owned(n, "Debt", id, user)?;
            println!("Marked debt {} as paid", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "DELETE FROM debts WHERE id=?1 AND user_id=?2",
                params![id, user],
            )?;
            ensure_owned(n, "Debt", id, user)?;
            println!("Removed debt {}", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct DebtRow {
    pub id: i64,
    pub person_name: String,
    pub direction: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub is_paid: bool,
}

pub fn list(conn: &Connection, user: &str, unpaid_only: bool) -> Result<Vec<DebtRow>> {
    let mut sql = String::from(
        "SELECT id, person_name, direction, amount, description, due_date, is_paid
         FROM debts WHERE user_id=?1",
    );
    if unpaid_only {
        sql.push_str(" AND is_paid=0");
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, bool>(6)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, person_name, direction, amount, description, due_date, is_paid) = row?;
        out.push(DebtRow {
            id,
            person_name,
            direction,
            amount: parse_decimal(&amount)?,
            description,
            due_date,
            is_paid,
        });
    }
    Ok(out)
}

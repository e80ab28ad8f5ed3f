// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxType;
use crate::utils::{ensure_owned, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let kind: TxType = sub.get_one::<String>("type").unwrap().parse()?;
            conn.execute(
                "INSERT INTO categories(user_id, name, type) VALUES (?1, ?2, ?3)",
                params![user, name, kind.as_str()],
            )
            .with_context(|| format!("Add category '{}'", name))?;
            println!("Added {} category '{}'", kind, name);
        }
        Some(("list", sub)) => {
            let rows = list(conn, user)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.name, c.r#type])
                    .collect();
                println!("{}", pretty_table(&["ID", "Category", "Type"], data));
            }
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let name = sub.get_one::<String>("name").unwrap().trim();
            let kind: TxType = sub.get_one::<String>("type").unwrap().parse()?;
            let n = conn.execute(
                "UPDATE categories SET name=?1, type=?2 WHERE id=?3 AND user_id=?4",
                params![name, kind.as_str(), id, user],
            )?;
            ensure_owned(n, "Category", id, user)?;
            println!("Updated category {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "DELETE FROM categories WHERE id=?1 AND user_id=?2",
                params![id, user],
            )?;
            ensure_owned(n, "Category", id, user)?;
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub r#type: String,
}

pub fn list(conn: &Connection, user: &str) -> Result<Vec<CategoryRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, type FROM categories WHERE user_id=?1 ORDER BY type, name")?;
    let rows = stmt.query_map(params![user], |r| {
        Ok(CategoryRow {
            id: r.get(0)?,
            name: r.get(1)?,
            r#type: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{ensure_owned, maybe_print_json, parse_date, pretty_table};
use anyhow::{Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub fn handle(conn: &Connection, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let title = sub.get_one::<String>("title").unwrap().trim();
            let goal = related_goal(conn, user, sub.get_one::<i64>("goal").copied())?;
            let due = sub
                .get_one::<String>("due")
                .map(|s| parse_date(s))
                .transpose()?;
            conn.execute(
                "INSERT INTO notes(user_id, title, content, type, priority, related_goal_id,
                 due_date) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user,
                    title,
                    sub.get_one::<String>("content"),
                    sub.get_one::<String>("type").unwrap(),
                    sub.get_one::<String>("priority").unwrap(),
                    goal,
                    due.map(|d| d.to_string())
                ],
            )?;
            println!("Added note '{}'", title);
        }
        Some(("list", sub)) => {
            let rows = list(conn, user)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .into_iter()
                    .map(|n| {
                        vec![
                            n.id.to_string(),
                            if n.is_completed { "x".into() } else { String::new() },
                            n.title,
                            n.r#type,
                            n.priority,
                            n.due_date.unwrap_or_default(),
                            n.goal_title.unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Done", "Title", "Type", "Priority", "Due", "Goal"], data)
                );
            }
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let title = sub.get_one::<String>("title").unwrap().trim();
            let goal = related_goal(conn, user, sub.get_one::<i64>("goal").copied())?;
            let due = sub
                .get_one::<String>("due")
                .map(|s| parse_date(s))
                .transpose()?;
            let n = conn.execute(
                "UPDATE notes SET title=?1, content=?2, type=?3, priority=?4, related_goal_id=?5,
                 due_date=?6, is_completed=?7 WHERE id=?8 AND user_id=?9",
                params![
                    title,
                    sub.get_one::<String>("content"),
                    sub.get_one::<String>("type").unwrap(),
                    sub.get_one::<String>("priority").unwrap(),
                    goal,
                    due.map(|d| d.to_string()),
                    sub.get_flag("completed"),
                    id,
                    user
                ],
            )?;
            ensure_owned(n, "Note", id, user)?;
            println!("Updated note {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "DELETE FROM notes WHERE id=?1 AND user_id=?2",
                params![id, user],
            )?;
            ensure_owned(n, "Note", id, user)?;
            println!("Removed note {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// A note may only point at one of the caller's own goals.
fn related_goal(conn: &Connection, user: &str, goal: Option<i64>) -> Result<Option<i64>> {
    let Some(id) = goal else {
        return Ok(None);
    };
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM goals WHERE id=?1 AND user_id=?2",
            params![id, user],
            |r| r.get(0),
        )
        .optional()?;
    if found.is_none() {
        bail!("Goal {} not found for user '{}'", id, user);
    }
    Ok(found)
}

#[derive(Debug, Serialize)]
pub struct NoteRow {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub r#type: String,
    pub priority: String,
    pub related_goal_id: Option<i64>,
    pub goal_title: Option<String>,
    pub due_date: Option<String>,
    pub is_completed: bool,
    pub created_at: String,
}

/// Open notes first, then by due date (undated last), newest first on ties.
pub fn list(conn: &Connection, user: &str) -> Result<Vec<NoteRow>> {
    let mut stmt = conn.prepare(
        "SELECT n.id, n.title, n.content, n.type, n.priority, n.related_goal_id, g.title,
                n.due_date, n.is_completed, n.created_at
         FROM notes n
         LEFT JOIN goals g ON n.related_goal_id=g.id AND g.user_id=n.user_id
         WHERE n.user_id=?1
         ORDER BY n.is_completed ASC, n.due_date IS NULL, n.due_date ASC,
                  n.created_at DESC, n.id DESC",
    )?;
    let rows = stmt.query_map(params![user], |r| {
        Ok(NoteRow {
            id: r.get(0)?,
            title: r.get(1)?,
            content: r.get(2)?,
            r#type: r.get(3)?,
            priority: r.get(4)?,
            related_goal_id: r.get(5)?,
            goal_title: r.get(6)?,
            due_date: r.get(7)?,
            is_completed: r.get(8)?,
            created_at: r.get(9)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<_>>()?)
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneydash::{cli, commands::notes, db};
use rusqlite::Connection;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute_batch(
        "INSERT INTO goals(id,user_id,title,target_amount) VALUES (1,'alice','Vacation','5000');
         INSERT INTO goals(id,user_id,title,target_amount) VALUES (2,'bob','Car','20000');",
    )
    .unwrap();
    conn
}

fn run(conn: &Connection, user: &str, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["moneydash", "note"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, note_m) = matches.subcommand().unwrap();
    notes::handle(conn, user, note_m)
}

#[test]
fn add_defaults_type_and_priority_and_joins_goal() {
    let conn = setup();
    run(
        &conn,
        "alice",
        &["add", "--title", "Book flights", "--goal", "1", "--due", "2025-09-01"],
    )
    .unwrap();
    let rows = notes::list(&conn, "alice").unwrap();
    assert_eq!(rows.len(), 1);
    let n = &rows[0];
    assert_eq!(n.r#type, "note");
    assert_eq!(n.priority, "medium");
    assert_eq!(n.related_goal_id, Some(1));
    assert_eq!(n.goal_title.as_deref(), Some("Vacation"));
    assert_eq!(n.due_date.as_deref(), Some("2025-09-01"));
    assert!(!n.is_completed);
    assert!(notes::list(&conn, "bob").unwrap().is_empty());
}

#[test]
fn cannot_link_another_users_goal() {
    let conn = setup();
    let res = run(&conn, "alice", &["add", "--title", "Peek", "--goal", "2"]);
    assert!(res.is_err());
    assert!(notes::list(&conn, "alice").unwrap().is_empty());
}

#[test]
fn list_orders_open_first_then_due_date_then_newest() {
    let conn = setup();
    conn.execute_batch(
        "INSERT INTO notes(id,user_id,title,due_date,is_completed,created_at)
             VALUES (1,'alice','done early',NULL,1,'2025-01-05 00:00:00');
         INSERT INTO notes(id,user_id,title,due_date,is_completed,created_at)
             VALUES (2,'alice','undated old',NULL,0,'2025-01-01 00:00:00');
         INSERT INTO notes(id,user_id,title,due_date,is_completed,created_at)
             VALUES (3,'alice','undated new',NULL,0,'2025-01-03 00:00:00');
         INSERT INTO notes(id,user_id,title,due_date,is_completed,created_at)
             VALUES (4,'alice','due late','2025-03-01',0,'2025-01-01 00:00:00');
         INSERT INTO notes(id,user_id,title,due_date,is_completed,created_at)
             VALUES (5,'alice','due soon','2025-02-01',0,'2025-01-01 00:00:00');",
    )
    .unwrap();
    let ids: Vec<i64> = notes::list(&conn, "alice")
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(ids, [5, 4, 3, 2, 1]);
}

#[test]
fn edit_replaces_fields_and_marks_completed() {
    let conn = setup();
    run(&conn, "alice", &["add", "--title", "Draft", "--goal", "1"]).unwrap();
    let id = notes::list(&conn, "alice").unwrap()[0].id.to_string();
    run(
        &conn,
        "alice",
        &[
            "edit", "--id", &id, "--title", "Plan", "--type", "plan", "--priority", "high",
            "--content", "save 500 a month", "--completed",
        ],
    )
    .unwrap();
    let n = &notes::list(&conn, "alice").unwrap()[0];
    assert_eq!(n.title, "Plan");
    assert_eq!(n.r#type, "plan");
    assert_eq!(n.priority, "high");
    assert_eq!(n.content.as_deref(), Some("save 500 a month"));
    assert_eq!(n.related_goal_id, None);
    assert!(n.is_completed);
}

#[test]
fn edit_and_rm_reject_foreign_notes() {
    let conn = setup();
    run(&conn, "alice", &["add", "--title", "Mine"]).unwrap();
    let id = notes::list(&conn, "alice").unwrap()[0].id.to_string();

    let err = run(&conn, "bob", &["edit", "--id", &id, "--title", "Stolen"]).unwrap_err();
    assert!(err.to_string().contains("not found for user 'bob'"));
    let err = run(&conn, "bob", &["rm", "--id", &id]).unwrap_err();
    assert!(err.to_string().contains("not found for user 'bob'"));
    assert_eq!(notes::list(&conn, "alice").unwrap()[0].title, "Mine");

    run(&conn, "alice", &["rm", "--id", &id]).unwrap();
    assert!(notes::list(&conn, "alice").unwrap().is_empty());
}

#[test]
fn deleting_a_goal_unlinks_its_notes() {
    let conn = setup();
    run(&conn, "alice", &["add", "--title", "Book flights", "--goal", "1"]).unwrap();
    conn.execute("DELETE FROM goals WHERE id=1", []).unwrap();
    let n = &notes::list(&conn, "alice").unwrap()[0];
    assert_eq!(n.related_goal_id, None);
    assert_eq!(n.goal_title, None);
}

#[test]
fn unknown_priority_is_rejected_by_the_parser() {
    let res = cli::build_cli().try_get_matches_from([
        "moneydash", "note", "add", "--title", "x", "--priority", "urgent",
    ]);
    assert!(res.is_err());
}

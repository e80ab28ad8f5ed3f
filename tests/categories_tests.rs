// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneydash::{cli, commands::categories, db};
use rusqlite::Connection;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn run(conn: &Connection, user: &str, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["moneydash", "category"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, category_m) = matches.subcommand().unwrap();
    categories::handle(conn, user, category_m)
}

fn id_of(conn: &Connection, user: &str, name: &str) -> String {
    categories::list(conn, user)
        .unwrap()
        .into_iter()
        .find(|c| c.name == name)
        .unwrap()
        .id
        .to_string()
}

#[test]
fn list_is_per_user_and_sorted_by_type_then_name() {
    let conn = setup();
    run(&conn, "alice", &["add", "--name", "Rent", "--type", "expense"]).unwrap();
    run(&conn, "alice", &["add", "--name", "Salary", "--type", "income"]).unwrap();
    run(&conn, "alice", &["add", "--name", "Food", "--type", "expense"]).unwrap();
    run(&conn, "bob", &["add", "--name", "Hobby", "--type", "expense"]).unwrap();

    let names: Vec<String> = categories::list(&conn, "alice")
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["Food", "Rent", "Salary"]);
    assert_eq!(categories::list(&conn, "bob").unwrap().len(), 1);
}

#[test]
fn names_are_unique_per_user_only() {
    let conn = setup();
    run(&conn, "alice", &["add", "--name", "Food", "--type", "expense"]).unwrap();
    assert!(run(&conn, "alice", &["add", "--name", "Food", "--type", "expense"]).is_err());
    run(&conn, "bob", &["add", "--name", "Food", "--type", "expense"]).unwrap();
}

#[test]
fn edit_replaces_name_and_type() {
    let conn = setup();
    run(&conn, "alice", &["add", "--name", "Gifts", "--type", "expense"]).unwrap();
    let id = id_of(&conn, "alice", "Gifts");
    run(
        &conn,
        "alice",
        &["edit", "--id", &id, "--name", "Presents", "--type", "income"],
    )
    .unwrap();
    let rows = categories::list(&conn, "alice").unwrap();
    assert_eq!(rows[0].name, "Presents");
    assert_eq!(rows[0].r#type, "income");
}

#[test]
fn edit_and_rm_reject_foreign_categories() {
    let conn = setup();
    run(&conn, "alice", &["add", "--name", "Food", "--type", "expense"]).unwrap();
    let id = id_of(&conn, "alice", "Food");

    let err = run(
        &conn,
        "bob",
        &["edit", "--id", &id, "--name", "Mine now", "--type", "expense"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("not found for user 'bob'"));
    let err = run(&conn, "bob", &["rm", "--id", &id]).unwrap_err();
    assert!(err.to_string().contains("not found for user 'bob'"));
    assert_eq!(categories::list(&conn, "alice").unwrap()[0].name, "Food");
}

#[test]
fn rm_uncategorizes_transactions_and_drops_budgets() {
    let conn = setup();
    run(&conn, "alice", &["add", "--name", "Food", "--type", "expense"]).unwrap();
    let id = id_of(&conn, "alice", "Food");
    conn.execute_batch(&format!(
        "INSERT INTO transactions(user_id,title,amount,type,category_id,occurred_at)
             VALUES ('alice','Lunch','12','expense',{id},'2025-01-02 12:00:00');
         INSERT INTO budgets(user_id,category_id,limit_amount,start_date)
             VALUES ('alice',{id},'300','2025-01-01');"
    ))
    .unwrap();

    run(&conn, "alice", &["rm", "--id", &id]).unwrap();
    assert!(categories::list(&conn, "alice").unwrap().is_empty());
    let cat: Option<i64> = conn
        .query_row("SELECT category_id FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(cat, None);
    let budgets: i64 = conn
        .query_row("SELECT COUNT(*) FROM budgets", [], |r| r.get(0))
        .unwrap();
    assert_eq!(budgets, 0);
}

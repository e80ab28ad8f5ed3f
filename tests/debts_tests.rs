// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use moneydash::{cli, commands::debts, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute_batch(
        "INSERT INTO debts(id,user_id,person_name,amount,direction,due_date)
             VALUES (1,'alice','Bob','50','i_owe','2025-02-01');",
    )
    .unwrap();
    conn
}

fn run(conn: &Connection, user: &str, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["moneydash", "debt"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, debt_m) = matches.subcommand().unwrap();
    debts::handle(conn, user, debt_m)
}

#[test]
fn add_and_list_unpaid_only() {
    let conn = setup();
    run(
        &conn,
        "alice",
        &["add", "--person", "Carol", "--amount", "20", "--direction", "owes_me"],
    )
    .unwrap();
    run(&conn, "alice", &["pay", "--id", "1"]).unwrap();

    let all = debts::list(&conn, "alice", false).unwrap();
    assert_eq!(all.len(), 2);
    let unpaid = debts::list(&conn, "alice", true).unwrap();
    assert_eq!(unpaid.len(), 1);
    assert_eq!(unpaid[0].person_name, "Carol");
    assert_eq!(unpaid[0].direction, "owes_me");
    assert_eq!(unpaid[0].amount, Decimal::new(20, 0));
}

#[test]
fn edit_replaces_every_field() {
    let conn = setup();
    run(
        &conn,
        "alice",
        &[
            "edit", "--id", "1", "--person", "Robert", "--amount", "75.5", "--direction",
            "owes_me", "--paid",
        ],
    )
    .unwrap();
    let d = &debts::list(&conn, "alice", false).unwrap()[0];
    assert_eq!(d.person_name, "Robert");
    assert_eq!(d.amount, Decimal::new(755, 1));
    assert_eq!(d.direction, "owes_me");
    assert_eq!(d.due_date, None);
    assert!(d.is_paid);
}

#[test]
fn non_positive_amount_is_rejected() {
    let conn = setup();
    let res = run(
        &conn,
        "alice",
        &["add", "--person", "Dan", "--amount", "0", "--direction", "i_owe"],
    );
    assert!(res.is_err());
    assert_eq!(debts::list(&conn, "alice", false).unwrap().len(), 1);
}

#[test]
fn foreign_user_cannot_edit_pay_or_remove() {
    let conn = setup();
    let err = run(
        &conn,
        "mallory",
        &["edit", "--id", "1", "--person", "Me", "--amount", "1", "--direction", "owes_me"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("Debt 1 not found for user 'mallory'"));

    let err = run(&conn, "mallory", &["pay", "--id", "1"]).unwrap_err();
    assert!(err.to_string().contains("Debt 1 not found for user 'mallory'"));

    let err = run(&conn, "mallory", &["rm", "--id", "1"]).unwrap_err();
    assert!(err.to_string().contains("Debt 1 not found for user 'mallory'"));

    let d = &debts::list(&conn, "alice", false).unwrap()[0];
    assert_eq!(d.person_name, "Bob");
    assert_eq!(d.amount, Decimal::new(50, 0));
    assert!(!d.is_paid);
}

#[test]
fn owner_can_remove() {
    let conn = setup();
    run(&conn, "alice", &["rm", "--id", "1"]).unwrap();
    assert!(debts::list(&conn, "alice", false).unwrap().is_empty());
    assert!(run(&conn, "alice", &["rm", "--id", "1"]).is_err());
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics::{Period, SqliteStore, build_dashboard, build_period_stats, build_planning};
use crate::config::Settings;
use crate::utils::{fmt_money, maybe_print_json, now_local, parse_timestamp, pretty_table};
use anyhow::Result;
use chrono::NaiveDateTime;

pub fn handle(settings: &Settings, m: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(settings.db_path.clone());
    let user = settings.user.as_str();
    match m.subcommand() {
        Some(("dashboard", sub)) => dashboard(&store, user, sub)?,
        Some(("period", sub)) => {
            let period: Period = sub.get_one::<String>("period").unwrap().parse()?;
            let stats = build_period_stats(&store, user, &period, as_of(sub)?)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &stats)? {
                let rows = vec![
                    vec!["Period".into(), stats.period.clone()],
                    vec!["From".into(), stats.start_date.to_string()],
                    vec!["Until".into(), stats.end_date.to_string()],
                    vec!["Income".into(), fmt_money(&stats.total_income)],
                    vec!["Expense".into(), fmt_money(&stats.total_expense)],
                    vec!["Net".into(), fmt_money(&stats.net_balance)],
                    vec!["Transactions".into(), stats.transaction_count.to_string()],
                ];
                println!("{}", pretty_table(&["Metric", "Value"], rows));
            }
        }
        Some(("forecast", sub)) => {
            let days = *sub.get_one::<u32>("days").unwrap();
            let report = build_planning(&store, user, as_of(sub)?, days)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
                let f = &report.forecast;
                let rows = vec![
                    vec!["Avg daily income".into(), fmt_money(&f.avg_daily_income)],
                    vec!["Avg daily expense".into(), fmt_money(&f.avg_daily_expense)],
                    vec!["Next 30d income".into(), fmt_money(&f.forecast_income)],
                    vec!["Next 30d expense".into(), fmt_money(&f.forecast_expense)],
                    vec!["Next 30d balance".into(), fmt_money(&f.forecast_balance)],
                    vec!["Savings rate".into(), format!("{}%", fmt_money(&f.savings_rate))],
                ];
                let window = format!("last {} days", f.trailing_days);
                println!("{}", pretty_table(&["Forecast", window.as_str()], rows));
                for r in &report.recommendations {
                    println!("[{:?}] {}: {}", r.kind, r.title, r.message);
                    for eta in &r.months_to_goal {
                        let amount = fmt_money(&eta.amount);
                        println!("  {} ({}): {} months", eta.label, amount, eta.months);
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn as_of(sub: &clap::ArgMatches) -> Result<NaiveDateTime> {
    match sub.get_one::<String>("now") {
        Some(s) => parse_timestamp(s),
        None => Ok(now_local()),
    }
}

fn dashboard(store: &SqliteStore, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let d = build_dashboard(store, user, as_of(sub)?)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &d)? {
        return Ok(());
    }
    let s = &d.summary;
    println!(
        "{}",
        pretty_table(
            &["Month", "Income", "Expense", "Net", "Balance"],
            vec![vec![
                s.current_month.clone(),
                fmt_money(&s.total_income),
                fmt_money(&s.total_expense),
                fmt_money(&s.net_balance),
                fmt_money(&s.total_balance),
            ]],
        )
    );
    if !d.category_spending.is_empty() {
        let rows = d
            .category_spending
            .iter()
            .map(|c| vec![c.category_name.clone(), fmt_money(&c.spent)])
            .collect();
        println!("{}", pretty_table(&["Top category", "Spent"], rows));
    }
    if !d.budget_status.is_empty() {
        let rows = d
            .budget_status
            .iter()
            .map(|b| {
                vec![
                    b.category_name.clone(),
                    fmt_money(&b.spent_amount),
                    fmt_money(&b.limit_amount),
                    format!("{}%", b.percentage),
                    if b.is_over_budget { "OVER".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Budget", "Spent", "Limit", "Used", ""], rows)
        );
    }
    if !d.recent_transactions.is_empty() {
        let rows = d
            .recent_transactions
            .iter()
            .map(|t| {
                vec![
                    t.occurred_at.to_string(),
                    t.title.clone(),
                    t.r#type.to_string(),
                    fmt_money(&t.amount),
                    t.category_name.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["When", "Title", "Type", "Amount", "Category"], rows)
        );
    }
    if !d.pending_transfers.is_empty() {
        let rows = d
            .pending_transfers
            .iter()
            .map(|p| {
                vec![
                    p.person_name.clone(),
                    p.direction.to_string(),
                    fmt_money(&p.amount),
                    p.due_date.map(|d| d.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Pending with", "Direction", "Amount", "Due"], rows)
        );
    }
    Ok(())
}

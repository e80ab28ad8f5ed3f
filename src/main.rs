// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use moneydash::config::Settings;
use moneydash::{cli, commands, db, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let settings = Settings::from_matches(&matches)?;
    logging::init(settings.verbosity);

    let conn = db::open_or_init(&settings.db_path)?;
    let user = settings.user.as_str();

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", settings.db_path.display());
        }
        Some(("category", sub)) => commands::categories::handle(&conn, user, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&conn, user, sub)?,
        Some(("goal", sub)) => commands::goals::handle(&conn, user, sub)?,
        Some(("note", sub)) => commands::notes::handle(&conn, user, sub)?,
        Some(("debt", sub)) => commands::debts::handle(&conn, user, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, user, sub)?,
        Some(("template", sub)) => commands::templates::handle(&conn, user, sub)?,
        Some(("currency", sub)) => commands::currencies::handle(&conn, &settings.fx_url, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, user, sub)?,
        Some(("stats", sub)) => commands::stats::handle(&settings, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

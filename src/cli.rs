// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON value per line"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn req(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn type_arg() -> Arg {
    Arg::new("type")
        .long("type")
        .required(true)
        .value_parser(["income", "expense"])
}

fn note_type_arg() -> Arg {
    Arg::new("type")
        .long("type")
        .default_value("note")
        .value_parser(["note", "reminder", "plan"])
}

fn priority_arg() -> Arg {
    Arg::new("priority")
        .long("priority")
        .default_value("medium")
        .value_parser(["low", "medium", "high"])
}

fn now_arg() -> Arg {
    Arg::new("now")
        .long("now")
        .help("Evaluate as of this timestamp instead of the local clock")
}

pub fn build_cli() -> Command {
    Command::new("moneydash")
        .version(clap::crate_version!())
        .about("Personal finance tracker: transactions, budgets, goals and dashboard analytics")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("SQLite database path (default: $MONEYDASH_DB or the platform data dir)"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .help("Authenticated user id (default: $MONEYDASH_USER or 'local')"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Raise log verbosity (-v info, -vv debug)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(Command::new("add").arg(req("name")).arg(type_arg()))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(req("name"))
                        .arg(type_arg()),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(req("title"))
                        .arg(req("amount").allow_hyphen_values(true))
                        .arg(type_arg())
                        .arg(opt("category"))
                        .arg(opt("at").help("When it happened (default: now)")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(opt("period").help("day|week|month|year|START..END"))
                        .arg(opt("category"))
                        .arg(opt("limit").value_parser(value_parser!(usize)))
                        .arg(now_arg()),
                ))
                .subcommand(
                    Command::new("edit")
                        .about("Replace title, amount and category")
                        .arg(id_arg())
                        .arg(req("title"))
                        .arg(req("amount").allow_hyphen_values(true))
                        .arg(opt("category")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("goal")
                .about("Savings goals")
                .subcommand(
                    Command::new("add")
                        .arg(req("title"))
                        .arg(req("target"))
                        .arg(opt("current"))
                        .arg(opt("deadline")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(req("title"))
                        .arg(req("target"))
                        .arg(req("current"))
                        .arg(opt("deadline")),
                )
                .subcommand(Command::new("contribute").arg(id_arg()).arg(req("amount")))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("note")
                .about("Notes, reminders and plans")
                .subcommand(
                    Command::new("add")
                        .arg(req("title"))
                        .arg(opt("content"))
                        .arg(note_type_arg())
                        .arg(priority_arg())
                        .arg(opt("goal").value_parser(value_parser!(i64)))
                        .arg(opt("due")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(req("title"))
                        .arg(opt("content"))
                        .arg(note_type_arg())
                        .arg(priority_arg())
                        .arg(opt("goal").value_parser(value_parser!(i64)))
                        .arg(opt("due"))
                        .arg(
                            Arg::new("completed")
                                .long("completed")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("debt")
                .about("Money owed to or by other people")
                .subcommand(
                    Command::new("add")
                        .arg(req("person"))
                        .arg(req("amount"))
                        .arg(
                            Arg::new("direction")
                                .long("direction")
                                .required(true)
                                .value_parser(["i_owe", "owes_me"]),
                        )
                        .arg(opt("due"))
                        .arg(opt("description")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(
                        Arg::new("unpaid")
                            .long("unpaid")
                            .action(ArgAction::SetTrue),
                    ),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(req("person"))
                        .arg(req("amount"))
                        .arg(
                            Arg::new("direction")
                                .long("direction")
                                .required(true)
                                .value_parser(["i_owe", "owes_me"]),
                        )
                        .arg(opt("due"))
                        .arg(opt("description"))
                        .arg(Arg::new("paid").long("paid").action(ArgAction::SetTrue)),
                )
                .subcommand(Command::new("pay").arg(id_arg()))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("budget")
                .about("Spending limits per category")
                .subcommand(
                    Command::new("add")
                        .arg(req("category"))
                        .arg(req("limit"))
                        .arg(req("start"))
                        .arg(opt("end")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(req("category"))
                        .arg(req("limit"))
                        .arg(req("start"))
                        .arg(opt("end"))
                        .arg(
                            Arg::new("inactive")
                                .long("inactive")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("template")
                .about("Reusable transaction templates")
                .subcommand(
                    Command::new("add")
                        .arg(req("name"))
                        .arg(req("amount"))
                        .arg(type_arg())
                        .arg(opt("category")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("use")
                        .arg(id_arg())
                        .arg(opt("at").help("When it happened (default: now)")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("currency")
                .about("Currency table and exchange-rate refresh")
                .subcommand(
                    Command::new("add")
                        .arg(req("code"))
                        .arg(req("name"))
                        .arg(req("symbol"))
                        .arg(opt("rate")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("set-base").arg(req("code")))
                .subcommand(
                    Command::new("convert")
                        .arg(req("amount"))
                        .arg(req("from"))
                        .arg(req("to")),
                )
                .subcommand(Command::new("refresh").about("Fetch the latest rates once"))
                .subcommand(
                    Command::new("watch")
                        .about("Refresh rates on a fixed interval")
                        .arg(
                            Arg::new("interval")
                                .long("interval")
                                .value_parser(value_parser!(u64))
                                .default_value("3600")
                                .help("Seconds between refreshes"),
                        )
                        .arg(
                            Arg::new("iterations")
                                .long("iterations")
                                .value_parser(value_parser!(u64))
                                .help("Stop after this many refresh attempts"),
                        ),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("transactions")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .required(true)
                                .value_parser(["csv", "json"]),
                        )
                        .arg(req("out")),
                ),
        )
        .subcommand(
            Command::new("stats")
                .about("Dashboard analytics")
                .subcommand(json_flags(Command::new("dashboard").arg(now_arg())))
                .subcommand(json_flags(
                    Command::new("period")
                        .arg(
                            Arg::new("period")
                                .required(true)
                                .help("day|week|month|year|START..END"),
                        )
                        .arg(now_arg()),
                ))
                .subcommand(json_flags(
                    Command::new("forecast")
                        .arg(
                            Arg::new("days")
                                .long("days")
                                .value_parser(value_parser!(u32))
                                .default_value("30"),
                        )
                        .arg(now_arg()),
                )),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn global_user_applies_to_subcommands() {
        let m = build_cli().get_matches_from(["moneydash", "tx", "list", "--user", "alice"]);
        let (_, tx) = m.subcommand().unwrap();
        let (_, list) = tx.subcommand().unwrap();
        assert_eq!(list.get_one::<String>("user").map(String::as_str), Some("alice"));
    }
}

use std::path::PathBuf;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};

use ramtree::commands;

const SORT_KEYS: [&str; 5] = ["rss", "virt", "dirty", "swap", "age"];

fn build_cli() -> Command {
    Command::new("ramtree")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live process tree with memory metrics")
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("MS")
                .help("Refresh interval in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("sort")
                .short('s')
                .long("sort")
                .value_name("KEY")
                .help("Initial sort metric")
                .value_parser(SORT_KEYS)
                .global(true),
        )
        .arg(
            Arg::new("filter")
                .short('f')
                .long("filter")
                .value_name("TEXT")
                .help("Only show processes whose name or command contains TEXT")
                .global(true),
        )
        .arg(
            Arg::new("no-enrich")
                .long("no-enrich")
                .help("Do not fetch dirty and swap figures in the background")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Append log output to PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Write the current process tree to a JSON file and exit")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("DIR")
                        .help("Directory to write into (defaults to the configured export dir)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("expand-all")
                        .short('a')
                        .long("expand-all")
                        .help("Include every process instead of only top-level ones")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    // Global args are visible on the subcommand's matches
    let scope: &ArgMatches = matches.subcommand().map(|(_, sub)| sub).unwrap_or(&matches);
    ramtree::init_logging(scope.get_one::<PathBuf>("log-file").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("snapshot", sub_matches)) => commands::snapshot(sub_matches),
        _ => commands::monitor(&matches),
    }
}

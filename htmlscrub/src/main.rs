// htmlscrub/src/main.rs
//! htmlscrub entry point.
//!
//! Loads `.env`, parses arguments, sets up logging and dispatches to a subcommand.
//! Any error is printed as one line on stderr and the process exits with status 1.

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use htmlscrub::cli::{Cli, Commands};
use htmlscrub::commands;
use htmlscrub::logger;
use htmlscrub::ui::output_format::error_msg;

fn main() {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let level = if args.quiet {
        Some(LevelFilter::Off)
    } else if args.debug {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    logger::init_logger(level);

    if let Err(err) = run(&args) {
        error_msg(format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(args: &Cli) -> Result<()> {
    match &args.command {
        Commands::Sanitize(cmd) => commands::sanitize::run(cmd, args.quiet),
        Commands::Profiles(config) => commands::profiles::run(config, args.quiet),
        Commands::ShowConfig(cmd) => commands::show_config::run(cmd),
    }
}

// htmlscrub/src/cli.rs
//! This file defines the command-line interface (CLI) for the htmlscrub application,
//! including all available commands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use htmlscrub_core::CONFIG_ENV_VAR;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "htmlscrub",
    author = "Obscura Team (Relay)",
    version = env!("CARGO_PKG_VERSION"),
    about = "Purify every string in a JSON request body",
    long_about = "htmlscrub reads a JSON request body, passes every string value through an HTML purifier configured from layered profiles, and writes the cleaned body back out. Numbers, booleans and nulls are left alone; strings that purify to nothing become null.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `htmlscrub` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitizes a JSON body read from a file or stdin.
    #[command(about = "Sanitizes a JSON body read from a file or stdin.")]
    Sanitize(SanitizeCommand),

    /// Lists the profiles defined in the configuration.
    #[command(about = "Lists the profiles defined in the configuration.")]
    Profiles(ConfigArgs),

    /// Prints the assembled configuration for a profile as JSON.
    #[command(name = "show-config", about = "Prints the assembled configuration for a profile as JSON.")]
    ShowConfig(ShowConfigCommand),
}

/// Where to load purifier settings from.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a purifier configuration file (YAML).
    #[arg(
        long = "config",
        value_name = "FILE",
        env = CONFIG_ENV_VAR,
        help = "Path to a purifier configuration file (YAML)."
    )]
    pub config: Option<PathBuf>,
}

/// Arguments for the `sanitize` command.
#[derive(Args, Debug)]
pub struct SanitizeCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write sanitized output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Profile of directives to apply.
    #[arg(long = "profile", short = 'p', value_name = "NAME", help = "Profile of directives to apply (default: 'default').")]
    pub profile: Option<String>,

    /// HTTP method the body arrived with.
    #[arg(long = "method", short = 'm', value_name = "METHOD", default_value = "POST", help = "HTTP method the body arrived with. Only POST, PUT and PATCH bodies are sanitized.")]
    pub method: String,

    /// Pretty-print the output JSON.
    #[arg(long, help = "Pretty-print the output JSON.")]
    pub pretty: bool,
}

/// Arguments for the `show-config` command.
#[derive(Args, Debug)]
pub struct ShowConfigCommand {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Profile to assemble.
    #[arg(long = "profile", short = 'p', value_name = "NAME", help = "Profile to assemble (default: 'default').")]
    pub profile: Option<String>,
}

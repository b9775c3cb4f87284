// htmlscrub/src/commands/sanitize.rs
//! `htmlscrub sanitize`: JSON body in, sanitized JSON body out.

use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use htmlscrub_core::{headless_sanitize_json, should_sanitize, PurifierSettings};

use crate::cli::SanitizeCommand;
use crate::commands::load_settings;
use crate::ui::output_format::{success_msg, warn_msg};

/// Options for [`run_sanitize_opts`], detached from the clap types.
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    pub input: String,
    pub output_path: Option<PathBuf>,
    pub profile: Option<String>,
    pub method: String,
    pub pretty: bool,
    pub quiet: bool,
}

/// Entry point for the `sanitize` subcommand.
pub fn run(cmd: &SanitizeCommand, quiet: bool) -> Result<()> {
    let settings = load_settings(&cmd.config)?;
    let input = read_input(cmd.input_file.as_ref())?;
    let opts = SanitizeOptions {
        input,
        output_path: cmd.output.clone(),
        profile: cmd.profile.clone(),
        method: cmd.method.clone(),
        pretty: cmd.pretty,
        quiet,
    };
    run_sanitize_opts(&settings, &opts)
}

/// Sanitizes `opts.input` and writes the result.
pub fn run_sanitize_opts(settings: &PurifierSettings, opts: &SanitizeOptions) -> Result<()> {
    info!("Starting htmlscrub sanitize (method: {}).", opts.method);

    let sanitized = should_sanitize(&opts.method);
    if !sanitized && !opts.quiet {
        warn_msg(format!(
            "Method '{}' is not sanitized; the body is passed through unchanged.",
            opts.method
        ));
    }
    // Passed-through bodies are echoed byte for byte.
    let terminator = if sanitized { "\n" } else { "" };

    let output = headless_sanitize_json(settings, opts.profile.as_deref(), &opts.method, &opts.input, opts.pretty)
        .context("Sanitization failed")?;
    debug!("Body sanitized. Input: {} bytes, output: {} bytes.", opts.input.len(), output.len());

    match &opts.output_path {
        Some(path) => {
            fs::write(path, format!("{}{}", output, terminator))
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            if !opts.quiet {
                success_msg(format!("Sanitized body written to {}", path.display()));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write!(handle, "{}{}", output, terminator).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            debug!("Reading input from {}", path.display());
            fs::read_to_string(path).with_context(|| format!("Failed to read input file {}", path.display()))
        }
        None => {
            debug!("Reading input from stdin");
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

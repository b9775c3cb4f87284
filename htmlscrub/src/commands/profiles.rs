// htmlscrub/src/commands/profiles.rs
//! `htmlscrub profiles`: lists the configured profile names.

use anyhow::{Context, Result};
use std::io::{self, Write};

use htmlscrub_core::{PurifierSettings, DEFAULT_PROFILE};

use crate::cli::ConfigArgs;
use crate::commands::load_settings;
use crate::ui::output_format::info_msg;

pub fn run(args: &ConfigArgs, quiet: bool) -> Result<()> {
    let settings = load_settings(args)?;
    let stdout = io::stdout();
    write_profiles(&settings, &mut stdout.lock(), quiet)
}

/// Writes one profile per line; the fallback profile is marked.
pub fn write_profiles<W: Write>(settings: &PurifierSettings, out: &mut W, quiet: bool) -> Result<()> {
    let names = settings.profile_names();
    if names.is_empty() && !quiet {
        info_msg("No profiles defined; only the built-in defaults apply.");
    }
    for name in names {
        let written = if name == DEFAULT_PROFILE {
            writeln!(out, "{} (default)", name)
        } else {
            writeln!(out, "{}", name)
        };
        written.context("Failed to write profile list")?;
    }
    Ok(())
}

// htmlscrub/src/commands/mod.rs
//! Implementations of the `htmlscrub` subcommands.

pub mod profiles;
pub mod sanitize;
pub mod show_config;

use anyhow::Result;
use log::debug;

use htmlscrub_core::PurifierSettings;

use crate::cli::ConfigArgs;

/// Loads settings from `--config`/`HTMLSCRUB_CONFIG`, the search path, or the
/// embedded defaults, in that order.
pub fn load_settings(args: &ConfigArgs) -> Result<PurifierSettings> {
    debug!("Resolving purifier settings (explicit path: {:?}).", args.config);
    PurifierSettings::discover(args.config.as_deref())
}

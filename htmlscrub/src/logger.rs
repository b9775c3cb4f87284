// htmlscrub/src/logger.rs
//! Logger setup for the htmlscrub binary.
//!
//! `RUST_LOG` is honored unless a level is forced from the command line. Log
//! lines go to stderr so they never mix with the JSON written to stdout.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Default filter when neither `RUST_LOG` nor a CLI flag picks one.
const DEFAULT_FILTER: &str = "warn";

/// Initializes the global logger. `level` overrides `RUST_LOG` for both crates;
/// `LevelFilter::Off` silences everything.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    builder.target(Target::Stderr).format_timestamp(None);

    match level {
        Some(LevelFilter::Off) => {
            builder.filter_level(LevelFilter::Off);
        }
        Some(level) => {
            builder
                .filter_level(LevelFilter::Warn)
                .filter_module("htmlscrub", level)
                .filter_module("htmlscrub_core", level);
        }
        None => {}
    }

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized; keeping the existing one.");
    }
}

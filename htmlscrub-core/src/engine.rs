// htmlscrub-core/src/engine.rs
//! Defines the `Purifier` trait, the seam between the traversal logic and the
//! HTML cleaning engine.
//!
//! The traversal never looks inside a string; it hands every string leaf to a
//! `Purifier` together with the assembled configuration and takes back whatever
//! the engine returns. Any engine that is deterministic for a given configuration
//! and safe to call from several threads at once can be plugged in.
//!
//! License: MIT OR APACHE 2.0

use crate::assembler::SanitizerConfig;
use crate::errors::ScrubResult;

/// The cleaning capability consumed by the `ValueSanitizer`.
pub trait Purifier: Send + Sync {
    /// Cleans one string under `config`.
    ///
    /// Errors are engine faults (unsupported encoding, internal failure). They
    /// abort the whole sanitize call; no string is ever half cleaned.
    fn purify(&self, input: &str, config: &SanitizerConfig) -> ScrubResult<String>;

    /// Short engine name for log lines.
    fn name(&self) -> &str;
}

impl<P: Purifier + ?Sized> Purifier for &P {
    fn purify(&self, input: &str, config: &SanitizerConfig) -> ScrubResult<String> {
        (**self).purify(input, config)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: Purifier + ?Sized> Purifier for std::sync::Arc<P> {
    fn purify(&self, input: &str, config: &SanitizerConfig) -> ScrubResult<String> {
        (**self).purify(input, config)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

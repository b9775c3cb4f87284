//! errors.rs - Custom error types for the htmlscrub-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! Configuration assembly never produces these errors for bad override entries
//! (those entries are dropped); the variants below are the faults that must reach
//! the request pipeline.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `htmlscrub-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScrubError {
    #[error("Unsupported output encoding '{0}'")]
    UnsupportedEncoding(String),

    #[error("Payload nesting exceeds the maximum depth of {0}")]
    DepthExceeded(usize),

    #[error("Sanitizer configuration is finalized and can no longer be modified")]
    ConfigFinalized,

    #[error("Purification engine failure: {0}")]
    Engine(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),
}

/// Convenience alias used throughout the sanitize path.
pub type ScrubResult<T> = Result<T, ScrubError>;

// htmlscrub-core/src/lib.rs
//! # htmlscrub Core Library
//!
//! `htmlscrub-core` sanitizes inbound request payloads: it walks arbitrarily
//! nested maps, sequences and objects and passes every string leaf through an
//! HTML purifier before the request reaches application code.
//!
//! Two pieces do the work. The [`ConfigAssembler`] builds an immutable
//! [`SanitizerConfig`] from layered sources (defaults, a named profile, custom
//! definition, elements and attributes). The [`ValueSanitizer`] then produces a
//! cleaned copy of a payload under that configuration.
//!
//! ## Modules
//!
//! * `config`: The YAML configuration source and its discovery on disk.
//! * `profiles`: Directive defaults, profile selection and merging.
//! * `definition`: Custom element/attribute specs and the grammar they build.
//! * `validators`: Attribute validators and the registry that resolves them by name.
//! * `assembler`: `ConfigAssembler` and the `SanitizerConfig` it produces.
//! * `value`: The payload tree model.
//! * `engine`: The `Purifier` trait, the seam to the HTML cleaning engine.
//! * `engines`: Concrete purifiers (ammonia) and their definition compiler.
//! * `sanitizer`: The recursive `ValueSanitizer`.
//! * `middleware`: The POST/PUT/PATCH gate and the `handle` entry point.
//! * `headless`: One-shot helpers for non-pipeline use.
//!
//! ## Usage Example
//!
//! ```rust
//! use htmlscrub_core::{AmmoniaEngine, ConfigAssembler, PurifierSettings, ValidatorRegistry, Value, ValueSanitizer};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     // 1. Load the embedded settings and assemble the default profile.
//!     let settings = PurifierSettings::load_default()?;
//!     let registry = ValidatorRegistry::default();
//!     let config = ConfigAssembler::new(&settings, &registry).assemble_from_settings(None);
//!
//!     // 2. Sanitize a payload.
//!     let engine = AmmoniaEngine::new();
//!     let payload = Value::from(serde_json::json!({
//!         "comment": "<p>Hi</p><script>alert(1)</script>",
//!         "likes": 3
//!     }));
//!     let cleaned = ValueSanitizer::new(&engine, &config).sanitize(&payload)?;
//!
//!     assert_eq!(cleaned.get("comment").and_then(Value::as_str), Some("<p>Hi</p>"));
//!     assert_eq!(cleaned.get("likes"), payload.get("likes"));
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Configuration loading returns `anyhow::Result`. The sanitize path returns
//! [`ScrubError`]; assembly never fails (bad override entries are dropped with
//! a warning).
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod assembler;
pub mod config;
pub mod definition;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod headless;
pub mod middleware;
pub mod profiles;
pub mod sanitizer;
pub mod validators;
pub mod value;

/// Re-exports the configuration source and its constants.
pub use config::{Directives, PurifierSettings, SettingsSection, CONFIG_ENV_VAR, DEFAULT_PROFILE};

/// Re-exports configuration assembly.
pub use assembler::{AssemblyOverrides, ConfigAssembler, SanitizerConfig, SanitizerConfigBuilder};

/// Re-exports grammar types.
pub use definition::{AttributeSpec, DefinitionOverride, ElementSpec, HtmlDefinition};
pub use validators::{AttrValidator, ValidatorRegistry, ValueSpec};

/// Re-exports the engine seam and the ammonia implementation.
pub use engine::Purifier;
pub use engines::ammonia_engine::AmmoniaEngine;

pub use errors::{ScrubError, ScrubResult};
pub use sanitizer::ValueSanitizer;
pub use value::{Blob, Fields, Object, Opaque, Value};

/// Re-exports the request gate.
pub use middleware::{should_sanitize, PurifyMiddleware, Request, SANITIZED_METHODS};

/// Re-exports types and functions for one-shot, non-interactive use.
pub use headless::{headless_sanitize_json, headless_sanitize_value};

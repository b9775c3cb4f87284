// File: htmlscrub-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for one-shot sanitization outside a request pipeline.
//!
//! Both helpers assemble a configuration from `settings` with the default
//! validator registry and run the ammonia engine over the payload.

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use crate::assembler::ConfigAssembler;
use crate::config::{effective_max_depth, PurifierSettings};
use crate::engines::ammonia_engine::AmmoniaEngine;
use crate::errors::ScrubError;
use crate::middleware::should_sanitize;
use crate::sanitizer::ValueSanitizer;
use crate::validators::ValidatorRegistry;
use crate::value::Value;

/// Sanitizes a single value under the named profile (or `default`).
pub fn headless_sanitize_value(settings: &PurifierSettings, profile: Option<&str>, value: &Value) -> Result<Value> {
    let registry = ValidatorRegistry::default();
    let config = ConfigAssembler::new(settings, &registry).assemble_from_settings(profile);
    let engine = AmmoniaEngine::new();
    let cleaned = ValueSanitizer::new(&engine, &config)
        .sanitize(value)
        .context("Failed to sanitize payload")?;
    Ok(cleaned)
}

/// Sanitizes a JSON request body as a request with `method` would be.
///
/// Bodies of methods outside POST/PUT/PATCH are returned byte for byte, without
/// being parsed. Qualifying bodies deeper than `maxDepth` fail with
/// [`ScrubError::DepthExceeded`] before they are parsed.
pub fn headless_sanitize_json(
    settings: &PurifierSettings,
    profile: Option<&str>,
    method: &str,
    body: &str,
    pretty: bool,
) -> Result<String> {
    if !should_sanitize(method) {
        debug!("Method '{}' is not sanitized; echoing body.", method);
        return Ok(body.to_string());
    }

    let parsed = parse_body(body, effective_max_depth(settings.max_depth))?;
    let output = headless_sanitize_value(settings, profile, &Value::from(parsed))?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    };
    rendered.context("Failed to serialize sanitized body")
}

/// Parses `body` once its nesting is known to fit under `max_depth`, so the
/// parser's own recursion limit can be lifted.
fn parse_body(body: &str, max_depth: usize) -> Result<serde_json::Value> {
    if json_nesting_depth(body) > max_depth {
        return Err(ScrubError::DepthExceeded(max_depth).into());
    }
    let mut deserializer = serde_json::Deserializer::from_str(body);
    deserializer.disable_recursion_limit();
    let parsed = serde_json::Value::deserialize(&mut deserializer).context("Request body is not valid JSON")?;
    deserializer.end().context("Request body is not valid JSON")?;
    Ok(parsed)
}

/// Deepest run of open arrays and objects in `body`, ignoring brackets inside
/// string literals. Malformed input is left for the parser to reject.
fn json_nesting_depth(body: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in body.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

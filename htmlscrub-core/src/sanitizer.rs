// htmlscrub-core/src/sanitizer.rs
//! ValueSanitizer: the recursive walk over a request payload.
//!
//! Only string leaves are ever handed to the [`Purifier`]. Every container is
//! rebuilt with the same shape (keys, order, length) and every non-string leaf is
//! copied as it is. A string that cleans down to nothing becomes `Value::Null`,
//! except the literal `"0"`.
//!
//! The walk refuses to descend past `max_depth` nested containers and fails with
//! [`ScrubError::DepthExceeded`] instead of returning a partially cleaned tree.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, trace};

use crate::assembler::SanitizerConfig;
use crate::config::{effective_max_depth, MAX_DEPTH_CEILING};
use crate::engine::Purifier;
use crate::errors::{ScrubError, ScrubResult};
use crate::value::{Fields, Object, Value};

/// Literal kept as-is even though callers treat it as "falsy".
const ZERO_LITERAL: &str = "0";

/// Walks payloads under one borrowed configuration.
#[derive(Clone, Copy)]
pub struct ValueSanitizer<'a> {
    purifier: &'a dyn Purifier,
    config: &'a SanitizerConfig,
    max_depth: usize,
}

impl std::fmt::Debug for ValueSanitizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueSanitizer")
            .field("purifier", &self.purifier.name())
            .field("profile", &self.config.profile())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl<'a> ValueSanitizer<'a> {
    /// The depth limit comes from the configuration (`maxDepth`).
    pub fn new(purifier: &'a dyn Purifier, config: &'a SanitizerConfig) -> Self {
        Self {
            purifier,
            config,
            max_depth: config.max_depth(),
        }
    }

    /// Overrides the depth limit, clamped to [`MAX_DEPTH_CEILING`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = effective_max_depth(max_depth);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns a cleaned copy of `value`. The input is never modified.
    pub fn sanitize(&self, value: &Value) -> ScrubResult<Value> {
        debug!(
            "Sanitizing {} payload with engine '{}' (profile: {:?}).",
            value.kind(),
            self.purifier.name(),
            self.config.profile()
        );
        self.walk(value, 0)
    }

    /// Cleans a request's field map, keeping key order.
    pub fn sanitize_fields(&self, fields: &Fields) -> ScrubResult<Fields> {
        debug!("Sanitizing {} request field(s) with engine '{}'.", fields.len(), self.purifier.name());
        self.walk_fields(fields, 0)
    }

    fn walk(&self, value: &Value, depth: usize) -> ScrubResult<Value> {
        match value {
            Value::Map(fields) => Ok(Value::Map(self.walk_fields(fields, depth)?)),
            Value::Seq(items) => {
                self.enter(depth)?;
                let cleaned = items
                    .iter()
                    .map(|item| self.walk(item, depth + 1))
                    .collect::<ScrubResult<Vec<_>>>()?;
                Ok(Value::Seq(cleaned))
            }
            Value::Bool(_) | Value::Number(_) | Value::Blob(_) => Ok(value.clone()),
            Value::String(text) => self.clean_string(text),
            Value::Object(object) => Ok(Value::Object(Object {
                type_name: object.type_name.clone(),
                fields: self.walk_fields(&object.fields, depth)?,
            })),
            Value::Null | Value::Other(_) => Ok(value.clone()),
        }
    }

    fn walk_fields(&self, fields: &Fields, depth: usize) -> ScrubResult<Fields> {
        self.enter(depth)?;
        fields
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.walk(value, depth + 1)?)))
            .collect()
    }

    fn enter(&self, depth: usize) -> ScrubResult<()> {
        if depth >= self.max_depth {
            debug!("Payload nesting reached {} container(s); refusing to descend.", depth);
            return Err(ScrubError::DepthExceeded(self.max_depth));
        }
        Ok(())
    }

    /// Purifies one string. `ignore_non_strings` is not consulted: only true
    /// strings reach this point.
    fn clean_string(&self, input: &str) -> ScrubResult<Value> {
        let cleaned = self.purifier.purify(input, self.config)?;
        if cleaned.is_empty() && input != ZERO_LITERAL {
            trace!("String of {} byte(s) purified to nothing; replaced with null.", input.len());
            return Ok(Value::Null);
        }
        Ok(Value::String(cleaned))
    }
}

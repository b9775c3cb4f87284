// htmlscrub-core/src/middleware.rs
//! The framework-facing boundary: a method gate plus a `handle` entry point.
//!
//! Framework glue builds a [`Request`] from its own request type, calls
//! [`PurifyMiddleware::handle`], and receives whatever the `next` handler returns.
//! Only `POST`, `PUT` and `PATCH` requests are sanitized; everything else is
//! forwarded untouched.
//!
//! ```text
//! framework request
//!   -> Request { method, path, fields }
//!   -> should_sanitize(method)?
//!        no:  next(request)
//!        yes: ConfigAssembler -> ValueSanitizer -> merge -> next(request)
//! ```
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use std::sync::Arc;

use log::{debug, info};

use crate::assembler::ConfigAssembler;
use crate::config::PurifierSettings;
use crate::engine::Purifier;
use crate::errors::ScrubResult;
use crate::sanitizer::ValueSanitizer;
use crate::validators::ValidatorRegistry;
use crate::value::{Fields, Value};

/// Methods whose payloads are sanitized.
pub const SANITIZED_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

/// True when requests with `method` must be sanitized. The match is exact:
/// HTTP method names are case-sensitive.
pub fn should_sanitize(method: &str) -> bool {
    SANITIZED_METHODS.contains(&method)
}

/// Framework-neutral view of an inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: String,
    path: String,
    fields: Fields,
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            fields: Fields::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Every input field, in arrival order.
    pub fn all(&self) -> &Fields {
        &self.fields
    }

    pub fn input(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Writes `fields` over the current ones. Existing keys keep their position.
    pub fn merge(&mut self, fields: Fields) {
        for (name, value) in fields {
            self.fields.insert(name, value);
        }
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

/// Sanitizes qualifying requests before handing them on.
#[derive(Clone)]
pub struct PurifyMiddleware {
    settings: Arc<PurifierSettings>,
    purifier: Arc<dyn Purifier>,
    registry: Arc<ValidatorRegistry>,
    profile: Option<String>,
}

impl fmt::Debug for PurifyMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurifyMiddleware")
            .field("purifier", &self.purifier.name())
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl PurifyMiddleware {
    /// `settings` is the process-wide configuration source, read-only from here on.
    pub fn new(
        settings: Arc<PurifierSettings>,
        purifier: Arc<dyn Purifier>,
        registry: Arc<ValidatorRegistry>,
    ) -> Self {
        Self {
            settings,
            purifier,
            registry,
            profile: None,
        }
    }

    /// Uses the named profile instead of `default`.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Gates, sanitizes and forwards `request`.
    ///
    /// `next` is only called once the payload is fully cleaned. A sanitize error
    /// is returned without calling it.
    pub fn handle<R, F>(&self, mut request: Request, next: F) -> ScrubResult<R>
    where
        F: FnOnce(Request) -> R,
    {
        if !should_sanitize(request.method()) {
            debug!("{} {}: method not sanitized, forwarding untouched.", request.method(), request.path());
            return Ok(next(request));
        }

        let config = ConfigAssembler::new(&self.settings, &self.registry)
            .assemble_from_settings(self.profile.as_deref());
        let sanitizer = ValueSanitizer::new(&*self.purifier, &config);
        let cleaned = sanitizer.sanitize_fields(request.all())?;

        info!(
            "{} {}: sanitized {} field(s) with profile {:?}.",
            request.method(),
            request.path(),
            cleaned.len(),
            config.profile()
        );
        request.merge(cleaned);
        Ok(next(request))
    }
}

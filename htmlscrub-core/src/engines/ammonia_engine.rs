// htmlscrub-core/src/engines/ammonia_engine.rs
//! A `Purifier` implementation backed by the `ammonia` whitelist sanitizer.
//!
//! Each call turns the compiled definition into an `ammonia::Builder`, runs it over
//! the input, and then re-encodes the result for the configured output encoding.
//! Compiled definitions are cached per engine instance (see
//! [`DefinitionCache`](super::compiler::DefinitionCache)).
//!
//! License: MIT OR APACHE 2.0

use std::any::Any;
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use ammonia::Builder;
use log::{debug, error};

use crate::assembler::SanitizerConfig;
use crate::engine::Purifier;
use crate::engines::compiler::{CompiledDefinition, DefinitionCache};
use crate::errors::{ScrubError, ScrubResult};

/// Output encodings the engine can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    Utf8,
    Latin1,
    Ascii,
}

impl OutputEncoding {
    /// Parses an encoding label such as `UTF-8`, `iso-8859-1` or `US-ASCII`.
    pub fn from_label(label: &str) -> ScrubResult<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "utf8" => Ok(Self::Utf8),
            "iso88591" | "latin1" | "l1" => Ok(Self::Latin1),
            "usascii" | "ascii" => Ok(Self::Ascii),
            _ => Err(ScrubError::UnsupportedEncoding(label.to_string())),
        }
    }

    fn max_code_point(self) -> Option<u32> {
        match self {
            Self::Utf8 => None,
            Self::Latin1 => Some(0xFF),
            Self::Ascii => Some(0x7F),
        }
    }

    /// Replaces characters the encoding cannot represent with numeric references.
    pub fn encode(self, text: String) -> String {
        let Some(limit) = self.max_code_point() else {
            return text;
        };
        if text.chars().all(|c| u32::from(c) <= limit) {
            return text;
        }
        let mut out = String::with_capacity(text.len() + 16);
        for c in text.chars() {
            let code = u32::from(c);
            if code <= limit {
                out.push(c);
            } else {
                let _ = write!(out, "&#{};", code);
            }
        }
        out
    }
}

/// HTML purifier built on `ammonia`.
#[derive(Debug, Default)]
pub struct AmmoniaEngine {
    cache: DefinitionCache,
}

impl AmmoniaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compiled definitions currently cached.
    pub fn cached_definitions(&self) -> usize {
        self.cache.len()
    }

    fn builder(compiled: &Arc<CompiledDefinition>) -> Builder<'_> {
        let mut builder = Builder::default();
        builder.strip_comments(true);
        builder.link_rel(if compiled.nofollow { Some("nofollow") } else { None });

        if let Some(tags) = &compiled.tags {
            builder.tags(tags.iter().map(String::as_str).collect());
        }
        if let Some(tag_attributes) = &compiled.tag_attributes {
            builder.tag_attributes(
                tag_attributes
                    .iter()
                    .map(|(tag, attrs)| (tag.as_str(), attrs.iter().map(String::as_str).collect()))
                    .collect(),
            );
        }
        if let Some(generic) = &compiled.generic_attributes {
            builder.generic_attributes(generic.iter().map(String::as_str).collect());
        }

        builder.add_tags(compiled.extra_tags.iter());
        for (tag, attrs) in &compiled.extra_tag_attributes {
            builder.add_tag_attributes(tag, attrs.iter());
        }
        builder.add_generic_attributes(compiled.extra_generic_attributes.iter());
        builder.rm_tags(compiled.forbidden_tags.iter());

        if let Some(schemes) = &compiled.url_schemes {
            builder.url_schemes(schemes.iter().map(String::as_str).collect());
        }
        builder.filter_style_properties(compiled.style_properties.iter().map(String::as_str).collect());

        if !compiled.validators.is_empty() {
            let validators = Arc::clone(&compiled.validators);
            builder.attribute_filter(move |element, attribute, value| validators.filter(element, attribute, value));
        }
        builder
    }
}

impl Purifier for AmmoniaEngine {
    fn purify(&self, input: &str, config: &SanitizerConfig) -> ScrubResult<String> {
        let encoding = OutputEncoding::from_label(config.encoding())?;
        let compiled = self.cache.get_or_compile(config)?;

        let cleaned = panic::catch_unwind(AssertUnwindSafe(|| {
            let builder = Self::builder(&compiled);
            builder.clean(input).to_string()
        }))
        .map_err(|payload| {
            let message = panic_message(payload.as_ref());
            error!("ammonia failed while cleaning input: {}", message);
            ScrubError::Engine(message)
        })?;

        if cleaned.len() != input.len() {
            debug!("ammonia changed input ({} -> {} bytes).", input.len(), cleaned.len());
        }
        Ok(encoding.encode(cleaned))
    }

    fn name(&self) -> &str {
        "ammonia"
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "engine panicked".to_string()
    }
}

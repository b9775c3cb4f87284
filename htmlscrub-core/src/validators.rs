// File: htmlscrub-core/src/validators.rs
//! Attribute value validators and the registry that resolves them by name.
//!
//! Custom attributes in the purifier configuration name their value type with an
//! identifier such as `"URI"`, `"Enum#_blank,_self"` or
//! `"HTMLPurifier_AttrDef_Text"`. The [`ValidatorRegistry`] turns those identifiers
//! into [`AttrValidator`] instances. An identifier the registry cannot resolve
//! yields `None`, which the assembler treats as "drop this attribute entry".
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The validator capability: decides whether an attribute value is acceptable and
/// returns the (possibly normalized) value to keep.
pub trait AttrValidator: Send + Sync + fmt::Debug {
    /// Identifier this validator was resolved from.
    fn name(&self) -> &str;

    /// Returns `None` when the attribute must be removed.
    fn validate<'v>(&self, value: &'v str) -> Option<Cow<'v, str>>;
}

/// Prefix used by HTMLPurifier attribute-definition class names.
const CLASS_PREFIX: &str = "HTMLPurifier_AttrDef_";

/// How a custom attribute describes its allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    /// A validator identifier, optionally parameterized (`Enum#a,b`).
    Named(String),
    /// An explicit set of allowed values.
    Set(Vec<String>),
}

impl ValueSpec {
    pub fn named(id: impl Into<String>) -> Self {
        ValueSpec::Named(id.into())
    }
}

impl fmt::Display for ValueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSpec::Named(id) => write!(f, "{}", id),
            ValueSpec::Set(values) => write!(f, "[{}]", values.join(",")),
        }
    }
}

/// Factory building a validator from the optional `#parameter` part of an identifier.
pub type ValidatorFactory =
    Arc<dyn Fn(Option<&str>) -> Option<Arc<dyn AttrValidator>> + Send + Sync>;

/// Maps stable identifiers to validator factories.
#[derive(Clone)]
pub struct ValidatorRegistry {
    factories: HashMap<String, ValidatorFactory>,
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ValidatorRegistry").field("identifiers", &names).finish()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ValidatorRegistry {
    /// A registry with no identifiers at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry pre-populated with the built-in HTML attribute types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_simple("Text", || Arc::new(TextValidator));
        registry.register_simple("URI", || Arc::new(UriValidator::default()));
        registry.register_simple("Number", || Arc::new(NumberValidator { integer_only: false }));
        registry.register_simple("Integer", || Arc::new(NumberValidator { integer_only: true }));
        registry.register_simple("Pixels", || Arc::new(LengthValidator { allow_percent: false }));
        registry.register_simple("Length", || Arc::new(LengthValidator { allow_percent: true }));
        registry.register_simple("Color", || Arc::new(ColorValidator));
        registry.register_simple("ID", || Arc::new(TokenValidator::id()));
        registry.register_simple("Class", || Arc::new(TokenValidator::class()));
        registry.register_simple("LanguageCode", || Arc::new(LanguageCodeValidator));
        registry.register("Enum", Arc::new(|param: Option<&str>| {
            param.map(|p| Arc::new(EnumValidator::parse(p)) as Arc<dyn AttrValidator>)
        }));
        registry.register("Bool", Arc::new(|param: Option<&str>| {
            param
                .filter(|p| !p.is_empty())
                .map(|p| Arc::new(BoolValidator { name: p.to_string() }) as Arc<dyn AttrValidator>)
        }));
        registry
    }

    /// Registers (or replaces) a factory under `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: ValidatorFactory) {
        let name = name.into();
        debug!("Registering attribute validator '{}'", name);
        self.factories.insert(name, factory);
    }

    /// Registers a parameterless validator.
    pub fn register_simple<F>(&mut self, name: impl Into<String>, build: F)
    where
        F: Fn() -> Arc<dyn AttrValidator> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(move |_param: Option<&str>| Some(build())));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(normalize_identifier(name))
    }

    /// Resolves an identifier such as `"URI"`, `"Enum#a,b"` or
    /// `"HTMLPurifier_AttrDef_Text"` into a validator.
    pub fn resolve(&self, identifier: &str) -> Option<Arc<dyn AttrValidator>> {
        let identifier = identifier.trim();
        let (name, param) = match identifier.split_once('#') {
            Some((name, param)) => (name, Some(param)),
            None => (identifier, None),
        };
        let factory = self.factories.get(normalize_identifier(name))?;
        factory(param)
    }

    /// Resolves a [`ValueSpec`]. Value sets always resolve to an enum validator.
    pub fn resolve_spec(&self, spec: &ValueSpec) -> Option<Arc<dyn AttrValidator>> {
        match spec {
            ValueSpec::Named(id) => self.resolve(id),
            ValueSpec::Set(values) => Some(Arc::new(EnumValidator::new(values.clone(), false))),
        }
    }
}

/// Strips the HTMLPurifier class prefix and maps the namespaced class names onto
/// the built-in identifiers (`HTMLPurifier_AttrDef_HTML_Color` -> `Color`).
fn normalize_identifier(name: &str) -> &str {
    let short = name.strip_prefix(CLASS_PREFIX).unwrap_or(name);
    match short {
        "HTML_Color" | "CSS_Color" => "Color",
        "HTML_Pixels" => "Pixels",
        "HTML_Length" | "CSS_Length" => "Length",
        "HTML_ID" => "ID",
        "HTML_Class" => "Class",
        "HTML_Bool" => "Bool",
        "CSS_Number" => "Number",
        other => other,
    }
}

// ---------- Built-in validators ----------

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static URI_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):").expect("static regex"));
static LENGTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)(px|%)?$").expect("static regex"));
static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").expect("static regex"));
static NMTOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_:.\-]*$").expect("static regex"));
static LANGUAGE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*$").expect("static regex"));

static NAMED_COLORS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend([
        "maroon", "red", "orange", "yellow", "olive", "purple", "fuchsia", "white", "lime",
        "green", "navy", "blue", "aqua", "teal", "black", "silver", "gray",
    ]);
    set
});

static DEFAULT_URI_SCHEMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(["http", "https", "mailto", "ftp", "nntp", "news", "tel"]);
    set
});

/// Free text; collapses runs of whitespace.
#[derive(Debug)]
pub struct TextValidator;

impl AttrValidator for TextValidator {
    fn name(&self) -> &str {
        "Text"
    }

    fn validate<'v>(&self, value: &'v str) -> Option<Cow<'v, str>> {
        let trimmed = value.trim();
        if WHITESPACE_RUN.find_iter(trimmed).any(|m| m.as_str() != " ") {
            Some(Cow::Owned(WHITESPACE_RUN.replace_all(trimmed, " ").into_owned()))
        } else {
            Some(Cow::Borrowed(trimmed))
        }
    }
}

/// URIs: relative references or an allowed scheme.
#[derive(Debug)]
pub struct UriValidator {
    schemes: HashSet<String>,
}

impl Default for UriValidator {
    fn default() -> Self {
        Self {
            schemes: DEFAULT_URI_SCHEMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AttrValidator for UriValidator {
    fn name(&self) -> &str {
        "URI"
    }

    fn validate<'v>(&self, value: &'v str) -> Option<Cow<'v, str>> {
        let trimmed = value.trim();
        if trimmed.chars().any(|c| c.is_control()) {
            return None;
        }
        match URI_SCHEME.captures(trimmed) {
            Some(caps) => {
                let scheme = caps.get(1)?.as_str().to_ascii_lowercase();
                self.schemes.contains(&scheme).then_some(Cow::Borrowed(trimmed))
            }
            None => Some(Cow::Borrowed(trimmed)),
        }
    }
}

/// Numbers; optionally integers only.
#[derive(Debug)]
pub struct NumberValidator {
    integer_only: bool,
}

impl AttrValidator for NumberValidator {
    fn name(&self) -> &str {
        if self.integer_only { "Integer" } else { "Number" }
    }

    fn validate<'v>(&self, value: &'v str) -> Option<Cow<'v, str>> {
        let trimmed = value.trim();
        let valid = if self.integer_only {
            trimmed.parse::<i64>().is_ok()
        } else {
            trimmed.parse::<f64>().map(|n| n.is_finite()).unwrap_or(false)
        };
        valid.then_some(Cow::Borrowed(trimmed))
    }
}

/// Pixel counts, or lengths that may also be percentages.
#[derive(Debug)]
pub struct LengthValidator {
    allow_percent: bool,
}

impl AttrValidator for LengthValidator {
    fn name(&self) -> &str {
        if self.allow_percent { "Length" } else { "Pixels" }
    }

    fn validate<'v>(&self, value: &'v str) -> Option<Cow<'v, str>> {
        let trimmed = value.trim();
        let caps = LENGTH.captures(trimmed)?;
        let number = caps.get(1)?.as_str();
        match caps.get(2).map(|m| m.as_str()) {
            Some("%") if self.allow_percent => Some(Cow::Borrowed(trimmed)),
            Some("%") => None,
            // HTMLPurifier drops the unit for pixel lengths.
            Some(_) => Some(Cow::Owned(number.to_string())),
            None => Some(Cow::Borrowed(trimmed)),
        }
    }
}

/// Hex or named colors; hex values are normalized to lowercase with a leading `#`.
#[derive(Debug)]
pub struct ColorValidator;

impl AttrValidator for ColorValidator {
    fn name(&self) -> &str {
        "Color"
    }

    fn validate<'v>(&self, value: &'v str) -> Option<Cow<'v, str>> {
        let trimmed = value.trim();
        let lower = trimmed.to_ascii_lowercase();
        if NAMED_COLORS.contains(lower.as_str()) {
            return Some(Cow::Owned(lower));
        }
        let caps = HEX_COLOR.captures(trimmed)?;
        let hex = caps.get(1)?.as_str().to_ascii_lowercase();
        Some(Cow::Owned(format!("#{}", hex)))
    }
}

/// `id` and `class` style name tokens.
#[derive(Debug)]
pub struct TokenValidator {
    name: &'static str,
    multiple: bool,
}

impl TokenValidator {
    fn id() -> Self {
        Self { name: "ID", multiple: false }
    }

    fn class() -> Self {
        Self { name: "Class", multiple: true }
    }
}

impl AttrValidator for TokenValidator {
    fn name(&self) -> &str {
        self.name
    }

    fn validate<'v>(&self, value: &'v str) -> Option<Cow<'v, str>> {
        let trimmed = value.trim();
        if !self.multiple {
            return NMTOKEN.is_match(trimmed).then_some(Cow::Borrowed(trimmed));
        }
        let kept: Vec<&str> = trimmed.split_whitespace().filter(|t| NMTOKEN.is_match(t)).collect();
        if kept.is_empty() {
            None
        } else {
            Some(Cow::Owned(kept.join(" ")))
        }
    }
}

/// BCP 47 style language tags.
#[derive(Debug)]
pub struct LanguageCodeValidator;

impl AttrValidator for LanguageCodeValidator {
    fn name(&self) -> &str {
        "LanguageCode"
    }

    fn validate<'v>(&self, value: &'v str) -> Option<Cow<'v, str>> {
        let trimmed = value.trim();
        LANGUAGE_CODE.is_match(trimmed).then_some(Cow::Borrowed(trimmed))
    }
}

/// One of a fixed set of values.
#[derive(Debug)]
pub struct EnumValidator {
    values: Vec<String>,
    case_sensitive: bool,
}

impl EnumValidator {
    pub fn new(values: Vec<String>, case_sensitive: bool) -> Self {
        let values = if case_sensitive {
            values
        } else {
            values.into_iter().map(|v| v.to_lowercase()).collect()
        };
        Self { values, case_sensitive }
    }

    /// Parses the parameter of an `Enum#...` identifier. A leading `s:` makes the
    /// comparison case-sensitive.
    pub fn parse(param: &str) -> Self {
        let (case_sensitive, list) = match param.strip_prefix("s:") {
            Some(rest) => (true, rest),
            None => (false, param),
        };
        let values = list
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(values, case_sensitive)
    }
}

impl AttrValidator for EnumValidator {
    fn name(&self) -> &str {
        "Enum"
    }

    fn validate<'v>(&self, value: &'v str) -> Option<Cow<'v, str>> {
        let trimmed = value.trim();
        if self.case_sensitive {
            self.values.iter().any(|v| v == trimmed).then_some(Cow::Borrowed(trimmed))
        } else {
            let lower = trimmed.to_lowercase();
            self.values.contains(&lower).then_some(Cow::Owned(lower))
        }
    }
}

/// Boolean attributes (`checked="checked"`); any value collapses to the attribute name.
#[derive(Debug)]
pub struct BoolValidator {
    name: String,
}

impl AttrValidator for BoolValidator {
    fn name(&self) -> &str {
        "Bool"
    }

    fn validate<'v>(&self, _value: &'v str) -> Option<Cow<'v, str>> {
        Some(Cow::Owned(self.name.clone()))
    }
}

//! compiler.rs - Compiles a `SanitizerConfig` into the form the ammonia engine runs.
//!
//! The directives and the custom grammar are turned into owned tag and attribute
//! sets plus a table of attribute validators. A [`DefinitionCache`] keeps compiled
//! definitions keyed by grammar identity (definition id, revision and a serial of
//! the definition directives), the way a purifier keeps serialized definitions around.
//! Configurations in debug mode (`Cache.DefinitionImpl: null`) or without a
//! definition id are always compiled fresh.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use log::{debug, warn};
use serde_json::Value;

use crate::assembler::SanitizerConfig;
use crate::definition::{HtmlDefinition, Validator, REQUIRED_SUFFIX};
use crate::errors::{ScrubError, ScrubResult};

/// Tags whose content ammonia removes wholesale. They can never be allowed tags.
pub const CONTENT_STRIPPED_TAGS: [&str; 2] = ["script", "style"];

/// Directive namespaces that shape the compiled definition.
const DEFINITION_NAMESPACES: [&str; 4] = ["HTML.", "URI.", "Attr.", "CSS."];

/// Inline style properties kept when `CSS.AllowedProperties` is not set.
/// Layout properties such as `position` or `z-index` are left out.
pub const DEFAULT_STYLE_PROPERTIES: [&str; 18] = [
    "background-color",
    "border",
    "color",
    "font",
    "font-family",
    "font-size",
    "font-style",
    "font-variant",
    "font-weight",
    "letter-spacing",
    "line-height",
    "list-style-type",
    "padding-left",
    "text-align",
    "text-decoration",
    "text-indent",
    "vertical-align",
    "white-space",
];

/// Definition directives the compiler understands.
const SUPPORTED_DIRECTIVES: [&str; 10] = [
    "HTML.Allowed",
    "HTML.AllowedElements",
    "HTML.AllowedAttributes",
    "HTML.ForbiddenElements",
    "HTML.Nofollow",
    "HTML.DefinitionID",
    "HTML.DefinitionRev",
    "URI.AllowedSchemes",
    "Attr.EnableID",
    "CSS.AllowedProperties",
];

/// Attribute validators keyed by element, plus the global ones.
#[derive(Debug, Default)]
pub struct AttributeValidators {
    per_element: HashMap<String, HashMap<String, Validator>>,
    global: HashMap<String, Validator>,
}

impl AttributeValidators {
    fn insert(&mut self, element: &str, attribute: &str, validator: Validator) {
        self.per_element
            .entry(element.to_string())
            .or_default()
            .insert(attribute.to_string(), validator);
    }

    fn insert_global(&mut self, attribute: &str, validator: Validator) {
        self.global.insert(attribute.to_string(), validator);
    }

    pub fn is_empty(&self) -> bool {
        self.per_element.is_empty() && self.global.is_empty()
    }

    /// Element-scoped validators take precedence over global ones. Attributes
    /// without a validator are kept as they are.
    pub fn filter<'u>(&self, element: &str, attribute: &str, value: &'u str) -> Option<Cow<'u, str>> {
        let validator = self
            .per_element
            .get(element)
            .and_then(|attrs| attrs.get(attribute))
            .or_else(|| self.global.get(attribute));
        match validator {
            Some(validator) => validator.validate(value),
            None => Some(Cow::Borrowed(value)),
        }
    }
}

/// A configuration compiled for the ammonia engine.
#[derive(Debug, Default)]
pub struct CompiledDefinition {
    /// Replacement tag whitelist; `None` keeps the engine defaults.
    pub tags: Option<HashSet<String>>,
    pub tag_attributes: Option<HashMap<String, HashSet<String>>>,
    pub generic_attributes: Option<HashSet<String>>,
    pub extra_tags: HashSet<String>,
    pub extra_tag_attributes: HashMap<String, HashSet<String>>,
    pub extra_generic_attributes: HashSet<String>,
    pub forbidden_tags: HashSet<String>,
    pub url_schemes: Option<HashSet<String>>,
    /// Properties kept inside `style` attributes. Everything else is dropped.
    pub style_properties: HashSet<String>,
    pub nofollow: bool,
    /// Required attributes per element (suffix stripped).
    pub required_attributes: HashMap<String, HashSet<String>>,
    pub validators: Arc<AttributeValidators>,
}

/// Identity of a compiled definition in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionKey {
    pub id: String,
    pub rev: u64,
    pub serial: u64,
}

impl DefinitionKey {
    /// `None` when the configuration must not be served from cache.
    pub fn for_config(config: &SanitizerConfig) -> Option<Self> {
        if !config.definition_cache_enabled() {
            return None;
        }
        let (id, rev) = config.definition_id()?;
        Some(Self {
            id: id.to_string(),
            rev,
            serial: directive_serial(config),
        })
    }
}

/// Hashes the directives that shape the definition, in a stable order.
fn directive_serial(config: &SanitizerConfig) -> u64 {
    let mut relevant: Vec<(&String, String)> = config
        .base_settings()
        .iter()
        .filter(|(key, _)| DEFINITION_NAMESPACES.iter().any(|ns| key.starts_with(ns)))
        .filter(|(key, _)| !key.starts_with("HTML.Definition"))
        .map(|(key, value)| (key, value.to_string()))
        .collect();
    relevant.sort();

    let mut hasher = DefaultHasher::new();
    relevant.hash(&mut hasher);
    hasher.finish()
}

/// In-memory store of compiled definitions.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    entries: RwLock<HashMap<DefinitionKey, Arc<CompiledDefinition>>>,
}

impl DefinitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets a compiled definition from the cache or compiles it.
    pub fn get_or_compile(&self, config: &SanitizerConfig) -> ScrubResult<Arc<CompiledDefinition>> {
        let Some(key) = DefinitionKey::for_config(config) else {
            debug!("Definition caching disabled for this configuration. Compiling now.");
            return Ok(Arc::new(compile_definition(config)));
        };

        {
            let entries = self
                .entries
                .read()
                .map_err(|_| ScrubError::Engine("definition cache lock poisoned".to_string()))?;
            if let Some(compiled) = entries.get(&key) {
                debug!("Serving compiled definition '{}' rev {} from cache.", key.id, key.rev);
                return Ok(Arc::clone(compiled));
            }
        }

        debug!("Compiled definition '{}' rev {} not cached. Compiling now.", key.id, key.rev);
        let compiled = Arc::new(compile_definition(config));
        self.entries
            .write()
            .map_err(|_| ScrubError::Engine("definition cache lock poisoned".to_string()))?
            .insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }
}

/// Compiles directives and grammar into a [`CompiledDefinition`].
pub fn compile_definition(config: &SanitizerConfig) -> CompiledDefinition {
    let mut compiled = CompiledDefinition::default();
    let mut validators = AttributeValidators::default();

    for key in config.base_settings().keys() {
        let shapes_definition = DEFINITION_NAMESPACES.iter().any(|ns| key.starts_with(ns));
        if shapes_definition && !SUPPORTED_DIRECTIVES.contains(&key.as_str()) {
            debug!("Directive '{}' is not supported by the ammonia engine; ignoring.", key);
        }
    }

    if let Some(allowed) = config.directive("HTML.Allowed").and_then(Value::as_str) {
        let (tags, tag_attributes, generic) = parse_allowed(allowed);
        compiled.tags = Some(tags);
        compiled.tag_attributes = Some(tag_attributes);
        compiled.generic_attributes = Some(generic);
    }
    if let Some(elements) = config.directive("HTML.AllowedElements") {
        compiled.tags = Some(directive_list(elements).into_iter().collect());
    }
    if let Some(attributes) = config.directive("HTML.AllowedAttributes") {
        let (tag_attributes, generic) = parse_allowed_attributes(&directive_list(attributes));
        compiled.tag_attributes = Some(tag_attributes);
        compiled.generic_attributes = Some(generic);
    }
    if let Some(forbidden) = config.directive("HTML.ForbiddenElements") {
        compiled.forbidden_tags = directive_list(forbidden).into_iter().collect();
    }
    if let Some(schemes) = config.directive("URI.AllowedSchemes") {
        compiled.url_schemes = Some(directive_list(schemes).into_iter().collect());
    }
    compiled.style_properties = match config.directive("CSS.AllowedProperties") {
        Some(properties) => directive_list(properties)
            .into_iter()
            .map(|p| p.to_ascii_lowercase())
            .collect(),
        None => DEFAULT_STYLE_PROPERTIES.iter().map(|p| p.to_string()).collect(),
    };
    compiled.nofollow = config.directive("HTML.Nofollow").map_or(false, is_truthy);
    let enable_id = config.directive("Attr.EnableID").map_or(false, is_truthy);

    if let Some(definition) = config.definition() {
        apply_grammar(definition, enable_id, &mut compiled, &mut validators);
    }

    sanitize_for_engine(&mut compiled);
    compiled.validators = Arc::new(validators);
    debug!(
        "Compiled definition: {} extra tag(s), {} extra generic attribute(s), validators: {}.",
        compiled.extra_tags.len(),
        compiled.extra_generic_attributes.len(),
        !compiled.validators.is_empty()
    );
    compiled
}

fn apply_grammar(
    definition: &HtmlDefinition,
    enable_id: bool,
    compiled: &mut CompiledDefinition,
    validators: &mut AttributeValidators,
) {
    for element in definition.elements() {
        compiled.extra_tags.insert(element.name.clone());
        let attrs = compiled.extra_tag_attributes.entry(element.name.clone()).or_default();
        attrs.extend(collection_attributes(&element.attribute_collection, enable_id).map(str::to_string));
        if let Some(explicit) = &element.attributes {
            for (name, validator) in explicit {
                let (bare, required) = split_required(name);
                attrs.insert(bare.to_string());
                validators.insert(&element.name, bare, Arc::clone(validator));
                if required {
                    compiled
                        .required_attributes
                        .entry(element.name.clone())
                        .or_default()
                        .insert(bare.to_string());
                }
            }
        }
    }

    for (element, attributes) in definition.attributes() {
        for (name, validator) in attributes {
            let (bare, required) = split_required(name);
            compiled
                .extra_tag_attributes
                .entry(element.clone())
                .or_default()
                .insert(bare.to_string());
            validators.insert(element, bare, Arc::clone(validator));
            if required {
                compiled
                    .required_attributes
                    .entry(element.clone())
                    .or_default()
                    .insert(bare.to_string());
            }
        }
    }

    for (name, validator) in definition.global_attributes() {
        let (bare, _) = split_required(name);
        compiled.extra_generic_attributes.insert(bare.to_string());
        validators.insert_global(bare, Arc::clone(validator));
    }
}

/// Removes combinations the engine refuses to run with.
fn sanitize_for_engine(compiled: &mut CompiledDefinition) {
    let mut drop_tag = |set: &mut HashSet<String>| {
        for tag in CONTENT_STRIPPED_TAGS {
            if set.remove(tag) {
                warn!("Tag '{}' cannot be allowed; its content is always stripped.", tag);
            }
        }
    };
    if let Some(tags) = compiled.tags.as_mut() {
        drop_tag(tags);
    }
    drop_tag(&mut compiled.extra_tags);

    if compiled.nofollow {
        let strip_rel = |set: &mut HashSet<String>| {
            if set.remove("rel") {
                warn!("Attribute 'rel' removed from the whitelist; it is managed by HTML.Nofollow.");
            }
        };
        compiled.tag_attributes.iter_mut().flat_map(|m| m.values_mut()).for_each(strip_rel);
        compiled.extra_tag_attributes.values_mut().for_each(strip_rel);
        compiled.generic_attributes.iter_mut().for_each(strip_rel);
        strip_rel(&mut compiled.extra_generic_attributes);
    }
}

fn split_required(name: &str) -> (&str, bool) {
    match name.strip_suffix(REQUIRED_SUFFIX) {
        Some(bare) => (bare, true),
        None => (name, false),
    }
}

/// Attributes granted by an attribute collection reference.
fn collection_attributes(collection: &str, enable_id: bool) -> impl Iterator<Item = &'static str> {
    let core: &[&'static str] = if enable_id { &["class", "title", "id"] } else { &["class", "title"] };
    let lang: &[&'static str] = &["lang", "dir"];
    let attrs: Vec<&'static str> = match collection {
        "Core" => core.to_vec(),
        "Lang" | "I18N" => lang.to_vec(),
        "Common" => core.iter().chain(lang.iter()).copied().collect(),
        _ => Vec::new(),
    };
    attrs.into_iter()
}

/// Parses `div,a[href|title],*[class]`.
fn parse_allowed(spec: &str) -> (HashSet<String>, HashMap<String, HashSet<String>>, HashSet<String>) {
    let mut tags = HashSet::new();
    let mut tag_attributes: HashMap<String, HashSet<String>> = HashMap::new();
    let mut generic = HashSet::new();

    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (name, attrs) = match token.split_once('[') {
            Some((name, rest)) => (name.trim(), rest.trim_end_matches(']')),
            None => (token, ""),
        };
        let attrs = attrs.split('|').map(str::trim).filter(|a| !a.is_empty()).map(str::to_string);
        if name == "*" {
            generic.extend(attrs);
        } else if !name.is_empty() {
            tags.insert(name.to_string());
            tag_attributes.entry(name.to_string()).or_default().extend(attrs);
        }
    }
    (tags, tag_attributes, generic)
}

/// Parses `a.href`, `*.class` entries.
fn parse_allowed_attributes(entries: &[String]) -> (HashMap<String, HashSet<String>>, HashSet<String>) {
    let mut tag_attributes: HashMap<String, HashSet<String>> = HashMap::new();
    let mut generic = HashSet::new();
    for entry in entries {
        match entry.split_once('.') {
            Some(("*", attr)) => {
                generic.insert(attr.to_string());
            }
            Some((tag, attr)) => {
                tag_attributes.entry(tag.to_string()).or_default().insert(attr.to_string());
            }
            None => {
                generic.insert(entry.clone());
            }
        }
    }
    (tag_attributes, generic)
}

/// Reads a list directive given as `"a,b"`, `["a", "b"]` or `{a: true, b: false}`.
fn directive_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        Value::Object(map) => map
            .iter()
            .filter(|(_, enabled)| is_truthy(enabled))
            .map(|(key, _)| key.clone())
            .collect(),
        _ => Vec::new(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::String(s) => !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false"),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

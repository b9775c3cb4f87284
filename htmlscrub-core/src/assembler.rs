// htmlscrub-core/src/assembler.rs
//! ConfigAssembler: builds an immutable [`SanitizerConfig`] from layered sources.
//!
//! Precedence, lowest first:
//!
//! 1. hard-coded defaults (encoding, cache path, cache file mode)
//! 2. the named profile's directives (or `default`)
//! 3. the custom definition (identity + revision + debug), then its own
//!    attribute and element lists
//! 4. custom elements
//! 5. custom attributes
//!
//! Steps 3 to 5 all write into one [`HtmlDefinition`]. Bad entries (a validator
//! identifier that does not resolve) are dropped with a warning; assembly itself
//! cannot fail.
//!
//! License: MIT OR APACHE 2.0

use std::path::PathBuf;

use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value as Directive;

use crate::config::{effective_max_depth, Directives, PurifierSettings};
use crate::definition::{AttributeSpec, DefinitionOverride, ElementSpec, HtmlDefinition, Validator};
use crate::errors::{ScrubError, ScrubResult};
use crate::profiles::{
    default_directives, merge_directives, normalize_directive_key, resolve_profile,
    CACHE_MODE_DIRECTIVE, CACHE_PATH_DIRECTIVE, DEFINITION_CACHE_DIRECTIVE,
    DEFINITION_ID_DIRECTIVE, DEFINITION_REV_DIRECTIVE, ENCODING_DIRECTIVE,
};
use crate::validators::ValidatorRegistry;

/// The custom grammar overrides applied after the profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyOverrides {
    pub custom_definition: Option<DefinitionOverride>,
    pub custom_elements: Vec<ElementSpec>,
    pub custom_attributes: Vec<AttributeSpec>,
}

impl AssemblyOverrides {
    /// Lifts `settings.custom_*` out of the configuration source.
    pub fn from_settings(settings: &PurifierSettings) -> Self {
        Self {
            custom_definition: settings.settings.custom_definition.clone(),
            custom_elements: settings.settings.custom_elements.clone(),
            custom_attributes: settings.settings.custom_attributes.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.custom_definition.is_none() && self.custom_elements.is_empty() && self.custom_attributes.is_empty()
    }
}

/// Immutable sanitizer configuration. Built once per request cycle.
#[derive(Debug, Clone)]
pub struct SanitizerConfig {
    encoding: String,
    cache_directory: Option<PathBuf>,
    cache_file_mode: u32,
    auto_finalize: bool,
    ignore_non_strings: bool,
    max_depth: usize,
    profile: Option<String>,
    base_settings: Directives,
    custom_definition: Option<DefinitionOverride>,
    custom_elements: Vec<ElementSpec>,
    custom_attributes: Vec<AttributeSpec>,
    definition: Option<HtmlDefinition>,
}

impl SanitizerConfig {
    /// Character encoding the engine emits (`Core.Encoding`).
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn cache_directory(&self) -> Option<&PathBuf> {
        self.cache_directory.as_ref()
    }

    pub fn cache_file_mode(&self) -> u32 {
        self.cache_file_mode
    }

    pub fn auto_finalize(&self) -> bool {
        self.auto_finalize
    }

    /// Carried for configuration compatibility. Only true strings ever reach the
    /// cleaning step, so the flag has no observable effect on traversal.
    pub fn ignore_non_strings(&self) -> bool {
        self.ignore_non_strings
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Name of the profile that was merged, if any.
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Every merged directive, custom definition directives included.
    pub fn base_settings(&self) -> &Directives {
        &self.base_settings
    }

    pub fn directive(&self, key: &str) -> Option<&Directive> {
        self.base_settings.get(normalize_directive_key(key))
    }

    pub fn custom_definition(&self) -> Option<&DefinitionOverride> {
        self.custom_definition.as_ref()
    }

    pub fn custom_elements(&self) -> &[ElementSpec] {
        &self.custom_elements
    }

    pub fn custom_attributes(&self) -> &[AttributeSpec] {
        &self.custom_attributes
    }

    /// The grammar extension, when any override touched it.
    pub fn definition(&self) -> Option<&HtmlDefinition> {
        self.definition.as_ref()
    }

    /// Identity of the grammar for compiled-definition caching.
    pub fn definition_id(&self) -> Option<(&str, u64)> {
        let id = self.base_settings.get(DEFINITION_ID_DIRECTIVE)?.as_str()?;
        let rev = self
            .base_settings
            .get(DEFINITION_REV_DIRECTIVE)
            .and_then(Directive::as_u64)
            .unwrap_or(1);
        Some((id, rev))
    }

    /// False when `Cache.DefinitionImpl` was set to null (debug mode).
    pub fn definition_cache_enabled(&self) -> bool {
        !matches!(self.base_settings.get(DEFINITION_CACHE_DIRECTIVE), Some(Directive::Null))
    }
}

/// Mutable draft of a [`SanitizerConfig`].
///
/// When the source has `finalize: true` the draft is locked as soon as assembly
/// finishes and the mutators return [`ScrubError::ConfigFinalized`]. [`build`]
/// freezes it either way.
///
/// [`build`]: SanitizerConfigBuilder::build
#[derive(Debug, Clone)]
pub struct SanitizerConfigBuilder {
    config: SanitizerConfig,
    locked: bool,
}

impl SanitizerConfigBuilder {
    fn new(settings: &PurifierSettings) -> Self {
        Self {
            config: SanitizerConfig {
                encoding: settings.encoding.clone(),
                cache_directory: settings.cache_path.clone(),
                cache_file_mode: settings.cache_file_mode,
                auto_finalize: settings.finalize,
                ignore_non_strings: settings.ignore_non_strings,
                max_depth: effective_max_depth(settings.max_depth),
                profile: None,
                base_settings: Directives::new(),
                custom_definition: None,
                custom_elements: Vec::new(),
                custom_attributes: Vec::new(),
                definition: None,
            },
            locked: false,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn ensure_unlocked(&self) -> ScrubResult<()> {
        if self.locked {
            Err(ScrubError::ConfigFinalized)
        } else {
            Ok(())
        }
    }

    /// Sets one engine directive on the draft.
    pub fn set_directive(&mut self, key: &str, value: Directive) -> ScrubResult<&mut Self> {
        self.ensure_unlocked()?;
        self.put_directive(key, value);
        Ok(self)
    }

    /// Mutable access to the grammar, creating it on first use.
    pub fn definition_mut(&mut self) -> ScrubResult<&mut HtmlDefinition> {
        self.ensure_unlocked()?;
        Ok(self.grammar())
    }

    pub fn directive(&self, key: &str) -> Option<&Directive> {
        self.config.directive(key)
    }

    /// Freezes the draft.
    pub fn build(self) -> SanitizerConfig {
        self.config
    }

    fn put_directive(&mut self, key: &str, value: Directive) {
        let key = normalize_directive_key(key);
        self.config.base_settings.insert(key.to_string(), value);
        self.sync_typed_fields();
    }

    fn grammar(&mut self) -> &mut HtmlDefinition {
        self.config.definition.get_or_insert_with(HtmlDefinition::new)
    }

    /// Keeps the typed accessors in step with the directive map.
    fn sync_typed_fields(&mut self) {
        let config = &mut self.config;
        if let Some(encoding) = config.base_settings.get(ENCODING_DIRECTIVE).and_then(Directive::as_str) {
            config.encoding = encoding.to_string();
        }
        config.cache_directory = config
            .base_settings
            .get(CACHE_PATH_DIRECTIVE)
            .and_then(Directive::as_str)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        if let Some(mode) = config.base_settings.get(CACHE_MODE_DIRECTIVE).and_then(Directive::as_u64) {
            config.cache_file_mode = u32::try_from(mode).unwrap_or(config.cache_file_mode);
        }
    }
}

/// Builds sanitizer configurations from a read-only settings snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ConfigAssembler<'a> {
    settings: &'a PurifierSettings,
    registry: &'a ValidatorRegistry,
}

impl<'a> ConfigAssembler<'a> {
    pub fn new(settings: &'a PurifierSettings, registry: &'a ValidatorRegistry) -> Self {
        Self { settings, registry }
    }

    /// Assembles and freezes a configuration.
    pub fn assemble(&self, profile: Option<&str>, overrides: &AssemblyOverrides) -> SanitizerConfig {
        self.prepare(profile, overrides).build()
    }

    /// Assembles using the overrides stored in the settings themselves.
    pub fn assemble_from_settings(&self, profile: Option<&str>) -> SanitizerConfig {
        self.assemble(profile, &AssemblyOverrides::from_settings(self.settings))
    }

    /// Runs every assembly step and returns the draft, locked if `finalize` is set.
    pub fn prepare(&self, profile: Option<&str>, overrides: &AssemblyOverrides) -> SanitizerConfigBuilder {
        let mut builder = SanitizerConfigBuilder::new(self.settings);

        // 1 + 2: defaults, then the profile on top.
        let selected = resolve_profile(self.settings, profile);
        let merged = merge_directives(default_directives(self.settings), selected.map(|(_, d)| d));
        builder.config.profile = selected.map(|(name, _)| name.to_string());
        for (key, value) in merged {
            builder.put_directive(&key, value);
        }

        // 3: custom definition, shared grammar.
        if let Some(definition) = &overrides.custom_definition {
            self.apply_custom_definition(&mut builder, definition);
        }

        // 4: custom elements.
        if !overrides.custom_elements.is_empty() {
            let grammar = builder.grammar();
            self.add_custom_elements(&overrides.custom_elements, grammar);
            builder.config.custom_elements = overrides.custom_elements.clone();
        }

        // 5: custom attributes.
        if !overrides.custom_attributes.is_empty() {
            let grammar = builder.grammar();
            self.add_custom_attributes(&overrides.custom_attributes, grammar);
            builder.config.custom_attributes = overrides.custom_attributes.clone();
        }

        builder.locked = builder.config.auto_finalize;
        debug!(
            "Assembled sanitizer config (profile: {:?}, {} directive(s), grammar: {}, finalized: {}).",
            builder.config.profile,
            builder.config.base_settings.len(),
            builder
                .config
                .definition
                .as_ref()
                .map_or_else(|| "none".to_string(), |d| d.to_string()),
            builder.locked
        );
        builder
    }

    fn apply_custom_definition(&self, builder: &mut SanitizerConfigBuilder, definition: &DefinitionOverride) {
        builder.put_directive(DEFINITION_ID_DIRECTIVE, Directive::from(definition.id.clone()));
        builder.put_directive(DEFINITION_REV_DIRECTIVE, Directive::from(definition.rev));

        if definition.is_debug() {
            debug!("Custom definition '{}' is in debug mode; compiled grammar will not be cached.", definition.id);
            builder.put_directive(DEFINITION_CACHE_DIRECTIVE, Directive::Null);
        }

        let grammar = builder.grammar();
        if !definition.attributes.is_empty() {
            self.add_custom_attributes(&definition.attributes, grammar);
        }
        if !definition.elements.is_empty() {
            self.add_custom_elements(&definition.elements, grammar);
        }
        builder.config.custom_definition = Some(definition.clone());
    }

    fn add_custom_elements(&self, elements: &[ElementSpec], grammar: &mut HtmlDefinition) {
        for element in elements {
            let explicit = element.explicit_attributes().map(|attrs| {
                attrs
                    .iter()
                    .filter_map(|(name, spec)| match self.registry.resolve_spec(spec) {
                        Some(validator) => Some((name.clone(), validator)),
                        None => {
                            warn!(
                                "Dropping attribute '{}' of custom element '{}': validator '{}' cannot be resolved.",
                                name, element.name, spec
                            );
                            None
                        }
                    })
                    .collect::<IndexMap<String, Validator>>()
            });

            grammar.add_element(
                &element.name,
                &element.content_set,
                &element.allowed_children,
                &element.attribute_collection,
                explicit,
            );
        }
    }

    fn add_custom_attributes(&self, attributes: &[AttributeSpec], grammar: &mut HtmlDefinition) {
        for attribute in attributes {
            let name = attribute.effective_name();
            let Some(validator) = self.registry.resolve_spec(&attribute.value) else {
                warn!(
                    "Dropping custom attribute '{}' on '{}': validator '{}' cannot be resolved.",
                    name, attribute.element, attribute.value
                );
                continue;
            };

            if attribute.is_global() {
                grammar.add_global_attribute(&name, validator);
            } else {
                grammar.add_attribute(&attribute.element, &name, validator);
            }
        }
    }
}

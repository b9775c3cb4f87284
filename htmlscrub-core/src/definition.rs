// htmlscrub-core/src/definition.rs
//! Custom HTML grammar: the override specs read from configuration and the
//! [`HtmlDefinition`] they are applied to.
//!
//! Element and attribute overrides accept two YAML shapes. The positional form
//! mirrors the published purifier config file:
//!
//! ```yaml
//! custom_elements:
//!   - [u, Inline, Inline, Common]
//!   - [video, Block, "Optional: (source, Flow) | (Flow, source) | Flow", Common,
//!      { src: URI, width: Length, controls: "Bool#controls" }]
//! custom_attributes:
//!   - [a, target, "Enum#_blank,_self,_target,_top"]
//!   - [img, src, URI, true]
//!   - ["*", data-id, Integer]
//! ```
//!
//! The named form (`{ name: u, content_set: Inline, ... }`) is accepted as well.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::validators::{AttrValidator, ValueSpec};

/// Element name meaning "every element" in attribute overrides.
pub const GLOBAL_ELEMENT: &str = "*";

/// Suffix the engine reads as "this attribute is required".
pub const REQUIRED_SUFFIX: char = '*';

/// Explicit attribute list of an element override.
pub type AttributeSpecs = IndexMap<String, ValueSpec>;

/// A custom element to add to the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ElementSpecRepr")]
pub struct ElementSpec {
    pub name: String,
    /// Content set the element joins (`Block`, `Inline`, `Flow`, ...).
    pub content_set: String,
    /// Allowed-children descriptor (`Inline`, `Empty`, `Optional: ...`).
    pub allowed_children: String,
    /// Attribute collection reference (`Common`, `Core`, ...).
    pub attribute_collection: String,
    pub attributes: Option<AttributeSpecs>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ElementSpecRepr {
    WithAttributes(String, String, String, String, Option<AttributeSpecs>),
    Positional(String, String, String, String),
    Named {
        name: String,
        #[serde(alias = "contentSet")]
        content_set: String,
        #[serde(alias = "allowedChildren")]
        allowed_children: String,
        #[serde(alias = "attributeCollection", alias = "attr_collection")]
        attribute_collection: String,
        #[serde(default)]
        attributes: Option<AttributeSpecs>,
    },
}

impl From<ElementSpecRepr> for ElementSpec {
    fn from(repr: ElementSpecRepr) -> Self {
        match repr {
            ElementSpecRepr::WithAttributes(name, content_set, allowed_children, attribute_collection, attributes)
            | ElementSpecRepr::Named { name, content_set, allowed_children, attribute_collection, attributes } => {
                ElementSpec { name, content_set, allowed_children, attribute_collection, attributes }
            }
            ElementSpecRepr::Positional(name, content_set, allowed_children, attribute_collection) => {
                ElementSpec { name, content_set, allowed_children, attribute_collection, attributes: None }
            }
        }
    }
}

impl ElementSpec {
    pub fn new(
        name: impl Into<String>,
        content_set: impl Into<String>,
        allowed_children: impl Into<String>,
        attribute_collection: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content_set: content_set.into(),
            allowed_children: allowed_children.into(),
            attribute_collection: attribute_collection.into(),
            attributes: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, spec: ValueSpec) -> Self {
        self.attributes.get_or_insert_with(IndexMap::new).insert(name.into(), spec);
        self
    }

    /// The explicit attribute list, only when it has entries.
    pub fn explicit_attributes(&self) -> Option<&AttributeSpecs> {
        self.attributes.as_ref().filter(|attrs| !attrs.is_empty())
    }
}

/// A custom attribute to register on one element or, with `*`, on every element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AttributeSpecRepr")]
pub struct AttributeSpec {
    pub element: String,
    pub name: String,
    pub value: ValueSpec,
    pub required: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AttributeSpecRepr {
    WithRequired(String, String, ValueSpec, Option<bool>),
    Positional(String, String, ValueSpec),
    Named {
        element: String,
        name: String,
        value: ValueSpec,
        #[serde(default)]
        required: bool,
    },
}

impl From<AttributeSpecRepr> for AttributeSpec {
    fn from(repr: AttributeSpecRepr) -> Self {
        match repr {
            AttributeSpecRepr::WithRequired(element, name, value, required) => AttributeSpec {
                element,
                name,
                value,
                required: required.unwrap_or(false),
            },
            AttributeSpecRepr::Positional(element, name, value) => AttributeSpec {
                element,
                name,
                value,
                required: false,
            },
            AttributeSpecRepr::Named { element, name, value, required } => AttributeSpec {
                element,
                name,
                value,
                required,
            },
        }
    }
}

impl AttributeSpec {
    pub fn new(element: impl Into<String>, name: impl Into<String>, value: ValueSpec) -> Self {
        Self {
            element: element.into(),
            name: name.into(),
            value,
            required: false,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn is_global(&self) -> bool {
        self.element == GLOBAL_ELEMENT
    }

    /// The attribute name as the engine must see it: `href*` when required.
    pub fn effective_name(&self) -> String {
        if self.required {
            format!("{}{}", self.name, REQUIRED_SUFFIX)
        } else {
            self.name.clone()
        }
    }
}

/// Identity of a custom grammar plus the lists applied when it is set up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionOverride {
    pub id: String,
    #[serde(default = "default_rev")]
    pub rev: u32,
    /// `None` counts as debug mode.
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

fn default_rev() -> u32 {
    1
}

impl DefinitionOverride {
    pub fn new(id: impl Into<String>, rev: u32) -> Self {
        Self {
            id: id.into(),
            rev,
            debug: None,
            elements: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Debug mode is on unless explicitly disabled.
    pub fn is_debug(&self) -> bool {
        self.debug.unwrap_or(true)
    }
}

/// Shared handle to a resolved validator.
pub type Validator = Arc<dyn AttrValidator>;

/// An element registered in the grammar.
#[derive(Debug, Clone)]
pub struct ElementDef {
    pub name: String,
    pub content_set: String,
    pub allowed_children: String,
    pub attribute_collection: String,
    pub attributes: Option<IndexMap<String, Validator>>,
}

/// The grammar extension handed to the engine.
///
/// There is exactly one of these per assembled configuration; every override
/// step writes into the same instance.
#[derive(Debug, Clone, Default)]
pub struct HtmlDefinition {
    elements: Vec<ElementDef>,
    attributes: IndexMap<String, IndexMap<String, Validator>>,
    global_attributes: IndexMap<String, Validator>,
}

impl HtmlDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element. `attributes` is only recorded when it has entries.
    pub fn add_element(
        &mut self,
        name: &str,
        content_set: &str,
        allowed_children: &str,
        attribute_collection: &str,
        attributes: Option<IndexMap<String, Validator>>,
    ) {
        debug!(
            "Adding element '{}' (content set '{}', collection '{}', explicit attributes: {})",
            name,
            content_set,
            attribute_collection,
            attributes.as_ref().map_or(0, |a| a.len())
        );
        self.elements.push(ElementDef {
            name: name.to_string(),
            content_set: content_set.to_string(),
            allowed_children: allowed_children.to_string(),
            attribute_collection: attribute_collection.to_string(),
            attributes: attributes.filter(|a| !a.is_empty()),
        });
    }

    /// Registers an attribute on a single element. `name` is forwarded as given,
    /// required suffix included.
    pub fn add_attribute(&mut self, element: &str, name: &str, validator: Validator) {
        debug!("Adding attribute '{}' to element '{}' ({})", name, element, validator.name());
        self.attributes
            .entry(element.to_string())
            .or_default()
            .insert(name.to_string(), validator);
    }

    /// Registers an attribute allowed on every element.
    pub fn add_global_attribute(&mut self, name: &str, validator: Validator) {
        debug!("Adding global attribute '{}' ({})", name, validator.name());
        self.global_attributes.insert(name.to_string(), validator);
    }

    pub fn elements(&self) -> &[ElementDef] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.iter().rev().find(|e| e.name == name)
    }

    pub fn attributes(&self) -> &IndexMap<String, IndexMap<String, Validator>> {
        &self.attributes
    }

    pub fn element_attributes(&self, element: &str) -> Option<&IndexMap<String, Validator>> {
        self.attributes.get(element)
    }

    pub fn global_attributes(&self) -> &IndexMap<String, Validator> {
        &self.global_attributes
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.attributes.is_empty() && self.global_attributes.is_empty()
    }
}

impl fmt::Display for HtmlDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attr_count: usize = self.attributes.values().map(IndexMap::len).sum();
        write!(
            f,
            "{} element(s), {} element attribute(s), {} global attribute(s)",
            self.elements.len(),
            attr_count,
            self.global_attributes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_element_forms() {
        let yaml = r#"
- [u, Inline, Inline, Common]
- [video, Block, Flow, Common, { src: URI, controls: "Bool#controls" }]
- [hr, Block, Empty, Common, ~]
- { name: section, content_set: Block, allowed_children: Flow, attribute_collection: Common }
"#;
        let specs: Vec<ElementSpec> = serde_yml::from_str(yaml).unwrap();
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[0], ElementSpec::new("u", "Inline", "Inline", "Common"));
        let video_attrs = specs[1].explicit_attributes().unwrap();
        assert_eq!(video_attrs.get("src"), Some(&ValueSpec::named("URI")));
        assert!(specs[2].attributes.is_none());
        assert_eq!(specs[3].name, "section");
    }

    #[test]
    fn test_positional_attribute_forms() {
        let yaml = r#"
- [a, target, "Enum#_blank,_self"]
- [img, src, URI, true]
- ["*", data-mode, [light, dark]]
- { element: a, name: rel, value: Text, required: false }
"#;
        let specs: Vec<AttributeSpec> = serde_yml::from_str(yaml).unwrap();
        assert_eq!(specs.len(), 4);
        assert!(!specs[0].required);
        assert!(specs[1].required);
        assert_eq!(specs[1].effective_name(), "src*");
        assert!(specs[2].is_global());
        assert_eq!(specs[2].value, ValueSpec::Set(vec!["light".into(), "dark".into()]));
        assert_eq!(specs[3].effective_name(), "rel");
    }

    #[test]
    fn test_empty_explicit_attributes_are_not_recorded() {
        let spec = ElementSpec {
            attributes: Some(IndexMap::new()),
            ..ElementSpec::new("u", "Inline", "Inline", "Common")
        };
        assert!(spec.explicit_attributes().is_none());

        let mut def = HtmlDefinition::new();
        def.add_element("u", "Inline", "Inline", "Common", Some(IndexMap::new()));
        assert!(def.element("u").unwrap().attributes.is_none());
    }

    #[test]
    fn test_definition_debug_defaults_to_true() {
        let def: DefinitionOverride = serde_yml::from_str("id: html5\nrev: 3\n").unwrap();
        assert!(def.is_debug());
        let def: DefinitionOverride = serde_yml::from_str("id: html5\ndebug: false\n").unwrap();
        assert!(!def.is_debug());
        assert_eq!(def.rev, 1);
    }
}

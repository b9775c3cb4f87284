// htmlscrub-core/tests/assembler_tests.rs
use indexmap::IndexMap;
use serde_json::json;

use htmlscrub_core::profiles::{DEFINITION_CACHE_DIRECTIVE, DEFINITION_ID_DIRECTIVE, DEFINITION_REV_DIRECTIVE};
use htmlscrub_core::{
    AssemblyOverrides, AttributeSpec, ConfigAssembler, DefinitionOverride, ElementSpec, PurifierSettings,
    ScrubError, ValidatorRegistry, ValueSpec,
};

fn settings() -> PurifierSettings {
    PurifierSettings::from_yaml_str("settings:\n  default:\n    HTML.Allowed: \"p,b,a[href]\"\n").unwrap()
}

#[test]
fn test_required_attribute_gets_suffix() {
    let settings = settings();
    let registry = ValidatorRegistry::default();
    let overrides = AssemblyOverrides {
        custom_attributes: vec![AttributeSpec::new("a", "href", ValueSpec::named("URI")).required(true)],
        ..Default::default()
    };
    let config = ConfigAssembler::new(&settings, &registry).assemble(None, &overrides);

    let attrs = config.definition().unwrap().element_attributes("a").unwrap();
    assert!(attrs.contains_key("href*"));
    assert!(!attrs.contains_key("href"));
}

#[test_log::test]
fn test_unresolvable_global_validator_is_dropped() {
    let settings = settings();
    let registry = ValidatorRegistry::default();
    let overrides = AssemblyOverrides {
        custom_attributes: vec![
            AttributeSpec::new("*", "data-x", ValueSpec::named("NoSuchValidator")),
            AttributeSpec::new("*", "data-id", ValueSpec::named("Integer")),
            AttributeSpec::new("a", "target", ValueSpec::named("Enum#_blank,_self")),
        ],
        ..Default::default()
    };
    let config = ConfigAssembler::new(&settings, &registry).assemble(None, &overrides);

    let definition = config.definition().unwrap();
    assert!(!definition.global_attributes().contains_key("data-x"));
    assert!(definition.global_attributes().contains_key("data-id"));
    assert!(definition.element_attributes("a").unwrap().contains_key("target"));
    assert_eq!(config.custom_attributes().len(), 3);
}

#[test]
fn test_unresolvable_element_validator_is_dropped() {
    let settings = settings();
    let registry = ValidatorRegistry::default();
    let overrides = AssemblyOverrides {
        custom_attributes: vec![AttributeSpec::new("img", "src", ValueSpec::named("Bogus"))],
        custom_elements: vec![ElementSpec::new("video", "Block", "Flow", "Common")
            .with_attribute("src", ValueSpec::named("URI"))
            .with_attribute("poster", ValueSpec::named("Bogus"))],
        ..Default::default()
    };
    let config = ConfigAssembler::new(&settings, &registry).assemble(None, &overrides);

    let definition = config.definition().unwrap();
    assert!(definition.element_attributes("img").is_none());
    let video = definition.element("video").unwrap().attributes.as_ref().unwrap();
    assert!(video.contains_key("src"));
    assert!(!video.contains_key("poster"));
}

#[test]
fn test_overrides_share_one_grammar() {
    let settings = settings();
    let registry = ValidatorRegistry::default();
    let mut definition = DefinitionOverride::new("html5", 2);
    definition.debug = Some(false);
    definition.elements = vec![ElementSpec::new("section", "Block", "Flow", "Common")];
    definition.attributes = vec![AttributeSpec::new("td", "border", ValueSpec::named("Text"))];

    let overrides = AssemblyOverrides {
        custom_definition: Some(definition),
        custom_elements: vec![ElementSpec::new("mark", "Inline", "Inline", "Common")],
        custom_attributes: vec![AttributeSpec::new("a", "target", ValueSpec::named("Enum#_blank"))],
    };
    let config = ConfigAssembler::new(&settings, &registry).assemble(None, &overrides);

    let grammar = config.definition().unwrap();
    let names: Vec<&str> = grammar.elements().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["section", "mark"]);
    assert!(grammar.element_attributes("td").unwrap().contains_key("border"));
    assert!(grammar.element_attributes("a").unwrap().contains_key("target"));

    assert_eq!(config.directive(DEFINITION_ID_DIRECTIVE), Some(&json!("html5")));
    assert_eq!(config.directive(DEFINITION_REV_DIRECTIVE), Some(&json!(2)));
    assert!(config.definition_cache_enabled());
}

#[test]
fn test_debug_definition_disables_cache() {
    let settings = settings();
    let registry = ValidatorRegistry::default();
    for debug in [None, Some(true)] {
        let mut definition = DefinitionOverride::new("html5", 1);
        definition.debug = debug;
        let overrides = AssemblyOverrides {
            custom_definition: Some(definition),
            ..Default::default()
        };
        let config = ConfigAssembler::new(&settings, &registry).assemble(None, &overrides);
        assert_eq!(config.directive(DEFINITION_CACHE_DIRECTIVE), Some(&serde_json::Value::Null));
        assert!(!config.definition_cache_enabled());
    }
}

#[test]
fn test_empty_explicit_attributes_are_omitted() {
    let settings = settings();
    let registry = ValidatorRegistry::default();
    let overrides = AssemblyOverrides {
        custom_elements: vec![
            ElementSpec {
                attributes: Some(IndexMap::new()),
                ..ElementSpec::new("u", "Inline", "Inline", "Common")
            },
            ElementSpec::new("del", "Block", "Flow", "Common").with_attribute("cite", ValueSpec::named("URI")),
        ],
        ..Default::default()
    };
    let config = ConfigAssembler::new(&settings, &registry).assemble(None, &overrides);
    let grammar = config.definition().unwrap();
    assert!(grammar.element("u").unwrap().attributes.is_none());
    assert_eq!(grammar.element("del").unwrap().attributes.as_ref().unwrap().len(), 1);
}

#[test]
fn test_value_set_resolves_to_enum() {
    let settings = settings();
    let registry = ValidatorRegistry::default();
    let overrides = AssemblyOverrides {
        custom_attributes: vec![AttributeSpec::new(
            "*",
            "data-theme",
            ValueSpec::Set(vec!["light".to_string(), "dark".to_string()]),
        )],
        ..Default::default()
    };
    let config = ConfigAssembler::new(&settings, &registry).assemble(None, &overrides);
    let validator = &config.definition().unwrap().global_attributes()["data-theme"];
    assert_eq!(validator.validate("dark").as_deref(), Some("dark"));
    assert!(validator.validate("blue").is_none());
}

#[test]
fn test_no_overrides_means_no_grammar() {
    let settings = settings();
    let registry = ValidatorRegistry::default();
    let config = ConfigAssembler::new(&settings, &registry).assemble(Some("default"), &AssemblyOverrides::default());
    assert!(config.definition().is_none());
    assert!(config.definition_id().is_none());
}

#[test]
fn test_embedded_settings_assemble() {
    let settings = PurifierSettings::load_default().unwrap();
    let registry = ValidatorRegistry::default();
    let config = ConfigAssembler::new(&settings, &registry).assemble_from_settings(None);

    assert_eq!(config.definition_id(), Some(("html5-definitions", 1)));
    assert!(config.definition_cache_enabled());
    let grammar = config.definition().unwrap();
    assert!(grammar.element("section").is_some());
    assert!(grammar.element("u").is_some());
    assert!(grammar.element_attributes("a").unwrap().contains_key("target"));
    assert!(grammar.element_attributes("iframe").unwrap().contains_key("allowfullscreen"));
}

#[test]
fn test_finalized_draft_is_locked() {
    let settings = settings();
    let registry = ValidatorRegistry::default();
    let mut draft = ConfigAssembler::new(&settings, &registry).prepare(None, &AssemblyOverrides::default());
    assert!(draft.is_locked());
    assert!(matches!(
        draft.set_directive("HTML.Allowed", json!("")),
        Err(ScrubError::ConfigFinalized)
    ));
    let config = draft.build();
    assert_eq!(config.directive("HTML.Allowed"), Some(&json!("p,b,a[href]")));
}

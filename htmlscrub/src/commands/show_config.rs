// htmlscrub/src/commands/show_config.rs
//! `htmlscrub show-config`: prints the assembled configuration as JSON.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::io::{self, Write};

use htmlscrub_core::{ConfigAssembler, HtmlDefinition, PurifierSettings, SanitizerConfig, ValidatorRegistry};

use crate::cli::ShowConfigCommand;
use crate::commands::load_settings;

pub fn run(cmd: &ShowConfigCommand) -> Result<()> {
    let settings = load_settings(&cmd.config)?;
    let report = assembled_config_json(&settings, cmd.profile.as_deref());
    let rendered = serde_json::to_string_pretty(&report).context("Failed to render configuration")?;
    let stdout = io::stdout();
    writeln!(stdout.lock(), "{}", rendered).context("Failed to write to stdout")?;
    Ok(())
}

/// Assembles `profile` and describes the result.
pub fn assembled_config_json(settings: &PurifierSettings, profile: Option<&str>) -> Value {
    let registry = ValidatorRegistry::default();
    let config = ConfigAssembler::new(settings, &registry).assemble_from_settings(profile);
    describe(&config)
}

fn describe(config: &SanitizerConfig) -> Value {
    json!({
        "profile": config.profile(),
        "encoding": config.encoding(),
        "cache_directory": config.cache_directory().map(|p| p.display().to_string()),
        "cache_file_mode": format!("{:o}", config.cache_file_mode()),
        "finalized": config.auto_finalize(),
        "max_depth": config.max_depth(),
        "directives": config.base_settings(),
        "definition": config.definition().map(describe_definition),
    })
}

fn describe_definition(definition: &HtmlDefinition) -> Value {
    let elements: Vec<Value> = definition
        .elements()
        .iter()
        .map(|element| {
            json!({
                "name": element.name,
                "content_set": element.content_set,
                "allowed_children": element.allowed_children,
                "attribute_collection": element.attribute_collection,
                "attributes": element.attributes.as_ref().map(|attrs| attrs.keys().collect::<Vec<_>>()),
            })
        })
        .collect();

    let attributes: Map<String, Value> = definition
        .attributes()
        .iter()
        .map(|(element, attrs)| (element.clone(), json!(attrs.keys().collect::<Vec<_>>())))
        .collect();

    json!({
        "elements": elements,
        "attributes": attributes,
        "global_attributes": definition.global_attributes().keys().collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_description() {
        let settings = PurifierSettings::load_default().unwrap();
        let report = assembled_config_json(&settings, None);
        assert_eq!(report["profile"], "default");
        assert_eq!(report["encoding"], "UTF-8");
        assert_eq!(report["cache_file_mode"], "755");
        assert_eq!(report["directives"]["HTML.DefinitionID"], "html5-definitions");
        assert_eq!(report["definition"]["attributes"]["a"], json!(["target"]));
    }

    #[test]
    fn test_no_grammar_is_null() {
        let settings = PurifierSettings::from_yaml_str("settings:\n  default: {}\n").unwrap();
        let report = assembled_config_json(&settings, None);
        assert!(report["definition"].is_null());
    }
}

// htmlscrub-core/tests/config_integration_tests.rs
use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use htmlscrub_core::config::{PurifierSettings, DEFAULT_CACHE_FILE_MODE};
use htmlscrub_core::validators::ValueSpec;

#[test]
fn test_load_embedded_default() {
    let settings = PurifierSettings::load_default().unwrap();
    assert_eq!(settings.profile_names(), vec!["default", "test", "youtube"]);

    let definition = settings.settings.custom_definition.as_ref().unwrap();
    assert_eq!(definition.id, "html5-definitions");
    assert_eq!(definition.rev, 1);
    assert!(!definition.is_debug());
    assert!(definition.elements.iter().any(|e| e.name == "section"));

    assert_eq!(settings.settings.custom_attributes.len(), 1);
    assert_eq!(settings.settings.custom_attributes[0].name, "target");
    assert_eq!(settings.settings.custom_elements[0].name, "u");
}

#[test]
fn test_load_from_file_positional_entries() -> Result<()> {
    let yaml_content = r#"
encoding: ISO-8859-1
cachePath: /var/cache/htmlscrub
finalize: false
settings:
  default:
    HTML.Allowed: "p,b,a[href]"
  comments:
    HTML.Allowed: "b,i"
    URI.AllowedSchemes: { http: true, https: true }
  custom_elements:
    - [mark, Inline, Inline, Common]
    - [video, Block, Flow, Common, { src: URI, controls: "Bool#controls" }]
  custom_attributes:
    - [img, src, URI, true]
    - ["*", data-theme, [light, dark]]
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;

    let settings = PurifierSettings::load_from_file(file.path())?;
    assert_eq!(settings.encoding, "ISO-8859-1");
    assert_eq!(settings.cache_path.as_deref(), Some(std::path::Path::new("/var/cache/htmlscrub")));
    assert_eq!(settings.cache_file_mode, DEFAULT_CACHE_FILE_MODE);
    assert!(!settings.finalize);
    assert_eq!(settings.profile_names(), vec!["default", "comments"]);

    let elements = &settings.settings.custom_elements;
    assert_eq!(elements.len(), 2);
    assert!(elements[0].explicit_attributes().is_none());
    assert_eq!(elements[1].explicit_attributes().unwrap().len(), 2);

    let attributes = &settings.settings.custom_attributes;
    assert_eq!(attributes[0].effective_name(), "src*");
    assert!(attributes[1].is_global());
    assert_eq!(attributes[1].value, ValueSpec::Set(vec!["light".to_string(), "dark".to_string()]));
    Ok(())
}

#[test]
fn test_discover_prefers_explicit_path() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"settings:\n  only:\n    HTML.Allowed: b\n")?;
    let settings = PurifierSettings::discover(Some(file.path()))?;
    assert_eq!(settings.profile_names(), vec!["only"]);
    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    let err = PurifierSettings::load_from_file(&missing).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_malformed_yaml_is_an_error() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"settings: [this, is, not, a, map]\n")?;
    assert!(PurifierSettings::load_from_file(file.path()).is_err());
    Ok(())
}

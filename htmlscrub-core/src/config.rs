//! Configuration management for `htmlscrub-core`.
//!
//! This module defines [`PurifierSettings`], the read-only configuration source the
//! assembler reads from. It handles deserialization of the YAML configuration file,
//! the embedded default configuration, and discovery of a config file on disk.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::definition::{AttributeSpec, DefinitionOverride, ElementSpec};

/// Environment variable that points at a configuration file.
pub const CONFIG_ENV_VAR: &str = "HTMLSCRUB_CONFIG";

/// File name looked up in the candidate directories.
pub const CONFIG_FILE_NAME: &str = "html_purifier.yaml";

/// Name of the profile used when the caller does not pick one.
pub const DEFAULT_PROFILE: &str = "default";

pub const DEFAULT_ENCODING: &str = "UTF-8";
pub const DEFAULT_CACHE_FILE_MODE: u32 = 0o755;
pub const DEFAULT_MAX_DEPTH: usize = 256;
/// Hard ceiling for `maxDepth`. Larger configured values are clamped to it so
/// the recursive walk stays within a normal thread stack.
pub const MAX_DEPTH_CEILING: usize = 512;

/// Clamps a configured depth limit to [`MAX_DEPTH_CEILING`].
pub fn effective_max_depth(configured: usize) -> usize {
    if configured > MAX_DEPTH_CEILING {
        warn!(
            "maxDepth {} exceeds the supported ceiling; using {}.",
            configured, MAX_DEPTH_CEILING
        );
        return MAX_DEPTH_CEILING;
    }
    configured
}

/// Flattened engine directives, e.g. `HTML.Allowed` -> `"p,b,a[href]"`.
pub type Directives = IndexMap<String, serde_json::Value>;

/// The top-level configuration source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PurifierSettings {
    /// Character encoding the engine emits.
    pub encoding: String,
    /// Directory for the engine's serialized definition cache. Passed through.
    #[serde(alias = "cache_path")]
    pub cache_path: Option<PathBuf>,
    /// Permissions for cache files. Passed through.
    #[serde(alias = "cache_file_mode", deserialize_with = "deserialize_file_mode")]
    pub cache_file_mode: u32,
    /// Lock the assembled configuration against further mutation.
    pub finalize: bool,
    /// Let non-string leaves bypass cleaning.
    #[serde(alias = "ignore_non_strings")]
    pub ignore_non_strings: bool,
    /// Maximum payload nesting the sanitizer will walk.
    #[serde(alias = "max_depth")]
    pub max_depth: usize,
    pub settings: SettingsSection,
}

impl Default for PurifierSettings {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            cache_path: None,
            cache_file_mode: DEFAULT_CACHE_FILE_MODE,
            finalize: true,
            ignore_non_strings: false,
            max_depth: DEFAULT_MAX_DEPTH,
            settings: SettingsSection::default(),
        }
    }
}

/// The `settings` block: named profiles plus the custom grammar overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsSection {
    pub custom_definition: Option<DefinitionOverride>,
    pub custom_elements: Vec<ElementSpec>,
    pub custom_attributes: Vec<AttributeSpec>,
    /// Every other key is a named profile of directives.
    #[serde(flatten)]
    pub profiles: IndexMap<String, Directives>,
}

/// Accepts `493`, `0o755`-style strings and PHP-style `"0755"` strings.
fn deserialize_file_mode<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Mode {
        Int(u32),
        Text(String),
    }

    match Mode::deserialize(deserializer)? {
        Mode::Int(mode) => Ok(mode),
        Mode::Text(text) => {
            let trimmed = text.trim();
            let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
            u32::from_str_radix(digits, 8)
                .map_err(|e| serde::de::Error::custom(format!("invalid file mode '{}': {}", text, e)))
        }
    }
}

impl PurifierSettings {
    /// Parses settings from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: PurifierSettings =
            serde_yml::from_str(yaml).context("Failed to parse purifier settings")?;
        debug!(
            "Parsed purifier settings: {} profile(s), {} custom element(s), {} custom attribute(s).",
            settings.settings.profiles.len(),
            settings.settings.custom_elements.len(),
            settings.settings.custom_attributes.len()
        );
        Ok(settings)
    }

    /// Loads settings from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading purifier settings from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Loads the settings embedded in the crate.
    pub fn load_default() -> Result<Self> {
        debug!("Loading default purifier settings from embedded string...");
        let default_yaml = include_str!("../config/html_purifier.yaml");
        Self::from_yaml_str(default_yaml).context("Failed to parse default purifier settings")
    }

    /// Finds settings: an explicit path, then `HTMLSCRUB_CONFIG`, then the candidate
    /// directories, then the embedded default.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            if !env_path.trim().is_empty() {
                return Self::load_from_file(env_path.trim());
            }
        }
        match config_candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from_file(path),
            None => {
                debug!("No purifier config found on disk, using embedded defaults.");
                Self::load_default()
            }
        }
    }

    /// Directives of a named profile, if present.
    pub fn profile(&self, name: &str) -> Option<&Directives> {
        self.settings.profiles.get(name)
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.settings.profiles.keys().map(String::as_str).collect()
    }
}

/// Locations searched for `html_purifier.yaml`, most specific first.
pub fn config_candidate_paths() -> Vec<PathBuf> {
    let base_dirs = vec![
        Some(PathBuf::from("./config")),
        dirs::config_dir().map(|p| p.join("htmlscrub")),
        dirs::home_dir().map(|p| p.join(".htmlscrub")),
        Some(PathBuf::from("/etc/htmlscrub")),
    ];

    base_dirs
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .collect()
}

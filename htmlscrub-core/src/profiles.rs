// File: htmlscrub-core/src/profiles.rs

//! profiles.rs - Named directive profiles and how they layer over the defaults.
//!
//! A profile is a flat map of engine directives stored under `settings.<name>` in
//! the configuration source. The assembler starts from a small set of hard-coded
//! defaults (encoding, cache path, cache file mode), then lays the selected
//! profile over them. Profile keys win on conflict.
//!
//! Profiles may use the short configuration names (`encoding`, `cachePath`,
//! `cacheFileMode`) as aliases for the engine directives they stand for.
//!
//! license: MIT OR Apache-2.0

use log::{debug, warn};
use serde_json::Value;

use crate::config::{Directives, PurifierSettings, DEFAULT_PROFILE};

pub const ENCODING_DIRECTIVE: &str = "Core.Encoding";
pub const CACHE_PATH_DIRECTIVE: &str = "Cache.SerializerPath";
pub const CACHE_MODE_DIRECTIVE: &str = "Cache.SerializerPermissions";
pub const DEFINITION_ID_DIRECTIVE: &str = "HTML.DefinitionID";
pub const DEFINITION_REV_DIRECTIVE: &str = "HTML.DefinitionRev";
pub const DEFINITION_CACHE_DIRECTIVE: &str = "Cache.DefinitionImpl";

/// Maps a configuration alias to its engine directive. Unknown keys pass through.
pub fn normalize_directive_key(key: &str) -> &str {
    match key {
        "encoding" => ENCODING_DIRECTIVE,
        "cachePath" | "cache_path" => CACHE_PATH_DIRECTIVE,
        "cacheFileMode" | "cache_file_mode" => CACHE_MODE_DIRECTIVE,
        other => other,
    }
}

/// The hard-coded defaults layer, seeded from the top-level settings.
pub fn default_directives(settings: &PurifierSettings) -> Directives {
    let mut defaults = Directives::new();
    defaults.insert(ENCODING_DIRECTIVE.to_string(), Value::from(settings.encoding.clone()));
    defaults.insert(
        CACHE_PATH_DIRECTIVE.to_string(),
        settings
            .cache_path
            .as_ref()
            .map(|p| Value::from(p.to_string_lossy().into_owned()))
            .unwrap_or(Value::Null),
    );
    defaults.insert(CACHE_MODE_DIRECTIVE.to_string(), Value::from(settings.cache_file_mode));
    defaults
}

/// Lays `profile` over `defaults`. Profile keys win; keys keep first-seen order.
pub fn merge_directives(mut defaults: Directives, profile: Option<&Directives>) -> Directives {
    let Some(profile) = profile else {
        debug!("No profile directives to merge; keeping {} default(s).", defaults.len());
        return defaults;
    };

    for (key, value) in profile {
        let key = normalize_directive_key(key);
        if let Some(previous) = defaults.get(key) {
            if previous != value {
                debug!("Profile overrides directive '{}'", key);
            }
        }
        defaults.insert(key.to_string(), value.clone());
    }

    debug!("Merged directives: {} total.", defaults.len());
    defaults
}

/// Picks the profile to apply: the named one if it exists, otherwise `default`.
///
/// Returns the name actually used together with its directives.
pub fn resolve_profile<'a>(
    settings: &'a PurifierSettings,
    requested: Option<&str>,
) -> Option<(&'a str, &'a Directives)> {
    let wanted = requested.unwrap_or(DEFAULT_PROFILE);
    if let Some((name, directives)) = settings.settings.profiles.get_key_value(wanted) {
        return Some((name.as_str(), directives));
    }
    if wanted != DEFAULT_PROFILE {
        warn!("Profile '{}' not found in settings. Falling back to '{}'.", wanted, DEFAULT_PROFILE);
    }
    settings
        .settings
        .profiles
        .get_key_value(DEFAULT_PROFILE)
        .map(|(name, directives)| (name.as_str(), directives))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn directives(value: serde_json::Value) -> Directives {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_profile_keys_win() {
        let defaults = directives(json!({"Core.Encoding": "utf-8", "Cache.SerializerPermissions": 493}));
        let profile = directives(json!({"encoding": "iso-8859-1", "cachePath": "/tmp"}));
        let merged = merge_directives(defaults, Some(&profile));
        assert_eq!(merged[ENCODING_DIRECTIVE], json!("iso-8859-1"));
        assert_eq!(merged[CACHE_PATH_DIRECTIVE], json!("/tmp"));
        assert_eq!(merged[CACHE_MODE_DIRECTIVE], json!(493));
    }

    #[test]
    fn test_unknown_profile_falls_back_to_default() {
        let settings = PurifierSettings::from_yaml_str(
            "settings:\n  default:\n    HTML.Allowed: b\n  strict:\n    HTML.Allowed: ''\n",
        )
        .unwrap();
        assert_eq!(resolve_profile(&settings, Some("strict")).unwrap().0, "strict");
        assert_eq!(resolve_profile(&settings, Some("missing")).unwrap().0, "default");
        assert_eq!(resolve_profile(&settings, None).unwrap().0, "default");
    }

    #[test]
    fn test_no_profiles_at_all() {
        let settings = PurifierSettings::default();
        assert!(resolve_profile(&settings, None).is_none());
        let merged = merge_directives(default_directives(&settings), None);
        assert_eq!(merged[CACHE_PATH_DIRECTIVE], serde_json::Value::Null);
    }
}

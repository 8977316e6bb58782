//! Store configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use jsonc_parser::ParseOptions;
use jsonschema::Validator;
use serde::{Deserialize, Serialize};

use crate::SyncError;

// Embed the schema
const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Result<Validator, String>> = OnceLock::new();

/// Configuration file names, in lookup order.
pub const CONFIG_FILES: [&str; 2] = [".taskline.jsonc", ".taskline.json"];

/// Data location used when the configuration names none.
pub const DEFAULT_DATA_LOCATION: &str = "~/.task";

/// Taskrc location used when the configuration names none.
pub const DEFAULT_TASKRC_LOCATION: &str = "~/.taskrc";

/// Override key holding the ambient context filter.
pub const CONTEXT_KEY: &str = "context";

/// Configuration for the task stores a document may talk to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Settings of the default store.
    #[serde(default)]
    pub default: StoreOverride,

    /// Additional named stores. Each falls back to the default store's
    /// settings for keys it leaves out.
    #[serde(default)]
    pub extra_stores: BTreeMap<String, StoreOverride>,
}

/// Store settings as written in the configuration file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taskrc_location: Option<String>,

    /// Settings applied on top of the taskrc.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, String>,
}

/// Fully resolved settings of one store connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_location: String,
    pub taskrc_location: String,
    pub overrides: BTreeMap<String, String>,
}

impl StoreConfig {
    /// Creates a configuration with no overrides.
    pub fn new(data_location: impl Into<String>, taskrc_location: impl Into<String>) -> Self {
        Self {
            data_location: data_location.into(),
            taskrc_location: taskrc_location.into(),
            overrides: BTreeMap::new(),
        }
    }

    /// Data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        expand_home(&self.data_location)
    }

    /// Taskrc file with `~` expanded.
    pub fn taskrc_path(&self) -> PathBuf {
        expand_home(&self.taskrc_location)
    }

    /// Returns a copy with the ambient context switched off.
    pub fn without_context(mut self) -> Self {
        self.overrides
            .insert(CONTEXT_KEY.to_string(), String::new());
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_LOCATION, DEFAULT_TASKRC_LOCATION)
    }
}

impl SyncConfig {
    /// Creates a configuration with only the default store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the first configuration file present in `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Option<PathBuf> {
        CONFIG_FILES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .find(|path| path.is_file())
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parses configuration from JSON with comments, with schema validation.
    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let value = jsonc_parser::parse_to_serde_value(json, &ParseOptions::default())
            .map_err(|e| SyncError::config(format!("Invalid JSON: {}", e)))?
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        let schema = CONFIG_SCHEMA
            .get_or_init(|| {
                let schema_json: serde_json::Value = serde_json::from_str(SCHEMA_JSON)
                    .map_err(|e| format!("Invalid embedded config schema: {}", e))?;
                Validator::new(&schema_json)
                    .map_err(|e| format!("Invalid config schema compilation: {}", e))
            })
            .as_ref()
            .map_err(SyncError::config)?;

        if let Err(e) = schema.validate(&value) {
            return Err(SyncError::config(format!(
                "Config validation failed: {} at {}",
                e,
                e.instance_path()
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| SyncError::config(format!("Invalid config: {}", e)))
    }

    /// Resolves the default store's settings.
    pub fn default_store(&self) -> StoreConfig {
        let defaults = StoreConfig::default();
        StoreConfig {
            data_location: self
                .default
                .data_location
                .clone()
                .unwrap_or(defaults.data_location),
            taskrc_location: self
                .default
                .taskrc_location
                .clone()
                .unwrap_or(defaults.taskrc_location),
            overrides: self.default.overrides.clone(),
        }
        .without_context()
    }

    /// Resolves every extra store's settings against the default store.
    pub fn extra_store_configs(&self) -> BTreeMap<String, StoreConfig> {
        let base = self.default_store();
        self.extra_stores
            .iter()
            .map(|(name, store)| {
                let mut overrides = base.overrides.clone();
                overrides.extend(store.overrides.clone());
                let config = StoreConfig {
                    data_location: store
                        .data_location
                        .clone()
                        .unwrap_or_else(|| base.data_location.clone()),
                    taskrc_location: store
                        .taskrc_location
                        .clone()
                        .unwrap_or_else(|| base.taskrc_location.clone()),
                    overrides,
                };
                (name.clone(), config.without_context())
            })
            .collect()
    }
}

/// Expands a leading `~` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SyncConfig::from_json("{}").unwrap();
        let store = config.default_store();

        assert_eq!(store.data_location, DEFAULT_DATA_LOCATION);
        assert_eq!(store.taskrc_location, DEFAULT_TASKRC_LOCATION);
        assert_eq!(store.overrides.get(CONTEXT_KEY).map(String::as_str), Some(""));
        assert!(config.extra_store_configs().is_empty());
    }

    #[test]
    fn test_blank_input_is_empty_config() {
        let config = SyncConfig::from_json("// nothing here\n").unwrap();
        assert_eq!(config, SyncConfig::new());
    }

    #[test]
    fn test_extra_stores_fall_back_to_default() {
        let json = r#"{
            // comments are allowed
            "default": {
                "data_location": "/data/main",
                "overrides": { "color": "off" }
            },
            "extra_stores": {
                "work": { "data_location": "/data/work", "overrides": { "verbose": "no" } },
            }
        }"#;

        let config = SyncConfig::from_json(json).unwrap();
        let extra = config.extra_store_configs();
        let work = &extra["work"];

        assert_eq!(work.data_location, "/data/work");
        assert_eq!(work.taskrc_location, DEFAULT_TASKRC_LOCATION);
        assert_eq!(work.overrides.get("color").map(String::as_str), Some("off"));
        assert_eq!(work.overrides.get("verbose").map(String::as_str), Some("no"));
        assert_eq!(work.overrides.get(CONTEXT_KEY).map(String::as_str), Some(""));
    }

    #[test]
    fn test_context_override_is_forced_off() {
        let json = r#"{ "default": { "overrides": { "context": "home" } } }"#;
        let store = SyncConfig::from_json(json).unwrap().default_store();
        assert_eq!(store.overrides.get(CONTEXT_KEY).map(String::as_str), Some(""));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("~user/x"), PathBuf::from("~user/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.task"), home.join(".task"));
            assert_eq!(expand_home("~"), home);
        }
    }

    #[test]
    fn test_discover_prefers_jsonc() {
        let dir = tempdir().unwrap();
        assert_eq!(SyncConfig::discover(dir.path()), None);

        fs::write(dir.path().join(".taskline.json"), "{}").unwrap();
        assert_eq!(
            SyncConfig::discover(dir.path()),
            Some(dir.path().join(".taskline.json"))
        );

        fs::write(dir.path().join(".taskline.jsonc"), "{}").unwrap();
        assert_eq!(
            SyncConfig::discover(dir.path()),
            Some(dir.path().join(".taskline.jsonc"))
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".taskline.jsonc");
        fs::write(&path, r#"{ "extra_stores": { "home": {} } }"#).unwrap();

        let config = SyncConfig::from_file(&path).unwrap();
        assert!(config.extra_stores.contains_key("home"));

        let missing = SyncConfig::from_file(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(SyncError::Configuration(_))));
    }

    #[rstest]
    #[case::unknown_property(r#"{ "stores": {} }"#, "Config validation failed")]
    #[case::type_mismatch(
        r#"{ "default": { "data_location": 3 } }"#,
        "Config validation failed"
    )]
    #[case::bad_store_name(
        r#"{ "extra_stores": { "has space": {} } }"#,
        "Config validation failed"
    )]
    #[case::non_string_override(
        r#"{ "default": { "overrides": { "color": false } } }"#,
        "Config validation failed"
    )]
    #[case::syntax(r#"{ "default": "#, "Invalid JSON")]
    fn test_config_validation_errors(#[case] json: &str, #[case] expected_error_part: &str) {
        let result = SyncConfig::from_json(json);
        assert!(result.is_err(), "Expected error for JSON: {}", json);
        let err = result.unwrap_err();
        assert!(
            err.to_string().contains(expected_error_part),
            "Error message '{}' should contain '{}'",
            err,
            expected_error_part
        );
    }
}

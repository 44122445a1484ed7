use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;

/// Synthesis configuration loaded from `.typesynth.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Deepest allowed run of directly nested arrays (`T[][]` is depth 2).
    pub max_array_depth: usize,
    /// Largest `maxItems` an array schema may declare. `None` disables the check.
    pub max_items: Option<u64>,
    /// Suffix for arrays promoted to named declarations (`PetArr`).
    pub array_suffix: String,
    /// Extra identifiers that generated type names must not use verbatim.
    pub reserved_words: Vec<String>,
    /// Resolve operation parameter, body and response schemas as well.
    pub include_operations: bool,
    pub naming: NamingConfig,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            max_array_depth: 8,
            max_items: None,
            array_suffix: "Arr".to_string(),
            reserved_words: Vec::new(),
            include_operations: true,
            naming: NamingConfig::default(),
        }
    }
}

/// Operation naming strategy and aliases.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    /// Map from resolved operation name (operationId or route-derived) to custom alias.
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            strategy: NamingStrategy::UseOperationId,
            aliases: IndexMap::new(),
        }
    }
}

/// How operation names are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    UseOperationId,
    UseRouteBased,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".typesynth.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<SynthConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: SynthConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# typesynth configuration
max_array_depth: 8        # deepest T[][]... allowed before a schema fails
# max_items: 10000        # reject arrays declaring a larger maxItems
array_suffix: Arr         # PetArr for arrays promoted to named types
reserved_words: []        # extra names generated types must avoid
include_operations: true  # also synthesize parameter/body/response types

naming:
  strategy: use_operation_id  # use_operation_id | use_route_based
  aliases: {}
    # createChatCompletion: chat     # operationId → custom name
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SynthConfig::default();
        assert_eq!(config.max_array_depth, 8);
        assert_eq!(config.max_items, None);
        assert_eq!(config.array_suffix, "Arr");
        assert!(config.include_operations);
        assert_eq!(config.naming.strategy, NamingStrategy::UseOperationId);
        assert!(config.naming.aliases.is_empty());
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
max_array_depth: 3
max_items: 500
array_suffix: List
reserved_words: [Client, Request]
include_operations: false
naming:
  strategy: use_route_based
  aliases:
    createChatCompletion: chat
"#;
        let config: SynthConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.max_array_depth, 3);
        assert_eq!(config.max_items, Some(500));
        assert_eq!(config.array_suffix, "List");
        assert_eq!(config.reserved_words, vec!["Client", "Request"]);
        assert!(!config.include_operations);
        assert_eq!(config.naming.strategy, NamingStrategy::UseRouteBased);
        assert_eq!(config.naming.aliases["createChatCompletion"], "chat");
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config: SynthConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.max_array_depth, 8);
        assert_eq!(config.array_suffix, "Arr");
        assert!(config.include_operations);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "max_array_depth: 2\n").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.max_array_depth, 2);
        assert_eq!(config.array_suffix, "Arr");
    }

    #[test]
    fn test_load_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "max_array_depth: [not, a, number]\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }
}

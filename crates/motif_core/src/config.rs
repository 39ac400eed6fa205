//! Configuration for the pattern library

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, Result};
use crate::index::DEFAULT_LOAD_CONCURRENCY;
use crate::suggest::{DEFAULT_MIN_RELEVANCE, DEFAULT_SUGGESTION_LIMIT};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotifConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub suggest: SuggestConfig,
}

/// Where pattern documents live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the store. Relative paths are resolved against the
    /// directory of the config file they were read from.
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("motif")
                .join("patterns"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Maximum documents read at once during an index build
    #[serde(default = "default_load_concurrency")]
    pub load_concurrency: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            load_concurrency: DEFAULT_LOAD_CONCURRENCY,
        }
    }
}

fn default_load_concurrency() -> usize {
    DEFAULT_LOAD_CONCURRENCY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SUGGESTION_LIMIT,
            min_relevance: DEFAULT_MIN_RELEVANCE,
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_SUGGESTION_LIMIT
}

fn default_min_relevance() -> f64 {
    DEFAULT_MIN_RELEVANCE
}

impl MotifConfig {
    /// Check value ranges that serde cannot express
    pub fn check(&self) -> std::result::Result<(), ConfigError> {
        if self.index.load_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "index.load_concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.suggest.limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "suggest.limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.suggest.min_relevance) {
            return Err(ConfigError::InvalidValue {
                field: "suggest.min_relevance".to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }
        Ok(())
    }

    pub async fn load() -> Result<Self> {
        load_config_from_standard_locations().await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        load_config(path).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        save_config(self, path).await
    }
}

/// Resolve a path relative to a base directory
/// If the path is absolute, return it as-is
fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<MotifConfig> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: path.display().to_string(),
                field: "file".to_string(),
                expected: "readable TOML file".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;

    let mut config: MotifConfig =
        toml::from_str(&content).map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "content".to_string(),
            expected: "valid TOML configuration".to_string(),
            cause: ConfigError::TomlParse(e.to_string()),
        })?;

    if let Err(cause) = config.check() {
        let field = match &cause {
            ConfigError::InvalidValue { field, .. } => field.clone(),
            _ => "content".to_string(),
        };
        return Err(CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field,
            expected: "value in the allowed range".to_string(),
            cause,
        });
    }

    let base_dir = path.parent().unwrap_or(Path::new("."));
    config.store.root = resolve_path(base_dir, &config.store.root);

    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Save configuration to a TOML file
pub async fn save_config(config: &MotifConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: parent.display().to_string(),
                field: "directory".to_string(),
                expected: "writable directory".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "serialization".to_string(),
        expected: "serializable config structure".to_string(),
        cause: ConfigError::TomlSerialize(e.to_string()),
    })?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "writable file location".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    Ok(())
}

/// Standard config file locations, in lookup order
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("motif.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("motif").join("config.toml"));
    }
    paths
}

/// Where `motif config init` writes by default
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("motif")
        .join("config.toml")
}

/// Load the first config found in [`config_paths`], or the defaults
pub async fn load_config_from_standard_locations() -> Result<MotifConfig> {
    for path in config_paths() {
        if path.exists() {
            return load_config(&path).await;
        }
    }

    tracing::debug!("No config file found, using defaults");
    Ok(MotifConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_engine_defaults() {
        let config = MotifConfig::default();
        assert_eq!(config.suggest.limit, 5);
        assert_eq!(config.suggest.min_relevance, 0.3);
        assert_eq!(config.index.load_concurrency, DEFAULT_LOAD_CONCURRENCY);
        assert!(config.check().is_ok());
    }

    #[tokio::test]
    async fn partial_file_fills_in_defaults_and_resolves_root() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("motif.toml");
        tokio::fs::write(&path, "[store]\nroot = \"patterns\"\n\n[suggest]\nlimit = 8\n")
            .await
            .unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.store.root, dir.path().join("patterns"));
        assert_eq!(config.suggest.limit, 8);
        assert_eq!(config.suggest.min_relevance, 0.3);
        assert_eq!(config.index, IndexConfig::default());
    }

    #[tokio::test]
    async fn save_then_load_keeps_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = MotifConfig::default();
        config.store.root = dir.path().join("store");
        config.index.load_concurrency = 4;

        save_config(&config, &path).await.unwrap();
        assert_eq!(load_config(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn bad_files_are_configuration_errors() {
        let dir = TempDir::new().unwrap();

        let missing = load_config(&dir.path().join("absent.toml")).await.unwrap_err();
        assert!(matches!(
            missing,
            CoreError::ConfigurationError { ref field, .. } if field == "file"
        ));

        let path = dir.path().join("motif.toml");
        tokio::fs::write(&path, "[suggest]\nmin_relevance = 1.5\n")
            .await
            .unwrap();
        let out_of_range = load_config(&path).await.unwrap_err();
        assert!(matches!(
            out_of_range,
            CoreError::ConfigurationError { ref field, .. } if field == "suggest.min_relevance"
        ));

        tokio::fs::write(&path, "[store\n").await.unwrap();
        let unparseable = load_config(&path).await.unwrap_err();
        assert!(matches!(
            unparseable,
            CoreError::ConfigurationError {
                cause: ConfigError::TomlParse(_),
                ..
            }
        ));
    }
}

use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tracing::debug;

use crate::common::error::ConformError;
use crate::common::result::{ConformResult, ResultExt};
use crate::domain::entities::multi_repository_config::MultiRepositoryConfig;
use crate::domain::entities::repository_config::RepositoryConfig;

/// Key whose presence marks a multi-repository document
const REPOSITORIES_KEY: &str = "repositories";

/// A desired-state document in either supported shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedConfig {
    /// One repository described at the top level
    Single(RepositoryConfig),

    /// `version` / `defaults` / `repositories`
    Multi(MultiRepositoryConfig),
}

impl LoadedConfig {
    /// Wrap a single config as a one-entry multi config so callers have one code path
    pub fn into_multi(self) -> MultiRepositoryConfig {
        match self {
            LoadedConfig::Single(config) => MultiRepositoryConfig::from_single(config),
            LoadedConfig::Multi(config) => config,
        }
    }

    /// Whether the document used the multi-repository shape
    pub fn is_multi(&self) -> bool {
        matches!(self, LoadedConfig::Multi(_))
    }
}

/// Loads desired-state YAML documents
#[derive(Debug, Clone, Default)]
pub struct ConfigStore;

impl ConfigStore {
    /// Create a new config store
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a desired-state file
    pub async fn load<P: AsRef<Path>>(&self, config_path: P) -> ConformResult<LoadedConfig> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Err(ConformError::config_error(
                format!("Config file not found: {}", config_path.display()),
                Some(config_path.to_path_buf()),
            ));
        }

        let content = async_fs::read_to_string(config_path)
            .await
            .with_filesystem_error(
                format!("Failed to read {}", config_path.display()),
                Some(config_path.to_path_buf()),
            )?;

        debug!("Loaded {} bytes from {}", content.len(), config_path.display());
        self.parse(&content, Some(config_path.to_path_buf()))
    }

    /// Parse a desired-state document from a string
    pub fn parse_str(&self, content: &str) -> ConformResult<LoadedConfig> {
        self.parse(content, None)
    }

    fn parse(&self, content: &str, path: Option<PathBuf>) -> ConformResult<LoadedConfig> {
        let document: Value =
            serde_yaml::from_str(content).with_config_error("YAML parsing failed", path.clone())?;

        let mapping = match &document {
            Value::Mapping(mapping) => mapping,
            Value::Null => {
                return Err(ConformError::config_error("Config document is empty", path))
            }
            _ => {
                return Err(ConformError::config_error(
                    "Config document must be a mapping",
                    path,
                ))
            }
        };

        if mapping.contains_key(REPOSITORIES_KEY) {
            let config: MultiRepositoryConfig = serde_yaml::from_value(document)
                .with_config_error("Invalid multi-repository config", path)?;
            Ok(LoadedConfig::Multi(config))
        } else {
            let config: RepositoryConfig = serde_yaml::from_value(document)
                .with_config_error("Invalid repository config", path)?;
            Ok(LoadedConfig::Single(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::permission::Permission;
    use tempfile::TempDir;

    const MULTI: &str = r#"
version: "1"
defaults:
  private: true
  teams:
    - team: platform
      permission: write
repositories:
  - name: api
  - name: web
    private: false
"#;

    #[tokio::test]
    async fn test_load_multi_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("repos.yml");
        std::fs::write(&config_path, MULTI).unwrap();

        let loaded = ConfigStore::new().load(&config_path).await.unwrap();
        assert!(loaded.is_multi());

        let multi = loaded.into_multi();
        assert_eq!(multi.names(), vec!["api", "web"]);
        let web = multi.resolve(&multi.repositories[1]);
        assert_eq!(web.private, Some(false));
        assert_eq!(web.teams.unwrap()[0].permission, Permission::Write);
    }

    #[tokio::test]
    async fn test_load_single_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("svc.yml");
        std::fs::write(&config_path, "name: svc\ndescription: Service\n").unwrap();

        let loaded = ConfigStore::new().load(&config_path).await.unwrap();
        assert!(!loaded.is_multi());

        let multi = loaded.into_multi();
        assert_eq!(multi.repositories.len(), 1);
        assert_eq!(multi.repositories[0].description.as_deref(), Some("Service"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigStore::new()
            .load(temp_dir.path().join("missing.yml"))
            .await;
        assert!(matches!(result, Err(ConformError::ConfigError { .. })));
    }

    #[test]
    fn test_single_without_name_still_parses() {
        let loaded = ConfigStore::new().parse_str("private: true\n").unwrap();
        match loaded {
            LoadedConfig::Single(config) => assert_eq!(config.name, ""),
            other => panic!("Expected single config, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_mapping_and_unknown_keys() {
        let store = ConfigStore::new();
        assert!(store.parse_str("- name: svc\n").is_err());
        assert!(store.parse_str("").is_err());

        let error = store
            .parse_str("repositories:\n  - name: svc\n    owner: acme\n")
            .unwrap_err();
        assert!(matches!(error, ConformError::ConfigError { .. }));
    }
}

//! 設定ファイル読み込みの統合テスト
//!
//! ファイルから読み込んだ設定を既定値の適用と検証まで通す

mod common;

use common::ConfigFile;
use pretty_assertions::assert_eq;
use repoconf::application::use_cases::reconcile_repositories::MultiRepositoryReconciler;
use repoconf::domain::value_objects::permission::Permission;
use repoconf::infrastructure::{ConfigStore, LoadedConfig};
use repoconf::ConformError;

const MULTI: &str = r#"version: "1"
defaults:
  private: true
  topics: [internal]
  collaborators:
    - username: alice
      permission: read
repositories:
  - name: api
    description: Public API
    private: false
  - name: web
    collaborators:
      - username: bob
        permission: admin
    webhooks:
      - url: https://hooks.example.com/web
        events: [push]
"#;

#[tokio::test]
async fn test_load_multi_file_applies_defaults() {
    let file = ConfigFile::new(MULTI);
    let loaded = ConfigStore::new().load(&file.path).await.unwrap();
    assert!(loaded.is_multi());

    let config = loaded.into_multi();
    let entries = config.select(None).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].private, Some(false));
    assert_eq!(entries[0].topics, Some(vec!["internal".to_string()]));
    assert_eq!(entries[0].collaborators.as_ref().unwrap()[0].username, "alice");

    // Lists replace the default wholesale.
    let web_collaborators = entries[1].collaborators.as_ref().unwrap();
    assert_eq!(web_collaborators.len(), 1);
    assert_eq!(web_collaborators[0].permission, Permission::Admin);
    assert!(entries[1].webhooks.as_ref().unwrap()[0].active);
}

#[tokio::test]
async fn test_load_single_file() {
    let file = ConfigFile::new("name: svc\nprivate: true\n");
    let loaded = ConfigStore::new().load(&file.path).await.unwrap();

    match &loaded {
        LoadedConfig::Single(config) => assert_eq!(config.name, "svc"),
        other => panic!("expected single config, got {:?}", other),
    }
    assert_eq!(loaded.into_multi().names(), vec!["svc"]);
}

#[tokio::test]
async fn test_missing_file_is_configuration_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let error = ConfigStore::new()
        .load(dir.path().join("absent.yml"))
        .await
        .unwrap_err();
    assert!(matches!(error, ConformError::ConfigError { .. }));
}

#[tokio::test]
async fn test_unknown_field_is_rejected() {
    let file = ConfigFile::new("name: svc\nvisibility: private\n");
    let error = ConfigStore::new().load(&file.path).await.unwrap_err();
    assert!(matches!(error, ConformError::ConfigError { .. }));
}

#[tokio::test]
async fn test_loaded_file_validates_offline() {
    let file = ConfigFile::new(
        r#"repositories:
  - name: api
    branch_protection:
      - pattern: main
        required_reviews: 9
  - name: web
"#,
    );
    let config = ConfigStore::new()
        .load(&file.path)
        .await
        .unwrap()
        .into_multi();

    let outcome = MultiRepositoryReconciler::offline("acme")
        .validate_all(&config, None, false)
        .await
        .unwrap();

    assert_eq!(outcome.result.valid, vec!["web"]);
    assert_eq!(
        outcome.result.invalid["api"][0].field,
        "branch_protection[0].required_reviews"
    );
    assert!(outcome.error.is_some());
}

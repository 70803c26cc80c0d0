//! Common test utilities and fixtures
//!
//! Shared desired-state builders, seeded in-memory backends and
//! temporary YAML files used across the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

use repoconf::domain::entities::multi_repository_config::{
    MultiRepositoryConfig, RepositoryDefaults,
};
use repoconf::domain::entities::observed_state::ObservedState;
use repoconf::domain::entities::repository_config::{
    BranchProtection, Collaborator, RepositoryConfig, RepositorySettings, TeamAccess, Webhook,
};
use repoconf::infrastructure::{InMemoryRepositoryApi, RepoRef};

pub const OWNER: &str = "acme";

pub fn repo(name: &str) -> RepoRef {
    RepoRef::new(OWNER, name)
}

/// Desired state exercising every managed resource kind
pub fn full_config(name: &str) -> RepositoryConfig {
    RepositoryConfig::new(name)
        .with_description("Service")
        .with_private(true)
        .with_topics(["rust", "api"])
        .with_branch_protection(vec![BranchProtection::new("main")
            .with_required_reviews(2)
            .with_status_checks(["ci"])])
        .with_collaborators(vec![Collaborator::new("alice", "write")])
        .with_teams(vec![TeamAccess::new("platform", "read")])
        .with_webhooks(vec![Webhook::new(
            "https://hooks.example.com/ci",
            ["push", "pull_request"],
        )])
}

/// Multi-repository file with shared private/topic defaults
pub fn multi_config(names: &[&str]) -> MultiRepositoryConfig {
    let defaults = RepositoryDefaults {
        private: Some(true),
        topics: Some(vec!["internal".to_string()]),
        ..Default::default()
    };
    MultiRepositoryConfig::new(names.iter().map(|n| RepositoryConfig::new(*n)).collect())
        .with_defaults(defaults)
}

/// Hosted repository with the given visibility and nothing else configured
pub fn hosted(private: bool) -> ObservedState {
    ObservedState::existing(RepositorySettings {
        private,
        ..Default::default()
    })
}

/// Backend that knows the users and teams used by [`full_config`]
pub fn backend() -> InMemoryRepositoryApi {
    InMemoryRepositoryApi::new()
        .with_user("alice")
        .with_team(OWNER, "platform")
}

/// Temporary directory holding one YAML file
pub struct ConfigFile {
    _dir: TempDir,
    pub path: PathBuf,
}

impl ConfigFile {
    pub fn new(content: &str) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("repos.yml");
        std::fs::write(&path, content).expect("write config");
        Self { _dir: dir, path }
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().expect("utf-8 path")
    }
}

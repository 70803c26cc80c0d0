use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::application::use_cases::reconcile_repositories::MultiRepositoryReconciler;
use crate::domain::entities::multi_repository_config::MultiRepositoryConfig;
use crate::infrastructure::filesystem::config_store::ConfigStore;
use crate::infrastructure::github::api::RepositoryApi;
use crate::infrastructure::github::client::{ClientConfig, GitHubClient};

/// Connection settings shared by every command
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub owner: Option<String>,
    pub token: Option<String>,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl ConnectionOptions {
    fn api(&self, token: &str) -> Result<Arc<dyn RepositoryApi>> {
        let config = ClientConfig::new(token)
            .with_api_url(&self.api_url)
            .with_timeout_secs(self.timeout_secs);
        let client = GitHubClient::new(&config).context("Failed to create GitHub client")?;
        Ok(Arc::new(client))
    }

    /// Reconciler that talks to the hosting API; owner and token are required
    pub fn reconciler(&self) -> Result<MultiRepositoryReconciler> {
        let owner = self
            .owner
            .as_deref()
            .ok_or_else(|| anyhow!("--owner (or REPOCONF_OWNER) is required"))?;
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("--token (or GITHUB_TOKEN) is required"))?;
        Ok(MultiRepositoryReconciler::new(self.api(token)?, owner))
    }

    /// Reconciler limited to offline validation
    pub fn offline_reconciler(&self) -> MultiRepositoryReconciler {
        MultiRepositoryReconciler::offline(self.owner.clone().unwrap_or_default())
    }

    /// Reconciler using the API when both owner and token are available
    pub fn reconciler_if_available(&self) -> Result<MultiRepositoryReconciler> {
        match (&self.owner, &self.token) {
            (Some(owner), Some(token)) => {
                Ok(MultiRepositoryReconciler::new(self.api(token)?, owner))
            }
            _ => Ok(self.offline_reconciler()),
        }
    }
}

/// Load a desired-state file in either shape
pub async fn load_config(file: &str) -> Result<MultiRepositoryConfig> {
    let loaded = ConfigStore::new()
        .load(Path::new(file))
        .await
        .with_context(|| format!("Failed to load {}", file))?;
    Ok(loaded.into_multi())
}

/// Repository filter from `--only`
pub fn filter(only: &[String]) -> Option<&[String]> {
    if only.is_empty() {
        None
    } else {
        Some(only)
    }
}

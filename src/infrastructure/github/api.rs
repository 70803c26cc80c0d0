//! Repository hosting API seam.
//!
//! The reconciler only talks to the hosting service through [`RepositoryApi`].
//! Implementations own transport concerns (timeouts, rate limits, retries);
//! the reconciler surfaces their errors immediately with repository context.
//!
//! Absent resources are expressed as `Ok(None)` or empty lists, never as an
//! error, so that "not there yet" stays a normal diff input.

use crate::domain::entities::repository_config::{
    BranchProtection, Collaborator, RepositorySettings, TeamAccess, Webhook,
};
use crate::domain::value_objects::permission::Permission;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Errors from hosting API operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The resource or endpoint was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The credential is missing or was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The credential lacks the permission for this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// The API answered with an unexpected status.
    #[error("API error: {status} - {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request could not be built from the given resource.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Owner/repository pair identifying a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    /// Organization or user that owns the repository
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Read/write operations the reconciler needs from the hosting service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    /// Read repository metadata; `None` when the repository does not exist.
    async fn get_repository(&self, repo: &RepoRef) -> Result<Option<RepositorySettings>, ApiError>;

    /// Create a repository with the given settings.
    async fn create_repository(
        &self,
        repo: &RepoRef,
        settings: &RepositorySettings,
    ) -> Result<(), ApiError>;

    /// Overwrite repository metadata.
    async fn update_repository(
        &self,
        repo: &RepoRef,
        settings: &RepositorySettings,
    ) -> Result<(), ApiError>;

    /// List every branch protection rule of the repository.
    async fn list_branch_protections(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<BranchProtection>, ApiError>;

    /// Create or replace the protection rule for `rule.pattern`.
    async fn set_branch_protection(
        &self,
        repo: &RepoRef,
        rule: &BranchProtection,
    ) -> Result<(), ApiError>;

    /// Remove the protection rule for a pattern.
    async fn delete_branch_protection(&self, repo: &RepoRef, pattern: &str)
        -> Result<(), ApiError>;

    /// List direct collaborators.
    async fn list_collaborators(&self, repo: &RepoRef) -> Result<Vec<Collaborator>, ApiError>;

    /// Grant or change a collaborator's permission.
    async fn set_collaborator(
        &self,
        repo: &RepoRef,
        collaborator: &Collaborator,
    ) -> Result<(), ApiError>;

    /// Revoke a collaborator's access.
    async fn remove_collaborator(&self, repo: &RepoRef, username: &str) -> Result<(), ApiError>;

    /// List team access grants.
    async fn list_teams(&self, repo: &RepoRef) -> Result<Vec<TeamAccess>, ApiError>;

    /// Grant or change a team's permission.
    async fn set_team_access(&self, repo: &RepoRef, team: &TeamAccess) -> Result<(), ApiError>;

    /// Revoke a team's access.
    async fn remove_team_access(&self, repo: &RepoRef, team: &str) -> Result<(), ApiError>;

    /// List webhooks; observed hooks carry their `id`.
    async fn list_webhooks(&self, repo: &RepoRef) -> Result<Vec<Webhook>, ApiError>;

    /// Create a webhook.
    async fn create_webhook(&self, repo: &RepoRef, hook: &Webhook) -> Result<(), ApiError>;

    /// Update an existing webhook in place.
    async fn update_webhook(
        &self,
        repo: &RepoRef,
        existing: &Webhook,
        desired: &Webhook,
    ) -> Result<(), ApiError>;

    /// Delete an existing webhook.
    async fn delete_webhook(&self, repo: &RepoRef, existing: &Webhook) -> Result<(), ApiError>;

    /// Whether a user account exists.
    async fn user_exists(&self, username: &str) -> Result<bool, ApiError>;

    /// Whether a team exists in the organization.
    async fn team_exists(&self, org: &str, slug: &str) -> Result<bool, ApiError>;

    /// Permission of the acting credential on the repository; `None` when the
    /// repository does not exist.
    async fn viewer_permission(&self, repo: &RepoRef) -> Result<Option<Permission>, ApiError>;

    /// Whether the acting credential may create repositories in the organization.
    async fn can_create_repository(&self, org: &str) -> Result<bool, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_display() {
        assert_eq!(RepoRef::new("acme", "svc").to_string(), "acme/svc");
    }

    #[test]
    fn test_api_error_display() {
        let error = ApiError::Status {
            status: 422,
            message: "Validation Failed".to_string(),
        };
        assert_eq!(error.to_string(), "API error: 422 - Validation Failed");
        assert_eq!(ApiError::RateLimited.to_string(), "rate limited");
    }
}

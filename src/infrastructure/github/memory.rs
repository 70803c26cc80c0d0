//! In-memory hosting API for deterministic testing.
//!
//! Stores repositories as [`ObservedState`] values keyed by `owner/repo`,
//! records every call, and can be told to fail a given operation (optionally
//! for one repository only) to exercise error paths.
//!
//! # Example
//!
//! ```
//! use repoconf::infrastructure::github::api::{RepoRef, RepositoryApi};
//! use repoconf::infrastructure::github::memory::InMemoryRepositoryApi;
//! use repoconf::domain::entities::repository_config::Collaborator;
//!
//! # tokio_test::block_on(async {
//! let api = InMemoryRepositoryApi::new().with_user("alice");
//! let repo = RepoRef::new("acme", "svc");
//!
//! api.create_repository(&repo, &Default::default()).await.unwrap();
//! api.set_collaborator(&repo, &Collaborator::new("alice", "write")).await.unwrap();
//!
//! let collaborators = api.list_collaborators(&repo).await.unwrap();
//! assert_eq!(collaborators.len(), 1);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::api::{ApiError, RepoRef, RepositoryApi};
use crate::domain::entities::observed_state::ObservedState;
use crate::domain::entities::repository_config::{
    BranchProtection, Collaborator, RepositorySettings, TeamAccess, Webhook,
};
use crate::domain::value_objects::permission::Permission;

/// API operations that can be recorded or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetRepository,
    CreateRepository,
    UpdateRepository,
    ListBranchProtections,
    SetBranchProtection,
    DeleteBranchProtection,
    ListCollaborators,
    SetCollaborator,
    RemoveCollaborator,
    ListTeams,
    SetTeamAccess,
    RemoveTeamAccess,
    ListWebhooks,
    CreateWebhook,
    UpdateWebhook,
    DeleteWebhook,
    UserExists,
    TeamExists,
    ViewerPermission,
    CanCreateRepository,
}

impl Operation {
    /// Whether the operation mutates hosted state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Operation::CreateRepository
                | Operation::UpdateRepository
                | Operation::SetBranchProtection
                | Operation::DeleteBranchProtection
                | Operation::SetCollaborator
                | Operation::RemoveCollaborator
                | Operation::SetTeamAccess
                | Operation::RemoveTeamAccess
                | Operation::CreateWebhook
                | Operation::UpdateWebhook
                | Operation::DeleteWebhook
        )
    }
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOperation {
    pub operation: Operation,
    /// `owner/repo` for repository calls, the looked-up name otherwise.
    pub target: String,
    /// Resource key for keyed writes (pattern, username, slug, url).
    pub key: Option<String>,
}

#[derive(Debug, Clone)]
struct Failure {
    operation: Operation,
    repository: Option<String>,
    error: ApiError,
}

#[derive(Debug)]
struct Inner {
    repositories: BTreeMap<String, ObservedState>,
    users: HashSet<String>,
    teams: HashSet<(String, String)>,
    viewer_permissions: HashMap<String, Permission>,
    can_create: bool,
    next_hook_id: u64,
    failures: Vec<Failure>,
    operations: Vec<RecordedOperation>,
}

/// In-memory [`RepositoryApi`].
///
/// Thread-safe via internal `Arc<Mutex<...>>`; clones share state.
#[derive(Debug, Clone)]
pub struct InMemoryRepositoryApi {
    inner: Arc<Mutex<Inner>>,
}

impl Default for InMemoryRepositoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepositoryApi {
    /// Create an empty API where the acting credential is an admin
    /// everywhere and may create repositories.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                repositories: BTreeMap::new(),
                users: HashSet::new(),
                teams: HashSet::new(),
                viewer_permissions: HashMap::new(),
                can_create: true,
                next_hook_id: 1,
                failures: Vec::new(),
                operations: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a hosted repository.
    pub fn with_repository(self, repo: &RepoRef, mut state: ObservedState) -> Self {
        {
            let mut inner = self.state();
            for hook in state.webhooks.iter_mut() {
                if hook.id.is_none() {
                    hook.id = Some(inner.next_hook_id);
                    inner.next_hook_id += 1;
                }
            }
            inner.repositories.insert(repo.to_string(), state);
        }
        self
    }

    /// Register an existing user account.
    pub fn with_user(self, username: &str) -> Self {
        self.state().users.insert(username.to_lowercase());
        self
    }

    /// Register an existing team.
    pub fn with_team(self, org: &str, slug: &str) -> Self {
        self.state()
            .teams
            .insert((org.to_lowercase(), slug.to_lowercase()));
        self
    }

    /// Override the acting credential's permission on one repository.
    pub fn with_viewer_permission(self, repo: &RepoRef, permission: Permission) -> Self {
        self.state()
            .viewer_permissions
            .insert(repo.to_string(), permission);
        self
    }

    /// Set whether the acting credential may create repositories.
    pub fn with_create_permission(self, allowed: bool) -> Self {
        self.state().can_create = allowed;
        self
    }

    /// Fail every call of `operation` with `error`.
    pub fn fail_on(self, operation: Operation, error: ApiError) -> Self {
        self.state().failures.push(Failure {
            operation,
            repository: None,
            error,
        });
        self
    }

    /// Fail `operation` only for the named repository.
    pub fn fail_on_repository(self, repository: &str, operation: Operation, error: ApiError) -> Self {
        self.state().failures.push(Failure {
            operation,
            repository: Some(repository.to_string()),
            error,
        });
        self
    }

    /// Clear every configured failure.
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// All recorded calls in order.
    pub fn operations(&self) -> Vec<RecordedOperation> {
        self.state().operations.clone()
    }

    /// Recorded calls that mutate hosted state.
    pub fn writes(&self) -> Vec<RecordedOperation> {
        self.state()
            .operations
            .iter()
            .filter(|op| op.operation.is_write())
            .cloned()
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    /// Snapshot of a hosted repository.
    pub fn repository(&self, repo: &RepoRef) -> Option<ObservedState> {
        self.state().repositories.get(&repo.to_string()).cloned()
    }

    fn begin(
        &self,
        operation: Operation,
        repo: Option<&RepoRef>,
        target: String,
        key: Option<&str>,
    ) -> Result<MutexGuard<'_, Inner>, ApiError> {
        let mut inner = self.state();
        inner.operations.push(RecordedOperation {
            operation,
            target,
            key: key.map(str::to_string),
        });

        let injected = inner
            .failures
            .iter()
            .find(|failure| {
                failure.operation == operation
                    && match (&failure.repository, repo) {
                        (None, _) => true,
                        (Some(name), Some(repo)) => name == &repo.repo,
                        (Some(_), None) => false,
                    }
            })
            .map(|failure| failure.error.clone());
        match injected {
            Some(error) => Err(error),
            None => Ok(inner),
        }
    }

    fn begin_repo(
        &self,
        operation: Operation,
        repo: &RepoRef,
        key: Option<&str>,
    ) -> Result<MutexGuard<'_, Inner>, ApiError> {
        self.begin(operation, Some(repo), repo.to_string(), key)
    }
}

fn hosted<'a>(inner: &'a mut Inner, repo: &RepoRef) -> Result<&'a mut ObservedState, ApiError> {
    inner
        .repositories
        .get_mut(&repo.to_string())
        .ok_or_else(|| ApiError::NotFound(format!("repository {}", repo)))
}

fn upsert<T, F>(items: &mut Vec<T>, item: T, same: F)
where
    F: Fn(&T) -> bool,
{
    match items.iter_mut().find(|existing| same(existing)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

#[async_trait]
impl RepositoryApi for InMemoryRepositoryApi {
    async fn get_repository(&self, repo: &RepoRef) -> Result<Option<RepositorySettings>, ApiError> {
        let inner = self.begin_repo(Operation::GetRepository, repo, None)?;
        Ok(inner
            .repositories
            .get(&repo.to_string())
            .and_then(|state| state.settings.clone()))
    }

    async fn create_repository(
        &self,
        repo: &RepoRef,
        settings: &RepositorySettings,
    ) -> Result<(), ApiError> {
        let mut inner = self.begin_repo(Operation::CreateRepository, repo, None)?;
        if inner.repositories.contains_key(&repo.to_string()) {
            return Err(ApiError::Status {
                status: 422,
                message: format!("repository {} already exists", repo),
            });
        }
        inner
            .repositories
            .insert(repo.to_string(), ObservedState::existing(settings.clone()));
        Ok(())
    }

    async fn update_repository(
        &self,
        repo: &RepoRef,
        settings: &RepositorySettings,
    ) -> Result<(), ApiError> {
        let mut inner = self.begin_repo(Operation::UpdateRepository, repo, None)?;
        hosted(&mut inner, repo)?.settings = Some(settings.clone());
        Ok(())
    }

    async fn list_branch_protections(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<BranchProtection>, ApiError> {
        let mut inner = self.begin_repo(Operation::ListBranchProtections, repo, None)?;
        Ok(hosted(&mut inner, repo)?.branch_protection.clone())
    }

    async fn set_branch_protection(
        &self,
        repo: &RepoRef,
        rule: &BranchProtection,
    ) -> Result<(), ApiError> {
        let mut inner =
            self.begin_repo(Operation::SetBranchProtection, repo, Some(&rule.pattern))?;
        let state = hosted(&mut inner, repo)?;
        upsert(&mut state.branch_protection, rule.clone(), |r| {
            r.pattern == rule.pattern
        });
        Ok(())
    }

    async fn delete_branch_protection(
        &self,
        repo: &RepoRef,
        pattern: &str,
    ) -> Result<(), ApiError> {
        let mut inner = self.begin_repo(Operation::DeleteBranchProtection, repo, Some(pattern))?;
        let state = hosted(&mut inner, repo)?;
        let before = state.branch_protection.len();
        state.branch_protection.retain(|r| r.pattern != pattern);
        if state.branch_protection.len() == before {
            return Err(ApiError::NotFound(format!("branch protection {}", pattern)));
        }
        Ok(())
    }

    async fn list_collaborators(&self, repo: &RepoRef) -> Result<Vec<Collaborator>, ApiError> {
        let mut inner = self.begin_repo(Operation::ListCollaborators, repo, None)?;
        Ok(hosted(&mut inner, repo)?.collaborators.clone())
    }

    async fn set_collaborator(
        &self,
        repo: &RepoRef,
        collaborator: &Collaborator,
    ) -> Result<(), ApiError> {
        let mut inner =
            self.begin_repo(Operation::SetCollaborator, repo, Some(&collaborator.username))?;
        let state = hosted(&mut inner, repo)?;
        upsert(&mut state.collaborators, collaborator.clone(), |c| {
            c.username.eq_ignore_ascii_case(&collaborator.username)
        });
        Ok(())
    }

    async fn remove_collaborator(&self, repo: &RepoRef, username: &str) -> Result<(), ApiError> {
        let mut inner = self.begin_repo(Operation::RemoveCollaborator, repo, Some(username))?;
        hosted(&mut inner, repo)?
            .collaborators
            .retain(|c| !c.username.eq_ignore_ascii_case(username));
        Ok(())
    }

    async fn list_teams(&self, repo: &RepoRef) -> Result<Vec<TeamAccess>, ApiError> {
        let mut inner = self.begin_repo(Operation::ListTeams, repo, None)?;
        Ok(hosted(&mut inner, repo)?.teams.clone())
    }

    async fn set_team_access(&self, repo: &RepoRef, team: &TeamAccess) -> Result<(), ApiError> {
        let mut inner = self.begin_repo(Operation::SetTeamAccess, repo, Some(&team.team))?;
        let state = hosted(&mut inner, repo)?;
        upsert(&mut state.teams, team.clone(), |t| {
            t.team.eq_ignore_ascii_case(&team.team)
        });
        Ok(())
    }

    async fn remove_team_access(&self, repo: &RepoRef, team: &str) -> Result<(), ApiError> {
        let mut inner = self.begin_repo(Operation::RemoveTeamAccess, repo, Some(team))?;
        hosted(&mut inner, repo)?
            .teams
            .retain(|t| !t.team.eq_ignore_ascii_case(team));
        Ok(())
    }

    async fn list_webhooks(&self, repo: &RepoRef) -> Result<Vec<Webhook>, ApiError> {
        let mut inner = self.begin_repo(Operation::ListWebhooks, repo, None)?;
        Ok(hosted(&mut inner, repo)?.webhooks.clone())
    }

    async fn create_webhook(&self, repo: &RepoRef, hook: &Webhook) -> Result<(), ApiError> {
        let mut inner = self.begin_repo(Operation::CreateWebhook, repo, Some(&hook.url))?;
        let id = inner.next_hook_id;
        inner.next_hook_id += 1;
        hosted(&mut inner, repo)?
            .webhooks
            .push(hook.clone().with_id(id));
        Ok(())
    }

    async fn update_webhook(
        &self,
        repo: &RepoRef,
        existing: &Webhook,
        desired: &Webhook,
    ) -> Result<(), ApiError> {
        let id = existing
            .id
            .ok_or_else(|| ApiError::InvalidRequest(format!("webhook {} has no id", existing.url)))?;
        let mut inner = self.begin_repo(Operation::UpdateWebhook, repo, Some(&existing.url))?;
        let state = hosted(&mut inner, repo)?;
        let hook = state
            .webhooks
            .iter_mut()
            .find(|h| h.id == Some(id))
            .ok_or_else(|| ApiError::NotFound(format!("webhook {}", id)))?;
        *hook = desired.clone().with_id(id);
        Ok(())
    }

    async fn delete_webhook(&self, repo: &RepoRef, existing: &Webhook) -> Result<(), ApiError> {
        let id = existing
            .id
            .ok_or_else(|| ApiError::InvalidRequest(format!("webhook {} has no id", existing.url)))?;
        let mut inner = self.begin_repo(Operation::DeleteWebhook, repo, Some(&existing.url))?;
        let state = hosted(&mut inner, repo)?;
        let before = state.webhooks.len();
        state.webhooks.retain(|h| h.id != Some(id));
        if state.webhooks.len() == before {
            return Err(ApiError::NotFound(format!("webhook {}", id)));
        }
        Ok(())
    }

    async fn user_exists(&self, username: &str) -> Result<bool, ApiError> {
        let inner = self.begin(Operation::UserExists, None, username.to_string(), None)?;
        Ok(inner.users.contains(&username.to_lowercase()))
    }

    async fn team_exists(&self, org: &str, slug: &str) -> Result<bool, ApiError> {
        let inner = self.begin(Operation::TeamExists, None, format!("{}/{}", org, slug), None)?;
        Ok(inner
            .teams
            .contains(&(org.to_lowercase(), slug.to_lowercase())))
    }

    async fn viewer_permission(&self, repo: &RepoRef) -> Result<Option<Permission>, ApiError> {
        let inner = self.begin_repo(Operation::ViewerPermission, repo, None)?;
        let key = repo.to_string();
        if !inner.repositories.contains_key(&key) {
            return Ok(None);
        }
        Ok(Some(
            inner
                .viewer_permissions
                .get(&key)
                .cloned()
                .unwrap_or(Permission::Admin),
        ))
    }

    async fn can_create_repository(&self, org: &str) -> Result<bool, ApiError> {
        let inner = self.begin(Operation::CanCreateRepository, None, org.to_string(), None)?;
        Ok(inner.can_create)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::permission::Permission;

    fn svc() -> RepoRef {
        RepoRef::new("acme", "svc")
    }

    #[tokio::test]
    async fn test_missing_repository_is_none() {
        let api = InMemoryRepositoryApi::new();
        assert_eq!(api.get_repository(&svc()).await.unwrap(), None);
        assert_eq!(api.viewer_permission(&svc()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_twice_is_rejected() {
        let api = InMemoryRepositoryApi::new();
        api.create_repository(&svc(), &RepositorySettings::default())
            .await
            .unwrap();
        let result = api
            .create_repository(&svc(), &RepositorySettings::default())
            .await;
        assert!(matches!(result, Err(ApiError::Status { status: 422, .. })));
    }

    #[tokio::test]
    async fn test_set_collaborator_replaces_case_insensitively() {
        let api = InMemoryRepositoryApi::new()
            .with_repository(&svc(), ObservedState::existing(RepositorySettings::default()));

        api.set_collaborator(&svc(), &Collaborator::new("Alice", "read"))
            .await
            .unwrap();
        api.set_collaborator(&svc(), &Collaborator::new("alice", "admin"))
            .await
            .unwrap();

        let collaborators = api.list_collaborators(&svc()).await.unwrap();
        assert_eq!(collaborators.len(), 1);
        assert_eq!(collaborators[0].permission, Permission::Admin);
    }

    #[tokio::test]
    async fn test_webhooks_get_ids() {
        let mut state = ObservedState::existing(RepositorySettings::default());
        state.webhooks = vec![Webhook::new("https://a.example.com", ["push"])];
        let api = InMemoryRepositoryApi::new().with_repository(&svc(), state);

        api.create_webhook(&svc(), &Webhook::new("https://b.example.com", ["push"]))
            .await
            .unwrap();

        let hooks = api.list_webhooks(&svc()).await.unwrap();
        assert_eq!(hooks[0].id, Some(1));
        assert_eq!(hooks[1].id, Some(2));

        api.delete_webhook(&svc(), &hooks[0]).await.unwrap();
        assert_eq!(api.list_webhooks(&svc()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_webhook_requires_id() {
        let api = InMemoryRepositoryApi::new()
            .with_repository(&svc(), ObservedState::existing(RepositorySettings::default()));
        let hook = Webhook::new("https://a.example.com", ["push"]);
        let result = api.update_webhook(&svc(), &hook, &hook).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_failure_scoped_to_repository() {
        let other = RepoRef::new("acme", "other");
        let api = InMemoryRepositoryApi::new().fail_on_repository(
            "svc",
            Operation::GetRepository,
            ApiError::RateLimited,
        );

        assert_eq!(
            api.get_repository(&svc()).await,
            Err(ApiError::RateLimited)
        );
        assert_eq!(api.get_repository(&other).await, Ok(None));

        api.clear_failures();
        assert_eq!(api.get_repository(&svc()).await, Ok(None));
    }

    #[tokio::test]
    async fn test_operations_are_recorded() {
        let api = InMemoryRepositoryApi::new()
            .with_user("alice")
            .with_team("acme", "platform");

        assert!(api.user_exists("ALICE").await.unwrap());
        assert!(!api.user_exists("bob").await.unwrap());
        assert!(api.team_exists("acme", "platform").await.unwrap());

        let operations = api.operations();
        assert_eq!(operations.len(), 3);
        assert_eq!(operations[0].operation, Operation::UserExists);
        assert_eq!(operations[2].target, "acme/platform");
        assert!(api.writes().is_empty());
    }
}

//! GitHub REST v3 implementation of [`RepositoryApi`].
//!
//! One request per trait call (plus pagination). Timeouts come from
//! [`ClientConfig`]; there is no retry. Status codes are mapped onto
//! [`ApiError`] and a 404 on a read becomes "absent".
//!
//! Push restrictions are flattened into one actor list: users are plain
//! logins, teams are written `team:<slug>` and apps `app:<slug>`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::api::{ApiError, RepoRef, RepositoryApi};
use crate::domain::entities::repository_config::{
    BranchProtection, Collaborator, Features, RepositorySettings, TeamAccess, Webhook,
};
use crate::domain::value_objects::permission::Permission;

/// Default GitHub API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT_VALUE: &str = concat!("repoconf/", env!("CARGO_PKG_VERSION"));
const PAGE_SIZE: usize = 100;
const TEAM_PREFIX: &str = "team:";
const APP_PREFIX: &str = "app:";

/// Connection settings for [`GitHubClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// API base URL (e.g. `https://github.example.com/api/v3` for Enterprise)
    pub api_url: String,
    /// Bearer token
    pub token: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

// Keep the token out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// GitHub REST client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: Url,
}

impl GitHubClient {
    /// Build a client from connection settings.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut api_base = Url::parse(&config.api_url)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid API URL: {}", e)))?;
        // Url::join drops the last segment unless the base ends with a slash.
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ApiError::InvalidRequest("token contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT_VALUE)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { client, api_base })
    }

    /// Build an endpoint URL; every segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("API URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn repo_endpoint(&self, repo: &RepoRef, rest: &[&str]) -> Result<Url, ApiError> {
        let mut segments = vec!["repos", repo.owner.as_str(), repo.repo.as_str()];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<GitHubErrorResponse>()
            .await
            .map(|e| e.message)
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(map_status(status, message))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, ApiError> {
        match self.get_json(url).await {
            Ok(value) => Ok(Some(value)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_paged<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let per_page = PAGE_SIZE.to_string();
        for page in 1.. {
            let mut page_url = url.clone();
            {
                let mut pairs = page_url.query_pairs_mut();
                for (key, value) in query {
                    pairs.append_pair(key, value);
                }
                pairs
                    .append_pair("per_page", &per_page)
                    .append_pair("page", &page.to_string());
            }
            let batch: Vec<T> = self.get_json(page_url).await?;
            let done = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<(), ApiError> {
        debug!("{} {}", method, url);
        self.send(self.client.request(method, url).json(body))
            .await
            .map(|_| ())
    }

    async fn delete(&self, url: Url) -> Result<(), ApiError> {
        debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await.map(|_| ())
    }

    async fn put_topics(&self, repo: &RepoRef, topics: &[String]) -> Result<(), ApiError> {
        let url = self.repo_endpoint(repo, &["topics"])?;
        self.send_json(Method::PUT, url, &json!({ "names": topics }))
            .await
    }

    async fn pending_invitation(
        &self,
        repo: &RepoRef,
        username: &str,
    ) -> Result<Option<GitHubInvitation>, ApiError> {
        let invitations: Vec<GitHubInvitation> = self
            .get_paged(self.repo_endpoint(repo, &["invitations"])?, &[])
            .await?;
        Ok(invitations.into_iter().find(|inv| inv.is_for(username)))
    }

    async fn authenticated_login(&self) -> Result<String, ApiError> {
        let user: GitHubUser = self.get_json(self.endpoint(&["user"])?).await?;
        Ok(user.login)
    }
}

/// Map an unsuccessful status onto [`ApiError`].
fn map_status(status: StatusCode, message: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
        StatusCode::FORBIDDEN if message.to_lowercase().contains("rate limit") => {
            ApiError::RateLimited
        }
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Default, Deserialize)]
struct GitHubPermissions {
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    maintain: bool,
    #[serde(default)]
    push: bool,
    #[serde(default)]
    triage: bool,
    #[serde(default)]
    pull: bool,
}

impl GitHubPermissions {
    fn highest(&self) -> Option<Permission> {
        if self.admin {
            Some(Permission::Admin)
        } else if self.maintain {
            Some(Permission::Other("maintain".to_string()))
        } else if self.push {
            Some(Permission::Write)
        } else if self.triage {
            Some(Permission::Other("triage".to_string()))
        } else if self.pull {
            Some(Permission::Read)
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
struct GitHubRepository {
    description: Option<String>,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    has_issues: bool,
    #[serde(default)]
    has_wiki: bool,
    #[serde(default)]
    has_projects: bool,
    #[serde(default)]
    has_discussions: bool,
    permissions: Option<GitHubPermissions>,
}

impl From<GitHubRepository> for RepositorySettings {
    fn from(repo: GitHubRepository) -> Self {
        RepositorySettings {
            description: repo.description.unwrap_or_default(),
            private: repo.private,
            topics: repo.topics,
            features: Features {
                has_issues: repo.has_issues,
                has_wiki: repo.has_wiki,
                has_projects: repo.has_projects,
                has_discussions: repo.has_discussions,
            },
        }
    }
}

fn repository_body(settings: &RepositorySettings) -> serde_json::Value {
    json!({
        "description": settings.description,
        "private": settings.private,
        "has_issues": settings.features.has_issues,
        "has_wiki": settings.features.has_wiki,
        "has_projects": settings.features.has_projects,
        "has_discussions": settings.features.has_discussions,
    })
}

#[derive(Deserialize)]
struct GitHubBranch {
    name: String,
}

#[derive(Deserialize)]
struct GitHubLogin {
    login: String,
}

#[derive(Deserialize)]
struct GitHubSlug {
    slug: String,
}

#[derive(Deserialize)]
struct GitHubReviewRules {
    #[serde(default)]
    required_approving_review_count: u32,
    #[serde(default)]
    dismiss_stale_reviews: bool,
    #[serde(default)]
    require_code_owner_reviews: bool,
}

#[derive(Deserialize)]
struct GitHubStatusChecks {
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    contexts: Vec<String>,
}

#[derive(Deserialize)]
struct GitHubRestrictions {
    #[serde(default)]
    users: Vec<GitHubLogin>,
    #[serde(default)]
    teams: Vec<GitHubSlug>,
    #[serde(default)]
    apps: Vec<GitHubSlug>,
}

#[derive(Deserialize)]
struct GitHubProtection {
    required_pull_request_reviews: Option<GitHubReviewRules>,
    required_status_checks: Option<GitHubStatusChecks>,
    restrictions: Option<GitHubRestrictions>,
}

impl GitHubProtection {
    fn into_rule(self, pattern: &str) -> BranchProtection {
        let mut rule = BranchProtection::new(pattern);
        if let Some(reviews) = self.required_pull_request_reviews {
            rule.required_reviews = reviews.required_approving_review_count;
            rule.dismiss_stale_reviews = reviews.dismiss_stale_reviews;
            rule.require_code_owner_review = reviews.require_code_owner_reviews;
        }
        if let Some(checks) = self.required_status_checks {
            rule.require_up_to_date = checks.strict;
            rule.required_status_checks = checks.contexts;
        }
        if let Some(restrictions) = self.restrictions {
            rule.restrict_pushes = restrictions
                .users
                .into_iter()
                .map(|u| u.login)
                .chain(
                    restrictions
                        .teams
                        .into_iter()
                        .map(|t| format!("{}{}", TEAM_PREFIX, t.slug)),
                )
                .chain(
                    restrictions
                        .apps
                        .into_iter()
                        .map(|a| format!("{}{}", APP_PREFIX, a.slug)),
                )
                .collect();
        }
        rule
    }
}

/// Request body for `PUT /repos/{owner}/{repo}/branches/{branch}/protection`.
///
/// Sections at their zero value are sent as `null` so that reading the rule
/// back yields the same [`BranchProtection`].
fn protection_body(rule: &BranchProtection) -> serde_json::Value {
    let status_checks = if rule.required_status_checks.is_empty() && !rule.require_up_to_date {
        serde_json::Value::Null
    } else {
        json!({
            "strict": rule.require_up_to_date,
            "contexts": rule.required_status_checks,
        })
    };

    let reviews = if rule.required_reviews == 0
        && !rule.dismiss_stale_reviews
        && !rule.require_code_owner_review
    {
        serde_json::Value::Null
    } else {
        json!({
            "required_approving_review_count": rule.required_reviews,
            "dismiss_stale_reviews": rule.dismiss_stale_reviews,
            "require_code_owner_reviews": rule.require_code_owner_review,
        })
    };

    let restrictions = if rule.restrict_pushes.is_empty() {
        serde_json::Value::Null
    } else {
        let mut users = Vec::new();
        let mut teams = Vec::new();
        let mut apps = Vec::new();
        for actor in &rule.restrict_pushes {
            if let Some(slug) = actor.strip_prefix(TEAM_PREFIX) {
                teams.push(slug);
            } else if let Some(slug) = actor.strip_prefix(APP_PREFIX) {
                apps.push(slug);
            } else {
                users.push(actor.as_str());
            }
        }
        json!({ "users": users, "teams": teams, "apps": apps })
    };

    json!({
        "required_status_checks": status_checks,
        "enforce_admins": serde_json::Value::Null,
        "required_pull_request_reviews": reviews,
        "restrictions": restrictions,
    })
}

#[derive(Deserialize)]
struct GitHubCollaborator {
    login: String,
    role_name: Option<String>,
    #[serde(default)]
    permissions: GitHubPermissions,
}

impl GitHubCollaborator {
    fn into_collaborator(self) -> Option<Collaborator> {
        let permission = match self.role_name {
            Some(role) => Permission::from(role),
            None => self.permissions.highest()?,
        };
        Some(Collaborator::new(self.login, permission))
    }
}

/// A pending collaborator invitation.
///
/// Inviting a user who is not yet a collaborator creates one of these, and
/// direct-affiliation listings omit them until accepted.
#[derive(Deserialize)]
struct GitHubInvitation {
    id: u64,
    invitee: Option<GitHubLogin>,
    permissions: String,
}

impl GitHubInvitation {
    fn is_for(&self, username: &str) -> bool {
        self.invitee
            .as_ref()
            .map_or(false, |invitee| invitee.login.eq_ignore_ascii_case(username))
    }
}

/// Append invited users that are not collaborators yet.
fn with_invitations(
    mut collaborators: Vec<Collaborator>,
    invitations: Vec<GitHubInvitation>,
) -> Vec<Collaborator> {
    for invitation in invitations {
        let Some(invitee) = invitation.invitee else {
            continue;
        };
        let known = collaborators
            .iter()
            .any(|c| c.username.eq_ignore_ascii_case(&invitee.login));
        if !known {
            collaborators.push(Collaborator::new(invitee.login, invitation.permissions));
        }
    }
    collaborators
}

#[derive(Deserialize)]
struct GitHubTeam {
    slug: String,
    permission: String,
}

#[derive(Deserialize)]
struct GitHubHookConfig {
    url: Option<String>,
}

#[derive(Deserialize)]
struct GitHubHook {
    id: u64,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    events: Vec<String>,
    config: GitHubHookConfig,
}

fn hook_body(hook: &Webhook) -> serde_json::Value {
    json!({
        "name": "web",
        "active": hook.active,
        "events": hook.events,
        "config": { "url": hook.url, "content_type": "json" },
    })
}

#[derive(Deserialize)]
struct GitHubMembership {
    role: String,
    state: String,
}

#[derive(Deserialize)]
struct GitHubOrganization {
    members_can_create_repositories: Option<bool>,
}

#[async_trait]
impl RepositoryApi for GitHubClient {
    async fn get_repository(&self, repo: &RepoRef) -> Result<Option<RepositorySettings>, ApiError> {
        let found: Option<GitHubRepository> = self.get_optional(self.repo_endpoint(repo, &[])?).await?;
        Ok(found.map(RepositorySettings::from))
    }

    async fn create_repository(
        &self,
        repo: &RepoRef,
        settings: &RepositorySettings,
    ) -> Result<(), ApiError> {
        let mut body = repository_body(settings);
        body["name"] = json!(repo.repo);

        let url = if self.authenticated_login().await?.eq_ignore_ascii_case(&repo.owner) {
            self.endpoint(&["user", "repos"])?
        } else {
            self.endpoint(&["orgs", &repo.owner, "repos"])?
        };
        self.send_json(Method::POST, url, &body).await?;

        if !settings.topics.is_empty() {
            self.put_topics(repo, &settings.topics).await?;
        }
        Ok(())
    }

    async fn update_repository(
        &self,
        repo: &RepoRef,
        settings: &RepositorySettings,
    ) -> Result<(), ApiError> {
        let url = self.repo_endpoint(repo, &[])?;
        self.send_json(Method::PATCH, url, &repository_body(settings))
            .await?;
        self.put_topics(repo, &settings.topics).await
    }

    async fn list_branch_protections(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<BranchProtection>, ApiError> {
        let branches: Vec<GitHubBranch> = self
            .get_paged(self.repo_endpoint(repo, &["branches"])?, &[("protected", "true")])
            .await?;

        let mut rules = Vec::with_capacity(branches.len());
        for branch in branches {
            let url = self.repo_endpoint(repo, &["branches", &branch.name, "protection"])?;
            // Branches protected only by rulesets have no classic protection.
            if let Some(protection) = self.get_optional::<GitHubProtection>(url).await? {
                rules.push(protection.into_rule(&branch.name));
            }
        }
        Ok(rules)
    }

    async fn set_branch_protection(
        &self,
        repo: &RepoRef,
        rule: &BranchProtection,
    ) -> Result<(), ApiError> {
        let url = self.repo_endpoint(repo, &["branches", &rule.pattern, "protection"])?;
        self.send_json(Method::PUT, url, &protection_body(rule)).await
    }

    async fn delete_branch_protection(
        &self,
        repo: &RepoRef,
        pattern: &str,
    ) -> Result<(), ApiError> {
        self.delete(self.repo_endpoint(repo, &["branches", pattern, "protection"])?)
            .await
    }

    async fn list_collaborators(&self, repo: &RepoRef) -> Result<Vec<Collaborator>, ApiError> {
        let collaborators: Vec<GitHubCollaborator> = self
            .get_paged(
                self.repo_endpoint(repo, &["collaborators"])?,
                &[("affiliation", "direct")],
            )
            .await?;
        let invitations: Vec<GitHubInvitation> = self
            .get_paged(self.repo_endpoint(repo, &["invitations"])?, &[])
            .await?;
        let collaborators = collaborators
            .into_iter()
            .filter_map(GitHubCollaborator::into_collaborator)
            .collect();
        Ok(with_invitations(collaborators, invitations))
    }

    async fn set_collaborator(
        &self,
        repo: &RepoRef,
        collaborator: &Collaborator,
    ) -> Result<(), ApiError> {
        if let Some(invitation) = self.pending_invitation(repo, &collaborator.username).await? {
            let url = self.repo_endpoint(repo, &["invitations", &invitation.id.to_string()])?;
            return self
                .send_json(
                    Method::PATCH,
                    url,
                    &json!({ "permissions": collaborator.permission.to_string() }),
                )
                .await;
        }
        let url = self.repo_endpoint(repo, &["collaborators", &collaborator.username])?;
        self.send_json(
            Method::PUT,
            url,
            &json!({ "permission": collaborator.permission.api_name() }),
        )
        .await
    }

    async fn remove_collaborator(&self, repo: &RepoRef, username: &str) -> Result<(), ApiError> {
        if let Some(invitation) = self.pending_invitation(repo, username).await? {
            let url = self.repo_endpoint(repo, &["invitations", &invitation.id.to_string()])?;
            return self.delete(url).await;
        }
        self.delete(self.repo_endpoint(repo, &["collaborators", username])?)
            .await
    }

    async fn list_teams(&self, repo: &RepoRef) -> Result<Vec<TeamAccess>, ApiError> {
        let teams: Vec<GitHubTeam> = self
            .get_paged(self.repo_endpoint(repo, &["teams"])?, &[])
            .await?;
        Ok(teams
            .into_iter()
            .map(|t| TeamAccess::new(t.slug, t.permission))
            .collect())
    }

    async fn set_team_access(&self, repo: &RepoRef, team: &TeamAccess) -> Result<(), ApiError> {
        let url = self.endpoint(&[
            "orgs",
            &repo.owner,
            "teams",
            &team.team,
            "repos",
            &repo.owner,
            &repo.repo,
        ])?;
        self.send_json(
            Method::PUT,
            url,
            &json!({ "permission": team.permission.api_name() }),
        )
        .await
    }

    async fn remove_team_access(&self, repo: &RepoRef, team: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&[
            "orgs",
            &repo.owner,
            "teams",
            team,
            "repos",
            &repo.owner,
            &repo.repo,
        ])?;
        self.delete(url).await
    }

    async fn list_webhooks(&self, repo: &RepoRef) -> Result<Vec<Webhook>, ApiError> {
        let hooks: Vec<GitHubHook> = self
            .get_paged(self.repo_endpoint(repo, &["hooks"])?, &[])
            .await?;
        Ok(hooks
            .into_iter()
            .filter_map(|hook| {
                let url = hook.config.url?;
                Some(
                    Webhook::new(url, hook.events)
                        .with_active(hook.active)
                        .with_id(hook.id),
                )
            })
            .collect())
    }

    async fn create_webhook(&self, repo: &RepoRef, hook: &Webhook) -> Result<(), ApiError> {
        let url = self.repo_endpoint(repo, &["hooks"])?;
        self.send_json(Method::POST, url, &hook_body(hook)).await
    }

    async fn update_webhook(
        &self,
        repo: &RepoRef,
        existing: &Webhook,
        desired: &Webhook,
    ) -> Result<(), ApiError> {
        let id = hook_id(existing)?;
        let url = self.repo_endpoint(repo, &["hooks", &id])?;
        self.send_json(Method::PATCH, url, &hook_body(desired)).await
    }

    async fn delete_webhook(&self, repo: &RepoRef, existing: &Webhook) -> Result<(), ApiError> {
        let id = hook_id(existing)?;
        self.delete(self.repo_endpoint(repo, &["hooks", &id])?).await
    }

    async fn user_exists(&self, username: &str) -> Result<bool, ApiError> {
        let user: Option<GitHubUser> = self.get_optional(self.endpoint(&["users", username])?).await?;
        Ok(user.is_some())
    }

    async fn team_exists(&self, org: &str, slug: &str) -> Result<bool, ApiError> {
        let team: Option<GitHubSlug> = self
            .get_optional(self.endpoint(&["orgs", org, "teams", slug])?)
            .await?;
        Ok(team.is_some())
    }

    async fn viewer_permission(&self, repo: &RepoRef) -> Result<Option<Permission>, ApiError> {
        let found: Option<GitHubRepository> = self.get_optional(self.repo_endpoint(repo, &[])?).await?;
        Ok(found.map(|repo| {
            repo.permissions
                .and_then(|p| p.highest())
                .unwrap_or(Permission::Read)
        }))
    }

    async fn can_create_repository(&self, org: &str) -> Result<bool, ApiError> {
        let membership: Option<GitHubMembership> = self
            .get_optional(self.endpoint(&["user", "memberships", "orgs", org])?)
            .await?;

        match membership {
            Some(m) if m.state != "active" => Ok(false),
            Some(m) if m.role == "admin" => Ok(true),
            Some(_) => {
                let organization: GitHubOrganization =
                    self.get_json(self.endpoint(&["orgs", org])?).await?;
                Ok(organization.members_can_create_repositories.unwrap_or(true))
            }
            // Not an organization member: only the account itself may create.
            None => Ok(self.authenticated_login().await?.eq_ignore_ascii_case(org)),
        }
    }
}

fn hook_id(hook: &Webhook) -> Result<String, ApiError> {
    hook.id
        .map(|id| id.to_string())
        .ok_or_else(|| ApiError::InvalidRequest(format!("webhook {} has no id", hook.url)))
}

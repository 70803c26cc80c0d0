use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::entities::repository_config::RepositoryConfig;
use crate::domain::entities::validation::{ValidationIssue, ValidationReport};
use crate::domain::value_objects::permission::Permission;
use crate::infrastructure::github::api::{RepoRef, RepositoryApi};

/// オンライン検証の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OnlineValidation {
    /// 検証を実行した
    Completed(ValidationReport),

    /// 認証情報がないなどの理由で実行しなかった（失敗ではない）
    Skipped { reason: String },
}

impl OnlineValidation {
    /// 実行済みならその検証結果
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            OnlineValidation::Completed(report) => Some(report),
            OnlineValidation::Skipped { .. } => None,
        }
    }
}

/// ホスティングAPIを使った検証
///
/// 参照されているユーザー・チームの存在（存在しなければエラー）と、
/// 実行者の権限（不足していれば警告）を確認する。
/// 個々の問い合わせが通信エラーになった場合は警告として記録し、検証は続行する。
pub struct OnlineValidator {
    api: Option<Arc<dyn RepositoryApi>>,
    owner: String,
}

impl OnlineValidator {
    /// APIを使う検証器を作成
    pub fn new(api: Arc<dyn RepositoryApi>, owner: impl Into<String>) -> Self {
        Self {
            api: Some(api),
            owner: owner.into(),
        }
    }

    /// APIなしの検証器を作成（常にSkippedを返す）
    pub fn without_api(owner: impl Into<String>) -> Self {
        Self {
            api: None,
            owner: owner.into(),
        }
    }

    /// 1リポジトリ分の設定をオンライン検証
    pub async fn validate(&self, config: &RepositoryConfig) -> OnlineValidation {
        let api = match &self.api {
            Some(api) => api,
            None => {
                warn!("Skipping online validation of '{}': no credential", config.name);
                return OnlineValidation::Skipped {
                    reason: "no API credential configured".to_string(),
                };
            }
        };

        debug!("Running online validation for {}/{}", self.owner, config.name);
        let mut report = ValidationReport::new();

        if let Some(collaborators) = &config.collaborators {
            for (i, collaborator) in collaborators.iter().enumerate() {
                if collaborator.username.trim().is_empty() {
                    continue;
                }
                let field = format!("collaborators[{}].username", i);
                match api.user_exists(&collaborator.username).await {
                    Ok(true) => {}
                    Ok(false) => report.error(
                        ValidationIssue::new(field, "user does not exist")
                            .with_value(&collaborator.username),
                    ),
                    Err(e) => report.warning(
                        ValidationIssue::new(field, format!("could not verify user: {}", e))
                            .with_value(&collaborator.username),
                    ),
                }
            }
        }

        if let Some(teams) = &config.teams {
            for (i, team) in teams.iter().enumerate() {
                if team.team.trim().is_empty() {
                    continue;
                }
                let field = format!("teams[{}].team", i);
                match api.team_exists(&self.owner, &team.team).await {
                    Ok(true) => {}
                    Ok(false) => report.error(
                        ValidationIssue::new(
                            field,
                            format!("team does not exist in organization '{}'", self.owner),
                        )
                        .with_value(&team.team),
                    ),
                    Err(e) => report.warning(
                        ValidationIssue::new(field, format!("could not verify team: {}", e))
                            .with_value(&team.team),
                    ),
                }
            }
        }

        self.check_access(api.as_ref(), config, &mut report).await;

        OnlineValidation::Completed(report)
    }

    async fn check_access(
        &self,
        api: &dyn RepositoryApi,
        config: &RepositoryConfig,
        report: &mut ValidationReport,
    ) {
        let repo = RepoRef::new(&self.owner, &config.name);
        match api.viewer_permission(&repo).await {
            Ok(Some(Permission::Admin)) => {}
            Ok(Some(permission)) => report.warning(
                ValidationIssue::new(
                    "name",
                    "acting credential lacks admin permission on the repository",
                )
                .with_value(permission.to_string()),
            ),
            Ok(None) => match api.can_create_repository(&self.owner).await {
                Ok(true) => {}
                Ok(false) => report.warning(
                    ValidationIssue::new(
                        "name",
                        format!(
                            "repository does not exist and the acting credential cannot create repositories in '{}'",
                            self.owner
                        ),
                    )
                    .with_value(&config.name),
                ),
                Err(e) => report.warning(ValidationIssue::new(
                    "name",
                    format!("could not verify repository creation permission: {}", e),
                )),
            },
            Err(e) => report.warning(ValidationIssue::new(
                "name",
                format!("could not verify repository permission: {}", e),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::observed_state::ObservedState;
    use crate::domain::entities::repository_config::{Collaborator, RepositorySettings, TeamAccess};
    use crate::infrastructure::github::api::{ApiError, MockRepositoryApi};
    use crate::infrastructure::github::memory::{InMemoryRepositoryApi, Operation};

    fn config() -> RepositoryConfig {
        RepositoryConfig::new("svc")
            .with_collaborators(vec![
                Collaborator::new("alice", "write"),
                Collaborator::new("ghost", "read"),
            ])
            .with_teams(vec![TeamAccess::new("platform", "read")])
    }

    #[tokio::test]
    async fn test_skipped_without_api() {
        let validator = OnlineValidator::without_api("acme");
        let result = validator.validate(&config()).await;
        assert!(matches!(result, OnlineValidation::Skipped { .. }));
        assert!(result.report().is_none());
    }

    #[tokio::test]
    async fn test_missing_user_is_error() {
        let api = InMemoryRepositoryApi::new()
            .with_user("alice")
            .with_team("acme", "platform");
        let validator = OnlineValidator::new(Arc::new(api), "acme");

        let result = validator.validate(&config()).await;
        let report = result.report().unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field, "collaborators[1].username");
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_permission_is_warning() {
        let repo = RepoRef::new("acme", "svc");
        let api = InMemoryRepositoryApi::new()
            .with_user("alice")
            .with_user("ghost")
            .with_team("acme", "platform")
            .with_repository(&repo, ObservedState::existing(RepositorySettings::default()))
            .with_viewer_permission(&repo, Permission::Write);
        let validator = OnlineValidator::new(Arc::new(api), "acme");

        let result = validator.validate(&config()).await;
        let report = result.report().unwrap();

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].value.as_deref(), Some("write"));
    }

    #[tokio::test]
    async fn test_cannot_create_is_warning() {
        let api = InMemoryRepositoryApi::new().with_create_permission(false);
        let validator = OnlineValidator::new(Arc::new(api), "acme");

        let result = validator.validate(&RepositoryConfig::new("svc")).await;
        let report = result.report().unwrap();

        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_warning() {
        let api = InMemoryRepositoryApi::new()
            .with_user("alice")
            .with_user("ghost")
            .fail_on(Operation::TeamExists, ApiError::RateLimited);
        let validator = OnlineValidator::new(Arc::new(api), "acme");

        let result = validator.validate(&config()).await;
        let report = result.report().unwrap();

        assert!(report.is_valid());
        assert_eq!(report.warnings[0].field, "teams[0].team");
        assert!(report.warnings[0].message.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_team_lookup_uses_owner() {
        let mut api = MockRepositoryApi::new();
        api.expect_team_exists()
            .withf(|org, slug| org == "acme" && slug == "platform")
            .times(1)
            .returning(|_, _| Ok(true));
        api.expect_viewer_permission()
            .returning(|_| Ok(Some(Permission::Admin)));
        let validator = OnlineValidator::new(Arc::new(api), "acme");

        let config = RepositoryConfig::new("svc").with_teams(vec![TeamAccess::new("platform", "admin")]);
        let result = validator.validate(&config).await;

        assert_eq!(result, OnlineValidation::Completed(ValidationReport::new()));
    }
}

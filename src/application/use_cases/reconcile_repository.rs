use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::services::config_validator::ConfigValidator;
use crate::domain::entities::observed_state::ObservedState;
use crate::domain::entities::plan::{
    Change, ChangeAction, PlannedChange, ReconciliationPlan, Resource,
};
use crate::domain::entities::repository_config::RepositoryConfig;
use crate::domain::entities::validation::{ValidationIssue, ValidationReport};
use crate::domain::services::diff_engine::compute_plan;
use crate::infrastructure::github::api::{ApiError, RepoRef, RepositoryApi};

/// 単一リポジトリの調整で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("repository '{repository}' has {} configuration error(s)", .errors.len())]
    InvalidConfig {
        repository: String,
        errors: Vec<ValidationIssue>,
    },

    #[error("failed to read {resource} of '{repository}': {source}")]
    Read {
        repository: String,
        resource: String,
        source: ApiError,
    },

    #[error("failed to apply {resource} to '{repository}': {source}")]
    Apply {
        repository: String,
        resource: String,
        source: ApiError,
    },
}

impl ReconcileError {
    /// 対象リポジトリ名
    pub fn repository(&self) -> &str {
        match self {
            ReconcileError::InvalidConfig { repository, .. }
            | ReconcileError::Read { repository, .. }
            | ReconcileError::Apply { repository, .. } => repository,
        }
    }
}

/// 適用済みの1変更
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedChange {
    /// リソースの表示名（例: `collaborator 'alice'`）
    pub resource: String,

    /// 変更の種類
    pub action: ChangeAction,
}

/// 1リポジトリ分の適用結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// 対象リポジトリ名
    pub repository: String,

    /// 適用した変更（適用順）
    pub applied: Vec<AppliedChange>,
}

/// 単一リポジトリのValidate / Plan / Applyを行うユースケース
pub struct RepositoryReconciler {
    api: Arc<dyn RepositoryApi>,
    owner: String,
    validator: ConfigValidator,
}

impl RepositoryReconciler {
    /// 新しいRepositoryReconcilerインスタンスを作成
    pub fn new(api: Arc<dyn RepositoryApi>, owner: impl Into<String>) -> Self {
        Self {
            api,
            owner: owner.into(),
            validator: ConfigValidator::new(),
        }
    }

    fn repo_ref(&self, name: &str) -> RepoRef {
        RepoRef::new(&self.owner, name)
    }

    /// ネットワークを使わない検証
    pub fn validate(&self, config: &RepositoryConfig) -> ValidationReport {
        self.validator.validate(config)
    }

    /// 現在の状態を読み取る
    ///
    /// リポジトリが存在しない場合はメタデータ以外を読み取らない。
    /// 存在する場合は宣言の有無にかかわらず全てのリソース種別を読み取る。
    pub async fn observe(&self, config: &RepositoryConfig) -> Result<ObservedState, ReconcileError> {
        let repo = self.repo_ref(&config.name);
        let read_error = |resource: &str| {
            let repository = config.name.clone();
            let resource = resource.to_string();
            move |source: ApiError| ReconcileError::Read {
                repository,
                resource,
                source,
            }
        };

        let settings = self
            .api
            .get_repository(&repo)
            .await
            .map_err(read_error("repository settings"))?;

        let mut observed = ObservedState {
            settings,
            ..Default::default()
        };
        if !observed.exists() {
            debug!("{} does not exist yet", repo);
            return Ok(observed);
        }

        observed.branch_protection = self
            .api
            .list_branch_protections(&repo)
            .await
            .map_err(read_error("branch protection"))?;
        observed.collaborators = self
            .api
            .list_collaborators(&repo)
            .await
            .map_err(read_error("collaborators"))?;
        observed.teams = self
            .api
            .list_teams(&repo)
            .await
            .map_err(read_error("teams"))?;
        observed.webhooks = self
            .api
            .list_webhooks(&repo)
            .await
            .map_err(read_error("webhooks"))?;

        Ok(observed)
    }

    /// 現在の状態を読み取り、変更計画を作成する
    ///
    /// 設定が不正な場合はネットワークにアクセスせずにエラーを返す。
    pub async fn plan(&self, config: &RepositoryConfig) -> Result<ReconciliationPlan, ReconcileError> {
        let report = self.validate(config);
        if !report.is_valid() {
            return Err(ReconcileError::InvalidConfig {
                repository: config.name.clone(),
                errors: report.errors,
            });
        }

        info!("Planning {}/{}", self.owner, config.name);
        let observed = self.observe(config).await?;
        let plan = compute_plan(config, &observed);

        for destructive in plan.destructive_changes() {
            warn!(
                "{}: destructive change to {}: {}",
                plan.repository, destructive.resource, destructive.reason
            );
        }
        info!(
            "{}: {} change(s), {} destructive",
            plan.repository,
            plan.change_count(),
            plan.destructive_count()
        );
        Ok(plan)
    }

    /// 計画を適用する
    ///
    /// リポジトリ設定、ブランチ保護、コラボレーター、チーム、Webhookの順に、
    /// 各種別内は計画の順で適用する。最初の失敗で停止し、適用済みの変更は戻さない。
    pub async fn apply(&self, plan: &ReconciliationPlan) -> Result<ApplyReport, ReconcileError> {
        let repo = self.repo_ref(&plan.repository);
        let mut report = ApplyReport {
            repository: plan.repository.clone(),
            applied: Vec::new(),
        };

        if plan.is_empty() {
            info!("{} is up to date", repo);
            return Ok(report);
        }
        info!("Applying {} change(s) to {}", plan.change_count(), repo);

        if let Some(planned) = &plan.settings {
            let result = match &planned.change {
                Change::Create { after } => self.api.create_repository(&repo, after).await,
                Change::Update { after, .. } => self.api.update_repository(&repo, after).await,
                Change::Delete { .. } => Err(ApiError::InvalidRequest(
                    "repository deletion is not supported".to_string(),
                )),
            };
            record(&mut report, planned, result)?;
        }

        for planned in &plan.branch_protection {
            let result = match &planned.change {
                Change::Create { after } | Change::Update { after, .. } => {
                    self.api.set_branch_protection(&repo, after).await
                }
                Change::Delete { before } => {
                    self.api
                        .delete_branch_protection(&repo, &before.pattern)
                        .await
                }
            };
            record(&mut report, planned, result)?;
        }

        for planned in &plan.collaborators {
            let result = match &planned.change {
                Change::Create { after } | Change::Update { after, .. } => {
                    self.api.set_collaborator(&repo, after).await
                }
                Change::Delete { before } => {
                    self.api.remove_collaborator(&repo, &before.username).await
                }
            };
            record(&mut report, planned, result)?;
        }

        for planned in &plan.teams {
            let result = match &planned.change {
                Change::Create { after } | Change::Update { after, .. } => {
                    self.api.set_team_access(&repo, after).await
                }
                Change::Delete { before } => self.api.remove_team_access(&repo, &before.team).await,
            };
            record(&mut report, planned, result)?;
        }

        for planned in &plan.webhooks {
            let result = match &planned.change {
                Change::Create { after } => self.api.create_webhook(&repo, after).await,
                Change::Update { before, after } => {
                    self.api.update_webhook(&repo, before, after).await
                }
                Change::Delete { before } => self.api.delete_webhook(&repo, before).await,
            };
            record(&mut report, planned, result)?;
        }

        info!("{}: applied {} change(s)", repo, report.applied.len());
        Ok(report)
    }
}

fn record<T: Resource>(
    report: &mut ApplyReport,
    planned: &PlannedChange<T>,
    result: Result<(), ApiError>,
) -> Result<(), ReconcileError> {
    let resource = planned.change.resource_label();
    match result {
        Ok(()) => {
            debug!(
                "{}: {} {}",
                report.repository,
                planned.change.action(),
                resource
            );
            report.applied.push(AppliedChange {
                resource,
                action: planned.change.action(),
            });
            Ok(())
        }
        Err(source) => Err(ReconcileError::Apply {
            repository: report.repository.clone(),
            resource,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::repository_config::{
        BranchProtection, Collaborator, RepositorySettings, TeamAccess, Webhook,
    };
    use crate::infrastructure::github::api::MockRepositoryApi;
    use crate::infrastructure::github::memory::{InMemoryRepositoryApi, Operation};
    use pretty_assertions::assert_eq;

    fn svc() -> RepoRef {
        RepoRef::new("acme", "svc")
    }

    fn desired() -> RepositoryConfig {
        RepositoryConfig::new("svc")
            .with_description("Service")
            .with_private(true)
            .with_branch_protection(vec![BranchProtection::new("main").with_required_reviews(1)])
            .with_collaborators(vec![Collaborator::new("alice", "write")])
            .with_teams(vec![TeamAccess::new("platform", "read")])
            .with_webhooks(vec![Webhook::new("https://hooks.example.com/ci", ["push"])])
    }

    #[tokio::test]
    async fn test_invalid_config_never_touches_api() {
        // Any API call on the strict mock would panic.
        let reconciler = RepositoryReconciler::new(Arc::new(MockRepositoryApi::new()), "acme");
        let config =
            RepositoryConfig::new("svc").with_collaborators(vec![Collaborator::new("", "read")]);

        let result = reconciler.plan(&config).await;

        assert!(matches!(result, Err(ReconcileError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_plan_for_missing_repository_skips_reads() {
        let api = InMemoryRepositoryApi::new();
        let reconciler = RepositoryReconciler::new(Arc::new(api.clone()), "acme");

        let plan = reconciler.plan(&desired()).await.unwrap();

        assert_eq!(plan.change_count(), 5);
        assert!(matches!(
            plan.settings.as_ref().map(|s| &s.change),
            Some(Change::Create { .. })
        ));
        let operations: Vec<Operation> = api.operations().iter().map(|o| o.operation).collect();
        assert_eq!(operations, vec![Operation::GetRepository]);
    }

    #[tokio::test]
    async fn test_existing_repository_reads_every_kind() {
        let api = InMemoryRepositoryApi::new()
            .with_repository(&svc(), ObservedState::existing(RepositorySettings::default()));
        let reconciler = RepositoryReconciler::new(Arc::new(api.clone()), "acme");
        let config = RepositoryConfig::new("svc").with_collaborators(vec![]);

        reconciler.plan(&config).await.unwrap();

        let operations: Vec<Operation> = api.operations().iter().map(|o| o.operation).collect();
        assert_eq!(
            operations,
            vec![
                Operation::GetRepository,
                Operation::ListBranchProtections,
                Operation::ListCollaborators,
                Operation::ListTeams,
                Operation::ListWebhooks,
            ]
        );
    }

    #[tokio::test]
    async fn test_omitted_webhooks_are_deleted() {
        let mut observed = ObservedState::existing(RepositorySettings::default());
        observed.webhooks = vec![Webhook::new("https://old.example.com/hook", ["push"])];
        let api = InMemoryRepositoryApi::new().with_repository(&svc(), observed);
        let reconciler = RepositoryReconciler::new(Arc::new(api.clone()), "acme");

        let plan = reconciler.plan(&RepositoryConfig::new("svc")).await.unwrap();

        assert_eq!(plan.webhooks.len(), 1);
        assert_eq!(plan.webhooks[0].change.action(), ChangeAction::Delete);
        assert!(plan.webhooks[0].is_destructive());

        reconciler.apply(&plan).await.unwrap();
        assert!(api.repository(&svc()).unwrap().webhooks.is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_is_distinct_from_absent() {
        let api = InMemoryRepositoryApi::new()
            .with_repository(&svc(), ObservedState::existing(RepositorySettings::default()))
            .fail_on(Operation::ListTeams, ApiError::Forbidden("no access".into()));
        let reconciler = RepositoryReconciler::new(Arc::new(api), "acme");

        let error = reconciler.plan(&desired()).await.unwrap_err();

        assert_eq!(
            error,
            ReconcileError::Read {
                repository: "svc".to_string(),
                resource: "teams".to_string(),
                source: ApiError::Forbidden("no access".into()),
            }
        );
    }

    #[tokio::test]
    async fn test_apply_then_plan_is_empty() {
        let api = InMemoryRepositoryApi::new();
        let reconciler = RepositoryReconciler::new(Arc::new(api), "acme");

        let plan = reconciler.plan(&desired()).await.unwrap();
        let report = reconciler.apply(&plan).await.unwrap();
        assert_eq!(report.applied.len(), 5);

        let replan = reconciler.plan(&desired()).await.unwrap();
        assert!(replan.is_empty(), "unexpected changes: {:?}", replan);
    }

    #[tokio::test]
    async fn test_apply_order_and_fail_fast() {
        let mut observed = ObservedState::existing(RepositorySettings::default());
        observed.collaborators = vec![Collaborator::new("bob", "admin")];
        let api = InMemoryRepositoryApi::new()
            .with_repository(&svc(), observed)
            .fail_on(Operation::SetTeamAccess, ApiError::RateLimited);
        let reconciler = RepositoryReconciler::new(Arc::new(api.clone()), "acme");

        let plan = reconciler.plan(&desired()).await.unwrap();
        api.clear_operations();
        let error = reconciler.apply(&plan).await.unwrap_err();

        assert!(matches!(
            &error,
            ReconcileError::Apply { resource, source: ApiError::RateLimited, .. }
                if resource == "team 'platform'"
        ));
        let writes: Vec<Operation> = api.writes().iter().map(|o| o.operation).collect();
        assert_eq!(
            writes,
            vec![
                Operation::UpdateRepository,
                Operation::SetBranchProtection,
                Operation::SetCollaborator,
                Operation::RemoveCollaborator,
                Operation::SetTeamAccess,
            ]
        );
        // Webhooks were never reached and nothing was rolled back.
        let state = api.repository(&svc()).unwrap();
        assert!(state.webhooks.is_empty());
        assert_eq!(state.collaborators, vec![Collaborator::new("alice", "write")]);
    }

    #[tokio::test]
    async fn test_apply_empty_plan_makes_no_calls() {
        let reconciler = RepositoryReconciler::new(Arc::new(MockRepositoryApi::new()), "acme");
        let report = reconciler
            .apply(&ReconciliationPlan::new("svc"))
            .await
            .unwrap();
        assert!(report.applied.is_empty());
    }
}

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use super::reconcile_repository::{ApplyReport, ReconcileError, RepositoryReconciler};
use crate::application::services::config_validator::ConfigValidator;
use crate::application::services::online_validator::{OnlineValidation, OnlineValidator};
use crate::domain::entities::multi_repository_config::MultiRepositoryConfig;
use crate::domain::entities::plan::ReconciliationPlan;
use crate::domain::entities::repository_config::RepositoryConfig;
use crate::domain::entities::validation::{ValidationIssue, ValidationReport};
use crate::infrastructure::github::api::RepositoryApi;

/// 複数リポジトリ処理のエラー
///
/// `Reference` / `EmptyConfiguration` / `ApiUnavailable` はネットワークアクセス前に
/// 処理全体を止める。それ以外は結果と一緒に返される集約エラー。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("unknown repositories requested: {}", .missing.join(", "))]
    Reference { missing: Vec<String> },

    #[error("configuration declares no repositories")]
    EmptyConfiguration,

    #[error("invalid configuration for: {}", join_keys(.invalid))]
    InvalidConfiguration {
        invalid: BTreeMap<String, Vec<ValidationIssue>>,
    },

    #[error("no API credential configured")]
    ApiUnavailable,

    #[error("planning failed for {} of {total} repositories: {}", .failures.len(), join_keys(.failures))]
    PlanFailed {
        failures: BTreeMap<String, ReconcileError>,
        total: usize,
    },

    #[error("{} repositories failed ({}), {} succeeded", .failed.len(), join_keys(.failed), .succeeded.len())]
    PartialFailure {
        succeeded: Vec<String>,
        failed: BTreeMap<String, ReconcileError>,
    },

    #[error("all {} repositories failed: {}", .failed.len(), join_keys(.failed))]
    AllFailed {
        failed: BTreeMap<String, ReconcileError>,
    },
}

fn join_keys<V>(map: &BTreeMap<String, V>) -> String {
    map.keys().cloned().collect::<Vec<_>>().join(", ")
}

fn serialize_errors<S>(errors: &BTreeMap<String, ReconcileError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(errors.iter().map(|(name, e)| (name, e.to_string())))
}

/// 結果と、結果に付随する集約エラー
#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub result: T,
    pub error: Option<BatchError>,
}

impl<T> BatchOutcome<T> {
    fn new(result: T, error: Option<BatchError>) -> Self {
        Self { result, error }
    }

    /// 集約エラーがないかどうか
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// 検証結果の集計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub warnings: usize,
}

/// 複数リポジトリの検証結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MultiRepoValidationResult {
    /// 有効なリポジトリ名（宣言順）
    pub valid: Vec<String>,

    /// 無効なリポジトリ名とそのエラー
    pub invalid: BTreeMap<String, Vec<ValidationIssue>>,

    /// リポジトリごとの検証結果（警告を含む）
    pub details: BTreeMap<String, ValidationReport>,

    /// オンライン検証をスキップした理由
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_skipped: Option<String>,

    pub summary: ValidationSummary,
}

/// 複数リポジトリの計画結果
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanSet {
    /// 作成できた計画（宣言順）
    pub plans: Vec<ReconciliationPlan>,

    /// 計画に失敗したリポジトリ
    #[serde(serialize_with = "serialize_errors")]
    pub failures: BTreeMap<String, ReconcileError>,
}

impl PlanSet {
    /// 全計画の変更数の合計
    pub fn change_count(&self) -> usize {
        self.plans.iter().map(ReconciliationPlan::change_count).sum()
    }

    /// 全計画の破壊的変更数の合計
    pub fn destructive_count(&self) -> usize {
        self.plans
            .iter()
            .map(ReconciliationPlan::destructive_count)
            .sum()
    }
}

/// 適用結果の集計
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
    pub total_changes: usize,
}

/// 複数リポジトリの適用結果
#[derive(Debug, Clone, Default, Serialize)]
pub struct MultiRepoResult {
    /// 変更を適用できたリポジトリ
    pub succeeded: Vec<String>,

    /// 適用に失敗したリポジトリ
    #[serde(serialize_with = "serialize_errors")]
    pub failed: BTreeMap<String, ReconcileError>,

    /// 変更がなかったリポジトリ
    pub skipped: Vec<String>,

    /// 成功したリポジトリの適用内容
    pub reports: Vec<ApplyReport>,

    pub summary: ApplySummary,
}

/// 複数リポジトリのValidate / Plan / Applyを行うユースケース
///
/// リポジトリは宣言順に1つずつ処理し、1つの失敗が残りを止めることはない。
pub struct MultiRepositoryReconciler {
    owner: String,
    api: Option<Arc<dyn RepositoryApi>>,
    validator: ConfigValidator,
}

impl MultiRepositoryReconciler {
    /// APIを使うMultiRepositoryReconcilerを作成
    pub fn new(api: Arc<dyn RepositoryApi>, owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            api: Some(api),
            validator: ConfigValidator::new(),
        }
    }

    /// APIなしのMultiRepositoryReconcilerを作成（オフライン検証のみ可能）
    pub fn offline(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            api: None,
            validator: ConfigValidator::new(),
        }
    }

    fn reconciler(&self) -> Result<RepositoryReconciler, BatchError> {
        self.api
            .as_ref()
            .map(|api| RepositoryReconciler::new(Arc::clone(api), &self.owner))
            .ok_or(BatchError::ApiUnavailable)
    }

    /// フィルターを解決し、既定値を適用したエントリーを返す
    pub fn select(
        &self,
        config: &MultiRepositoryConfig,
        filter: Option<&[String]>,
    ) -> Result<Vec<RepositoryConfig>, BatchError> {
        if config.repositories.is_empty() {
            return Err(BatchError::EmptyConfiguration);
        }
        config
            .select(filter)
            .map_err(|missing| BatchError::Reference { missing })
    }

    /// 全リポジトリを検証する
    ///
    /// 同名のエントリーは2つ目以降の出現ごとに1つのエラーを報告する。
    /// `online` が真でAPIがあれば、オフライン検証を通過したエントリーに
    /// オンライン検証も行う。
    pub async fn validate_all(
        &self,
        config: &MultiRepositoryConfig,
        filter: Option<&[String]>,
        online: bool,
    ) -> Result<BatchOutcome<MultiRepoValidationResult>, BatchError> {
        let entries = self.select(config, filter)?;
        let mut result = MultiRepoValidationResult::default();

        let online_validator = match (&self.api, online) {
            (Some(api), true) => Some(OnlineValidator::new(Arc::clone(api), &self.owner)),
            (None, true) => Some(OnlineValidator::without_api(&self.owner)),
            (_, false) => None,
        };

        let mut order = Vec::new();
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            let name = display_name(entry, index);
            let mut report = self.validator.validate(entry);

            let first_occurrence = seen.insert(name.clone());
            if first_occurrence {
                order.push(name.clone());
            } else {
                report.error(
                    ValidationIssue::new("name", "duplicate repository name")
                        .with_value(&entry.name),
                );
            }

            if let Some(validator) = &online_validator {
                if first_occurrence && report.is_valid() {
                    match validator.validate(entry).await {
                        OnlineValidation::Completed(online_report) => report.merge(online_report),
                        OnlineValidation::Skipped { reason } => {
                            result.online_skipped = Some(reason)
                        }
                    }
                }
            }

            result.details.entry(name).or_default().merge(report);
        }

        for name in order {
            let Some(report) = result.details.get(&name) else {
                continue;
            };
            result.summary.warnings += report.warnings.len();
            if report.is_valid() {
                result.valid.push(name);
            } else {
                result.invalid.insert(name, report.errors.clone());
            }
        }
        result.summary.total = result.details.len();
        result.summary.valid = result.valid.len();
        result.summary.invalid = result.invalid.len();

        info!(
            "Validated {} repositories: {} valid, {} invalid, {} warning(s)",
            result.summary.total,
            result.summary.valid,
            result.summary.invalid,
            result.summary.warnings
        );

        let error = if result.invalid.is_empty() {
            None
        } else {
            Some(BatchError::InvalidConfiguration {
                invalid: result.invalid.clone(),
            })
        };
        Ok(BatchOutcome::new(result, error))
    }

    /// 全リポジトリの計画を作成する
    ///
    /// 設定の不備はネットワークアクセス前にエラーとなる。
    /// 読み取りの失敗は該当リポジトリのみに影響し、残りの計画は続行する。
    pub async fn plan_all(
        &self,
        config: &MultiRepositoryConfig,
        filter: Option<&[String]>,
    ) -> Result<BatchOutcome<PlanSet>, BatchError> {
        let validation = self.validate_all(config, filter, false).await?;
        if let Some(error) = validation.error {
            return Err(error);
        }
        let reconciler = self.reconciler()?;
        let entries = self.select(config, filter)?;

        let mut set = PlanSet::default();
        for entry in &entries {
            match reconciler.plan(entry).await {
                Ok(plan) => set.plans.push(plan),
                Err(e) => {
                    error!("Planning {} failed: {}", entry.name, e);
                    set.failures.insert(entry.name.clone(), e);
                }
            }
        }

        let error = if set.failures.is_empty() {
            None
        } else {
            Some(BatchError::PlanFailed {
                failures: set.failures.clone(),
                total: entries.len(),
            })
        };
        Ok(BatchOutcome::new(set, error))
    }

    /// 計画を順に適用する
    ///
    /// 変更のない計画はスキップとして扱う。成功と失敗が混在すれば
    /// `PartialFailure`、成功が1つもなければ `AllFailed` を返す。
    pub async fn apply_all(
        &self,
        plans: &[ReconciliationPlan],
    ) -> Result<BatchOutcome<MultiRepoResult>, BatchError> {
        let reconciler = self.reconciler()?;
        let mut result = MultiRepoResult::default();

        for plan in plans {
            if plan.is_empty() {
                result.skipped.push(plan.repository.clone());
                continue;
            }
            match reconciler.apply(plan).await {
                Ok(report) => {
                    result.summary.total_changes += report.applied.len();
                    result.succeeded.push(plan.repository.clone());
                    result.reports.push(report);
                }
                Err(e) => {
                    error!("Applying {} failed: {}", plan.repository, e);
                    result.failed.insert(plan.repository.clone(), e);
                }
            }
        }

        result.summary.total = plans.len();
        result.summary.success = result.succeeded.len();
        result.summary.failure = result.failed.len();
        result.summary.skipped = result.skipped.len();

        let error = if result.failed.is_empty() {
            None
        } else if result.succeeded.is_empty() {
            Some(BatchError::AllFailed {
                failed: result.failed.clone(),
            })
        } else {
            Some(BatchError::PartialFailure {
                succeeded: result.succeeded.clone(),
                failed: result.failed.clone(),
            })
        };
        Ok(BatchOutcome::new(result, error))
    }
}

fn display_name(entry: &RepositoryConfig, index: usize) -> String {
    if entry.name.trim().is_empty() {
        format!("<repositories[{}]>", index)
    } else {
        entry.name.clone()
    }
}

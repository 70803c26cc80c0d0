use super::repository_config::{
    BranchProtection, Collaborator, RepositorySettings, TeamAccess, Webhook,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 差分計算・適用の単位となるリソース
pub trait Resource {
    /// リソース種別の表示名
    const KIND: &'static str;

    /// リポジトリ内で一意なキー
    fn key(&self) -> &str;

    /// 突き合わせに用いる正規化済みキー
    fn match_key(&self) -> String {
        self.key().to_string()
    }
}

impl Resource for RepositorySettings {
    const KIND: &'static str = "repository settings";

    fn key(&self) -> &str {
        "settings"
    }
}

impl Resource for BranchProtection {
    const KIND: &'static str = "branch protection";

    fn key(&self) -> &str {
        &self.pattern
    }
}

impl Resource for Collaborator {
    const KIND: &'static str = "collaborator";

    fn key(&self) -> &str {
        &self.username
    }

    // ユーザー名は大文字小文字を区別しない
    fn match_key(&self) -> String {
        self.username.to_lowercase()
    }
}

impl Resource for TeamAccess {
    const KIND: &'static str = "team";

    fn key(&self) -> &str {
        &self.team
    }

    fn match_key(&self) -> String {
        self.team.to_lowercase()
    }
}

impl Resource for Webhook {
    const KIND: &'static str = "webhook";

    fn key(&self) -> &str {
        &self.url
    }
}

/// 変更の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Create => write!(f, "create"),
            ChangeAction::Update => write!(f, "update"),
            ChangeAction::Delete => write!(f, "delete"),
        }
    }
}

/// 1リソースに対する変更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Change<T> {
    /// 新規作成
    Create { after: T },
    /// 既存リソースの更新
    Update { before: T, after: T },
    /// 削除
    Delete { before: T },
}

impl<T> Change<T> {
    /// 変更の種類を返す
    pub fn action(&self) -> ChangeAction {
        match self {
            Change::Create { .. } => ChangeAction::Create,
            Change::Update { .. } => ChangeAction::Update,
            Change::Delete { .. } => ChangeAction::Delete,
        }
    }

    /// 変更前の値
    pub fn before(&self) -> Option<&T> {
        match self {
            Change::Create { .. } => None,
            Change::Update { before, .. } | Change::Delete { before } => Some(before),
        }
    }

    /// 変更後の値
    pub fn after(&self) -> Option<&T> {
        match self {
            Change::Create { after } | Change::Update { after, .. } => Some(after),
            Change::Delete { .. } => None,
        }
    }
}

impl<T: Resource> Change<T> {
    /// 対象リソースのキー
    pub fn key(&self) -> &str {
        match self {
            Change::Create { after } | Change::Update { after, .. } => after.key(),
            Change::Delete { before } => before.key(),
        }
    }

    /// ログやエラーに使うリソースの表示名（例: `branch protection 'main'`）
    pub fn resource_label(&self) -> String {
        format!("{} '{}'", T::KIND, self.key())
    }
}

/// 破壊的変更の判定理由を伴う変更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedChange<T> {
    /// 変更内容
    #[serde(flatten)]
    pub change: Change<T>,

    /// 破壊的と判定された理由（空なら非破壊的）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destructive_reasons: Vec<String>,
}

impl<T> PlannedChange<T> {
    /// 非破壊的な変更を作成
    pub fn safe(change: Change<T>) -> Self {
        Self {
            change,
            destructive_reasons: Vec::new(),
        }
    }

    /// 破壊的理由を付けて変更を作成
    pub fn with_reasons(change: Change<T>, destructive_reasons: Vec<String>) -> Self {
        Self {
            change,
            destructive_reasons,
        }
    }

    /// 破壊的変更かどうか
    pub fn is_destructive(&self) -> bool {
        !self.destructive_reasons.is_empty()
    }
}

/// 破壊的変更の一覧表示用エントリー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestructiveChange {
    /// 対象リソースの表示名
    pub resource: String,
    /// 破壊的と判定された理由
    pub reason: String,
}

/// 1リポジトリ分の変更計画
///
/// 変更が1つもなければ最新状態であることを意味する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    /// 対象リポジトリ名
    pub repository: String,

    /// リポジトリ設定の変更
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PlannedChange<RepositorySettings>>,

    /// ブランチ保護の変更
    #[serde(default)]
    pub branch_protection: Vec<PlannedChange<BranchProtection>>,

    /// コラボレーターの変更
    #[serde(default)]
    pub collaborators: Vec<PlannedChange<Collaborator>>,

    /// チームアクセスの変更
    #[serde(default)]
    pub teams: Vec<PlannedChange<TeamAccess>>,

    /// Webhookの変更
    #[serde(default)]
    pub webhooks: Vec<PlannedChange<Webhook>>,

    /// 計画の作成時刻
    pub generated_at: DateTime<Utc>,
}

impl ReconciliationPlan {
    /// 空の計画を作成
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            settings: None,
            branch_protection: Vec::new(),
            collaborators: Vec::new(),
            teams: Vec::new(),
            webhooks: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// 変更の総数
    pub fn change_count(&self) -> usize {
        usize::from(self.settings.is_some())
            + self.branch_protection.len()
            + self.collaborators.len()
            + self.teams.len()
            + self.webhooks.len()
    }

    /// 変更がないかどうか
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    /// 破壊的変更の一覧（適用順）
    pub fn destructive_changes(&self) -> Vec<DestructiveChange> {
        fn collect<T: Resource>(changes: &[PlannedChange<T>], out: &mut Vec<DestructiveChange>) {
            for planned in changes {
                for reason in &planned.destructive_reasons {
                    out.push(DestructiveChange {
                        resource: planned.change.resource_label(),
                        reason: reason.clone(),
                    });
                }
            }
        }

        let mut out = Vec::new();
        if let Some(settings) = &self.settings {
            collect(std::slice::from_ref(settings), &mut out);
        }
        collect(&self.branch_protection, &mut out);
        collect(&self.collaborators, &mut out);
        collect(&self.teams, &mut out);
        collect(&self.webhooks, &mut out);
        out
    }

    /// 破壊的変更を含む変更の数
    pub fn destructive_count(&self) -> usize {
        fn count<T>(changes: &[PlannedChange<T>]) -> usize {
            changes.iter().filter(|c| c.is_destructive()).count()
        }

        self.settings
            .as_ref()
            .map_or(0, |s| usize::from(s.is_destructive()))
            + count(&self.branch_protection)
            + count(&self.collaborators)
            + count(&self.teams)
            + count(&self.webhooks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_plan() {
        let plan = ReconciliationPlan::new("svc");
        assert!(plan.is_empty());
        assert_eq!(plan.change_count(), 0);
        assert_eq!(plan.destructive_count(), 0);
    }

    #[test]
    fn test_change_accessors() {
        let change = Change::Update {
            before: Collaborator::new("alice", "admin"),
            after: Collaborator::new("alice", "read"),
        };

        assert_eq!(change.action(), ChangeAction::Update);
        assert_eq!(change.key(), "alice");
        assert_eq!(change.resource_label(), "collaborator 'alice'");
        assert_eq!(change.before().unwrap().permission.to_string(), "admin");
        assert_eq!(change.after().unwrap().permission.to_string(), "read");
    }

    #[test]
    fn test_destructive_changes_are_listed() {
        let mut plan = ReconciliationPlan::new("svc");
        plan.webhooks.push(PlannedChange::with_reasons(
            Change::Delete {
                before: Webhook::new("https://hooks.example.com", ["push"]),
            },
            vec!["removing webhook".to_string()],
        ));
        plan.collaborators.push(PlannedChange::safe(Change::Create {
            after: Collaborator::new("bob", "read"),
        }));

        assert_eq!(plan.change_count(), 2);
        assert_eq!(plan.destructive_count(), 1);
        let destructive = plan.destructive_changes();
        assert_eq!(destructive.len(), 1);
        assert_eq!(destructive[0].resource, "webhook 'https://hooks.example.com'");
        assert_eq!(destructive[0].reason, "removing webhook");
    }

    #[test]
    fn test_change_serializes_with_action_tag() {
        let change = PlannedChange::safe(Change::Create {
            after: TeamAccess::new("platform", "write"),
        });
        let json = serde_json::to_value(&change).unwrap();

        assert_eq!(json["action"], "create");
        assert_eq!(json["after"]["team"], "platform");
        assert!(json.get("destructive_reasons").is_none());
    }
}

use crate::domain::value_objects::permission::Permission;
use serde::{Deserialize, Serialize};

/// リポジトリ機能フラグ（宣言側）
///
/// 未指定のフラグは管理対象外として差分計算から除外される。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureFlags {
    /// Issuesを有効にするか
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,

    /// Wikiを有効にするか
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,

    /// Projectsを有効にするか
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,

    /// Discussionsを有効にするか
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_discussions: Option<bool>,
}

/// リポジトリ機能フラグ（観測側、全て確定値）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub has_issues: bool,
    pub has_wiki: bool,
    pub has_projects: bool,
    pub has_discussions: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            has_issues: true,
            has_wiki: true,
            has_projects: true,
            has_discussions: false,
        }
    }
}

impl Features {
    /// 宣言されたフラグだけを上書きした値を返す
    pub fn overlaid_with(&self, flags: &FeatureFlags) -> Features {
        Features {
            has_issues: flags.has_issues.unwrap_or(self.has_issues),
            has_wiki: flags.has_wiki.unwrap_or(self.has_wiki),
            has_projects: flags.has_projects.unwrap_or(self.has_projects),
            has_discussions: flags.has_discussions.unwrap_or(self.has_discussions),
        }
    }
}

/// ホスティング側から読み取ったリポジトリのメタデータ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySettings {
    /// リポジトリの説明
    pub description: String,

    /// 非公開リポジトリかどうか
    pub private: bool,

    /// トピックのリスト（集合として比較される）
    pub topics: Vec<String>,

    /// 機能フラグ
    pub features: Features,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            description: String::new(),
            private: false,
            topics: Vec::new(),
            features: Features::default(),
        }
    }
}

/// ブランチ保護ルール（パターンがキー）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BranchProtection {
    /// 対象ブランチのパターン
    pub pattern: String,

    /// 必要な承認レビュー数
    pub required_reviews: u32,

    /// 新しいコミットで古い承認を取り消すか
    pub dismiss_stale_reviews: bool,

    /// CODEOWNERSのレビューを必須とするか
    pub require_code_owner_review: bool,

    /// 必須ステータスチェック（集合として比較される）
    pub required_status_checks: Vec<String>,

    /// マージ前にベースブランチへの追従を必須とするか
    pub require_up_to_date: bool,

    /// pushを許可するアクター（集合として比較される、空なら制限なし）
    pub restrict_pushes: Vec<String>,
}

impl BranchProtection {
    /// 新しいBranchProtectionインスタンスを作成
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    /// 必要レビュー数を設定
    pub fn with_required_reviews(mut self, count: u32) -> Self {
        self.required_reviews = count;
        self
    }

    /// 古い承認の取り消しを設定
    pub fn with_dismiss_stale_reviews(mut self, value: bool) -> Self {
        self.dismiss_stale_reviews = value;
        self
    }

    /// CODEOWNERSレビュー必須を設定
    pub fn with_code_owner_review(mut self, value: bool) -> Self {
        self.require_code_owner_review = value;
        self
    }

    /// 必須ステータスチェックを設定
    pub fn with_status_checks<I, S>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_status_checks = checks.into_iter().map(Into::into).collect();
        self
    }

    /// ベースブランチへの追従必須を設定
    pub fn with_require_up_to_date(mut self, value: bool) -> Self {
        self.require_up_to_date = value;
        self
    }

    /// push制限アクターを設定
    pub fn with_restrict_pushes<I, S>(mut self, actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.restrict_pushes = actors.into_iter().map(Into::into).collect();
        self
    }
}

/// 個人コラボレーター（ユーザー名がキー）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Collaborator {
    /// ユーザー名
    pub username: String,

    /// 付与する権限
    pub permission: Permission,
}

impl Collaborator {
    /// 新しいCollaboratorインスタンスを作成
    pub fn new(username: impl Into<String>, permission: impl Into<Permission>) -> Self {
        Self {
            username: username.into(),
            permission: permission.into(),
        }
    }
}

/// チームアクセス（チームslugがキー）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamAccess {
    /// チームのslug
    pub team: String,

    /// 付与する権限
    pub permission: Permission,
}

impl TeamAccess {
    /// 新しいTeamAccessインスタンスを作成
    pub fn new(team: impl Into<String>, permission: impl Into<Permission>) -> Self {
        Self {
            team: team.into(),
            permission: permission.into(),
        }
    }
}

fn default_active() -> bool {
    true
}

/// Webhook（URLがキー）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Webhook {
    /// 配信先URL
    pub url: String,

    /// 購読するイベント（集合として比較される）
    #[serde(default)]
    pub events: Vec<String>,

    /// 有効かどうか
    #[serde(default = "default_active")]
    pub active: bool,

    /// ホスティング側で割り当てられたID（観測側のみ）
    #[serde(skip)]
    pub id: Option<u64>,
}

impl Webhook {
    /// 新しいWebhookインスタンスを作成
    pub fn new<I, S>(url: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            url: url.into(),
            events: events.into_iter().map(Into::into).collect(),
            active: true,
            id: None,
        }
    }

    /// 有効/無効を設定
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// IDを設定
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

/// 単一リポジトリの望ましい状態
///
/// `name` 以外のフィールドは全て省略可能。省略されたスカラー値は管理対象外、
/// 省略されたリストはそのリソース種別ごと管理対象外となる。
/// 空リスト（`Some(vec![])`）は「空に収束させる」ことを意味する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// リポジトリ名（一意キー）
    #[serde(default)]
    pub name: String,

    /// リポジトリの説明
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 非公開にするか
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    /// トピック
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,

    /// 機能フラグ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureFlags>,

    /// ブランチ保護ルール（宣言順を保持）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_protection: Option<Vec<BranchProtection>>,

    /// 個人コラボレーター
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<Vec<Collaborator>>,

    /// チームアクセス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<TeamAccess>>,

    /// Webhook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhooks: Option<Vec<Webhook>>,
}

impl RepositoryConfig {
    /// 新しいRepositoryConfigインスタンスを作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 説明を設定
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 公開範囲を設定
    pub fn with_private(mut self, private: bool) -> Self {
        self.private = Some(private);
        self
    }

    /// トピックを設定
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = Some(topics.into_iter().map(Into::into).collect());
        self
    }

    /// 機能フラグを設定
    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = Some(features);
        self
    }

    /// ブランチ保護ルールを設定
    pub fn with_branch_protection(mut self, rules: Vec<BranchProtection>) -> Self {
        self.branch_protection = Some(rules);
        self
    }

    /// コラボレーターを設定
    pub fn with_collaborators(mut self, collaborators: Vec<Collaborator>) -> Self {
        self.collaborators = Some(collaborators);
        self
    }

    /// チームアクセスを設定
    pub fn with_teams(mut self, teams: Vec<TeamAccess>) -> Self {
        self.teams = Some(teams);
        self
    }

    /// Webhookを設定
    pub fn with_webhooks(mut self, webhooks: Vec<Webhook>) -> Self {
        self.webhooks = Some(webhooks);
        self
    }

    /// 宣言されたフィールドを観測値に重ねたリポジトリ設定を返す
    ///
    /// 観測値がない場合（新規作成時）は既定値を土台にする。
    pub fn desired_settings(&self, observed: Option<&RepositorySettings>) -> RepositorySettings {
        let base = observed.cloned().unwrap_or_default();
        RepositorySettings {
            description: self.description.clone().unwrap_or(base.description),
            private: self.private.unwrap_or(base.private),
            topics: self.topics.clone().unwrap_or(base.topics),
            features: match &self.features {
                Some(flags) => base.features.overlaid_with(flags),
                None => base.features,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_config_builder() {
        let config = RepositoryConfig::new("svc")
            .with_description("Service")
            .with_private(true)
            .with_topics(["rust", "api"])
            .with_collaborators(vec![Collaborator::new("alice", "write")]);

        assert_eq!(config.name, "svc");
        assert_eq!(config.description.as_deref(), Some("Service"));
        assert_eq!(config.private, Some(true));
        assert_eq!(config.topics.as_ref().map(|t| t.len()), Some(2));
        assert_eq!(
            config.collaborators.unwrap()[0].permission,
            Permission::Write
        );
        assert!(config.webhooks.is_none());
    }

    #[test]
    fn test_desired_settings_keeps_unmanaged_fields() {
        let observed = RepositorySettings {
            description: "old".to_string(),
            private: true,
            topics: vec!["legacy".to_string()],
            features: Features::default(),
        };
        let config = RepositoryConfig::new("svc").with_description("new");

        let desired = config.desired_settings(Some(&observed));

        assert_eq!(desired.description, "new");
        assert!(desired.private);
        assert_eq!(desired.topics, vec!["legacy".to_string()]);
    }

    #[test]
    fn test_desired_settings_for_new_repository() {
        let config = RepositoryConfig::new("svc").with_features(FeatureFlags {
            has_wiki: Some(false),
            ..Default::default()
        });

        let desired = config.desired_settings(None);

        assert_eq!(desired.description, "");
        assert!(!desired.private);
        assert!(!desired.features.has_wiki);
        assert!(desired.features.has_issues);
    }

    #[test]
    fn test_deserialize_repository_config() {
        let yaml = r#"
name: svc
private: true
topics: [rust]
branch_protection:
  - pattern: main
    required_reviews: 2
    required_status_checks: [ci]
collaborators:
  - username: alice
    permission: admin
webhooks:
  - url: https://hooks.example.com/ci
    events: [push]
"#;
        let config: RepositoryConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.name, "svc");
        let rules = config.branch_protection.unwrap();
        assert_eq!(rules[0].required_reviews, 2);
        assert!(!rules[0].dismiss_stale_reviews);
        let hooks = config.webhooks.unwrap();
        assert!(hooks[0].active);
        assert_eq!(hooks[0].id, None);
        assert!(config.teams.is_none());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let yaml = "name: svc\nvisibility: public\n";
        assert!(serde_yaml::from_str::<RepositoryConfig>(yaml).is_err());
    }
}

use super::repository_config::{
    BranchProtection, Collaborator, FeatureFlags, RepositoryConfig, TeamAccess, Webhook,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 複数リポジトリ設定ファイルのバージョン既定値
pub const DEFAULT_CONFIG_VERSION: &str = "1";

fn default_version() -> String {
    DEFAULT_CONFIG_VERSION.to_string()
}

/// 全リポジトリ共通の既定値（`name` を除いたRepositoryConfigと同じ形）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureFlags>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_protection: Option<Vec<BranchProtection>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<Vec<Collaborator>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<TeamAccess>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhooks: Option<Vec<Webhook>>,
}

impl RepositoryDefaults {
    /// 既定値の上にエントリーが明示したフィールドを重ねる
    ///
    /// 重ね合わせはフィールド単位の浅いもの。リスト値（ブランチ保護、
    /// コラボレーター、チーム、Webhook、トピック）はエントリー側が指定すれば
    /// 既定値のリストを丸ごと置き換え、要素単位のマージは行わない。
    pub fn overlay(&self, entry: &RepositoryConfig) -> RepositoryConfig {
        RepositoryConfig {
            name: entry.name.clone(),
            description: entry
                .description
                .clone()
                .or_else(|| self.description.clone()),
            private: entry.private.or(self.private),
            topics: entry.topics.clone().or_else(|| self.topics.clone()),
            features: entry.features.clone().or_else(|| self.features.clone()),
            branch_protection: entry
                .branch_protection
                .clone()
                .or_else(|| self.branch_protection.clone()),
            collaborators: entry
                .collaborators
                .clone()
                .or_else(|| self.collaborators.clone()),
            teams: entry.teams.clone().or_else(|| self.teams.clone()),
            webhooks: entry.webhooks.clone().or_else(|| self.webhooks.clone()),
        }
    }
}

/// 複数リポジトリ設定ファイルの構造
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultiRepositoryConfig {
    /// 設定ファイルのバージョン
    #[serde(default = "default_version")]
    pub version: String,

    /// 共通の既定値（オプション）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<RepositoryDefaults>,

    /// リポジトリのリスト（宣言順を保持）
    pub repositories: Vec<RepositoryConfig>,
}

impl MultiRepositoryConfig {
    /// 新しいMultiRepositoryConfigインスタンスを作成
    pub fn new(repositories: Vec<RepositoryConfig>) -> Self {
        Self {
            version: default_version(),
            defaults: None,
            repositories,
        }
    }

    /// 既定値を設定
    pub fn with_defaults(mut self, defaults: RepositoryDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// 単一リポジトリ設定を1エントリーの複数リポジトリ設定として包む
    pub fn from_single(config: RepositoryConfig) -> Self {
        Self::new(vec![config])
    }

    /// 既定値を適用したエントリーを返す
    pub fn resolve(&self, entry: &RepositoryConfig) -> RepositoryConfig {
        match &self.defaults {
            Some(defaults) => defaults.overlay(entry),
            None => entry.clone(),
        }
    }

    /// 宣言されたリポジトリ名（宣言順、重複を含む）
    pub fn names(&self) -> Vec<&str> {
        self.repositories.iter().map(|r| r.name.as_str()).collect()
    }

    /// 存在しないリポジトリ名を返す
    pub fn unresolved_names(&self, requested: &[String]) -> Vec<String> {
        let known: HashSet<&str> = self.names().into_iter().collect();
        let mut missing = Vec::new();
        for name in requested {
            if !known.contains(name.as_str()) && !missing.contains(name) {
                missing.push(name.clone());
            }
        }
        missing
    }

    /// フィルターに一致するエントリーを既定値適用済みで返す
    ///
    /// フィルターが指定された場合、全ての名前が解決できなければ
    /// 未解決の名前のリストをエラーとして返す。同名のエントリーが複数ある場合は
    /// 全て返す（重複検出は検証側の責務）。
    pub fn select(&self, filter: Option<&[String]>) -> Result<Vec<RepositoryConfig>, Vec<String>> {
        match filter {
            Some(names) => {
                let missing = self.unresolved_names(names);
                if !missing.is_empty() {
                    return Err(missing);
                }
                Ok(self
                    .repositories
                    .iter()
                    .filter(|entry| names.iter().any(|name| name == &entry.name))
                    .map(|entry| self.resolve(entry))
                    .collect())
            }
            None => Ok(self
                .repositories
                .iter()
                .map(|entry| self.resolve(entry))
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn defaults() -> RepositoryDefaults {
        RepositoryDefaults {
            private: Some(true),
            description: Some("managed".to_string()),
            branch_protection: Some(vec![
                BranchProtection::new("main").with_required_reviews(2),
                BranchProtection::new("release").with_required_reviews(1),
            ]),
            teams: Some(vec![TeamAccess::new("platform", "admin")]),
            ..Default::default()
        }
    }

    #[test]
    fn test_overlay_fills_unset_fields() {
        let entry = RepositoryConfig::new("svc").with_description("Service");
        let resolved = defaults().overlay(&entry);

        assert_eq!(resolved.name, "svc");
        assert_eq!(resolved.description.as_deref(), Some("Service"));
        assert_eq!(resolved.private, Some(true));
        assert_eq!(resolved.branch_protection.as_ref().unwrap().len(), 2);
        assert!(resolved.collaborators.is_none());
    }

    #[test]
    fn test_overlay_replaces_lists_wholesale() {
        let entry = RepositoryConfig::new("svc")
            .with_branch_protection(vec![BranchProtection::new("develop")]);
        let resolved = defaults().overlay(&entry);

        assert_eq!(
            resolved.branch_protection,
            Some(vec![BranchProtection::new("develop")])
        );
        assert_eq!(
            resolved.teams,
            Some(vec![TeamAccess::new("platform", "admin")])
        );
    }

    #[test]
    fn test_overlay_keeps_explicit_empty_list() {
        let entry = RepositoryConfig::new("svc").with_teams(vec![]);
        let resolved = defaults().overlay(&entry);

        assert_eq!(resolved.teams, Some(vec![]));
    }

    #[test]
    fn test_overlay_explicit_false_wins() {
        let entry = RepositoryConfig::new("svc").with_private(false);
        let resolved = defaults().overlay(&entry);

        assert_eq!(resolved.private, Some(false));
    }

    #[test]
    fn test_select_with_filter() {
        let config = MultiRepositoryConfig::new(vec![
            RepositoryConfig::new("a"),
            RepositoryConfig::new("b"),
            RepositoryConfig::new("c"),
        ])
        .with_defaults(defaults());

        let selected = config
            .select(Some(&["c".to_string(), "a".to_string()]))
            .unwrap();

        let names: Vec<&str> = selected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(selected.iter().all(|r| r.private == Some(true)));
    }

    #[test]
    fn test_select_reports_all_unresolved_names() {
        let config = MultiRepositoryConfig::new(vec![RepositoryConfig::new("a")]);

        let missing = config
            .select(Some(&[
                "x".to_string(),
                "a".to_string(),
                "y".to_string(),
                "x".to_string(),
            ]))
            .unwrap_err();

        assert_eq!(missing, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let yaml = r#"
version: "1"
defaults:
  private: true
  collaborators:
    - username: bot
      permission: write
repositories:
  - name: api
  - name: web
    private: false
"#;
        let config: MultiRepositoryConfig = serde_yaml::from_str(yaml).unwrap();
        let resolved = config.select(None).unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].private, Some(true));
        assert_eq!(resolved[1].private, Some(false));
        assert_eq!(resolved[1].collaborators.as_ref().unwrap()[0].username, "bot");
    }
}

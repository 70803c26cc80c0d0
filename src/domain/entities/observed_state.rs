use super::repository_config::{
    BranchProtection, Collaborator, RepositorySettings, TeamAccess, Webhook,
};

/// ホスティング側から読み取った1リポジトリ分の現在の状態
///
/// 管理対象外のリソース種別は読み取られず空のままになる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedState {
    /// リポジトリのメタデータ（存在しなければNone）
    pub settings: Option<RepositorySettings>,

    /// ブランチ保護ルール
    pub branch_protection: Vec<BranchProtection>,

    /// 個人コラボレーター
    pub collaborators: Vec<Collaborator>,

    /// チームアクセス
    pub teams: Vec<TeamAccess>,

    /// Webhook
    pub webhooks: Vec<Webhook>,
}

impl ObservedState {
    /// リポジトリが存在しない状態
    pub fn absent() -> Self {
        Self::default()
    }

    /// 既存リポジトリの状態
    pub fn existing(settings: RepositorySettings) -> Self {
        Self {
            settings: Some(settings),
            ..Default::default()
        }
    }

    /// リポジトリが存在するかどうか
    pub fn exists(&self) -> bool {
        self.settings.is_some()
    }
}

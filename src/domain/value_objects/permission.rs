use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// コラボレーター/チームに付与するアクセス権限
///
/// `read < write < admin` の全順序を持つ。ホスティング側が返す未知の権限
/// （`maintain` や `triage` など）は [`Permission::Other`] として保持し、
/// 順序比較の対象外とする。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Permission {
    /// 読み取り権限
    Read,
    /// 書き込み権限
    Write,
    /// 管理者権限
    Admin,
    /// 順序付けできない未知の権限文字列
    Other(String),
}

impl Permission {
    /// 順序比較に用いるレベル（未知の権限は `None`）
    pub fn level(&self) -> Option<u8> {
        match self {
            Permission::Read => Some(1),
            Permission::Write => Some(2),
            Permission::Admin => Some(3),
            Permission::Other(_) => None,
        }
    }

    /// 既知の権限かどうか
    pub fn is_known(&self) -> bool {
        self.level().is_some()
    }

    /// `self` から `target` への変更が権限の引き下げかどうか
    ///
    /// どちらか一方でも未知の権限であれば引き下げとはみなさない。
    pub fn is_downgrade_to(&self, target: &Permission) -> bool {
        match (self.level(), target.level()) {
            (Some(current), Some(next)) => next < current,
            _ => false,
        }
    }

    /// GitHub REST APIが受け付ける権限名
    pub fn api_name(&self) -> &str {
        match self {
            Permission::Read => "pull",
            Permission::Write => "push",
            Permission::Admin => "admin",
            Permission::Other(value) => value.as_str(),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Read => write!(f, "read"),
            Permission::Write => write!(f, "write"),
            Permission::Admin => write!(f, "admin"),
            Permission::Other(value) => write!(f, "{}", value),
        }
    }
}

impl FromStr for Permission {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let permission = match s.trim().to_lowercase().as_str() {
            "read" | "pull" => Permission::Read,
            "write" | "push" => Permission::Write,
            "admin" => Permission::Admin,
            _ => Permission::Other(s.trim().to_string()),
        };
        Ok(permission)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(permission) => permission,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for Permission {
    fn from(value: &str) -> Self {
        Permission::from(value.to_string())
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.to_string()
    }
}

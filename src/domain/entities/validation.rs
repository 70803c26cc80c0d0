use serde::{Deserialize, Serialize};
use std::fmt;

/// 検証で見つかった問題（エラー・警告共通）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// 問題のあるフィールド（例: `collaborators[1].username`）
    pub field: String,

    /// 問題のある値
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// メッセージ
    pub message: String,
}

impl ValidationIssue {
    /// 新しいValidationIssueインスタンスを作成
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: None,
            message: message.into(),
        }
    }

    /// 問題のある値を設定
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}: {} (got '{}')", self.field, self.message, value),
            None => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

/// 1リポジトリ分の検証結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// 致命的な問題
    pub errors: Vec<ValidationIssue>,

    /// 致命的でない問題
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// 空の検証結果を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// エラーを追加
    pub fn error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// 警告を追加
    pub fn warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// エラーがないかどうか
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// 別の検証結果を取り込む
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue::new("collaborators[0].permission", "unknown permission")
            .with_value("owner");
        assert_eq!(
            issue.to_string(),
            "collaborators[0].permission: unknown permission (got 'owner')"
        );
    }

    #[test]
    fn test_report_merge() {
        let mut report = ValidationReport::new();
        report.warning(ValidationIssue::new("name", "looks sensitive"));
        assert!(report.is_valid());

        let mut other = ValidationReport::new();
        other.error(ValidationIssue::new("teams[0].team", "team does not exist"));
        report.merge(other);

        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 1);
    }
}

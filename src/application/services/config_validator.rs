use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

use crate::domain::entities::repository_config::{
    BranchProtection, Collaborator, RepositoryConfig, TeamAccess, Webhook,
};
use crate::domain::entities::validation::{ValidationIssue, ValidationReport};
use crate::domain::value_objects::permission::Permission;

/// ホスティング側が許容する必須レビュー数の上限
pub const MAX_REQUIRED_REVIEWS: u32 = 6;

/// 公開リポジトリの名前に含まれていると警告する語
const SENSITIVE_NAME_PARTS: [&str; 4] = ["secret", "internal", "private", "credential"];

/// ブランチパターンをワイルドカードにする文字
const GLOB_CHARS: &[char] = &['*', '?', '['];

fn repository_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]{1,100}$").expect("repository name pattern"))
}

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,37}[A-Za-z0-9])?$").expect("username pattern")
    })
}

fn team_slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("team slug pattern"))
}

fn topic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,49}$").expect("topic pattern"))
}

/// ネットワークを使わない設定検証
///
/// 必須フィールドの有無、権限値、ユーザー名・チームslug・Webhook URLの構文、
/// 同一リスト内のキー重複を検査する。致命的でない問題は警告として返す。
#[derive(Debug, Clone, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// 新しいConfigValidatorインスタンスを作成
    pub fn new() -> Self {
        Self
    }

    /// 1リポジトリ分の設定を検証
    pub fn validate(&self, config: &RepositoryConfig) -> ValidationReport {
        let mut report = ValidationReport::new();

        self.validate_name(config, &mut report);

        if let Some(topics) = &config.topics {
            self.validate_topics(topics, &mut report);
        }
        if let Some(rules) = &config.branch_protection {
            self.validate_branch_protection(rules, &mut report);
        }
        if let Some(collaborators) = &config.collaborators {
            self.validate_collaborators(collaborators, &mut report);
        }
        if let Some(teams) = &config.teams {
            self.validate_teams(teams, &mut report);
        }
        if let Some(webhooks) = &config.webhooks {
            self.validate_webhooks(webhooks, &mut report);
        }

        report
    }

    fn validate_name(&self, config: &RepositoryConfig, report: &mut ValidationReport) {
        let name = config.name.trim();
        if name.is_empty() {
            report.error(ValidationIssue::new("name", "repository name is required"));
            return;
        }
        if name == "." || name == ".." || !repository_name_pattern().is_match(name) {
            report.error(
                ValidationIssue::new(
                    "name",
                    "repository name may only contain letters, digits, '.', '-' and '_'",
                )
                .with_value(&config.name),
            );
        }

        let lowered = name.to_lowercase();
        if config.private != Some(true)
            && SENSITIVE_NAME_PARTS.iter().any(|part| lowered.contains(part))
        {
            report.warning(
                ValidationIssue::new("name", "name looks sensitive but the repository is not private")
                    .with_value(&config.name),
            );
        }
    }

    fn validate_topics(&self, topics: &[String], report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for (i, topic) in topics.iter().enumerate() {
            let field = format!("topics[{}]", i);
            if !topic_pattern().is_match(topic) {
                report.error(
                    ValidationIssue::new(
                        field,
                        "topic must be lowercase letters, digits or '-', at most 50 characters",
                    )
                    .with_value(topic),
                );
            } else if !seen.insert(topic.as_str()) {
                report.warning(ValidationIssue::new(field, "duplicate topic").with_value(topic));
            }
        }
    }

    fn validate_branch_protection(&self, rules: &[BranchProtection], report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for (i, rule) in rules.iter().enumerate() {
            let prefix = format!("branch_protection[{}]", i);

            if rule.pattern.trim().is_empty() {
                report.error(ValidationIssue::new(
                    format!("{}.pattern", prefix),
                    "branch pattern is required",
                ));
            } else if rule.pattern.contains(GLOB_CHARS) {
                // 従来のブランチ保護はブランチ名で指定する
                report.error(
                    ValidationIssue::new(
                        format!("{}.pattern", prefix),
                        "wildcard patterns are not supported; name a branch",
                    )
                    .with_value(&rule.pattern),
                );
            } else if !seen.insert(rule.pattern.as_str()) {
                report.error(
                    ValidationIssue::new(format!("{}.pattern", prefix), "duplicate branch pattern")
                        .with_value(&rule.pattern),
                );
            }

            if rule.required_reviews > MAX_REQUIRED_REVIEWS {
                report.error(
                    ValidationIssue::new(
                        format!("{}.required_reviews", prefix),
                        format!("at most {} required reviews are supported", MAX_REQUIRED_REVIEWS),
                    )
                    .with_value(rule.required_reviews.to_string()),
                );
            }

            for (j, check) in rule.required_status_checks.iter().enumerate() {
                if check.trim().is_empty() {
                    report.error(ValidationIssue::new(
                        format!("{}.required_status_checks[{}]", prefix, j),
                        "status check name is empty",
                    ));
                }
            }

            for (j, actor) in rule.restrict_pushes.iter().enumerate() {
                if actor.trim().is_empty() {
                    report.error(ValidationIssue::new(
                        format!("{}.restrict_pushes[{}]", prefix, j),
                        "push actor is empty",
                    ));
                }
            }
        }
    }

    fn validate_collaborators(&self, collaborators: &[Collaborator], report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for (i, collaborator) in collaborators.iter().enumerate() {
            let prefix = format!("collaborators[{}]", i);
            let username = collaborator.username.as_str();

            if username.trim().is_empty() {
                report.error(ValidationIssue::new(
                    format!("{}.username", prefix),
                    "username is required",
                ));
            } else if !username_pattern().is_match(username) || username.contains("--") {
                report.error(
                    ValidationIssue::new(format!("{}.username", prefix), "invalid username")
                        .with_value(username),
                );
            } else if !seen.insert(username.to_lowercase()) {
                report.error(
                    ValidationIssue::new(format!("{}.username", prefix), "duplicate collaborator")
                        .with_value(username),
                );
            }

            check_permission(&collaborator.permission, &prefix, report);
        }
    }

    fn validate_teams(&self, teams: &[TeamAccess], report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for (i, team) in teams.iter().enumerate() {
            let prefix = format!("teams[{}]", i);
            let slug = team.team.as_str();

            if slug.trim().is_empty() {
                report.error(ValidationIssue::new(
                    format!("{}.team", prefix),
                    "team slug is required",
                ));
            } else if !team_slug_pattern().is_match(slug) {
                report.error(
                    ValidationIssue::new(format!("{}.team", prefix), "invalid team slug")
                        .with_value(slug),
                );
            } else if !seen.insert(slug.to_lowercase()) {
                report.error(
                    ValidationIssue::new(format!("{}.team", prefix), "duplicate team")
                        .with_value(slug),
                );
            }

            check_permission(&team.permission, &prefix, report);
        }
    }

    fn validate_webhooks(&self, webhooks: &[Webhook], report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for (i, hook) in webhooks.iter().enumerate() {
            let prefix = format!("webhooks[{}]", i);

            if hook.url.trim().is_empty() {
                report.error(ValidationIssue::new(
                    format!("{}.url", prefix),
                    "webhook URL is required",
                ));
            } else {
                match Url::parse(&hook.url) {
                    Ok(url) if url.host_str().is_none() => report.error(
                        ValidationIssue::new(format!("{}.url", prefix), "webhook URL has no host")
                            .with_value(&hook.url),
                    ),
                    Ok(url) if url.scheme() == "https" => {}
                    Ok(url) if url.scheme() == "http" => report.warning(
                        ValidationIssue::new(
                            format!("{}.url", prefix),
                            "webhook URL is not https; payloads are sent in clear text",
                        )
                        .with_value(&hook.url),
                    ),
                    Ok(_) => report.error(
                        ValidationIssue::new(
                            format!("{}.url", prefix),
                            "webhook URL must use http or https",
                        )
                        .with_value(&hook.url),
                    ),
                    Err(e) => report.error(
                        ValidationIssue::new(
                            format!("{}.url", prefix),
                            format!("invalid webhook URL: {}", e),
                        )
                        .with_value(&hook.url),
                    ),
                }

                if !seen.insert(hook.url.as_str()) {
                    report.error(
                        ValidationIssue::new(format!("{}.url", prefix), "duplicate webhook URL")
                            .with_value(&hook.url),
                    );
                }
            }

            if hook.events.is_empty() {
                report.warning(ValidationIssue::new(
                    format!("{}.events", prefix),
                    "webhook subscribes to no events",
                ));
            }
            for (j, event) in hook.events.iter().enumerate() {
                if event.trim().is_empty() {
                    report.error(ValidationIssue::new(
                        format!("{}.events[{}]", prefix, j),
                        "event name is empty",
                    ));
                }
            }
        }
    }
}

fn check_permission(permission: &Permission, prefix: &str, report: &mut ValidationReport) {
    if !permission.is_known() {
        report.error(
            ValidationIssue::new(
                format!("{}.permission", prefix),
                "unknown permission; expected read, write or admin",
            )
            .with_value(permission.to_string()),
        );
    }
}

//! 観測状態と望ましい状態の差分計算
//!
//! リソース種別ごとに「変更なし」または1つの [`PlannedChange`] を返し、
//! アクセス・保護・公開範囲を縮小する変更を破壊的変更として分類する。

use crate::domain::entities::{
    observed_state::ObservedState,
    plan::{Change, PlannedChange, ReconciliationPlan, Resource},
    repository_config::{
        BranchProtection, Collaborator, RepositoryConfig, RepositorySettings, TeamAccess, Webhook,
    },
};
use crate::domain::value_objects::{
    permission::Permission,
    string_multiset::{multiset_eq, removed_items},
};
use std::collections::{HashMap, HashSet};

/// リポジトリ設定の差分
///
/// 観測値がなければ作成、宣言されたフィールドのいずれかが異なれば更新。
/// 削除は決して行わない。非公開から公開への変更のみ破壊的とする。
pub fn diff_repository(
    observed: Option<&RepositorySettings>,
    desired: &RepositoryConfig,
) -> Option<PlannedChange<RepositorySettings>> {
    let after = desired.desired_settings(observed);
    let before = match observed {
        Some(before) => before,
        None => return Some(PlannedChange::safe(Change::Create { after })),
    };

    if settings_equal(before, &after) {
        return None;
    }

    let mut reasons = Vec::new();
    if before.private && !after.private {
        reasons.push("making repository public".to_string());
    }

    Some(PlannedChange::with_reasons(
        Change::Update {
            before: before.clone(),
            after,
        },
        reasons,
    ))
}

fn settings_equal(left: &RepositorySettings, right: &RepositorySettings) -> bool {
    left.description == right.description
        && left.private == right.private
        && multiset_eq(&left.topics, &right.topics)
        && left.features == right.features
}

/// ブランチ保護ルールの差分
pub fn diff_branch_protection(
    observed: Option<&BranchProtection>,
    desired: Option<&BranchProtection>,
) -> Option<PlannedChange<BranchProtection>> {
    match (observed, desired) {
        (None, None) => None,
        (None, Some(after)) => Some(PlannedChange::safe(Change::Create {
            after: after.clone(),
        })),
        (Some(before), None) => Some(PlannedChange::with_reasons(
            Change::Delete {
                before: before.clone(),
            },
            vec!["removing protection".to_string()],
        )),
        (Some(before), Some(after)) => {
            if protection_equal(before, after) {
                return None;
            }
            Some(PlannedChange::with_reasons(
                Change::Update {
                    before: before.clone(),
                    after: after.clone(),
                },
                protection_reductions(before, after),
            ))
        }
    }
}

fn protection_equal(left: &BranchProtection, right: &BranchProtection) -> bool {
    left.required_reviews == right.required_reviews
        && left.dismiss_stale_reviews == right.dismiss_stale_reviews
        && left.require_code_owner_review == right.require_code_owner_review
        && multiset_eq(&left.required_status_checks, &right.required_status_checks)
        && left.require_up_to_date == right.require_up_to_date
        && multiset_eq(&left.restrict_pushes, &right.restrict_pushes)
}

/// 保護を弱める変更点を列挙する
fn protection_reductions(before: &BranchProtection, after: &BranchProtection) -> Vec<String> {
    let mut reasons = Vec::new();

    if after.required_reviews < before.required_reviews {
        reasons.push(format!(
            "reducing protection: required reviews {} -> {}",
            before.required_reviews, after.required_reviews
        ));
    }
    if before.dismiss_stale_reviews && !after.dismiss_stale_reviews {
        reasons.push("reducing protection: stale reviews are no longer dismissed".to_string());
    }
    if before.require_code_owner_review && !after.require_code_owner_review {
        reasons.push("reducing protection: code owner review no longer required".to_string());
    }
    let dropped_checks = removed_items(&before.required_status_checks, &after.required_status_checks);
    if !dropped_checks.is_empty() {
        reasons.push(format!(
            "reducing protection: status checks no longer required: {}",
            dropped_checks.join(", ")
        ));
    }
    if before.require_up_to_date && !after.require_up_to_date {
        reasons.push("reducing protection: branch no longer required to be up to date".to_string());
    }
    let dropped_actors = removed_items(&before.restrict_pushes, &after.restrict_pushes);
    if !dropped_actors.is_empty() {
        reasons.push(format!(
            "reducing protection: push restriction list shrinks: {}",
            dropped_actors.join(", ")
        ));
    }

    reasons
}

fn diff_access<T>(
    observed: Option<&T>,
    desired: Option<&T>,
    permission_of: fn(&T) -> &Permission,
) -> Option<PlannedChange<T>>
where
    T: Clone,
{
    match (observed, desired) {
        (None, None) => None,
        (None, Some(after)) => Some(PlannedChange::safe(Change::Create {
            after: after.clone(),
        })),
        (Some(before), None) => Some(PlannedChange::with_reasons(
            Change::Delete {
                before: before.clone(),
            },
            vec!["removing access".to_string()],
        )),
        (Some(before), Some(after)) => {
            let current = permission_of(before);
            let next = permission_of(after);
            if current == next {
                return None;
            }
            let mut reasons = Vec::new();
            if current.is_downgrade_to(next) {
                reasons.push(format!("reducing access: {} -> {}", current, next));
            }
            Some(PlannedChange::with_reasons(
                Change::Update {
                    before: before.clone(),
                    after: after.clone(),
                },
                reasons,
            ))
        }
    }
}

/// コラボレーターの差分
pub fn diff_collaborator(
    observed: Option<&Collaborator>,
    desired: Option<&Collaborator>,
) -> Option<PlannedChange<Collaborator>> {
    diff_access(observed, desired, collaborator_permission)
}

fn collaborator_permission(collaborator: &Collaborator) -> &Permission {
    &collaborator.permission
}

fn team_permission(team: &TeamAccess) -> &Permission {
    &team.permission
}

/// チームアクセスの差分
pub fn diff_team_access(
    observed: Option<&TeamAccess>,
    desired: Option<&TeamAccess>,
) -> Option<PlannedChange<TeamAccess>> {
    diff_access(observed, desired, team_permission)
}

/// Webhookの差分
///
/// 削除は常に破壊的、イベントや有効状態の更新は非破壊的。
pub fn diff_webhook(
    observed: Option<&Webhook>,
    desired: Option<&Webhook>,
) -> Option<PlannedChange<Webhook>> {
    match (observed, desired) {
        (None, None) => None,
        (None, Some(after)) => Some(PlannedChange::safe(Change::Create {
            after: after.clone(),
        })),
        (Some(before), None) => Some(PlannedChange::with_reasons(
            Change::Delete {
                before: before.clone(),
            },
            vec!["removing webhook".to_string()],
        )),
        (Some(before), Some(after)) => {
            if before.active == after.active && multiset_eq(&before.events, &after.events) {
                return None;
            }
            let mut after = after.clone();
            after.id = before.id;
            Some(PlannedChange::safe(Change::Update {
                before: before.clone(),
                after,
            }))
        }
    }
}

/// キー付きリソースのリストを突き合わせて差分を計算する
///
/// 作成・更新は宣言順、削除は観測順に並ぶ。同じキーが宣言側で重複した場合は
/// 最初のものを採用する（重複自体は検証でエラーになる）。
pub fn diff_keyed<T, F>(observed: &[T], desired: &[T], diff_one: F) -> Vec<PlannedChange<T>>
where
    T: Resource,
    F: Fn(Option<&T>, Option<&T>) -> Option<PlannedChange<T>>,
{
    let observed_by_key: HashMap<String, &T> = observed
        .iter()
        .map(|resource| (resource.match_key(), resource))
        .collect();

    let mut changes = Vec::new();
    let mut declared = HashSet::new();

    for resource in desired {
        let key = resource.match_key();
        if !declared.insert(key.clone()) {
            continue;
        }
        let current = observed_by_key.get(&key).copied();
        if let Some(change) = diff_one(current, Some(resource)) {
            changes.push(change);
        }
    }

    for resource in observed {
        if declared.contains(&resource.match_key()) {
            continue;
        }
        if let Some(change) = diff_one(Some(resource), None) {
            changes.push(change);
        }
    }

    changes
}

/// 1リポジトリ分の変更計画を計算する
///
/// 宣言されていない（`None` の）リストは空リストとして扱い、
/// 観測側にだけ存在するリソースは削除になる。
pub fn compute_plan(desired: &RepositoryConfig, observed: &ObservedState) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::new(&desired.name);

    plan.settings = diff_repository(observed.settings.as_ref(), desired);
    plan.branch_protection = diff_keyed(
        &observed.branch_protection,
        declared(&desired.branch_protection),
        diff_branch_protection,
    );
    plan.collaborators = diff_keyed(
        &observed.collaborators,
        declared(&desired.collaborators),
        diff_collaborator,
    );
    plan.teams = diff_keyed(&observed.teams, declared(&desired.teams), diff_team_access);
    plan.webhooks = diff_keyed(&observed.webhooks, declared(&desired.webhooks), diff_webhook);

    plan
}

fn declared<T>(list: &Option<Vec<T>>) -> &[T] {
    list.as_deref().unwrap_or_default()
}

//! 順序を無視し重複数を考慮する文字列コレクションの比較
//!
//! topics、webhookのevents、必須ステータスチェック、push制限アクターなど、
//! 設定上はリストでも意味的には集合として扱う値の比較に使用する。

use std::collections::{HashMap, HashSet};

fn counts(items: &[String]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item.as_str()).or_insert(0) += 1;
    }
    counts
}

/// 要素ごとの出現回数が一致する場合にのみ等しいとみなす
///
/// ```
/// use repoconf::domain::value_objects::string_multiset::multiset_eq;
///
/// let a = vec!["a".to_string(), "b".to_string(), "c".to_string()];
/// let b = vec!["c".to_string(), "a".to_string(), "b".to_string()];
/// assert!(multiset_eq(&a, &b));
/// ```
pub fn multiset_eq(left: &[String], right: &[String]) -> bool {
    left.len() == right.len() && counts(left) == counts(right)
}

/// `before` には含まれるが `after` には一度も現れない要素
///
/// 集合として比較するため、重複数の減少は削除とみなさない。
/// 戻り値は `before` に現れた順序で重複なく並ぶ。
pub fn removed_items(before: &[String], after: &[String]) -> Vec<String> {
    let kept: HashSet<&str> = after.iter().map(String::as_str).collect();
    let mut removed: Vec<String> = Vec::new();
    for item in before {
        if !kept.contains(item.as_str()) && !removed.contains(item) {
            removed.push(item.clone());
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_order_is_ignored() {
        assert!(multiset_eq(&strings(&["a", "b", "c"]), &strings(&["c", "a", "b"])));
        assert!(multiset_eq(&[], &[]));
    }

    #[test]
    fn test_multiplicity_is_respected() {
        assert!(!multiset_eq(
            &strings(&["a", "a", "b"]),
            &strings(&["a", "b", "b"])
        ));
        assert!(!multiset_eq(&strings(&["a"]), &strings(&["a", "a"])));
    }

    #[test]
    fn test_removed_items() {
        assert_eq!(
            removed_items(&strings(&["ci", "lint", "ci"]), &strings(&["lint"])),
            strings(&["ci"])
        );
        assert!(removed_items(&strings(&["ci"]), &strings(&["ci", "docs"])).is_empty());
    }

    #[test]
    fn test_fewer_duplicates_is_not_removal() {
        assert!(removed_items(&strings(&["ci", "ci"]), &strings(&["ci"])).is_empty());
    }
}

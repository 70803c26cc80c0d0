use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use crate::application::use_cases::reconcile_repositories::{
    MultiRepoResult, MultiRepoValidationResult, PlanSet,
};
use crate::domain::entities::plan::{Change, PlannedChange, ReconciliationPlan, Resource};

/// Print per-repository validation results and a summary line
pub fn print_validation(result: &MultiRepoValidationResult) {
    for (name, report) in &result.details {
        if report.is_valid() {
            println!("{} {}", "✓".green().bold(), name.bold());
        } else {
            println!("{} {}", "✗".red().bold(), name.bold());
        }
        for issue in &report.errors {
            println!("    {} {}", "error:".red(), issue);
        }
        for issue in &report.warnings {
            println!("    {} {}", "warning:".yellow(), issue);
        }
    }

    if let Some(reason) = &result.online_skipped {
        println!("{} Online checks skipped: {}", "::".blue().bold(), reason);
    }

    let summary = &result.summary;
    println!(
        "{} {} repositories: {} valid, {} invalid, {} warning(s)",
        "::".blue().bold(),
        summary.total,
        summary.valid.to_string().green(),
        summary.invalid.to_string().red(),
        summary.warnings.to_string().yellow()
    );
}

/// Print every plan followed by the planning failures
pub fn print_plan_set(set: &PlanSet) {
    for plan in &set.plans {
        print_plan(plan);
    }
    for (name, error) in &set.failures {
        println!("{} {}: {}", "✗".red().bold(), name.bold(), error);
    }
    println!(
        "{} {} change(s) across {} repositories, {} destructive",
        "::".blue().bold(),
        set.change_count(),
        set.plans.len(),
        set.destructive_count().to_string().red()
    );
}

/// Print one repository plan
pub fn print_plan(plan: &ReconciliationPlan) {
    if plan.is_empty() {
        println!("{} {} is up to date", "✓".green().bold(), plan.repository.bold());
        return;
    }

    println!(
        "{} {} ({} change(s))",
        "::".blue().bold(),
        plan.repository.bold(),
        plan.change_count()
    );
    if let Some(settings) = &plan.settings {
        print_change(settings);
    }
    plan.branch_protection.iter().for_each(print_change);
    plan.collaborators.iter().for_each(print_change);
    plan.teams.iter().for_each(print_change);
    plan.webhooks.iter().for_each(print_change);
}

fn print_change<T: Resource + Serialize>(planned: &PlannedChange<T>) {
    let label = planned.change.resource_label();
    match &planned.change {
        Change::Create { .. } => println!("    {} {}", "+".green().bold(), label),
        Change::Update { before, after } => {
            println!("    {} {}", "~".yellow().bold(), label);
            for (field, old, new) in changed_fields(before, after) {
                println!("        {}: {} -> {}", field, old.dimmed(), new.green());
            }
        }
        Change::Delete { .. } => println!("    {} {}", "-".red().bold(), label),
    }
    for reason in &planned.destructive_reasons {
        println!("        {} {}", "!".red().bold(), reason.red());
    }
}

/// Top-level fields whose serialized values differ
fn changed_fields<T: Serialize>(before: &T, after: &T) -> Vec<(String, String, String)> {
    let (Ok(Value::Object(before)), Ok(Value::Object(after))) =
        (serde_json::to_value(before), serde_json::to_value(after))
    else {
        return Vec::new();
    };

    after
        .iter()
        .filter_map(|(field, new)| {
            let old = before.get(field).cloned().unwrap_or(Value::Null);
            (old != *new).then(|| (field.clone(), old.to_string(), new.to_string()))
        })
        .collect()
}

/// Print per-repository apply results and a summary line
pub fn print_apply(result: &MultiRepoResult) {
    for report in &result.reports {
        println!(
            "{} {} ({} change(s) applied)",
            "✓".green().bold(),
            report.repository.bold(),
            report.applied.len()
        );
    }
    for name in &result.skipped {
        println!("{} {} is up to date", "-".dimmed(), name.bold());
    }
    for (name, error) in &result.failed {
        println!("{} {}: {}", "✗".red().bold(), name.bold(), error);
    }

    let summary = &result.summary;
    println!(
        "{} {} repositories: {} succeeded, {} failed, {} skipped, {} change(s) applied",
        "::".blue().bold(),
        summary.total,
        summary.success.to_string().green(),
        summary.failure.to_string().red(),
        summary.skipped,
        summary.total_changes
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::repository_config::BranchProtection;

    #[test]
    fn test_changed_fields() {
        let before = BranchProtection::new("main").with_required_reviews(2);
        let after = BranchProtection::new("main")
            .with_required_reviews(1)
            .with_status_checks(["ci"]);

        let fields = changed_fields(&before, &after);

        assert_eq!(
            fields,
            vec![
                ("required_reviews".to_string(), "2".to_string(), "1".to_string()),
                (
                    "required_status_checks".to_string(),
                    "[]".to_string(),
                    "[\"ci\"]".to_string()
                ),
            ]
        );
    }
}

use anyhow::{bail, Result};
use colored::Colorize;

use super::connection::{filter, load_config, ConnectionOptions};
use super::render::{print_apply, print_plan_set};

/// Handler for the apply command
///
/// Always re-plans from a fresh read before applying.
pub struct ApplyCommand {
    pub file: String,
    pub only: Vec<String>,
    pub yes: bool,
}

impl ApplyCommand {
    pub fn new(file: String, only: Vec<String>, yes: bool) -> Self {
        Self { file, only, yes }
    }

    pub async fn execute(&self, connection: &ConnectionOptions) -> Result<()> {
        let config = load_config(&self.file).await?;
        let reconciler = connection.reconciler()?;

        let planned = reconciler.plan_all(&config, filter(&self.only)).await?;
        let set = &planned.result;
        print_plan_set(set);

        if set.change_count() == 0 {
            println!("{} Nothing to apply", "✓".green().bold());
            return match planned.error {
                Some(error) => Err(error.into()),
                None => Ok(()),
            };
        }

        if set.destructive_count() > 0 && !self.yes {
            bail!(
                "{} destructive change(s) planned; re-run with --yes to apply them",
                set.destructive_count()
            );
        }

        println!("{} Applying changes...", "::".blue().bold());
        let applied = reconciler.apply_all(&set.plans).await?;
        print_apply(&applied.result);

        // Apply failures take precedence over planning failures in the exit status.
        match applied.error.or(planned.error) {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

use anyhow::Result;
use clap::ValueEnum;

use super::connection::{filter, load_config, ConnectionOptions};
use super::render::print_plan_set;

/// Output format for the plan command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    Text,
    /// JSON output
    Json,
}

/// Handler for the plan command
pub struct PlanCommand {
    pub file: String,
    pub only: Vec<String>,
    pub format: OutputFormat,
}

impl PlanCommand {
    pub fn new(file: String, only: Vec<String>, format: OutputFormat) -> Self {
        Self { file, only, format }
    }

    pub async fn execute(&self, connection: &ConnectionOptions) -> Result<()> {
        let config = load_config(&self.file).await?;
        let reconciler = connection.reconciler()?;

        let outcome = reconciler.plan_all(&config, filter(&self.only)).await?;
        match self.format {
            OutputFormat::Text => print_plan_set(&outcome.result),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome.result)?),
        }

        match outcome.error {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

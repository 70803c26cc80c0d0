pub mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::exit;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::github::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use commands::{ApplyCommand, ConnectionOptions, OutputFormat, PlanCommand, ValidateCommand};

/// repoconf - Reconcile hosted repositories with a YAML-declared desired state
#[derive(Parser)]
#[command(name = "repoconf")]
#[command(about = "Reconcile hosted repositories with a YAML-declared desired state")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Organization or user owning the repositories
    #[arg(long, env = "REPOCONF_OWNER", global = true)]
    pub owner: Option<String>,

    /// API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// API base URL (for GitHub Enterprise)
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a desired-state file
    Validate {
        /// Path to the desired-state YAML file
        file: String,

        /// Only these repositories (repeatable)
        #[arg(long)]
        only: Vec<String>,

        /// Also check users, teams and permissions against the API
        #[arg(long)]
        online: bool,
    },

    /// Show the changes needed to reach the desired state
    Plan {
        /// Path to the desired-state YAML file
        file: String,

        /// Only these repositories (repeatable)
        #[arg(long)]
        only: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Plan and apply the changes
    Apply {
        /// Path to the desired-state YAML file
        file: String,

        /// Only these repositories (repeatable)
        #[arg(long)]
        only: Vec<String>,

        /// Apply destructive changes without refusing
        #[arg(short, long)]
        yes: bool,
    },
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    /// Install the tracing subscriber; `--verbose` forces debug level
    pub fn init_logging(&self) {
        let filter = if self.cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    pub async fn run(self) -> anyhow::Result<()> {
        if self.cli.no_color {
            colored::control::set_override(false);
        }

        match self.handle_command().await {
            Ok(_) => Ok(()),
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                exit(1);
            }
        }
    }

    fn connection(&self) -> ConnectionOptions {
        ConnectionOptions {
            owner: self.cli.owner.clone(),
            token: self.cli.token.clone().filter(|t| !t.is_empty()),
            api_url: self.cli.api_url.clone(),
            timeout_secs: self.cli.timeout_secs,
        }
    }

    async fn handle_command(&self) -> anyhow::Result<()> {
        let connection = self.connection();
        match &self.cli.command {
            Commands::Validate { file, only, online } => {
                ValidateCommand::new(file.clone(), only.clone(), *online)
                    .execute(&connection)
                    .await
            }
            Commands::Plan { file, only, format } => {
                PlanCommand::new(file.clone(), only.clone(), *format)
                    .execute(&connection)
                    .await
            }
            Commands::Apply { file, only, yes } => {
                ApplyCommand::new(file.clone(), only.clone(), *yes)
                    .execute(&connection)
                    .await
            }
        }
    }
}

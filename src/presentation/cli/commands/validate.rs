use anyhow::Result;

use super::connection::{filter, load_config, ConnectionOptions};
use super::render::print_validation;

/// Handler for the validate command
pub struct ValidateCommand {
    pub file: String,
    pub only: Vec<String>,
    pub online: bool,
}

impl ValidateCommand {
    pub fn new(file: String, only: Vec<String>, online: bool) -> Self {
        Self { file, only, online }
    }

    pub async fn execute(&self, connection: &ConnectionOptions) -> Result<()> {
        let config = load_config(&self.file).await?;
        let reconciler = if self.online {
            connection.reconciler_if_available()?
        } else {
            connection.offline_reconciler()
        };

        let outcome = reconciler
            .validate_all(&config, filter(&self.only), self.online)
            .await?;
        print_validation(&outcome.result);

        match outcome.error {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

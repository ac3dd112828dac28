//! Delete command implementation

use crate::adapters::fhir::cancellable;
use crate::cli::commands::report_failure;
use crate::config::DeskConfig;
use crate::core::registry::{PatientRegistry, RemovalOutcome};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Patient id
    pub id: String,
}

impl DeleteArgs {
    /// Execute the delete command
    pub async fn execute(
        &self,
        config: &DeskConfig,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(id = %self.id, "Deleting patient");

        let registry = match PatientRegistry::from_config(config) {
            Ok(r) => r,
            Err(e) => return Ok(report_failure("Failed to connect to FHIR server", &e)),
        };

        match cancellable(&mut shutdown, registry.remove(&self.id)).await {
            Ok(RemovalOutcome::Deleted) => println!("✅ Patient {} deleted", self.id),
            Ok(RemovalOutcome::AlreadyAbsent) => {
                println!("⚠️  Patient {} was not found; nothing to delete", self.id)
            }
            Err(e) => {
                return Ok(report_failure(
                    &format!("Failed to delete patient '{}'", self.id),
                    &e,
                ))
            }
        }
        Ok(0)
    }
}

//! Update command implementation

use crate::adapters::fhir::cancellable;
use crate::cli::commands::report_failure;
use crate::cli::render::{patient_detail, patients_json};
use crate::config::DeskConfig;
use crate::core::registry::{parse_date_argument, DemographicsUpdate, PatientRegistry};
use crate::domain::AdministrativeGender;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Patient id
    pub id: String,

    /// New family name
    #[arg(long)]
    pub family: Option<String>,

    /// Replacement given names (repeat for several)
    #[arg(short, long)]
    pub given: Vec<String>,

    /// New date of birth as YYYY-MM-DD
    #[arg(short, long)]
    pub birth_date: Option<String>,

    /// New administrative gender
    #[arg(long)]
    pub gender: Option<AdministrativeGender>,

    /// Home phone number to add
    #[arg(short, long)]
    pub phone: Option<String>,

    /// Print the stored resource as FHIR JSON
    #[arg(long)]
    pub json: bool,
}

impl UpdateArgs {
    fn changes(&self) -> crate::domain::Result<DemographicsUpdate> {
        Ok(DemographicsUpdate {
            family: self.family.clone(),
            given: (!self.given.is_empty()).then(|| self.given.clone()),
            birth_date: self
                .birth_date
                .as_deref()
                .map(parse_date_argument)
                .transpose()?,
            gender: self.gender,
            home_phone: self.phone.clone(),
        })
    }

    /// Execute the update command
    pub async fn execute(
        &self,
        config: &DeskConfig,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(id = %self.id, "Updating patient");

        let changes = match self.changes() {
            Ok(c) => c,
            Err(e) => return Ok(report_failure("Invalid update", &e)),
        };

        let registry = match PatientRegistry::from_config(config) {
            Ok(r) => r,
            Err(e) => return Ok(report_failure("Failed to connect to FHIR server", &e)),
        };

        let patient = match cancellable(&mut shutdown, registry.revise(&self.id, &changes)).await {
            Ok(p) => p,
            Err(e) => {
                return Ok(report_failure(
                    &format!("Failed to update patient '{}'", self.id),
                    &e,
                ))
            }
        };

        if self.json {
            println!("{}", patients_json(std::slice::from_ref(&patient))?);
        } else {
            println!("✅ Patient updated");
            println!("{}", patient_detail(&patient));
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> UpdateArgs {
        UpdateArgs {
            id: "1".to_string(),
            family: None,
            given: Vec::new(),
            birth_date: None,
            gender: None,
            phone: None,
            json: false,
        }
    }

    #[test]
    fn test_phone_only_update() {
        let args = UpdateArgs {
            phone: Some("555-0101".to_string()),
            ..args()
        };
        let changes = args.changes().unwrap();
        assert!(changes.given.is_none());
        assert_eq!(changes.home_phone.as_deref(), Some("555-0101"));
    }

    #[test]
    fn test_bad_birth_date() {
        let args = UpdateArgs {
            birth_date: Some("12/05/1990".to_string()),
            ..args()
        };
        assert!(args.changes().is_err());
    }
}

//! Core business logic for fhirdesk.
//!
//! # Modules
//!
//! - [`registry`] - Patient registration workflows over the FHIR client
//!
//! # Example
//!
//! ```rust,no_run
//! use fhirdesk::config::load_config;
//! use fhirdesk::core::registry::{PatientQuery, PatientRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("fhirdesk.toml")?;
//! let registry = PatientRegistry::from_config(&config)?;
//!
//! let query = PatientQuery {
//!     criteria: vec!["family=Garcia".to_string()],
//!     max_results: Some(5),
//!     only_with_encounters: true,
//! };
//! for patient in registry.find_patients(&query, None).await? {
//!     println!("{:?}", patient.primary_name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod registry;

pub use registry::{
    parse_date_argument, DemographicsUpdate, PatientQuery, PatientRegistry, Registration,
    RemovalOutcome,
};

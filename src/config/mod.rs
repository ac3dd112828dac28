//! Configuration management for fhirdesk.
//!
//! fhirdesk uses a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `FHIRDESK_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`ClientConfig`] - FHIR server URL, wire format, return preference, auth, timeouts
//! - [`SearchConfig`] - Result limit and page size for patient searches
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "development"
//!
//! [application]
//! log_level = "info"
//!
//! [server]
//! base_url = "http://localhost:8081/fhir"
//! return_preference = "representation"
//! timeout_seconds = 30
//! auth_type = "bearer"
//! token = "${FHIRDESK_TOKEN}"
//!
//! [search]
//! max_results = 20
//! page_size = 50
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default};
pub use schema::{
    known_server, ApplicationConfig, AuthType, ClientConfig, DeskConfig, Environment,
    LoggingConfig, ReturnPreference, SearchConfig, WireFormat,
};
pub use secret::{secret_string, SecretString, SecretValue};

//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - Console output on stderr, filtered by level or `RUST_LOG`
//! - Optional JSON-lines file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use fhirdesk::logging::init_logging;
//! use fhirdesk::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! tracing::error!(error = "Something went wrong", "Error occurred");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log one completed HTTP exchange with the FHIR server
///
/// # Example
///
/// ```no_run
/// use fhirdesk::log_fhir_exchange;
/// use std::time::Duration;
///
/// log_fhir_exchange!("GET", "http://localhost:8081/fhir/Patient/1", 200, Duration::from_millis(12));
/// ```
#[macro_export]
macro_rules! log_fhir_exchange {
    ($method:expr, $url:expr, $status:expr, $elapsed:expr) => {
        tracing::debug!(
            method = %$method,
            url = %$url,
            status = $status,
            elapsed_ms = $elapsed.as_millis() as u64,
            "FHIR request completed"
        );
    };
}

/// Log a fetched page of search results
///
/// # Example
///
/// ```no_run
/// use fhirdesk::log_page_fetched;
///
/// log_page_fetched!("Patient", 20, Some(57u64), true);
/// ```
#[macro_export]
macro_rules! log_page_fetched {
    ($resource_type:expr, $entries:expr, $total:expr, $has_next:expr) => {
        tracing::debug!(
            resource_type = $resource_type,
            entries = $entries,
            total = ?$total,
            has_next = $has_next,
            "Search page fetched"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use fhirdesk::log_error_with_context;
/// use fhirdesk::domain::FhirError;
///
/// let error = FhirError::NotFound("Patient/123".to_string());
/// log_error_with_context!(&error, "Failed to read patient");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

//! CLI command implementations
//!
//! Commands print their results and return a process exit code:
//! 0 success, 1 not found or rejected, 2 configuration or credentials, 5 fatal.

pub mod create;
pub mod delete;
pub mod init;
pub mod read;
pub mod search;
pub mod update;
pub mod validate;

use crate::domain::FhirError;
use crate::log_error_with_context;

/// Exit code for a failed operation
pub fn exit_code(error: &FhirError) -> i32 {
    match error {
        FhirError::InvalidArgument(_) | FhirError::NotFound(_) | FhirError::Validation { .. } => 1,
        FhirError::Configuration(_) | FhirError::Authentication(_) => 2,
        FhirError::MalformedResource(_)
        | FhirError::Transport(_)
        | FhirError::Cancelled
        | FhirError::Io(_) => 5,
    }
}

/// Prints a failure and returns its exit code
pub(crate) fn report_failure(context: &str, error: &FhirError) -> i32 {
    log_error_with_context!(error, context);
    println!("❌ {context}");
    println!("   Error: {error}");
    exit_code(error)
}

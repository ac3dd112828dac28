//! Result type alias for fhirdesk

use super::errors::FhirError;

/// Result type alias for fhirdesk operations
///
/// # Examples
///
/// ```
/// use fhirdesk::domain::result::Result;
/// use fhirdesk::domain::errors::FhirError;
///
/// fn require_id(id: &str) -> Result<&str> {
///     if id.is_empty() {
///         return Err(FhirError::InvalidArgument("id cannot be empty".to_string()));
///     }
///     Ok(id)
/// }
///
/// assert!(require_id("").is_err());
/// ```
pub type Result<T> = std::result::Result<T, FhirError>;

//! Resource identifier type with validation
//!
//! FHIR logical ids are server-assigned and limited to 1-64 characters drawn
//! from `[A-Za-z0-9\-\.]`. Keeping them in a newtype means an id that reached
//! a URL path has already been checked.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a FHIR logical id
pub const MAX_ID_LENGTH: usize = 64;

/// FHIR logical id newtype wrapper
///
/// # Examples
///
/// ```
/// use fhirdesk::domain::ids::ResourceId;
/// use std::str::FromStr;
///
/// let id = ResourceId::from_str("a1b2-c3.d4").unwrap();
/// assert_eq!(id.as_str(), "a1b2-c3.d4");
///
/// assert!(ResourceId::new("").is_err());
/// assert!(ResourceId::new("Patient/123").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates a new ResourceId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(ResourceId)` if the id is valid, `Err` with a description otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Resource id cannot be empty".to_string());
        }

        if id.len() > MAX_ID_LENGTH {
            return Err(format!(
                "Resource id must be at most {MAX_ID_LENGTH} characters, got {}",
                id.len()
            ));
        }

        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
        {
            return Err(format!(
                "Invalid character '{c}' in resource id '{id}'. Allowed: A-Z, a-z, 0-9, '-', '.'"
            ));
        }

        Ok(Self(id))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_id_valid() {
        let id = ResourceId::new("123").unwrap();
        assert_eq!(id.as_str(), "123");
        assert_eq!(id.to_string(), "123");

        let id = ResourceId::new("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap();
        assert_eq!(id.into_inner(), "7d44b88c-4199-4bad-97dc-d78268e01398");
    }

    #[test]
    fn test_resource_id_empty() {
        assert!(ResourceId::new("").is_err());
        assert!(ResourceId::new("   ").is_err());
    }

    #[test]
    fn test_resource_id_rejects_path_characters() {
        let err = ResourceId::new("Patient/123").unwrap_err();
        assert!(err.contains("'/'"));
        assert!(ResourceId::new("12 3").is_err());
        assert!(ResourceId::new("abc?x=1").is_err());
    }

    #[test]
    fn test_resource_id_length_limit() {
        assert!(ResourceId::new("a".repeat(MAX_ID_LENGTH)).is_ok());
        assert!(ResourceId::new("a".repeat(MAX_ID_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_resource_id_serde_transparent_string() {
        let id = ResourceId::new("example").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"example\"");
    }
}

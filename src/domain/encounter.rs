//! Encounter domain model
//!
//! Only the fields needed to relate an encounter back to its patient are modelled.

use super::ids::ResourceId;
use std::fmt;

/// A literal reference to another resource, e.g. `Patient/123`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference(String);

impl Reference {
    /// Builds a relative reference `{resource_type}/{id}`
    pub fn to(resource_type: &str, id: &ResourceId) -> Self {
        Self(format!("{resource_type}/{id}"))
    }

    /// Wraps a reference string as received from the server
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An Encounter resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encounter {
    id: Option<ResourceId>,

    /// Status code (planned, in-progress, finished, ...)
    pub status: Option<String>,

    /// The patient the encounter is about
    pub subject: Option<Reference>,
}

impl Encounter {
    /// Creates an unpersisted encounter for the given subject
    pub fn for_subject(subject: Reference, status: impl Into<String>) -> Self {
        Self {
            id: None,
            status: Some(status.into()),
            subject: Some(subject),
        }
    }

    /// Server-assigned id, if the encounter has been persisted
    pub fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    pub(crate) fn with_assigned_id(mut self, id: ResourceId) -> Self {
        self.id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_to_patient() {
        let id = ResourceId::new("123").unwrap();
        let reference = Reference::to("Patient", &id);
        assert_eq!(reference.as_str(), "Patient/123");
    }

    #[test]
    fn test_encounter_for_subject() {
        let encounter = Encounter::for_subject(Reference::new("Patient/7"), "finished");
        assert!(encounter.id().is_none());
        assert_eq!(encounter.status.as_deref(), Some("finished"));
        assert_eq!(encounter.subject.unwrap().to_string(), "Patient/7");
    }
}

//! Domain models and types for fhirdesk.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ResourceId`])
//! - **Resource models** ([`Patient`], [`Encounter`]) and their nested datatypes
//! - **Search results** ([`SearchBundle`], [`ContinuationLink`])
//! - **Error types** ([`FhirError`], [`TransportError`])
//! - **Result type alias** ([`Result`])
//!
//! Domain types carry no wire-format knowledge; encoding and decoding live in
//! [`crate::adapters::fhir::codec`].
//!
//! # Builder Pattern
//!
//! ```rust
//! use fhirdesk::domain::{AdministrativeGender, ContactPoint, HumanName, Patient};
//!
//! let patient = Patient::builder()
//!     .name(HumanName::new("Garcia").with_given("Ana"))
//!     .telecom(ContactPoint::home_phone("555-0101"))
//!     .gender(AdministrativeGender::Female)
//!     .build();
//! assert!(patient.id().is_none());
//! ```

pub mod bundle;
pub mod encounter;
pub mod errors;
pub mod ids;
pub mod patient;
pub mod result;

// Re-export commonly used types for convenience
pub use bundle::{ContinuationLink, SearchBundle};
pub use encounter::{Encounter, Reference};
pub use errors::{FhirError, TransportError, TransportErrorKind};
pub use ids::ResourceId;
pub use patient::{
    AdministrativeGender, ContactPoint, ContactPointSystem, ContactPointUse, HumanName, Patient,
    PatientBuilder,
};
pub use result::Result;

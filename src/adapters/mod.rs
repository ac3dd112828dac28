//! External system integrations for fhirdesk.
//!
//! - [`fhir`] - FHIR R4 REST server integration (HAPI, Firely, local servers)
//!
//! # Design Pattern
//!
//! The HTTP layer sits behind the [`fhir::Transport`] trait so the resource
//! client, paginator and filters can be exercised against a mock server or a
//! scripted transport in tests.
//!
//! ```rust,no_run
//! use fhirdesk::adapters::fhir::{ResourceClient, Session};
//! use fhirdesk::config::ClientConfig;
//! use fhirdesk::domain::Patient;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Arc::new(Session::new(ClientConfig::for_server("local"))?);
//! let patients = ResourceClient::<Patient>::from_session(session);
//! let patient = patients.read("123").await?;
//! println!("{:?}", patient.primary_name());
//! # Ok(())
//! # }
//! ```

pub mod fhir;

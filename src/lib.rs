// fhirdesk - FHIR patient record client
// Copyright (c) 2025 fhirdesk Contributors
// Licensed under the MIT License

//! # fhirdesk - FHIR patient record client
//!
//! fhirdesk searches, registers, reads, updates and deletes Patient records on
//! FHIR R4 servers over the RESTful JSON API.
//!
//! ## Overview
//!
//! This library provides:
//! - **Transport**: a reqwest-backed [`adapters::fhir::Session`] with content
//!   negotiation, return preference and optional authentication
//! - **Codec**: Patient, Encounter and search Bundle JSON to and from domain types
//! - **Resource client**: typed create, read, update and delete
//! - **Paginator**: lazy, capped, filtered iteration over search result pages
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Patient registry workflows
//! - [`adapters`] - FHIR server integration
//! - [`domain`] - Resource models, identifiers and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fhirdesk::adapters::fhir::{HasEncounters, ResourceClient, SearchRequest, Session};
//! use fhirdesk::config::ClientConfig;
//! use fhirdesk::domain::Patient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Arc::new(Session::new(ClientConfig::for_server("hapi"))?);
//!     let patients = ResourceClient::<Patient>::from_session(session);
//!
//!     let request = SearchRequest::from_criteria(["family=Garcia"])?
//!         .max_results(10)
//!         .filter(HasEncounters::new(patients.sibling()));
//!
//!     for patient in patients.search_all(request).await? {
//!         println!("{:?}", patient.primary_name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`], whose error is
//! [`domain::FhirError`]:
//!
//! ```rust,no_run
//! use fhirdesk::adapters::fhir::{ResourceClient, Session};
//! use fhirdesk::config::ClientConfig;
//! use fhirdesk::domain::{FhirError, Patient};
//! use std::sync::Arc;
//!
//! # async fn example() -> fhirdesk::domain::Result<()> {
//! let session = Arc::new(Session::new(ClientConfig::default())?);
//! let patients = ResourceClient::<Patient>::from_session(session);
//! match patients.read("123").await {
//!     Ok(patient) => println!("{:?}", patient.primary_name()),
//!     Err(FhirError::NotFound(what)) => println!("no such patient: {what}"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

//! FHIR R4 REST client
//!
//! Layers, bottom up:
//!
//! - [`transport`] - [`Session`] and the byte-level [`Transport`] seam
//! - [`codec`] - FHIR JSON to and from domain resources
//! - [`client`] - typed CRUD and search pages per resource type
//! - [`search`] - lazy, filtered, capped pagination over search results
//! - [`filter`] - candidate filters, including the encounter existence check

pub mod client;
pub mod codec;
pub mod filter;
mod models;
pub mod search;
pub mod transport;

pub use client::{server_capabilities, ResourceClient, ServerCapabilities};
pub use codec::{decode, decode_bundle, encode, DateHandling, FhirResource};
pub use filter::{filter_fn, FnFilter, HasEncounters, SearchFilter};
pub use search::{cancellable, SearchParam, SearchRequest, SearchResults, DEFAULT_MAX_RESULTS};
pub use transport::{HttpMethod, RawResponse, Session, Transport, TransportRequest};

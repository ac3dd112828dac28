//! Search filters
//!
//! A filter decides per candidate whether the paginator yields it. Filters
//! run in server order, one candidate at a time, and may query the server.

use super::client::ResourceClient;
use super::codec::FhirResource;
use super::search::SearchParam;
use crate::domain::{Encounter, FhirError, Patient, Reference, Result};
use async_trait::async_trait;
use std::fmt;

/// Predicate applied to each search candidate
///
/// An error from `accept` ends the search with that error.
#[async_trait]
pub trait SearchFilter<R>: Send + Sync {
    async fn accept(&self, candidate: &R) -> Result<bool>;
}

/// Filter backed by a synchronous closure
pub struct FnFilter<F>(F);

impl<F> fmt::Debug for FnFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnFilter")
    }
}

/// Wraps a closure as a [`SearchFilter`]
///
/// # Example
///
/// ```
/// use fhirdesk::adapters::fhir::{filter_fn, SearchFilter};
/// use fhirdesk::domain::{AdministrativeGender, Patient};
///
/// # async fn example() -> fhirdesk::domain::Result<()> {
/// let women = filter_fn(|p: &Patient| p.gender == Some(AdministrativeGender::Female));
/// assert!(!women.accept(&Patient::new()).await?);
/// # Ok(())
/// # }
/// ```
pub fn filter_fn<R, F>(predicate: F) -> FnFilter<F>
where
    F: Fn(&R) -> bool + Send + Sync,
{
    FnFilter(predicate)
}

#[async_trait]
impl<R, F> SearchFilter<R> for FnFilter<F>
where
    R: Sync,
    F: Fn(&R) -> bool + Send + Sync,
{
    async fn accept(&self, candidate: &R) -> Result<bool> {
        Ok((self.0)(candidate))
    }
}

/// Accepts patients referenced by at least one Encounter
///
/// Issues one Encounter search (`patient=Patient/{id}`, `_count=1`) per
/// candidate.
#[derive(Clone)]
pub struct HasEncounters {
    encounters: ResourceClient<Encounter>,
}

impl HasEncounters {
    pub fn new(encounters: ResourceClient<Encounter>) -> Self {
        Self { encounters }
    }
}

#[async_trait]
impl SearchFilter<Patient> for HasEncounters {
    async fn accept(&self, patient: &Patient) -> Result<bool> {
        let id = patient.id().ok_or_else(|| {
            FhirError::MalformedResource("Search returned a Patient without an id".to_string())
        })?;

        let reference = Reference::to(Patient::RESOURCE_TYPE, id);
        let count = self
            .encounters
            .count(&[SearchParam::new("patient", reference.as_str())])
            .await?;

        tracing::debug!(
            patient = %reference,
            encounters = count,
            "Checked patient encounters"
        );
        Ok(count > 0)
    }
}

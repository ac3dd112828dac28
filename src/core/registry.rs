//! Patient registry workflows
//!
//! [`PatientRegistry`] combines the Patient and Encounter clients into the
//! operations a registration desk performs: find patients (optionally only
//! those with encounters), register, look up, revise demographics and remove.

use crate::adapters::fhir::codec::BIRTH_YEARS;
use crate::adapters::fhir::{HasEncounters, ResourceClient, SearchRequest, Session};
use crate::config::{DeskConfig, SearchConfig};
use crate::domain::{
    AdministrativeGender, ContactPoint, ContactPointSystem, ContactPointUse, Encounter, FhirError,
    HumanName, Patient, Result,
};
use chrono::{Datelike, NaiveDate};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio::sync::watch;

/// Criteria for a patient search
#[derive(Debug, Clone, Default)]
pub struct PatientQuery {
    /// `name=value` search parameters, e.g. `family=Garcia`
    pub criteria: Vec<String>,

    /// Overrides `search.max_results` from configuration
    pub max_results: Option<usize>,

    /// Only return patients referenced by at least one Encounter
    pub only_with_encounters: bool,
}

/// Demographics for a new patient
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub family: String,
    pub given: Vec<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<AdministrativeGender>,
    pub home_phone: Option<String>,
}

impl Registration {
    /// Builds the unpersisted Patient
    ///
    /// # Errors
    ///
    /// Returns `FhirError::InvalidArgument` if the family name is blank
    pub fn to_patient(&self) -> Result<Patient> {
        let family = self.family.trim();
        if family.is_empty() {
            return Err(FhirError::InvalidArgument(
                "Family name cannot be empty".to_string(),
            ));
        }

        let mut name = HumanName::new(family);
        for given in self.given.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
            name = name.with_given(given);
        }

        let mut builder = Patient::builder().name(name);
        if let Some(birth_date) = self.birth_date {
            builder = builder.birth_date(birth_date);
        }
        if let Some(gender) = self.gender {
            builder = builder.gender(gender);
        }
        if let Some(phone) = self.home_phone.as_deref().filter(|p| !p.trim().is_empty()) {
            builder = builder.telecom(ContactPoint::home_phone(phone.trim()));
        }
        Ok(builder.build())
    }
}

/// Changes applied to a stored patient by [`PatientRegistry::revise`]
#[derive(Debug, Clone, Default)]
pub struct DemographicsUpdate {
    pub family: Option<String>,
    pub given: Option<Vec<String>>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<AdministrativeGender>,
    /// Added as a home phone unless the patient already has it
    pub home_phone: Option<String>,
}

impl DemographicsUpdate {
    /// Returns true if applying the update changes nothing
    pub fn is_empty(&self) -> bool {
        self.family.is_none()
            && self.given.is_none()
            && self.birth_date.is_none()
            && self.gender.is_none()
            && self.home_phone.is_none()
    }

    /// Applies the changes to the patient's first name and contact list
    pub fn apply(&self, patient: &mut Patient) {
        if self.family.is_some() || self.given.is_some() {
            if patient.name.is_empty() {
                patient.name.push(HumanName::default());
            }
            let name = &mut patient.name[0];
            if let Some(family) = &self.family {
                name.family = Some(family.clone());
            }
            if let Some(given) = &self.given {
                name.given = given.clone();
            }
        }

        if let Some(birth_date) = self.birth_date {
            patient.birth_date = Some(birth_date);
        }
        if let Some(gender) = self.gender {
            patient.gender = Some(gender);
        }

        if let Some(phone) = &self.home_phone {
            let already_recorded = patient.telecom.iter().any(|cp| {
                cp.system == Some(ContactPointSystem::Phone)
                    && cp.r#use == Some(ContactPointUse::Home)
                    && cp.value.as_deref() == Some(phone.as_str())
            });
            if !already_recorded {
                patient.telecom.push(ContactPoint::home_phone(phone.clone()));
            }
        }
    }
}

/// Result of [`PatientRegistry::remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The server deleted the patient
    Deleted,
    /// The server reported the patient missing or already deleted
    AlreadyAbsent,
}

/// Patient registration workflows over one FHIR server
pub struct PatientRegistry {
    patients: ResourceClient<Patient>,
    encounters: ResourceClient<Encounter>,
    search: SearchConfig,
}

impl PatientRegistry {
    /// Creates a registry over an existing Patient client
    pub fn new(patients: ResourceClient<Patient>, search: SearchConfig) -> Self {
        let encounters = patients.sibling();
        Self {
            patients,
            encounters,
            search,
        }
    }

    /// Opens a session against the configured server
    ///
    /// # Errors
    ///
    /// Returns `FhirError::Configuration` if the session cannot be built
    pub fn from_config(config: &DeskConfig) -> Result<Self> {
        let session = Arc::new(Session::new(config.server.clone())?);
        Ok(Self::new(
            ResourceClient::from_session(session),
            config.search.clone(),
        ))
    }

    /// The underlying Patient client
    pub fn patients(&self) -> &ResourceClient<Patient> {
        &self.patients
    }

    /// Builds the search a query runs, applying configured defaults
    pub fn search_request(&self, query: &PatientQuery) -> Result<SearchRequest<Patient>> {
        let mut request = SearchRequest::from_criteria(&query.criteria)?
            .max_results(query.max_results.unwrap_or(self.search.max_results));
        if let Some(page_size) = self.search.page_size {
            request = request.page_size(page_size);
        }
        if query.only_with_encounters {
            request = request.filter(HasEncounters::new(self.encounters.clone()));
        }
        Ok(request)
    }

    /// Finds patients matching a query, in server order
    ///
    /// # Errors
    ///
    /// Returns the first error raised while paging or filtering, or
    /// `FhirError::Cancelled` once `cancel` turns `true`.
    pub async fn find_patients(
        &self,
        query: &PatientQuery,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<Vec<Patient>> {
        let mut request = self.search_request(query)?;
        if let Some(cancel) = cancel {
            request = request.cancel_on(cancel);
        }

        let found: Vec<Patient> = self.patients.search(request).try_collect().await?;
        tracing::info!(
            criteria = ?query.criteria,
            only_with_encounters = query.only_with_encounters,
            found = found.len(),
            "Patient search completed"
        );
        Ok(found)
    }

    /// Registers a new patient and returns it with its server-assigned id
    pub async fn register(&self, registration: &Registration) -> Result<Patient> {
        let patient = registration.to_patient()?;
        self.patients.create(&patient).await
    }

    /// Reads a patient by id
    pub async fn lookup(&self, id: &str) -> Result<Patient> {
        self.patients.read(id).await
    }

    /// Reads a patient, applies `changes` and stores the result
    ///
    /// The read and the update are separate requests; a concurrent writer
    /// between them is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `FhirError::InvalidArgument` if `changes` is empty
    pub async fn revise(&self, id: &str, changes: &DemographicsUpdate) -> Result<Patient> {
        if changes.is_empty() {
            return Err(FhirError::InvalidArgument(
                "No changes given for the patient".to_string(),
            ));
        }

        let mut patient = self.patients.read(id).await?;
        changes.apply(&mut patient);
        self.patients.update(&patient).await
    }

    /// Deletes a patient; a patient that is already gone is not an error
    pub async fn remove(&self, id: &str) -> Result<RemovalOutcome> {
        match self.patients.delete(id).await {
            Ok(()) => Ok(RemovalOutcome::Deleted),
            Err(e) if e.is_not_found() => {
                tracing::info!(id, "Patient already absent");
                Ok(RemovalOutcome::AlreadyAbsent)
            }
            Err(e) => Err(e),
        }
    }
}

/// Parses a `YYYY-MM-DD` date given on the command line or in a form
///
/// # Errors
///
/// Returns `FhirError::InvalidArgument` for anything else, including years
/// outside [`BIRTH_YEARS`]
pub fn parse_date_argument(raw: &str) -> Result<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        FhirError::InvalidArgument(format!("'{raw}' is not a date in YYYY-MM-DD format"))
    })?;
    if !BIRTH_YEARS.contains(&date.year()) {
        return Err(FhirError::InvalidArgument(format!(
            "'{raw}' has a year outside {}..={}",
            BIRTH_YEARS.start(),
            BIRTH_YEARS.end()
        )));
    }
    Ok(date)
}

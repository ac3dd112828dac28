//! Patient domain model
//!
//! This module defines the Patient resource and its nested datatypes
//! (HumanName, ContactPoint) as the client core sees them. The wire
//! representation lives in `adapters::fhir::models`.

use super::ids::ResourceId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Administrative gender (FHIR value set `administrative-gender`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    /// Returns the FHIR code
    pub fn code(&self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AdministrativeGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AdministrativeGender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(AdministrativeGender::Male),
            "female" => Ok(AdministrativeGender::Female),
            "other" => Ok(AdministrativeGender::Other),
            "unknown" => Ok(AdministrativeGender::Unknown),
            _ => Err(format!(
                "Invalid gender '{s}'. Must be one of: male, female, other, unknown"
            )),
        }
    }
}

/// Telecommunications form of a contact point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactPointSystem {
    Phone,
    Fax,
    Email,
    Pager,
    Url,
    Sms,
    Other,
}

impl fmt::Display for ContactPointSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ContactPointSystem::Phone => "phone",
            ContactPointSystem::Fax => "fax",
            ContactPointSystem::Email => "email",
            ContactPointSystem::Pager => "pager",
            ContactPointSystem::Url => "url",
            ContactPointSystem::Sms => "sms",
            ContactPointSystem::Other => "other",
        };
        f.write_str(code)
    }
}

/// Purpose of a contact point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactPointUse {
    Home,
    Work,
    Temp,
    Old,
    Mobile,
}

impl fmt::Display for ContactPointUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ContactPointUse::Home => "home",
            ContactPointUse::Work => "work",
            ContactPointUse::Temp => "temp",
            ContactPointUse::Old => "old",
            ContactPointUse::Mobile => "mobile",
        };
        f.write_str(code)
    }
}

/// A person's name: family name plus ordered given names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HumanName {
    /// Family name (surname)
    pub family: Option<String>,

    /// Given names, in order
    pub given: Vec<String>,
}

impl HumanName {
    /// Creates a name with the given family name and no given names
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: Some(family.into()),
            given: Vec::new(),
        }
    }

    /// Appends a given name
    pub fn with_given(mut self, given: impl Into<String>) -> Self {
        self.given.push(given.into());
        self
    }

    /// Returns true when neither family nor given names are set
    pub fn is_empty(&self) -> bool {
        self.family.is_none() && self.given.is_empty()
    }
}

impl fmt::Display for HumanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .given
            .iter()
            .map(String::as_str)
            .chain(self.family.as_deref())
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Phone number, email address or other contact detail
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPoint {
    pub system: Option<ContactPointSystem>,
    pub value: Option<String>,
    pub r#use: Option<ContactPointUse>,
}

impl ContactPoint {
    /// A home phone number, the contact the registration desk records
    pub fn home_phone(value: impl Into<String>) -> Self {
        Self {
            system: Some(ContactPointSystem::Phone),
            value: Some(value.into()),
            r#use: Some(ContactPointUse::Home),
        }
    }
}

/// A Patient resource
///
/// The id is absent until the server assigns one on create; it can only be set
/// by decoding a server payload, so a locally built patient can never carry a
/// made-up id into an update.
///
/// # Examples
///
/// ```
/// use fhirdesk::domain::patient::{HumanName, Patient};
/// use chrono::NaiveDate;
///
/// let patient = Patient::builder()
///     .name(HumanName::new("Garcia").with_given("Ana"))
///     .birth_date(NaiveDate::from_ymd_opt(1990, 5, 12).unwrap())
///     .build();
///
/// assert!(patient.id().is_none());
/// assert_eq!(patient.primary_name().unwrap().to_string(), "Ana Garcia");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patient {
    id: Option<ResourceId>,

    /// Names, in server order
    pub name: Vec<HumanName>,

    /// Contact details, in server order
    pub telecom: Vec<ContactPoint>,

    /// Date of birth
    pub birth_date: Option<NaiveDate>,

    /// Administrative gender
    pub gender: Option<AdministrativeGender>,
}

impl Patient {
    /// Creates an empty, unpersisted patient
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new builder for constructing a Patient
    pub fn builder() -> PatientBuilder {
        PatientBuilder::default()
    }

    /// Server-assigned id, if the patient has been persisted
    pub fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    /// The first recorded name
    pub fn primary_name(&self) -> Option<&HumanName> {
        self.name.first()
    }

    /// The first phone number, if any
    pub fn primary_phone(&self) -> Option<&str> {
        self.telecom
            .iter()
            .find(|cp| cp.system == Some(ContactPointSystem::Phone))
            .and_then(|cp| cp.value.as_deref())
    }

    pub(crate) fn with_assigned_id(mut self, id: ResourceId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Builder for constructing Patient instances
#[derive(Debug, Default)]
pub struct PatientBuilder {
    name: Vec<HumanName>,
    telecom: Vec<ContactPoint>,
    birth_date: Option<NaiveDate>,
    gender: Option<AdministrativeGender>,
}

impl PatientBuilder {
    /// Creates a new PatientBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a name
    pub fn name(mut self, name: HumanName) -> Self {
        self.name.push(name);
        self
    }

    /// Appends a contact point
    pub fn telecom(mut self, contact: ContactPoint) -> Self {
        self.telecom.push(contact);
        self
    }

    /// Sets the date of birth
    pub fn birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    /// Sets the gender
    pub fn gender(mut self, gender: AdministrativeGender) -> Self {
        self.gender = Some(gender);
        self
    }

    /// Builds the Patient; the id stays unassigned
    pub fn build(self) -> Patient {
        Patient {
            id: None,
            name: self.name,
            telecom: self.telecom,
            birth_date: self.birth_date,
            gender: self.gender,
        }
    }
}

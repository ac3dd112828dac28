//! Resource codec: FHIR JSON to and from domain types
//!
//! Decoding is strict about structure (`resourceType` must match, present
//! `name` arrays must be non-empty, ids must be valid) and configurable about
//! birth dates through [`DateHandling`].

use super::models::{
    BundleWire, ContactPointWire, EncounterWire, HumanNameWire, OperationOutcomeWire, PatientWire,
    ReferenceWire,
};
use crate::domain::{
    ContactPoint, ContinuationLink, Encounter, FhirError, HumanName, Patient, Reference,
    ResourceId, Result, SearchBundle,
};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use std::ops::RangeInclusive;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Years a FHIR `date` can carry as four digits
pub const BIRTH_YEARS: RangeInclusive<i32> = 1..=9999;

/// How to treat a `birthDate` that is not a full `YYYY-MM-DD` date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateHandling {
    /// Fail decoding with `MalformedResource`
    #[default]
    Strict,
    /// Leave the date unset and log a warning
    Lenient,
}

impl DateHandling {
    /// Maps the `strict_dates` configuration flag
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            DateHandling::Strict
        } else {
            DateHandling::Lenient
        }
    }
}

/// A FHIR resource type the client can exchange with a server
pub trait FhirResource: Sized + Send + Sync + 'static {
    /// The `resourceType` discriminator and REST path segment
    const RESOURCE_TYPE: &'static str;

    /// Server-assigned id, if any
    fn resource_id(&self) -> Option<&ResourceId>;

    /// Encodes into a FHIR JSON object
    fn to_value(&self) -> Result<Value>;

    /// Decodes from a FHIR JSON object
    ///
    /// # Errors
    ///
    /// Returns `FhirError::MalformedResource` if the object is not a valid
    /// instance of this resource type.
    fn from_value(value: Value, dates: DateHandling) -> Result<Self>;
}

impl FhirResource for Patient {
    const RESOURCE_TYPE: &'static str = "Patient";

    fn resource_id(&self) -> Option<&ResourceId> {
        self.id()
    }

    fn to_value(&self) -> Result<Value> {
        let wire = PatientWire {
            resource_type: Self::RESOURCE_TYPE.to_string(),
            id: self.id().map(|id| id.as_str().to_string()),
            name: if self.name.is_empty() {
                None
            } else {
                Some(
                    self.name
                        .iter()
                        .map(|n| HumanNameWire {
                            family: n.family.clone(),
                            given: n.given.clone(),
                        })
                        .collect(),
                )
            },
            telecom: self
                .telecom
                .iter()
                .map(|cp| ContactPointWire {
                    system: cp.system,
                    value: cp.value.clone(),
                    r#use: cp.r#use,
                })
                .collect(),
            gender: self.gender,
            birth_date: self.birth_date.map(format_birth_date).transpose()?,
        };
        Ok(serde_json::to_value(wire)?)
    }

    fn from_value(value: Value, dates: DateHandling) -> Result<Self> {
        expect_resource_type(&value, Self::RESOURCE_TYPE)?;
        let wire: PatientWire = serde_json::from_value(value)
            .map_err(|e| FhirError::MalformedResource(format!("Patient: {e}")))?;

        let names = match wire.name {
            Some(names) if names.is_empty() => {
                return Err(FhirError::MalformedResource(
                    "Patient.name is present but empty".to_string(),
                ))
            }
            Some(names) => names
                .into_iter()
                .map(|n| HumanName {
                    family: n.family,
                    given: n.given,
                })
                .collect(),
            None => Vec::new(),
        };

        let mut patient = Patient::new();
        patient.name = names;
        patient.telecom = wire
            .telecom
            .into_iter()
            .map(|cp| ContactPoint {
                system: cp.system,
                value: cp.value,
                r#use: cp.r#use,
            })
            .collect();
        patient.gender = wire.gender;
        patient.birth_date = match wire.birth_date {
            Some(raw) => parse_birth_date(&raw, dates)?,
            None => None,
        };

        match parse_id(Self::RESOURCE_TYPE, wire.id)? {
            Some(id) => Ok(patient.with_assigned_id(id)),
            None => Ok(patient),
        }
    }
}

impl FhirResource for Encounter {
    const RESOURCE_TYPE: &'static str = "Encounter";

    fn resource_id(&self) -> Option<&ResourceId> {
        self.id()
    }

    fn to_value(&self) -> Result<Value> {
        let wire = EncounterWire {
            resource_type: Self::RESOURCE_TYPE.to_string(),
            id: self.id().map(|id| id.as_str().to_string()),
            status: self.status.clone(),
            subject: self.subject.as_ref().map(|r| ReferenceWire {
                reference: Some(r.as_str().to_string()),
            }),
        };
        Ok(serde_json::to_value(wire)?)
    }

    fn from_value(value: Value, _dates: DateHandling) -> Result<Self> {
        expect_resource_type(&value, Self::RESOURCE_TYPE)?;
        let wire: EncounterWire = serde_json::from_value(value)
            .map_err(|e| FhirError::MalformedResource(format!("Encounter: {e}")))?;

        let mut encounter = Encounter::default();
        encounter.status = wire.status;
        encounter.subject = wire.subject.and_then(|s| s.reference).map(Reference::new);

        match parse_id(Self::RESOURCE_TYPE, wire.id)? {
            Some(id) => Ok(encounter.with_assigned_id(id)),
            None => Ok(encounter),
        }
    }
}

/// Encodes a resource as FHIR JSON bytes
pub fn encode<R: FhirResource>(resource: &R) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&resource.to_value()?)?)
}

/// Decodes a single resource from FHIR JSON bytes
///
/// # Example
///
/// ```
/// use fhirdesk::adapters::fhir::codec::{decode, DateHandling};
/// use fhirdesk::domain::Patient;
///
/// let json = br#"{"resourceType":"Patient","id":"p1","name":[{"family":"Garcia","given":["Ana"]}]}"#;
/// let patient: Patient = decode(json, DateHandling::Strict).unwrap();
/// assert_eq!(patient.id().unwrap().as_str(), "p1");
/// assert_eq!(patient.primary_name().unwrap().to_string(), "Ana Garcia");
/// ```
pub fn decode<R: FhirResource>(bytes: &[u8], dates: DateHandling) -> Result<R> {
    R::from_value(parse_json(bytes)?, dates)
}

/// Decodes a search-set Bundle into one page of `R`
///
/// Entries of other resource types and entries returned as includes or
/// outcomes are skipped. Any matching entry that fails to decode fails the
/// whole page.
pub fn decode_bundle<R: FhirResource>(bytes: &[u8], dates: DateHandling) -> Result<SearchBundle<R>> {
    let value = parse_json(bytes)?;
    expect_resource_type(&value, "Bundle")?;
    let wire: BundleWire = serde_json::from_value(value)
        .map_err(|e| FhirError::MalformedResource(format!("Bundle: {e}")))?;

    let mut entries = Vec::with_capacity(wire.entry.len());
    for entry in wire.entry {
        let mode = entry.search.as_ref().and_then(|s| s.mode.as_deref());
        if matches!(mode, Some("include") | Some("outcome")) {
            continue;
        }
        let Some(resource) = entry.resource else {
            continue;
        };
        let resource_type = resource.get("resourceType").and_then(Value::as_str);
        if resource_type != Some(R::RESOURCE_TYPE) {
            tracing::trace!(
                expected = R::RESOURCE_TYPE,
                found = ?resource_type,
                "Skipping bundle entry of another resource type"
            );
            continue;
        }
        entries.push(R::from_value(resource, dates)?);
    }

    let next = wire
        .link
        .into_iter()
        .find(|link| link.relation == "next" && !link.url.is_empty())
        .map(|link| ContinuationLink::new(link.url));

    Ok(SearchBundle {
        total: wire.total,
        entries,
        next,
    })
}

/// Joins the diagnostics of an OperationOutcome body, if the body is one
pub fn outcome_summary(bytes: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    if value.get("resourceType").and_then(Value::as_str) != Some("OperationOutcome") {
        return None;
    }
    let outcome: OperationOutcomeWire = serde_json::from_value(value).ok()?;
    let messages: Vec<String> = outcome
        .issue
        .into_iter()
        .filter_map(|issue| issue.diagnostics.or_else(|| issue.details.and_then(|d| d.text)))
        .filter(|message| !message.trim().is_empty())
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

fn parse_json(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes)
        .map_err(|e| FhirError::MalformedResource(format!("Invalid JSON: {e}")))
}

fn expect_resource_type(value: &Value, expected: &str) -> Result<()> {
    match value.get("resourceType").and_then(Value::as_str) {
        Some(found) if found == expected => Ok(()),
        Some(found) => Err(FhirError::MalformedResource(format!(
            "Expected resourceType '{expected}', found '{found}'"
        ))),
        None => Err(FhirError::MalformedResource(format!(
            "Missing resourceType, expected '{expected}'"
        ))),
    }
}

fn parse_id(resource_type: &str, id: Option<String>) -> Result<Option<ResourceId>> {
    id.map(|raw| {
        ResourceId::new(raw)
            .map_err(|e| FhirError::MalformedResource(format!("{resource_type}.id: {e}")))
    })
    .transpose()
}

fn format_birth_date(date: NaiveDate) -> Result<String> {
    if !BIRTH_YEARS.contains(&date.year()) {
        return Err(FhirError::InvalidArgument(format!(
            "Patient.birthDate year {} is outside {}..={}",
            date.year(),
            BIRTH_YEARS.start(),
            BIRTH_YEARS.end()
        )));
    }
    Ok(date.format(DATE_FORMAT).to_string())
}

fn parse_birth_date(raw: &str, dates: DateHandling) -> Result<Option<NaiveDate>> {
    let parsed = if raw.len() == 10 {
        NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
    } else {
        None
    };

    match (parsed, dates) {
        (Some(date), _) => Ok(Some(date)),
        (None, DateHandling::Strict) => Err(FhirError::MalformedResource(format!(
            "Patient.birthDate '{raw}' is not a YYYY-MM-DD date"
        ))),
        (None, DateHandling::Lenient) => {
            tracing::warn!(birth_date = %raw, "Ignoring unparsable birthDate");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdministrativeGender, ContactPointSystem, ContactPointUse};
    use serde_json::json;

    fn to_bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_decode_full_patient() {
        let body = to_bytes(json!({
            "resourceType": "Patient",
            "id": "123",
            "meta": {"versionId": "2"},
            "name": [{"family": "Smith", "given": ["John", "Q"]}],
            "telecom": [{"system": "phone", "value": "555-1234", "use": "home"}],
            "gender": "male",
            "birthDate": "1980-01-31"
        }));

        let patient: Patient = decode(&body, DateHandling::Strict).unwrap();
        assert_eq!(patient.id().unwrap().as_str(), "123");
        assert_eq!(patient.name[0].family.as_deref(), Some("Smith"));
        assert_eq!(patient.name[0].given, vec!["John", "Q"]);
        assert_eq!(patient.telecom[0].system, Some(ContactPointSystem::Phone));
        assert_eq!(patient.telecom[0].r#use, Some(ContactPointUse::Home));
        assert_eq!(patient.gender, Some(AdministrativeGender::Male));
        assert_eq!(
            patient.birth_date,
            NaiveDate::from_ymd_opt(1980, 1, 31)
        );
    }

    #[test]
    fn test_encode_omits_absent_fields() {
        let patient = Patient::builder()
            .name(HumanName::new("Smith").with_given("John"))
            .build();
        let value = patient.to_value().unwrap();

        assert_eq!(value["resourceType"], "Patient");
        assert!(value.get("id").is_none());
        assert!(value.get("birthDate").is_none());
        assert!(value.get("telecom").is_none());
        assert_eq!(value["name"][0]["family"], "Smith");
    }

    #[test]
    fn test_encode_date_format() {
        let patient = Patient::builder()
            .birth_date(NaiveDate::from_ymd_opt(1990, 5, 2).unwrap())
            .build();
        assert_eq!(patient.to_value().unwrap()["birthDate"], "1990-05-02");
    }

    #[test]
    fn test_encode_rejects_years_without_four_digits() {
        let far_future = Patient::builder()
            .birth_date(NaiveDate::from_ymd_opt(10000, 1, 1).unwrap())
            .build();
        assert!(matches!(
            far_future.to_value(),
            Err(FhirError::InvalidArgument(_))
        ));

        let before_era = Patient::builder()
            .birth_date(NaiveDate::from_ymd_opt(0, 12, 31).unwrap())
            .build();
        assert!(matches!(
            encode(&before_era),
            Err(FhirError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_boundary_years_round_trip() {
        for date in [
            NaiveDate::from_ymd_opt(1, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(9999, 12, 31).unwrap(),
        ] {
            let patient = Patient::builder().birth_date(date).build();
            let bytes = encode(&patient).unwrap();
            let decoded: Patient = decode(&bytes, DateHandling::Strict).unwrap();
            assert_eq!(decoded.birth_date, Some(date));
        }
    }

    #[test]
    fn test_wrong_resource_type() {
        let body = to_bytes(json!({"resourceType": "Observation", "id": "1"}));
        let err = decode::<Patient>(&body, DateHandling::Strict).unwrap_err();
        assert!(matches!(err, FhirError::MalformedResource(_)));
        assert!(err.to_string().contains("Observation"));
    }

    #[test]
    fn test_missing_resource_type() {
        let body = to_bytes(json!({"id": "1"}));
        assert!(matches!(
            decode::<Patient>(&body, DateHandling::Strict),
            Err(FhirError::MalformedResource(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            decode::<Patient>(b"<html>", DateHandling::Strict),
            Err(FhirError::MalformedResource(_))
        ));
    }

    #[test]
    fn test_present_empty_name_array_rejected() {
        let body = to_bytes(json!({"resourceType": "Patient", "name": []}));
        assert!(matches!(
            decode::<Patient>(&body, DateHandling::Strict),
            Err(FhirError::MalformedResource(_))
        ));
    }

    #[test]
    fn test_absent_name_is_empty() {
        let body = to_bytes(json!({"resourceType": "Patient", "id": "a"}));
        let patient: Patient = decode(&body, DateHandling::Strict).unwrap();
        assert!(patient.name.is_empty());
        assert!(patient.primary_name().is_none());
    }

    #[test]
    fn test_unknown_gender_rejected() {
        let body = to_bytes(json!({"resourceType": "Patient", "gender": "robot"}));
        assert!(matches!(
            decode::<Patient>(&body, DateHandling::Strict),
            Err(FhirError::MalformedResource(_))
        ));
    }

    #[test]
    fn test_invalid_id_rejected() {
        let body = to_bytes(json!({"resourceType": "Patient", "id": "has space"}));
        assert!(matches!(
            decode::<Patient>(&body, DateHandling::Strict),
            Err(FhirError::MalformedResource(_))
        ));
    }

    #[test]
    fn test_partial_birth_date_strict_and_lenient() {
        let body = to_bytes(json!({"resourceType": "Patient", "birthDate": "1990-05"}));

        assert!(matches!(
            decode::<Patient>(&body, DateHandling::Strict),
            Err(FhirError::MalformedResource(_))
        ));

        let patient: Patient = decode(&body, DateHandling::Lenient).unwrap();
        assert!(patient.birth_date.is_none());
    }

    #[test]
    fn test_garbage_birth_date_lenient() {
        let body = to_bytes(json!({"resourceType": "Patient", "birthDate": "yesterday"}));
        let patient: Patient = decode(&body, DateHandling::Lenient).unwrap();
        assert!(patient.birth_date.is_none());
    }

    #[test]
    fn test_encounter_subject() {
        let body = to_bytes(json!({
            "resourceType": "Encounter",
            "id": "e1",
            "status": "finished",
            "subject": {"reference": "Patient/123"}
        }));
        let encounter: Encounter = decode(&body, DateHandling::Strict).unwrap();
        assert_eq!(encounter.subject.unwrap().as_str(), "Patient/123");
        assert_eq!(encounter.status.as_deref(), Some("finished"));
    }

    #[test]
    fn test_decode_bundle_skips_foreign_entries() {
        let body = to_bytes(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 3,
            "link": [
                {"relation": "self", "url": "http://x/Patient?name=a"},
                {"relation": "next", "url": "http://x?_getpages=abc"}
            ],
            "entry": [
                {"resource": {"resourceType": "Patient", "id": "1"}, "search": {"mode": "match"}},
                {"resource": {"resourceType": "OperationOutcome"}, "search": {"mode": "outcome"}},
                {"resource": {"resourceType": "Organization", "id": "o"}, "search": {"mode": "include"}},
                {"resource": {"resourceType": "Patient", "id": "2"}}
            ]
        }));

        let bundle: SearchBundle<Patient> = decode_bundle(&body, DateHandling::Strict).unwrap();
        assert_eq!(bundle.total, Some(3));
        assert_eq!(bundle.entries.len(), 2);
        assert_eq!(bundle.entries[1].id().unwrap().as_str(), "2");
        assert_eq!(bundle.next.unwrap().as_str(), "http://x?_getpages=abc");
    }

    #[test]
    fn test_decode_bundle_bad_entry_fails_page() {
        let body = to_bytes(json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"resourceType": "Patient", "id": "1"}},
                {"resource": {"resourceType": "Patient", "name": []}}
            ]
        }));
        assert!(matches!(
            decode_bundle::<Patient>(&body, DateHandling::Strict),
            Err(FhirError::MalformedResource(_))
        ));
    }

    #[test]
    fn test_decode_bundle_without_links_or_entries() {
        let body = to_bytes(json!({"resourceType": "Bundle", "total": 0}));
        let bundle: SearchBundle<Patient> = decode_bundle(&body, DateHandling::Strict).unwrap();
        assert!(bundle.is_empty_result());
        assert!(bundle.entries.is_empty());
        assert!(bundle.next.is_none());
    }

    #[test]
    fn test_outcome_summary() {
        let body = to_bytes(json!({
            "resourceType": "OperationOutcome",
            "issue": [
                {"severity": "error", "code": "invalid", "diagnostics": "Patient.birthDate invalid"},
                {"severity": "error", "code": "required", "details": {"text": "name required"}}
            ]
        }));
        assert_eq!(
            outcome_summary(&body).as_deref(),
            Some("Patient.birthDate invalid; name required")
        );
        assert_eq!(outcome_summary(b"not json"), None);
        assert_eq!(
            outcome_summary(&to_bytes(json!({"resourceType": "Patient"}))),
            None
        );
    }
}

//! Integration tests for the FHIR JSON codec
//!
//! Round-trips generated patients and checks the wire shape servers expect.

use chrono::NaiveDate;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use fhirdesk::adapters::fhir::{decode, encode, DateHandling};
use fhirdesk::domain::{
    AdministrativeGender, ContactPoint, ContactPointSystem, ContactPointUse, FhirError, HumanName,
    Patient,
};
use serde_json::Value;
use test_case::test_case;

fn random_name() -> HumanName {
    let mut name = HumanName::new(LastName().fake::<String>());
    for _ in 0..(0..3).fake::<usize>() {
        name = name.with_given(FirstName().fake::<String>());
    }
    name
}

fn random_patient() -> Patient {
    let mut builder = Patient::builder();
    for _ in 0..(1..3).fake::<usize>() {
        builder = builder.name(random_name());
    }
    if (0..2).fake::<u8>() == 1 {
        builder = builder.telecom(ContactPoint::home_phone(PhoneNumber().fake::<String>()));
    }
    let birth_date = NaiveDate::from_ymd_opt(
        (1900..2024).fake::<i32>(),
        (1..13).fake::<u32>(),
        (1..29).fake::<u32>(),
    );
    if let Some(birth_date) = birth_date {
        builder = builder.birth_date(birth_date);
    }
    builder.build()
}

fn round_trip(patient: &Patient) -> Patient {
    let bytes = encode(patient).unwrap();
    decode(&bytes, DateHandling::Strict).unwrap()
}

#[test]
fn test_generated_patients_round_trip() {
    for _ in 0..50 {
        let patient = random_patient();
        assert_eq!(round_trip(&patient), patient);
    }
}

#[test_case(None ; "no gender")]
#[test_case(Some(AdministrativeGender::Male) ; "male")]
#[test_case(Some(AdministrativeGender::Female) ; "female")]
#[test_case(Some(AdministrativeGender::Other) ; "other")]
#[test_case(Some(AdministrativeGender::Unknown) ; "unknown")]
fn test_gender_round_trip(gender: Option<AdministrativeGender>) {
    let mut patient = Patient::builder().name(HumanName::new("Lee")).build();
    patient.gender = gender;
    assert_eq!(round_trip(&patient), patient);
}

#[test]
fn test_empty_patient_round_trip() {
    let patient = Patient::new();
    let bytes = encode(&patient).unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, serde_json::json!({"resourceType": "Patient"}));
    assert_eq!(round_trip(&patient), patient);
}

#[test]
fn test_all_contact_kinds_round_trip() {
    let patient = Patient::builder()
        .telecom(ContactPoint {
            system: Some(ContactPointSystem::Email),
            value: Some("ana@example.org".to_string()),
            r#use: Some(ContactPointUse::Work),
        })
        .telecom(ContactPoint {
            system: Some(ContactPointSystem::Sms),
            value: Some("+34 600 000 000".to_string()),
            r#use: Some(ContactPointUse::Mobile),
        })
        .telecom(ContactPoint {
            system: None,
            value: Some("unknown kind".to_string()),
            r#use: None,
        })
        .build();
    assert_eq!(round_trip(&patient), patient);
}

#[test]
fn test_server_payload_round_trip_keeps_id() {
    let body = br#"{
        "resourceType": "Patient",
        "id": "pat-42",
        "meta": {"versionId": "3", "lastUpdated": "2024-03-01T10:00:00Z"},
        "text": {"status": "generated", "div": "<div/>"},
        "name": [{"use": "official", "family": "Garcia", "given": ["Ana"]}],
        "birthDate": "1990-05-12"
    }"#;
    let patient: Patient = decode(body, DateHandling::Strict).unwrap();
    assert_eq!(patient.id().unwrap().as_str(), "pat-42");
    assert_eq!(round_trip(&patient), patient);

    let value: Value = serde_json::from_slice(&encode(&patient).unwrap()).unwrap();
    assert_eq!(value["id"], "pat-42");
    assert_eq!(value["birthDate"], "1990-05-12");
}

#[test_case("1990-05-12T00:00:00Z" ; "timestamp")]
#[test_case("1990" ; "year only")]
#[test_case("12/05/1990" ; "local format")]
#[test_case("1990-02-30" ; "impossible day")]
fn test_unparsable_birth_dates(raw: &str) {
    let body = format!(r#"{{"resourceType":"Patient","birthDate":"{raw}"}}"#);

    let strict = decode::<Patient>(body.as_bytes(), DateHandling::Strict);
    assert!(matches!(strict, Err(FhirError::MalformedResource(_))));

    let lenient: Patient = decode(body.as_bytes(), DateHandling::Lenient).unwrap();
    assert!(lenient.birth_date.is_none());
}

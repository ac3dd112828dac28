//! Terminal rendering of patients

use crate::adapters::fhir::FhirResource;
use crate::domain::{Patient, Result};

/// One line per patient: id, name, birth date, gender, phone
pub fn patient_row(patient: &Patient) -> String {
    format!(
        "{:<24} {:<32} {:<10} {:<7} {}",
        patient.id().map(|id| id.as_str()).unwrap_or("-"),
        patient
            .primary_name()
            .map(ToString::to_string)
            .unwrap_or_else(|| "(no name)".to_string()),
        patient
            .birth_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string()),
        patient.gender.map(|g| g.code()).unwrap_or("-"),
        patient.primary_phone().unwrap_or("-"),
    )
}

/// Multi-line detail view
pub fn patient_detail(patient: &Patient) -> String {
    let mut lines = vec![format!(
        "  Id:         {}",
        patient.id().map(|id| id.as_str()).unwrap_or("-")
    )];

    if patient.name.is_empty() {
        lines.push("  Name:       (none)".to_string());
    }
    for name in &patient.name {
        lines.push(format!("  Name:       {name}"));
    }

    lines.push(format!(
        "  Birth date: {}",
        patient
            .birth_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    lines.push(format!(
        "  Gender:     {}",
        patient.gender.map(|g| g.code()).unwrap_or("-")
    ));

    for contact in &patient.telecom {
        let kind = match (contact.system, contact.r#use) {
            (Some(system), Some(usage)) => format!("{system} ({usage})"),
            (Some(system), None) => system.to_string(),
            (None, _) => "contact".to_string(),
        };
        lines.push(format!(
            "  Telecom:    {kind}: {}",
            contact.value.as_deref().unwrap_or("-")
        ));
    }

    lines.join("\n")
}

/// Pretty-printed FHIR JSON for one or more patients
pub fn patients_json(patients: &[Patient]) -> Result<String> {
    let values = patients
        .iter()
        .map(FhirResource::to_value)
        .collect::<Result<Vec<_>>>()?;
    let rendered = if values.len() == 1 {
        serde_json::to_string_pretty(&values[0])?
    } else {
        serde_json::to_string_pretty(&values)?
    };
    Ok(rendered)
}

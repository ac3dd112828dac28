//! FHIR R4 JSON wire models
//!
//! These mirror the subset of the JSON representation fhirdesk reads and
//! writes. Unknown elements (`meta`, `text`, extensions, ...) are ignored on
//! input. Conversion to and from the domain types lives in [`super::codec`].

use crate::domain::{AdministrativeGender, ContactPointSystem, ContactPointUse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatientWire {
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Vec<HumanNameWire>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPointWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct HumanNameWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ContactPointWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<ContactPointSystem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#use: Option<ContactPointUse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EncounterWire {
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<ReferenceWire>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ReferenceWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BundleWire {
    #[serde(default)]
    pub total: Option<u64>,

    #[serde(default)]
    pub link: Vec<BundleLinkWire>,

    #[serde(default)]
    pub entry: Vec<BundleEntryWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BundleLinkWire {
    pub relation: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BundleEntryWire {
    #[serde(default)]
    pub resource: Option<Value>,

    #[serde(default)]
    pub search: Option<EntrySearchWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EntrySearchWire {
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OperationOutcomeWire {
    #[serde(default)]
    pub issue: Vec<OutcomeIssueWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OutcomeIssueWire {
    #[serde(default)]
    pub diagnostics: Option<String>,

    #[serde(default)]
    pub details: Option<CodeableConceptWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CodeableConceptWire {
    #[serde(default)]
    pub text: Option<String>,
}

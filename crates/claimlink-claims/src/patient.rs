//! Patient demographic summary flattening.

use serde::Serialize;
use serde_json::Value;

use claimlink_core::path::{array_at, str_at, string_at};

use crate::normalize::common::extension_string;

const RACE_URL: &str = "https://bluebutton.cms.gov/resources/variables/race";

/// A flattened demographic view of a Patient resource.
///
/// Every field is optional; a malformed or empty resource flattens to an
/// all-`None` summary rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    pub deceased: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceased_date: Option<String>,
}

impl PatientSummary {
    /// Flattens a raw Patient resource.
    #[must_use]
    pub fn from_resource(patient: &Value) -> Self {
        let deceased_date = string_at(patient, "deceasedDateTime");
        Self {
            id: string_at(patient, "id"),
            first_name: string_at(patient, "name.0.given.0"),
            middle_name: string_at(patient, "name.0.given.1"),
            last_name: string_at(patient, "name.0.family"),
            birth_date: string_at(patient, "birthDate"),
            gender: string_at(patient, "gender"),
            postal_code: string_at(patient, "address.0.postalCode"),
            state: string_at(patient, "address.0.state"),
            race: extension_string(array_at(patient, "extension"), RACE_URL),
            deceased: deceased_date.is_some(),
            deceased_date,
        }
    }

    /// Flattens the first Patient entry of a search bundle, if any.
    #[must_use]
    pub fn from_bundle(bundle: &claimlink_core::Bundle) -> Option<Self> {
        bundle
            .entry
            .iter()
            .find(|entry| str_at(&entry.resource, "resourceType") == Some("Patient"))
            .map(|entry| Self::from_resource(&entry.resource))
    }
}

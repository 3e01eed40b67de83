//! Prescription-drug-event (Part D) claim normalization.

use serde::Serialize;
use serde_json::Value;

use claimlink_core::path::{array_at, f64_at, string_at, u64_at, value_at};

use crate::ClaimsResult;
use crate::normalize::common::{
    CareTeamMember, Period, ResourceMeta, SupportingInfo, indexed,
    require_explanation_of_benefit, resolve_sequences, supporting_info,
};

/// A normalized prescription drug event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdeClaim {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    pub billable_period: Period,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility: Option<Facility>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub care_team: Vec<CareTeamMember>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supporting_information: Vec<SupportingInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<PdeLineItem>,
    pub meta: ResourceMeta,
}

/// The dispensing pharmacy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// One dispensed-drug line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdeLineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serviced_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub care_team: Vec<CareTeamMember>,
}

/// Normalizes a raw prescription-drug-event EOB resource.
///
/// # Errors
///
/// Returns [`crate::ClaimsError::InvalidClaimShape`] only when the resource
/// is not an ExplanationOfBenefit.
pub fn normalize(resource: &Value) -> ClaimsResult<PdeClaim> {
    require_explanation_of_benefit(resource)?;

    let (care_team, care_team_index) = indexed(
        array_at(resource, "careTeam"),
        CareTeamMember::from_value,
        |m| m.sequence,
    );

    let line_items = array_at(resource, "item")
        .map(|items| {
            items
                .iter()
                .map(|item| PdeLineItem {
                    line_number: u64_at(item, "sequence"),
                    product_code: string_at(item, "productOrService.coding.0.code"),
                    product_description: string_at(item, "productOrService.coding.0.display"),
                    quantity: f64_at(item, "quantity.value"),
                    serviced_date: string_at(item, "servicedDate"),
                    care_team: resolve_sequences(
                        &care_team_index,
                        array_at(item, "careTeamSequence"),
                    ),
                })
                .collect()
        })
        .unwrap_or_default();

    let facility = value_at(resource, "facility").map(|facility| Facility {
        name: string_at(facility, "display"),
        identifier: string_at(facility, "identifier.value"),
    });

    Ok(PdeClaim {
        id: string_at(resource, "id"),
        status: string_at(resource, "status"),
        created: string_at(resource, "created"),
        outcome: string_at(resource, "outcome"),
        billable_period: Period::at(resource, "billablePeriod"),
        facility,
        care_team,
        supporting_information: supporting_info(resource),
        line_items,
        meta: ResourceMeta::from_resource(resource),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pde_claim() -> Value {
        json!({
            "resourceType": "ExplanationOfBenefit",
            "id": "pde-5891214010",
            "status": "active",
            "created": "2016-12-06",
            "outcome": "complete",
            "meta": { "lastUpdated": "2020-04-01T00:00:00Z" },
            "type": { "coding": [
                { "system": "https://bluebutton.cms.gov/resources/codesystem/eob-type",
                  "code": "PDE", "display": "Part D event" }
            ]},
            "billablePeriod": { "start": "2016-12-06", "end": "2016-12-06" },
            "facility": { "display": "Corner Pharmacy",
                          "identifier": { "value": "4444444444" } },
            "careTeam": [
                { "sequence": 2,
                  "provider": { "display": "Dr. Patel", "identifier": { "value": "5555555555" } },
                  "role": { "coding": [{ "display": "Prescribing provider" }] },
                  "qualification": { "coding": [{ "display": "Internal medicine" }] } }
            ],
            "supportingInfo": [
                { "sequence": 1,
                  "category": { "coding": [{ "display": "Days Supply" }] },
                  "valueQuantity": { "value": 30 } }
            ],
            "item": [
                { "sequence": 1,
                  "productOrService": { "coding": [
                      { "code": "00071101568", "display": "Atorvastatin 10 MG Oral Tablet" }
                  ]},
                  "quantity": { "value": 30 },
                  "servicedDate": "2016-12-06",
                  "careTeamSequence": [2, 7] }
            ]
        })
    }

    #[test]
    fn test_normalize_full_event() {
        let claim = normalize(&pde_claim()).unwrap();

        assert_eq!(claim.id.as_deref(), Some("pde-5891214010"));
        assert_eq!(claim.billable_period.start.as_deref(), Some("2016-12-06"));

        let facility = claim.facility.as_ref().unwrap();
        assert_eq!(facility.name.as_deref(), Some("Corner Pharmacy"));
        assert_eq!(facility.identifier.as_deref(), Some("4444444444"));

        assert_eq!(claim.care_team.len(), 1);
        assert_eq!(claim.care_team[0].specialty.as_deref(), Some("Internal medicine"));
        assert_eq!(claim.supporting_information[0].value, Some(json!(30)));
    }

    #[test]
    fn test_line_items_resolve_prescribers() {
        let claim = normalize(&pde_claim()).unwrap();
        let item = &claim.line_items[0];

        assert_eq!(item.product_code.as_deref(), Some("00071101568"));
        assert_eq!(item.quantity, Some(30.0));
        assert_eq!(item.serviced_date.as_deref(), Some("2016-12-06"));
        // Sequence 7 is unresolvable and dropped; 2 resolves to the prescriber.
        assert_eq!(item.care_team.len(), 1);
        assert_eq!(item.care_team[0].name.as_deref(), Some("Dr. Patel"));
    }

    #[test]
    fn test_minimal_resource_normalizes() {
        let claim = normalize(&json!({ "resourceType": "ExplanationOfBenefit" })).unwrap();
        assert!(claim.id.is_none());
        assert!(claim.facility.is_none());
        assert!(claim.line_items.is_empty());
    }

    #[test]
    fn test_wrong_resource_kind_is_rejected() {
        assert!(
            normalize(&json!({ "resourceType": "MedicationRequest" }))
                .unwrap_err()
                .is_shape_error()
        );
    }
}

//! Carrier (Part B professional) claim normalization.

use serde::Serialize;
use serde_json::Value;

use claimlink_core::path::{array_at, f64_at, string_at, u64_at, value_at};

use crate::ClaimsResult;
use crate::normalize::common::{
    CareTeamMember, Diagnosis, Financials, Modifier, Period, ResourceMeta, contained_of_kind,
    extension_at, indexed, require_explanation_of_benefit, resolve_sequences,
};

const CARRIER_NUMBER_URL: &str = "https://bluebutton.cms.gov/resources/variables/carr_num";
const CLAIM_CONTROL_NUMBER_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/carr_clm_cntl_num";
const ASSIGNMENT_CODE_URL: &str = "https://bluebutton.cms.gov/resources/variables/asgmntcd";
const CLAIM_ENTRY_CODE_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/carr_clm_entry_cd";
const BETOS_URL: &str = "https://bluebutton.cms.gov/resources/variables/betos_cd";
const PROCESSING_INDICATOR_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/line_prcsg_ind_cd";
const CLIA_LAB_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/carr_line_clia_lab_num";
const PROVIDER_STATE_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/prvdr_state_cd";
const PROVIDER_ZIP_URL: &str = "https://bluebutton.cms.gov/resources/variables/prvdr_zip";
const NDC_URL: &str = "http://hl7.org/fhir/sid/ndc";

/// A normalized carrier claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierClaim {
    pub claim_info: CarrierClaimInfo,
    pub patient: PatientRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral: Option<Referral>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub care_team: Vec<CareTeamMember>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnoses: Vec<Diagnosis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<CarrierLineItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub test_results: Vec<TestResult>,
    pub meta: ResourceMeta,
}

/// Claim-level facts for a carrier claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierClaimInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub claim_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub claim_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub service_period: Period,
    pub extensions: CarrierExtensions,
}

/// Carrier-specific CMS variable extensions at claim level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierExtensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_control_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_entry_code: Option<String>,
}

/// Who the claim is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medicare_id: Option<String>,
}

impl PatientRef {
    /// Reads the claim `patient` reference block.
    #[must_use]
    pub fn from_claim(claim: &Value) -> Self {
        Self {
            reference: string_at(claim, "patient.reference"),
            medicare_id: string_at(claim, "patient.identifier.value"),
        }
    }
}

/// Referral identity, when the claim carries one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// One line item, with its sequence references resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierLineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedure_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedure_description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    pub place_of_service: PlaceOfService,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndc_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub betos_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_indicator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clia_lab_number: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnoses: Vec<Diagnosis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub care_team: Vec<CareTeamMember>,
    pub financials: Financials,
}

/// Where a line item's service happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOfService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

/// A contained Observation flattened into a test result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Normalizes a raw carrier EOB resource.
///
/// # Errors
///
/// Returns [`crate::ClaimsError::InvalidClaimShape`] only when the resource
/// is not an ExplanationOfBenefit.
pub fn normalize(resource: &Value) -> ClaimsResult<CarrierClaim> {
    require_explanation_of_benefit(resource)?;

    let extensions = array_at(resource, "extension");
    let extension_field = |url: &str, path: &str| {
        extension_at(extensions, url).and_then(|ext| string_at(ext, path))
    };

    let (diagnoses, diagnosis_index) = indexed(
        array_at(resource, "diagnosis"),
        Diagnosis::from_value,
        |d| d.sequence,
    );
    let (care_team, care_team_index) = indexed(
        array_at(resource, "careTeam"),
        CareTeamMember::from_value,
        |m| m.sequence,
    );

    let line_items = array_at(resource, "item")
        .map(|items| {
            items
                .iter()
                .map(|item| line_item(item, &diagnosis_index, &care_team_index))
                .collect()
        })
        .unwrap_or_default();

    let referral = value_at(resource, "referral").map(|referral| Referral {
        code: string_at(referral, "identifier.type.coding.0.code"),
        display: string_at(referral, "identifier.type.coding.0.display"),
        value: string_at(referral, "identifier.value"),
    });

    let test_results = contained_of_kind(resource, "Observation")
        .into_iter()
        .map(|observation| TestResult {
            test_id: string_at(observation, "id"),
            test_name: string_at(observation, "code.coding.0.display"),
            code: string_at(observation, "code.coding.0.code"),
            result: value_at(observation, "valueQuantity.value")
                .or_else(|| value_at(observation, "valueString"))
                .cloned(),
            unit: string_at(observation, "valueQuantity.unit"),
        })
        .collect();

    Ok(CarrierClaim {
        claim_info: CarrierClaimInfo {
            id: string_at(resource, "id"),
            claim_type: string_at(resource, "type.coding.0.display"),
            status: string_at(resource, "status"),
            claim_use: string_at(resource, "use"),
            outcome: string_at(resource, "outcome"),
            created: string_at(resource, "created"),
            service_period: Period::at(resource, "billablePeriod"),
            extensions: CarrierExtensions {
                carrier_number: extension_field(CARRIER_NUMBER_URL, "valueIdentifier.value"),
                claim_control_number: extension_field(
                    CLAIM_CONTROL_NUMBER_URL,
                    "valueIdentifier.value",
                ),
                assignment_code: extension_field(ASSIGNMENT_CODE_URL, "valueCoding.display"),
                claim_entry_code: extension_field(CLAIM_ENTRY_CODE_URL, "valueCoding.display"),
            },
        },
        patient: PatientRef::from_claim(resource),
        insurer: string_at(resource, "insurer.identifier.value"),
        referral,
        care_team,
        diagnoses,
        line_items,
        test_results,
        meta: ResourceMeta::from_resource(resource),
    })
}

fn line_item(
    item: &Value,
    diagnosis_index: &std::collections::HashMap<u64, Diagnosis>,
    care_team_index: &std::collections::HashMap<u64, CareTeamMember>,
) -> CarrierLineItem {
    let item_extensions = array_at(item, "extension");
    let location_extensions = array_at(item, "locationCodeableConcept.extension");
    let product_extensions = array_at(item, "productOrService.extension");

    CarrierLineItem {
        line_number: u64_at(item, "sequence"),
        service_date: string_at(item, "servicedPeriod.start")
            .or_else(|| string_at(item, "servicedDate")),
        procedure_code: string_at(item, "productOrService.coding.0.code"),
        procedure_description: string_at(item, "productOrService.coding.0.display"),
        modifiers: Modifier::list_at(item, "modifier"),
        place_of_service: PlaceOfService {
            code: string_at(item, "locationCodeableConcept.coding.0.code"),
            description: string_at(item, "locationCodeableConcept.coding.0.display"),
            state: extension_at(location_extensions, PROVIDER_STATE_URL)
                .and_then(|ext| string_at(ext, "valueCoding.code")),
            zip: extension_at(location_extensions, PROVIDER_ZIP_URL)
                .and_then(|ext| string_at(ext, "valueCoding.code")),
        },
        quantity: f64_at(item, "quantity.value"),
        ndc_code: extension_at(product_extensions, NDC_URL)
            .and_then(|ext| string_at(ext, "valueCoding.code")),
        betos_code: extension_at(item_extensions, BETOS_URL)
            .and_then(|ext| string_at(ext, "valueCoding.display")),
        processing_indicator: extension_at(item_extensions, PROCESSING_INDICATOR_URL)
            .and_then(|ext| string_at(ext, "valueCoding.display")),
        clia_lab_number: extension_at(item_extensions, CLIA_LAB_URL)
            .and_then(|ext| string_at(ext, "valueIdentifier.value")),
        diagnoses: resolve_sequences(diagnosis_index, array_at(item, "diagnosisSequence")),
        care_team: resolve_sequences(care_team_index, array_at(item, "careTeamSequence")),
        financials: Financials::from_adjudications(array_at(item, "adjudication")),
    }
}

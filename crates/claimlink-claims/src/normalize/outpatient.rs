//! Outpatient institutional claim normalization.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use claimlink_core::path::{array_at, f64_at, string_at, u64_at, value_at};

use crate::ClaimsResult;
use crate::normalize::common::{
    AdjudicationEntry, AdjudicationKind, BenefitBalance, CareTeamMember, Diagnosis, Financials,
    Payment, Period, Procedure, ProviderIdentity, ResourceMeta, TotalAmount, benefit_balances,
    contained_by_reference, extension_at, extension_string, indexed, procedures,
    require_explanation_of_benefit, resolve_sequences, supporting_info, totals_by_category,
};

const CONTROL_NUMBER_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/fi_doc_clm_cntl_num";
const NDC_URL: &str = "http://hl7.org/fhir/sid/ndc";
const UNIT_COUNT_URL: &str = "https://bluebutton.cms.gov/resources/variables/rev_cntr_unit_cnt";
const REVENUE_STATUS_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/rev_cntr_stus_ind_cd";

/// A normalized outpatient claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpatientClaim {
    pub claim_info: OutpatientClaimInfo,
    pub patient: OutpatientPatient,
    pub providers: OutpatientProviders,
    pub insurance: OutpatientInsurance,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnoses: Vec<Diagnosis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub procedures: Vec<Procedure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<OutpatientLineItem>,
    pub financials: OutpatientFinancial,
    pub meta: ResourceMeta,
}

/// Claim-level facts for an outpatient claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpatientClaimInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub claim_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub service_period: Period,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_number: Option<String>,
}

/// Who the claim is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpatientPatient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// The billing provider (resolved from `contained`) and the care team.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpatientProviders {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_provider: Option<ProviderIdentity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub care_team: Vec<CareTeamMember>,
}

/// Coverage facts for the claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpatientInsurance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<String>,
}

/// One revenue-center line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpatientLineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndc_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_center: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_count: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_center_status: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnoses: Vec<Diagnosis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<CareTeamMember>,
    pub financials: Financials,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub denial_reasons: Vec<AdjudicationEntry>,
}

/// The claim's money: totals, payment, balances.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpatientFinancial {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub totals: BTreeMap<String, TotalAmount>,
    pub payment: Payment,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub benefit_balance: Vec<BenefitBalance>,
}

/// Normalizes a raw outpatient EOB resource.
///
/// # Errors
///
/// Returns [`crate::ClaimsError::InvalidClaimShape`] only when the resource
/// is not an ExplanationOfBenefit.
pub fn normalize(resource: &Value) -> ClaimsResult<OutpatientClaim> {
    require_explanation_of_benefit(resource)?;

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
                .map(|item| {
                    let item_extensions = array_at(item, "extension");
                    let financials = Financials::from_adjudications(array_at(item, "adjudication"));
                    let denial_reasons = financials
                        .breakdown
                        .iter()
                        .filter(|entry| entry.kind == AdjudicationKind::Denial)
                        .cloned()
                        .collect();

                    OutpatientLineItem {
                        line_number: u64_at(item, "sequence"),
                        service_date: string_at(item, "servicedDate")
                            .or_else(|| string_at(item, "servicedPeriod.start")),
                        service_code: string_at(item, "productOrService.coding.0.code"),
                        service_description: string_at(item, "productOrService.coding.0.display"),
                        ndc_code: extension_at(item_extensions, NDC_URL)
                            .and_then(|ext| string_at(ext, "valueCoding.code")),
                        quantity: f64_at(item, "quantity.value"),
                        revenue_center: string_at(item, "revenue.coding.0.code"),
                        unit_count: extension_at(item_extensions, UNIT_COUNT_URL)
                            .and_then(|ext| value_at(ext, "valueQuantity.value").cloned()),
                        revenue_center_status: extension_string(
                            item_extensions,
                            REVENUE_STATUS_URL,
                        ),
                        diagnoses: resolve_sequences(
                            &diagnosis_index,
                            array_at(item, "diagnosisSequence"),
                        ),
                        providers: resolve_sequences(
                            &care_team_index,
                            array_at(item, "careTeamSequence"),
                        ),
                        financials,
                        denial_reasons,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let billing_provider = string_at(resource, "provider.reference")
        .and_then(|reference| contained_by_reference(resource, &reference))
        .map(ProviderIdentity::from_resource);

    let received_date = supporting_info(resource)
        .first()
        .and_then(|info| info.value.as_ref())
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(OutpatientClaim {
        claim_info: OutpatientClaimInfo {
            id: string_at(resource, "id"),
            claim_type: string_at(resource, "type.coding.0.display"),
            status: string_at(resource, "status"),
            outcome: string_at(resource, "outcome"),
            created: string_at(resource, "created"),
            service_period: Period::at(resource, "billablePeriod"),
            received_date,
            control_number: extension_string(array_at(resource, "extension"), CONTROL_NUMBER_URL),
        },
        patient: OutpatientPatient {
            reference: string_at(resource, "patient.reference"),
        },
        providers: OutpatientProviders {
            billing_provider,
            care_team,
        },
        insurance: OutpatientInsurance {
            payer: string_at(resource, "insurer.identifier.value"),
            coverage: string_at(resource, "insurance.0.coverage.reference"),
        },
        diagnoses,
        procedures: procedures(resource),
        line_items,
        financials: OutpatientFinancial {
            totals: totals_by_category(resource),
            payment: Payment::from_claim(resource),
            benefit_balance: benefit_balances(resource),
        },
        meta: ResourceMeta::from_resource(resource),
    })
}

//! Inpatient (Part A institutional) claim normalization.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use claimlink_core::path::{array_at, f64_at, string_at, u64_at};

use crate::ClaimsResult;
use crate::normalize::common::{
    BenefitBalance, CareTeamMember, Diagnosis, Financials, Modifier, Payment, Period, Procedure,
    ProviderIdentity, ResourceMeta, SupportingInfo, TotalAmount, benefit_balances,
    contained_of_kind, extension_number, extension_string, indexed, procedures,
    require_explanation_of_benefit, resolve_sequences, supporting_info, totals_by_category,
};

const CLAIM_CLASS_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/nch_near_line_rec_ident_cd";
const ACTION_CODE_URL: &str = "https://bluebutton.cms.gov/resources/variables/fi_clm_actn_cd";
const NON_PAYMENT_REASON_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/clm_mdcr_non_pmt_rsn_cd";
const IME_AMOUNT_URL: &str = "https://bluebutton.cms.gov/resources/variables/ime_op_clm_val_amt";
const DSH_AMOUNT_URL: &str = "https://bluebutton.cms.gov/resources/variables/dsh_op_clm_val_amt";
const CONTROL_NUMBER_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/fi_doc_clm_cntl_num";
const PROCESSING_DATE_URL: &str = "https://bluebutton.cms.gov/resources/variables/fi_clm_proc_dt";
const CLAIM_QUERY_CODE_URL: &str = "https://bluebutton.cms.gov/resources/variables/claim_query_cd";
const FACILITY_TYPE_URL: &str = "https://bluebutton.cms.gov/resources/variables/clm_fac_type_cd";

/// Supporting-info categories that get promoted into the clinical summary.
const DISCHARGE_STATUS_CATEGORY: &str = "Discharge Status";
const DRG_CATEGORY: &str = "Claim Diagnosis Related Group Code (or MS-DRG Code)";
const BLOOD_PINTS_CATEGORY: &str = "NCH Blood Pints Furnished Quantity";
const PRIMARY_PAYER_CATEGORY: &str = "NCH Primary Payer Code (if not Medicare)";

/// A normalized inpatient claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InpatientClaim {
    pub metadata: ResourceMeta,
    pub claim: InpatientClaimInfo,
    pub patient: InpatientPatient,
    pub provider: InpatientProvider,
    pub insurance: InpatientInsurance,
    pub clinical: ClinicalSummary,
    pub financial: InpatientFinancial,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub care_team: Vec<CareTeamMember>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supporting_information: Vec<SupportingInfo>,
}

/// Claim-level facts for an inpatient claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InpatientClaimInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub claim_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype_code: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub claim_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub billable_period: Period,
    /// Claim query code from the billable-period extension.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_date: Option<String>,
    pub extensions: InpatientExtensions,
}

/// Inpatient CMS variable extensions at claim level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InpatientExtensions {
    /// Part A institutional claim record type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_code: Option<String>,
    /// Reason for Medicare non-payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_payment_reason: Option<String>,
    /// Indirect Medical Education amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ime_amount: Option<f64>,
    /// Disproportionate Share Hospital amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsh_amount: Option<f64>,
}

/// Who the claim is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InpatientPatient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
}

/// The billing organization and facility type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InpatientProvider {
    pub organization: ProviderIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_type: Option<String>,
}

/// Coverage facts for the claim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InpatientInsurance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_payer_code: Option<Value>,
}

/// Diagnoses, procedures, and stay-level clinical facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalSummary {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnoses: Vec<Diagnosis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub procedures: Vec<Procedure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discharge_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drg_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pints: Option<Value>,
}

/// The claim's money: totals, payment, balances, and line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InpatientFinancial {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub totals: BTreeMap<String, TotalAmount>,
    pub payment: Payment,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub benefit_balances: Vec<BenefitBalance>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<InpatientLineItem>,
}

/// One revenue-center line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InpatientLineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnoses: Vec<Diagnosis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<CareTeamMember>,
    pub financials: Financials,
}

/// Normalizes a raw inpatient EOB resource.
///
/// # Errors
///
/// Returns [`crate::ClaimsError::InvalidClaimShape`] only when the resource
/// is not an ExplanationOfBenefit.
pub fn normalize(resource: &Value) -> ClaimsResult<InpatientClaim> {
    require_explanation_of_benefit(resource)?;

    let extensions = array_at(resource, "extension");

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
                .map(|item| InpatientLineItem {
                    line_number: u64_at(item, "sequence"),
                    service_code: string_at(item, "productOrService.coding.0.code"),
                    service_description: string_at(item, "productOrService.coding.0.display"),
                    revenue_code: string_at(item, "revenue.coding.0.code"),
                    revenue_description: string_at(item, "revenue.coding.0.display"),
                    location: string_at(item, "locationAddress.state"),
                    quantity: f64_at(item, "quantity.value"),
                    unit: string_at(item, "quantity.unit"),
                    modifiers: Modifier::list_at(item, "modifier"),
                    diagnoses: resolve_sequences(
                        &diagnosis_index,
                        array_at(item, "diagnosisSequence"),
                    ),
                    providers: resolve_sequences(
                        &care_team_index,
                        array_at(item, "careTeamSequence"),
                    ),
                    financials: Financials::from_adjudications(array_at(item, "adjudication")),
                })
                .collect()
        })
        .unwrap_or_default();

    let supporting_information = supporting_info(resource);
    let info_value = |category: &str| {
        supporting_information
            .iter()
            .find(|info| info.category.as_deref() == Some(category))
            .and_then(|info| info.value.clone())
    };
    let info_code = |category: &str| {
        supporting_information
            .iter()
            .find(|info| info.category.as_deref() == Some(category))
            .and_then(|info| info.code.clone())
    };

    // Prefer a contained Organization carrying an NPI or tax id, else the
    // first Organization.
    let organizations = contained_of_kind(resource, "Organization");
    let organization = organizations
        .iter()
        .map(|org| ProviderIdentity::from_resource(org))
        .find(|identity| identity.npi.is_some() || identity.tax_id.is_some())
        .or_else(|| {
            organizations
                .first()
                .map(|org| ProviderIdentity::from_resource(org))
        })
        .unwrap_or_default();

    Ok(InpatientClaim {
        metadata: ResourceMeta::from_resource(resource),
        claim: InpatientClaimInfo {
            id: string_at(resource, "id"),
            status: string_at(resource, "status"),
            claim_type: string_at(resource, "type.coding.0.display"),
            type_code: string_at(resource, "type.coding.0.code"),
            subtype: string_at(resource, "subType.coding.0.display"),
            subtype_code: string_at(resource, "subType.coding.0.code"),
            claim_use: string_at(resource, "use"),
            outcome: string_at(resource, "outcome"),
            created: string_at(resource, "created"),
            billable_period: Period::at(resource, "billablePeriod"),
            billing_code: extension_string(
                array_at(resource, "billablePeriod.extension"),
                CLAIM_QUERY_CODE_URL,
            ),
            control_number: extension_string(extensions, CONTROL_NUMBER_URL),
            processing_date: extension_string(extensions, PROCESSING_DATE_URL),
            extensions: InpatientExtensions {
                claim_class: extension_string(extensions, CLAIM_CLASS_URL),
                action_code: extension_string(extensions, ACTION_CODE_URL),
                non_payment_reason: extension_string(extensions, NON_PAYMENT_REASON_URL),
                ime_amount: extension_number(extensions, IME_AMOUNT_URL),
                dsh_amount: extension_number(extensions, DSH_AMOUNT_URL),
            },
        },
        patient: InpatientPatient {
            reference: string_at(resource, "patient.reference"),
            member_id: string_at(resource, "identifier.0.value"),
        },
        provider: InpatientProvider {
            organization,
            facility_type: extension_string(
                array_at(resource, "facility.extension"),
                FACILITY_TYPE_URL,
            ),
        },
        insurance: InpatientInsurance {
            payer: string_at(resource, "insurer.identifier.value"),
            coverage: string_at(resource, "insurance.0.coverage.reference"),
            primary_payer_code: info_value(PRIMARY_PAYER_CATEGORY),
        },
        clinical: ClinicalSummary {
            diagnoses,
            procedures: procedures(resource),
            discharge_status: info_code(DISCHARGE_STATUS_CATEGORY),
            drg_code: info_code(DRG_CATEGORY),
            blood_pints: info_value(BLOOD_PINTS_CATEGORY),
        },
        financial: InpatientFinancial {
            totals: totals_by_category(resource),
            payment: Payment::from_claim(resource),
            benefit_balances: benefit_balances(resource),
            line_items,
        },
        care_team,
        supporting_information,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inpatient_claim() -> Value {
        json!({
            "resourceType": "ExplanationOfBenefit",
            "id": "inpatient-10000930037921",
            "status": "active",
            "use": "claim",
            "outcome": "complete",
            "created": "2016-02-10",
            "meta": { "lastUpdated": "2020-02-01T00:00:00Z" },
            "type": { "coding": [
                { "system": "https://bluebutton.cms.gov/resources/codesystem/eob-type",
                  "code": "INPATIENT", "display": "Inpatient claim" }
            ]},
            "subType": { "coding": [{ "code": "inpatient", "display": "Inpatient" }], "text": "Inpatient" },
            "identifier": [ { "value": "10000930037921" } ],
            "extension": [
                { "url": "https://bluebutton.cms.gov/resources/variables/nch_near_line_rec_ident_cd",
                  "valueCoding": { "display": "Inpatient claim" } },
                { "url": "https://bluebutton.cms.gov/resources/variables/clm_mdcr_non_pmt_rsn_cd",
                  "valueCoding": { "code": "N" } },
                { "url": "https://bluebutton.cms.gov/resources/variables/ime_op_clm_val_amt",
                  "valueMoney": { "value": 431.75 } },
                { "url": "https://bluebutton.cms.gov/resources/variables/fi_doc_clm_cntl_num",
                  "valueIdentifier": { "value": "23011921368815998" } },
                { "url": "https://bluebutton.cms.gov/resources/variables/fi_clm_proc_dt",
                  "valueDate": "2016-02-26" }
            ],
            "billablePeriod": {
                "start": "2016-01-15", "end": "2016-01-27",
                "extension": [
                    { "url": "https://bluebutton.cms.gov/resources/variables/claim_query_cd",
                      "valueCoding": { "display": "Final bill" } }
                ]
            },
            "patient": { "reference": "Patient/-20140000008325" },
            "insurer": { "identifier": { "value": "CMS" } },
            "insurance": [ { "coverage": { "reference": "Coverage/part-a--20140000008325" } } ],
            "facility": { "extension": [
                { "url": "https://bluebutton.cms.gov/resources/variables/clm_fac_type_cd",
                  "valueCoding": { "display": "Hospital" } }
            ]},
            "contained": [
                { "resourceType": "Organization", "id": "provider-org", "name": "General Hospital",
                  "identifier": [
                      { "type": { "coding": [{ "code": "npi" }] }, "value": "9999999999" }
                  ]}
            ],
            "careTeam": [
                { "sequence": 1,
                  "provider": { "display": "Dr. Adams", "identifier": { "value": "1111111111" } },
                  "role": { "coding": [{ "code": "attending", "display": "Attending" }] },
                  "qualification": { "coding": [{ "code": "08", "display": "Family practice" }] } }
            ],
            "diagnosis": [
                { "sequence": 1,
                  "diagnosisCodeableConcept": { "coding": [
                      { "code": "A41.9", "system": "http://hl7.org/fhir/sid/icd-10",
                        "display": "Sepsis, unspecified organism" }
                  ]},
                  "type": [{ "coding": [{ "code": "principal", "display": "Principal" }] }],
                  "extension": [
                      { "url": "https://bluebutton.cms.gov/resources/variables/clm_poa_ind_sw2",
                        "valueCoding": { "display": "Present on admission" } }
                  ]}
            ],
            "procedure": [
                { "sequence": 1, "date": "2016-01-16",
                  "procedureCodeableConcept": { "coding": [
                      { "code": "0DJD8ZZ", "display": "Inspection of lower intestinal tract" }
                  ]}}
            ],
            "supportingInfo": [
                { "sequence": 1,
                  "category": { "coding": [{ "display": "Discharge Status" }] },
                  "code": { "coding": [{ "code": "01", "display": "Discharged to home" }] } },
                { "sequence": 2,
                  "category": { "coding": [{ "display": "Claim Diagnosis Related Group Code (or MS-DRG Code)" }] },
                  "code": { "coding": [{ "code": "871" }] } },
                { "sequence": 3,
                  "category": { "coding": [{ "display": "NCH Blood Pints Furnished Quantity" }] },
                  "valueQuantity": { "value": 0, "unit": "pint" } }
            ],
            "total": [
                { "category": { "coding": [{ "code": "benefit", "display": "Benefit Amount" }] },
                  "amount": { "value": 12500.0, "currency": "USD" } }
            ],
            "payment": { "amount": { "value": 11300.5, "currency": "USD" }, "date": "2016-02-26" },
            "benefitBalance": [
                { "category": { "coding": [{ "display": "Medical Care" }] },
                  "financial": [
                      { "type": { "coding": [{ "display": "Part A Deductible" }] },
                        "usedMoney": { "value": 1288.0 } }
                  ]}
            ],
            "item": [
                { "sequence": 1,
                  "revenue": { "coding": [{ "code": "0001", "display": "Total charge" }] },
                  "locationAddress": { "state": "TX" },
                  "quantity": { "value": 12, "unit": "day" },
                  "careTeamSequence": [1],
                  "diagnosisSequence": [1],
                  "adjudication": [
                      { "category": { "coding": [{ "code": "submitted" }] },
                        "amount": { "value": 14000.0 } },
                      { "category": { "coding": [{ "code": "deductible", "display": "Part A Deductible" }] },
                        "amount": { "value": 1288.0 } }
                  ]}
            ]
        })
    }

    #[test]
    fn test_normalize_full_claim() {
        let claim = normalize(&inpatient_claim()).unwrap();

        assert_eq!(claim.claim.id.as_deref(), Some("inpatient-10000930037921"));
        assert_eq!(claim.claim.subtype.as_deref(), Some("Inpatient"));
        assert_eq!(claim.claim.billing_code.as_deref(), Some("Final bill"));
        assert_eq!(claim.claim.control_number.as_deref(), Some("23011921368815998"));
        assert_eq!(claim.claim.processing_date.as_deref(), Some("2016-02-26"));
        assert_eq!(claim.claim.extensions.claim_class.as_deref(), Some("Inpatient claim"));
        assert_eq!(claim.claim.extensions.non_payment_reason.as_deref(), Some("N"));
        assert_eq!(claim.claim.extensions.ime_amount, Some(431.75));
        assert!(claim.claim.extensions.dsh_amount.is_none());

        assert_eq!(claim.patient.member_id.as_deref(), Some("10000930037921"));
        assert_eq!(claim.provider.organization.name.as_deref(), Some("General Hospital"));
        assert_eq!(claim.provider.organization.npi.as_deref(), Some("9999999999"));
        assert_eq!(claim.provider.facility_type.as_deref(), Some("Hospital"));
        assert_eq!(
            claim.insurance.coverage.as_deref(),
            Some("Coverage/part-a--20140000008325")
        );
    }

    #[test]
    fn test_clinical_summary_promotion() {
        let claim = normalize(&inpatient_claim()).unwrap();

        assert_eq!(claim.clinical.diagnoses.len(), 1);
        assert_eq!(
            claim.clinical.diagnoses[0].present_on_admission.as_deref(),
            Some("Present on admission")
        );
        assert_eq!(claim.clinical.procedures.len(), 1);
        assert_eq!(claim.clinical.discharge_status.as_deref(), Some("Discharged to home"));
        assert_eq!(claim.clinical.drg_code.as_deref(), Some("871"));
        assert_eq!(claim.clinical.blood_pints, Some(json!(0)));
    }

    #[test]
    fn test_financials() {
        let claim = normalize(&inpatient_claim()).unwrap();

        assert_eq!(claim.financial.totals["benefit"].amount, 12500.0);
        assert_eq!(claim.financial.payment.amount, Some(11300.5));
        assert_eq!(claim.financial.payment.date.as_deref(), Some("2016-02-26"));
        assert_eq!(claim.financial.benefit_balances.len(), 1);

        let item = &claim.financial.line_items[0];
        assert_eq!(item.revenue_code.as_deref(), Some("0001"));
        assert_eq!(item.location.as_deref(), Some("TX"));
        assert_eq!(item.quantity, Some(12.0));
        assert_eq!(item.providers[0].name.as_deref(), Some("Dr. Adams"));
        assert_eq!(item.diagnoses[0].code.as_deref(), Some("A41.9"));
        assert_eq!(item.financials.summary.submitted_amount, 14000.0);
        assert_eq!(item.financials.summary.deductible, 1288.0);
        assert_eq!(item.financials.summary.paid_to_patient, 0.0);
    }

    #[test]
    fn test_minimal_resource_normalizes() {
        let claim = normalize(&json!({ "resourceType": "ExplanationOfBenefit" })).unwrap();
        assert!(claim.claim.id.is_none());
        assert!(claim.financial.line_items.is_empty());
        assert_eq!(claim.provider.organization, ProviderIdentity::default());
    }

    #[test]
    fn test_wrong_resource_kind_is_rejected() {
        assert!(normalize(&json!({ "resourceType": "Patient" })).unwrap_err().is_shape_error());
    }
}

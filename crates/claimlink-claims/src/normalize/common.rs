//! Extraction building blocks shared by all four normalizers.
//!
//! Everything here follows the same rule as the path accessor it is built
//! on: absence at any depth produces `None` (or an empty collection, or a
//! zero amount), never an error. Only the top-level resource-kind check in
//! [`require_explanation_of_benefit`] can fail.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use claimlink_core::path::{array_at, bool_at, f64_at, str_at, string_at, u64_at, value_at};

use crate::ClaimsResult;
use crate::error::ClaimsError;

/// The resource kind every normalizer expects.
pub const EXPLANATION_OF_BENEFIT: &str = "ExplanationOfBenefit";

/// Rejects resources that are not ExplanationOfBenefit.
///
/// # Errors
///
/// Returns [`ClaimsError::InvalidClaimShape`] naming what actually arrived.
pub fn require_explanation_of_benefit(resource: &Value) -> ClaimsResult<()> {
    match str_at(resource, "resourceType") {
        Some(EXPLANATION_OF_BENEFIT) => Ok(()),
        Some(other) => Err(ClaimsError::invalid_claim_shape(
            EXPLANATION_OF_BENEFIT,
            other,
        )),
        None => Err(ClaimsError::invalid_claim_shape(
            EXPLANATION_OF_BENEFIT,
            "a resource without resourceType",
        )),
    }
}

// =============================================================================
// Small shared shapes
// =============================================================================

/// A code/display pair pulled from a CodeableConcept coding entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Reads a single coding entry.
    #[must_use]
    pub fn from_value(coding: &Value) -> Self {
        Self {
            code: string_at(coding, "code"),
            display: string_at(coding, "display"),
        }
    }

    /// Reads every coding under `path` (a coding array), empty when absent.
    #[must_use]
    pub fn list_at(root: &Value, path: &str) -> Vec<Coding> {
        array_at(root, path)
            .map(|codings| codings.iter().map(Coding::from_value).collect())
            .unwrap_or_default()
    }
}

/// A start/end period; either bound may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl Period {
    /// Reads the period object under `path`.
    #[must_use]
    pub fn at(root: &Value, path: &str) -> Self {
        value_at(root, path)
            .map(|period| Self {
                start: string_at(period, "start"),
                end: string_at(period, "end"),
            })
            .unwrap_or_default()
    }
}

/// Resource metadata every category reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl ResourceMeta {
    /// Reads `meta.lastUpdated` and the first profile.
    #[must_use]
    pub fn from_resource(resource: &Value) -> Self {
        Self {
            last_updated: string_at(resource, "meta.lastUpdated"),
            profile: string_at(resource, "meta.profile.0"),
        }
    }
}

// =============================================================================
// Extension lookup
// =============================================================================

/// Finds the extension entry with the given URL. Linear scan, first match.
#[must_use]
pub fn extension_at<'a>(extensions: Option<&'a Vec<Value>>, url: &str) -> Option<&'a Value> {
    extensions?.iter().find(|ext| str_at(ext, "url") == Some(url))
}

/// The value of an extension, whichever `value[x]` form it carries.
///
/// Mirrors the provider's mix of extension value types: coding display or
/// code, identifier value, date, quantity, money, string, boolean - first
/// present wins.
#[must_use]
pub fn extension_value(extensions: Option<&Vec<Value>>, url: &str) -> Option<Value> {
    let ext = extension_at(extensions, url)?;
    [
        "valueCoding.display",
        "valueCoding.code",
        "valueIdentifier.value",
        "valueDate",
        "valueQuantity.value",
        "valueMoney.value",
        "valueString",
        "valueBoolean",
    ]
    .iter()
    .find_map(|path| value_at(ext, path))
    .cloned()
}

/// String form of [`extension_value`]; non-string values yield `None`.
#[must_use]
pub fn extension_string(extensions: Option<&Vec<Value>>, url: &str) -> Option<String> {
    match extension_value(extensions, url)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Numeric form of [`extension_value`]; non-numeric values yield `None`.
#[must_use]
pub fn extension_number(extensions: Option<&Vec<Value>>, url: &str) -> Option<f64> {
    extension_value(extensions, url)?.as_f64()
}

// =============================================================================
// Diagnoses and care team (declared once, referenced by sequence)
// =============================================================================

/// A diagnosis declared at claim level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub diagnosis_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present_on_admission: Option<String>,
}

const PRESENT_ON_ADMISSION_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/clm_poa_ind_sw2";

impl Diagnosis {
    /// Reads one `diagnosis` list entry.
    #[must_use]
    pub fn from_value(diagnosis: &Value) -> Self {
        Self {
            sequence: u64_at(diagnosis, "sequence"),
            code: string_at(diagnosis, "diagnosisCodeableConcept.coding.0.code"),
            system: string_at(diagnosis, "diagnosisCodeableConcept.coding.0.system"),
            description: string_at(diagnosis, "diagnosisCodeableConcept.coding.0.display"),
            diagnosis_type: string_at(diagnosis, "type.0.coding.0.display"),
            type_code: string_at(diagnosis, "type.0.coding.0.code"),
            present_on_admission: extension_string(
                array_at(diagnosis, "extension"),
                PRESENT_ON_ADMISSION_URL,
            ),
        }
    }
}

/// A care-team member declared at claim level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareTeamMember {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participation: Option<String>,
}

const PARTICIPATION_URL: &str =
    "https://bluebutton.cms.gov/resources/variables/prtcptng_ind_cd";

impl CareTeamMember {
    /// Reads one `careTeam` list entry.
    #[must_use]
    pub fn from_value(member: &Value) -> Self {
        Self {
            sequence: u64_at(member, "sequence"),
            name: string_at(member, "provider.display"),
            npi: string_at(member, "provider.identifier.value"),
            role: string_at(member, "role.coding.0.display"),
            role_code: string_at(member, "role.coding.0.code"),
            specialty: string_at(member, "qualification.coding.0.display"),
            specialty_code: string_at(member, "qualification.coding.0.code"),
            responsible: bool_at(member, "responsible"),
            participation: extension_string(array_at(member, "extension"), PARTICIPATION_URL),
        }
    }
}

/// A line-item procedure modifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl Modifier {
    /// Reads every modifier under `path` (a CodeableConcept array).
    #[must_use]
    pub fn list_at(root: &Value, path: &str) -> Vec<Modifier> {
        array_at(root, path)
            .map(|modifiers| {
                modifiers
                    .iter()
                    .map(|modifier| Modifier {
                        code: string_at(modifier, "coding.0.code"),
                        display: string_at(modifier, "coding.0.display"),
                        system: string_at(modifier, "coding.0.system"),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Builds the list and the sequence index for a claim-level declaration
/// list (diagnoses, care team). Entries without a sequence stay in the list
/// but cannot be referenced.
#[must_use]
pub fn indexed<T: Clone>(
    items: Option<&Vec<Value>>,
    build: impl Fn(&Value) -> T,
    sequence_of: impl Fn(&T) -> Option<u64>,
) -> (Vec<T>, HashMap<u64, T>) {
    let list: Vec<T> = items
        .map(|items| items.iter().map(&build).collect())
        .unwrap_or_default();
    let map = list
        .iter()
        .filter_map(|item| sequence_of(item).map(|seq| (seq, item.clone())))
        .collect();
    (list, map)
}

/// Resolves a line item's sequence-reference list against an index,
/// silently dropping unresolvable sequence numbers.
#[must_use]
pub fn resolve_sequences<T: Clone>(
    index: &HashMap<u64, T>,
    sequences: Option<&Vec<Value>>,
) -> Vec<T> {
    sequences
        .map(|seqs| {
            seqs.iter()
                .filter_map(Value::as_u64)
                .filter_map(|seq| index.get(&seq).cloned())
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Adjudications and financial aggregation
// =============================================================================

/// One flattened adjudication component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjudicationEntry {
    /// `financial` for category codings, `denial` for reason codings.
    pub kind: AdjudicationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub currency: String,
}

/// Whether a breakdown entry carries money or a denial reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjudicationKind {
    Financial,
    Denial,
}

const DEFAULT_CURRENCY: &str = "USD";

/// Flattens an adjudication list into per-coding breakdown entries.
#[must_use]
pub fn flatten_adjudications(adjudications: Option<&Vec<Value>>) -> Vec<AdjudicationEntry> {
    let Some(adjudications) = adjudications else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for adjudication in adjudications {
        let amount = f64_at(adjudication, "amount.value");
        let currency = string_at(adjudication, "amount.currency")
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        if let Some(codings) = array_at(adjudication, "category.coding") {
            for coding in codings {
                let code = string_at(coding, "code");
                entries.push(AdjudicationEntry {
                    kind: AdjudicationKind::Financial,
                    label: string_at(coding, "display").or_else(|| code.clone()),
                    code,
                    system: string_at(coding, "system"),
                    amount,
                    currency: currency.clone(),
                });
            }
        }
        if let Some(codings) = array_at(adjudication, "reason.coding") {
            for coding in codings {
                entries.push(AdjudicationEntry {
                    kind: AdjudicationKind::Denial,
                    code: string_at(coding, "code"),
                    system: string_at(coding, "system"),
                    label: string_at(coding, "display"),
                    amount,
                    currency: currency.clone(),
                });
            }
        }
    }
    entries
}

/// The per-line financial picture, located by adjudication category keyword.
///
/// Every amount defaults to zero when the matching adjudication is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub submitted_amount: f64,
    pub allowed_amount: f64,
    pub paid_to_provider: f64,
    pub paid_to_patient: f64,
    pub deductible: f64,
    pub coinsurance: f64,
    pub non_covered_amount: f64,
    pub covered_amount: f64,
}

impl FinancialSummary {
    /// Aggregates a line item's adjudication list.
    #[must_use]
    pub fn from_adjudications(adjudications: Option<&Vec<Value>>) -> Self {
        let submitted_amount = adjudication_amount(adjudications, "submitted");
        let non_covered_amount = adjudication_amount(adjudications, "noncovered");
        Self {
            submitted_amount,
            allowed_amount: adjudication_amount(adjudications, "eligible"),
            paid_to_provider: adjudication_amount(adjudications, "paidtoprovider"),
            paid_to_patient: adjudication_amount(adjudications, "paidtopatient"),
            deductible: adjudication_amount(adjudications, "deductible"),
            coinsurance: adjudication_amount(adjudications, "coinsurance"),
            non_covered_amount,
            covered_amount: submitted_amount - non_covered_amount,
        }
    }
}

/// Finds the amount of the first adjudication whose category coding code or
/// display contains `keyword`, case-insensitively. Zero when absent.
#[must_use]
pub fn adjudication_amount(adjudications: Option<&Vec<Value>>, keyword: &str) -> f64 {
    let keyword = keyword.to_lowercase();
    adjudications
        .and_then(|adjudications| {
            adjudications.iter().find(|adjudication| {
                array_at(adjudication, "category.coding").is_some_and(|codings| {
                    codings.iter().any(|coding| {
                        let matches = |field: &str| {
                            str_at(coding, field)
                                .is_some_and(|v| v.to_lowercase().contains(&keyword))
                        };
                        matches("code") || matches("display")
                    })
                })
            })
        })
        .and_then(|adjudication| f64_at(adjudication, "amount.value"))
        .unwrap_or(0.0)
}

/// A line item's financials: the keyword summary plus the full breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    pub summary: FinancialSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub breakdown: Vec<AdjudicationEntry>,
}

impl Financials {
    /// Builds both views from a line item's adjudication list.
    #[must_use]
    pub fn from_adjudications(adjudications: Option<&Vec<Value>>) -> Self {
        Self {
            summary: FinancialSummary::from_adjudications(adjudications),
            breakdown: flatten_adjudications(adjudications),
        }
    }
}

// =============================================================================
// Claim-level money: totals, payment, benefit balances
// =============================================================================

/// One entry of the claim `total` list, keyed by lowercased category code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalAmount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub amount: f64,
    pub currency: String,
}

/// Collapses the claim `total` list into a category-keyed map. Entries
/// without an amount are dropped.
#[must_use]
pub fn totals_by_category(claim: &Value) -> BTreeMap<String, TotalAmount> {
    let mut totals = BTreeMap::new();
    if let Some(entries) = array_at(claim, "total") {
        for total in entries {
            let Some(amount) = f64_at(total, "amount.value") else {
                continue;
            };
            let code = string_at(total, "category.coding.0.code")
                .unwrap_or_else(|| "unknown".to_string())
                .to_lowercase();
            totals.insert(
                code,
                TotalAmount {
                    label: string_at(total, "category.coding.0.display"),
                    amount,
                    currency: string_at(total, "amount.currency")
                        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                },
            );
        }
    }
    totals
}

/// The claim-level payment block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl Payment {
    /// Reads `payment`, falling back to `created` for the date.
    #[must_use]
    pub fn from_claim(claim: &Value) -> Self {
        Self {
            amount: f64_at(claim, "payment.amount.value"),
            currency: string_at(claim, "payment.amount.currency")
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            date: string_at(claim, "payment.date").or_else(|| string_at(claim, "created")),
            method: string_at(claim, "payment.type.coding.0.display"),
        }
    }
}

/// One benefit-balance category with its financial entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitBalance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub financials: Vec<BenefitFinancial>,
}

/// One `benefitBalance.financial` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitFinancial {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub balance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub currency: String,
}

/// Reads the claim `benefitBalance` list.
#[must_use]
pub fn benefit_balances(claim: &Value) -> Vec<BenefitBalance> {
    array_at(claim, "benefitBalance")
        .map(|balances| {
            balances
                .iter()
                .map(|balance| BenefitBalance {
                    category: string_at(balance, "category.coding.0.display")
                        .or_else(|| string_at(balance, "category.coding.0.code")),
                    financials: array_at(balance, "financial")
                        .map(|financials| {
                            financials
                                .iter()
                                .map(|financial| BenefitFinancial {
                                    balance_type: string_at(financial, "type.coding.0.display")
                                        .or_else(|| string_at(financial, "type.coding.0.code")),
                                    amount: f64_at(financial, "usedMoney.value")
                                        .or_else(|| f64_at(financial, "usedUnsignedInt")),
                                    currency: string_at(financial, "usedMoney.currency")
                                        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Procedures, supporting info, contained resources
// =============================================================================

/// A procedure declared at claim level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Reads the claim `procedure` list.
#[must_use]
pub fn procedures(claim: &Value) -> Vec<Procedure> {
    array_at(claim, "procedure")
        .map(|procedures| {
            procedures
                .iter()
                .map(|procedure| Procedure {
                    sequence: u64_at(procedure, "sequence"),
                    code: string_at(procedure, "procedureCodeableConcept.coding.0.code"),
                    system: string_at(procedure, "procedureCodeableConcept.coding.0.system"),
                    description: string_at(procedure, "procedureCodeableConcept.coding.0.display"),
                    date: string_at(procedure, "date"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// One `supportingInfo` entry, category and code flattened to display-first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportingInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Reads the claim `supportingInfo` list.
#[must_use]
pub fn supporting_info(claim: &Value) -> Vec<SupportingInfo> {
    array_at(claim, "supportingInfo")
        .map(|infos| {
            infos
                .iter()
                .map(|info| SupportingInfo {
                    sequence: u64_at(info, "sequence"),
                    category: string_at(info, "category.coding.0.display")
                        .or_else(|| string_at(info, "category.coding.0.code")),
                    code: string_at(info, "code.coding.0.display")
                        .or_else(|| string_at(info, "code.coding.0.code")),
                    value: value_at(info, "timingDate")
                        .or_else(|| value_at(info, "valueQuantity.value"))
                        .or_else(|| value_at(info, "valueString"))
                        .or_else(|| value_at(info, "code.text"))
                        .cloned(),
                    unit: string_at(info, "valueQuantity.unit"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Resolves a `#local` reference against the claim's `contained` list.
#[must_use]
pub fn contained_by_reference<'a>(claim: &'a Value, reference: &str) -> Option<&'a Value> {
    let id = reference.strip_prefix('#').unwrap_or(reference);
    array_at(claim, "contained")?
        .iter()
        .find(|resource| str_at(resource, "id") == Some(id))
}

/// All contained resources of one kind.
#[must_use]
pub fn contained_of_kind<'a>(claim: &'a Value, kind: &str) -> Vec<&'a Value> {
    array_at(claim, "contained")
        .map(|resources| {
            resources
                .iter()
                .filter(|resource| str_at(resource, "resourceType") == Some(kind))
                .collect()
        })
        .unwrap_or_default()
}

/// Identity of a billing provider or organization resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderIdentity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl ProviderIdentity {
    /// Reads a Practitioner/Organization resource, scanning identifiers for
    /// NPI and tax-id type codes.
    #[must_use]
    pub fn from_resource(resource: &Value) -> Self {
        let identifier_with = |predicate: &dyn Fn(&Value) -> bool| -> Option<String> {
            array_at(resource, "identifier")?
                .iter()
                .find(|identifier| predicate(identifier))
                .and_then(|identifier| string_at(identifier, "value"))
        };

        let npi = identifier_with(&|identifier| {
            str_at(identifier, "system").is_some_and(|s| s.contains("us-npi"))
                || has_type_code(identifier, "npi")
        });
        let tax_id = identifier_with(&|identifier| has_type_code(identifier, "PRN"));

        Self {
            name: string_at(resource, "name").or_else(|| string_at(resource, "display")),
            npi,
            tax_id,
            resource_type: string_at(resource, "resourceType"),
            active: bool_at(resource, "active"),
        }
    }
}

fn has_type_code(identifier: &Value, code: &str) -> bool {
    array_at(identifier, "type.coding")
        .is_some_and(|codings| codings.iter().any(|c| str_at(c, "code") == Some(code)))
}

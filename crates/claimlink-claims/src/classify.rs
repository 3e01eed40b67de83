//! Bundle classification into claim categories.
//!
//! Every entry of a merged searchset lands in exactly one bucket. An entry
//! is normalized into its category when its `type.coding` list carries the
//! recognized coding system with a known code (first match wins, remaining
//! codings ignored); everything else - wrong resource kind, missing coding,
//! unknown code - passes through unmodified in `OTHER`.
//!
//! Classification is deterministic: the same raw bundle always yields the
//! same bucket assignment.

use serde::Serialize;
use serde_json::Value;

use claimlink_core::Bundle;
use claimlink_core::path::{array_at, str_at, string_at};

use crate::normalize::{CarrierClaim, InpatientClaim, OutpatientClaim, PdeClaim, carrier,
    common::EXPLANATION_OF_BENEFIT, inpatient, outpatient, pde};
use crate::types::{ClaimType, EOB_TYPE_SYSTEM};

/// The classified, normalized view of one claims bundle.
///
/// Serialization is sparse: categories with zero entries are omitted, so a
/// bundle with only carrier claims serializes to `{"CARRIER": [...]}`.
#[derive(Debug, Default, Serialize)]
pub struct CategorizedClaims {
    #[serde(rename = "CARRIER", skip_serializing_if = "Vec::is_empty")]
    pub carrier: Vec<CarrierClaim>,
    #[serde(rename = "INPATIENT", skip_serializing_if = "Vec::is_empty")]
    pub inpatient: Vec<InpatientClaim>,
    #[serde(rename = "OUTPATIENT", skip_serializing_if = "Vec::is_empty")]
    pub outpatient: Vec<OutpatientClaim>,
    #[serde(rename = "PDE", skip_serializing_if = "Vec::is_empty")]
    pub pde: Vec<PdeClaim>,
    /// Unrecognized entries, passed through unmodified.
    #[serde(rename = "OTHER", skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<Value>,
}

impl CategorizedClaims {
    /// Total entries across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.carrier.len()
            + self.inpatient.len()
            + self.outpatient.len()
            + self.pde.len()
            + self.other.len()
    }

    /// Returns `true` when every bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Determines the claim category of a raw EOB resource.
///
/// Scans `type.coding` in order; the first coding carrying the recognized
/// system and a parseable code decides. `None` when nothing matches.
#[must_use]
pub fn claim_type_of(resource: &Value) -> Option<ClaimType> {
    array_at(resource, "type.coding")?.iter().find_map(|coding| {
        if str_at(coding, "system") != Some(EOB_TYPE_SYSTEM) {
            return None;
        }
        str_at(coding, "code").and_then(|code| ClaimType::parse(code).ok())
    })
}

/// Partitions and normalizes a merged bundle.
///
/// A normalizer failure drops only that entry (logged with the offending
/// resource id); the rest of the bundle is still processed.
#[must_use]
pub fn classify(bundle: &Bundle) -> CategorizedClaims {
    let mut categorized = CategorizedClaims::default();

    for entry in &bundle.entry {
        let resource = &entry.resource;

        if str_at(resource, "resourceType") != Some(EXPLANATION_OF_BENEFIT) {
            categorized.other.push(resource.clone());
            continue;
        }

        let Some(claim_type) = claim_type_of(resource) else {
            tracing::debug!(
                id = string_at(resource, "id").as_deref().unwrap_or("<no id>"),
                "claim category coding missing or unrecognized, passing through"
            );
            categorized.other.push(resource.clone());
            continue;
        };

        let outcome = match claim_type {
            ClaimType::Carrier => {
                carrier::normalize(resource).map(|claim| categorized.carrier.push(claim))
            }
            ClaimType::Inpatient => {
                inpatient::normalize(resource).map(|claim| categorized.inpatient.push(claim))
            }
            ClaimType::Outpatient => {
                outpatient::normalize(resource).map(|claim| categorized.outpatient.push(claim))
            }
            ClaimType::Pde => pde::normalize(resource).map(|claim| categorized.pde.push(claim)),
        };

        if let Err(error) = outcome {
            tracing::warn!(
                id = string_at(resource, "id").as_deref().unwrap_or("<no id>"),
                %claim_type,
                %error,
                "dropping entry that failed normalization"
            );
        }
    }

    categorized
}

//! FHIR searchset bundle types.
//!
//! The claims API returns search results as `Bundle` resources whose entries
//! are opaque raw resources until classified. Entries stay as
//! [`serde_json::Value`] here; typed views are the normalizers' job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A FHIR bundle, as returned by a search against the claims API.
///
/// Deserialization is tolerant: every field except `resourceType` may be
/// absent on the wire and defaults to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// Always `"Bundle"` for well-formed responses.
    #[serde(default = "Bundle::resource_type_name")]
    pub resource_type: String,

    /// Bundle type, `"searchset"` for search responses.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<String>,

    /// Total matching resources, when the server reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    /// The matched resources. Absent on the wire means empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

/// One entry of a [`Bundle`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    /// Absolute URL of the resource, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    /// The raw resource. Opaque until classified.
    #[serde(default)]
    pub resource: Value,
}

impl Bundle {
    fn resource_type_name() -> String {
        "Bundle".to_string()
    }

    /// Builds a searchset bundle from a set of entries.
    #[must_use]
    pub fn searchset(entry: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: Self::resource_type_name(),
            bundle_type: Some("searchset".to_string()),
            total: Some(entry.len() as u64),
            entry,
        }
    }

    /// Merges several bundles into one searchset.
    ///
    /// Entry order is preserved within each input bundle; bundles are
    /// concatenated in iteration order. No cross-bundle ordering beyond that
    /// is guaranteed or implied.
    #[must_use]
    pub fn merge(bundles: impl IntoIterator<Item = Bundle>) -> Self {
        let entry: Vec<BundleEntry> = bundles.into_iter().flat_map(|b| b.entry).collect();
        Self::searchset(entry)
    }

    /// Number of entries in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entry.len()
    }

    /// Returns `true` if the bundle carries no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }
}

impl BundleEntry {
    /// Wraps a raw resource in an entry.
    #[must_use]
    pub fn from_resource(resource: Value) -> Self {
        Self {
            full_url: None,
            resource,
        }
    }
}

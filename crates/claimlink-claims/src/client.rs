//! Outbound client for the external claims API.
//!
//! All calls are bearer-token-authenticated GETs with a bounded timeout and
//! no automatic retries. The ExplanationOfBenefit fetch fans out one
//! concurrent request per requested claim type and joins them into a single
//! merged searchset; any single failure fails the whole fetch - partial
//! bundles are never returned.

use std::time::Duration;

use futures_util::future::try_join_all;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use claimlink_core::Bundle;

use crate::ClaimsResult;
use crate::error::ClaimsError;
use crate::types::ClaimType;

/// Default timeout for claims API calls.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const FHIR_ACCEPT: &str = "application/fhir+json";

/// Configuration for the claims API client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimsClientConfig {
    /// Base URL of the claims API's FHIR endpoint.
    pub base_url: Url,

    /// Timeout applied to every request.
    #[serde(
        with = "humantime_serde",
        default = "ClaimsClientConfig::default_timeout"
    )]
    pub request_timeout: Duration,
}

impl ClaimsClientConfig {
    /// Creates a configuration with the default timeout.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn default_timeout() -> Duration {
        DEFAULT_REQUEST_TIMEOUT
    }
}

/// Client for the external claims API.
#[derive(Debug, Clone)]
pub struct ClaimsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ClaimsClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::Configuration`] if the base URL cannot anchor
    /// resource paths or the HTTP client cannot be constructed.
    pub fn new(config: ClaimsClientConfig) -> ClaimsResult<Self> {
        let mut base_url = config.base_url;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        if base_url.cannot_be_a_base() {
            return Err(ClaimsError::configuration("base_url cannot be a base URL"));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                ClaimsError::configuration(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { http, base_url })
    }

    /// Fetches ExplanationOfBenefit resources for a patient.
    ///
    /// With an empty `types` slice, issues one request for all claim types.
    /// Otherwise issues one concurrent request per requested type and merges
    /// the entries: order is preserved within each per-type response, with
    /// no guaranteed ordering across types.
    ///
    /// # Errors
    ///
    /// Fails the whole fetch if any single request fails - no
    /// partial-bundle success.
    pub async fn explanation_of_benefit(
        &self,
        access_token: &str,
        patient_id: &str,
        types: &[ClaimType],
    ) -> ClaimsResult<Bundle> {
        let urls: Vec<Url> = if types.is_empty() {
            vec![self.eob_url(patient_id, None)?]
        } else {
            types
                .iter()
                .map(|claim_type| self.eob_url(patient_id, Some(*claim_type)))
                .collect::<ClaimsResult<_>>()?
        };

        let bundles = try_join_all(
            urls.into_iter()
                .map(|url| self.fetch_bundle(access_token, url)),
        )
        .await?;

        let merged = Bundle::merge(bundles);
        tracing::debug!(entries = merged.len(), "merged claims bundles");
        Ok(merged)
    }

    /// Fetches the Patient search bundle for the token's beneficiary.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::Api`] on a non-success response.
    pub async fn patient(&self, access_token: &str) -> ClaimsResult<Bundle> {
        let url = self.resource_url("Patient")?;
        self.fetch_bundle(access_token, url).await
    }

    /// Fetches one Patient resource by provider-issued id.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::Api`] on a non-success response.
    pub async fn patient_by_id(&self, access_token: &str, patient_id: &str) -> ClaimsResult<Value> {
        let url = self
            .base_url
            .join(&format!("Patient/{patient_id}"))
            .map_err(|e| ClaimsError::configuration(format!("invalid patient id: {e}")))?;
        let response = self.get(access_token, url).await?;
        Ok(response.json().await?)
    }

    /// Fetches the Coverage search bundle for the token's beneficiary.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::Api`] on a non-success response.
    pub async fn coverage(&self, access_token: &str) -> ClaimsResult<Bundle> {
        let url = self.resource_url("Coverage")?;
        self.fetch_bundle(access_token, url).await
    }

    fn resource_url(&self, resource: &str) -> ClaimsResult<Url> {
        self.base_url
            .join(resource)
            .map_err(|e| ClaimsError::configuration(format!("invalid resource path: {e}")))
    }

    fn eob_url(&self, patient_id: &str, claim_type: Option<ClaimType>) -> ClaimsResult<Url> {
        let mut url = self.resource_url("ExplanationOfBenefit")?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("patient", patient_id);
            if let Some(claim_type) = claim_type {
                params.append_pair("type", claim_type.as_str());
            }
            params.append_pair("_summary", "true");
        }
        Ok(url)
    }

    async fn fetch_bundle(&self, access_token: &str, url: Url) -> ClaimsResult<Bundle> {
        let response = self.get(access_token, url).await?;
        Ok(response.json().await?)
    }

    async fn get(&self, access_token: &str, url: Url) -> ClaimsResult<reqwest::Response> {
        tracing::debug!(path = url.path(), "claims API request");
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, FHIR_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body_len = body.len(), "claims API returned an error");
            return Err(ClaimsError::api(
                status.as_u16(),
                "claims API request failed",
            ));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClaimsClientConfig::new(Url::parse("https://api.example.com/v2/fhir/").unwrap());
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);

        let config = config.with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_deserialization() {
        let config: ClaimsClientConfig = serde_json::from_value(serde_json::json!({
            "base_url": "https://api.example.com/v2/fhir/",
            "request_timeout": "10s"
        }))
        .unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_eob_url_shape() {
        let client = ClaimsClient::new(ClaimsClientConfig::new(
            Url::parse("https://api.example.com/v2/fhir").unwrap(),
        ))
        .unwrap();

        let url = client.eob_url("-20140000008325", Some(ClaimType::Carrier)).unwrap();
        assert_eq!(url.path(), "/v2/fhir/ExplanationOfBenefit");
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(query.contains(&("patient".to_string(), "-20140000008325".to_string())));
        assert!(query.contains(&("type".to_string(), "CARRIER".to_string())));
        assert!(query.contains(&("_summary".to_string(), "true".to_string())));

        let untyped = client.eob_url("-20140000008325", None).unwrap();
        assert!(!untyped.query().unwrap_or("").contains("type="));
    }
}

//! Outbound client for the provider's OAuth token endpoint.
//!
//! Both grants authenticate with HTTP Basic credentials built from the
//! client id and secret and post `application/x-www-form-urlencoded` bodies.
//! Calls carry the configured timeout and are never retried: neither grant
//! is safely retriable after a successful-but-unacknowledged provider
//! response.

use serde::Deserialize;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::pkce::PkceVerifier;

/// Result of a successful authorization-code exchange.
#[derive(Debug, Clone)]
pub struct CodeGrant {
    /// Short-lived access token for immediate claims calls.
    pub access_token: String,
    /// The refresh token anchoring the new consent. Plaintext here only;
    /// encrypted before it reaches storage.
    pub refresh_token: String,
    /// The provider-issued patient identifier.
    pub patient_id: String,
}

/// Result of a successful refresh-token exchange.
#[derive(Debug, Clone)]
pub struct RefreshGrant {
    /// Fresh short-lived access token.
    pub access_token: String,
    /// The rotated refresh token that replaces the one just spent.
    pub refresh_token: String,
}

/// Wire shape of a token-endpoint success response. `token_type`,
/// `expires_in`, and `scope` also arrive on the wire but are not read.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    /// Patient identifier; the claims provider includes it on
    /// authorization-code grants.
    patient: Option<String>,
}

/// Wire shape of a token-endpoint error response.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Client for the provider's token endpoint.
#[derive(Debug, Clone)]
pub struct TokenEndpointClient {
    http: reqwest::Client,
    config: AuthConfig,
}

impl TokenEndpointClient {
    /// Creates a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: AuthConfig) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Exchanges an authorization code (plus the session's PKCE verifier)
    /// for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExchange`] when the provider rejects the
    /// grant or the response omits `refresh_token` or the patient
    /// identifier, and [`AuthError::Http`] on transport failure.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &PkceVerifier,
    ) -> AuthResult<CodeGrant> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", verifier.as_str()),
        ];

        tracing::debug!(endpoint = %self.config.token_endpoint, "exchanging authorization code");

        let response = self
            .http
            .post(self.config.token_endpoint.clone())
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log_provider_error("authorization_code", status, &body);
            return Err(AuthError::token_exchange(
                "provider rejected the authorization code",
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|_| AuthError::token_exchange("provider returned an unreadable response"))?;

        let refresh_token = token
            .refresh_token
            .ok_or_else(|| AuthError::token_exchange("provider response omitted refresh_token"))?;
        let patient_id = token.patient.ok_or_else(|| {
            AuthError::token_exchange("provider response omitted the patient identifier")
        })?;

        Ok(CodeGrant {
            access_token: token.access_token,
            refresh_token,
            patient_id,
        })
    }

    /// Exchanges a refresh token for a new access/refresh pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Refresh`] when the provider rejects the token
    /// (expired or revoked - terminal for that consent) or omits the
    /// rotated refresh token, and [`AuthError::Http`] on transport failure.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<RefreshGrant> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        tracing::debug!(endpoint = %self.config.token_endpoint, "refreshing access token");

        let response = self
            .http
            .post(self.config.token_endpoint.clone())
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log_provider_error("refresh_token", status, &body);
            return Err(AuthError::refresh("provider rejected the refresh token"));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|_| AuthError::refresh("provider returned an unreadable response"))?;

        // The provider rotates refresh tokens. A success response without a
        // new one is indistinguishable from a revoked grant, so it is
        // surfaced rather than silently keeping the spent token.
        let refresh_token = token
            .refresh_token
            .ok_or_else(|| AuthError::refresh("provider response omitted the rotated token"))?;

        Ok(RefreshGrant {
            access_token: token.access_token,
            refresh_token,
        })
    }
}

/// Logs provider error detail at the failure site; callers surface only a
/// categorical message.
fn log_provider_error(grant_type: &str, status: reqwest::StatusCode, body: &str) {
    match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(oauth_error) => tracing::warn!(
            grant_type,
            %status,
            error = %oauth_error.error,
            description = oauth_error.error_description.as_deref().unwrap_or(""),
            "token endpoint returned an OAuth error"
        ),
        Err(_) => tracing::warn!(grant_type, %status, "token endpoint returned an error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_deserialization() {
        let token: TokenResponse = serde_json::from_str(
            r#"{
                "access_token": "at-1",
                "token_type": "Bearer",
                "expires_in": 600,
                "refresh_token": "rt-1",
                "patient": "-20140000008325"
            }"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "at-1");
        assert_eq!(token.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(token.patient.as_deref(), Some("-20140000008325"));
    }

    #[test]
    fn test_token_response_minimal() {
        let token: TokenResponse =
            serde_json::from_str(r#"{ "access_token": "at-1" }"#).unwrap();
        assert!(token.refresh_token.is_none());
        assert!(token.patient.is_none());
    }

    #[test]
    fn test_oauth_error_deserialization() {
        let err: OAuthErrorResponse = serde_json::from_str(
            r#"{ "error": "invalid_grant", "error_description": "Code expired" }"#,
        )
        .unwrap();
        assert_eq!(err.error, "invalid_grant");
        assert_eq!(err.error_description.as_deref(), Some("Code expired"));
    }
}

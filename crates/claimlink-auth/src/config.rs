//! Consent-flow configuration.
//!
//! Loaded once at process startup and treated as read-only afterwards.
//! Secrets (`client_secret`, `vault_key`) are redacted from `Debug` output.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::vault::KEY_SIZE;

/// Default timeout for calls to the provider's token endpoint.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while validating the consent-flow configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required field is empty.
    #[error("Missing configuration value: {field}")]
    MissingField {
        /// The empty field.
        field: &'static str,
    },

    /// The vault key is not a hex-encoded 256-bit key.
    #[error("Invalid vault key: {message}")]
    InvalidVaultKey {
        /// What is wrong with the key.
        message: String,
    },
}

impl ConfigError {
    /// Creates a new `MissingField` error.
    #[must_use]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Creates a new `InvalidVaultKey` error.
    #[must_use]
    pub fn invalid_vault_key(message: impl Into<String>) -> Self {
        Self::InvalidVaultKey {
            message: message.into(),
        }
    }
}

/// Configuration for the consent flow and token-endpoint client.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// OAuth client id registered with the claims provider.
    pub client_id: String,

    /// OAuth client secret. Sent only as HTTP Basic credentials to the
    /// token endpoint.
    pub client_secret: String,

    /// The provider's authorization endpoint.
    pub authorization_endpoint: Url,

    /// The provider's token endpoint.
    pub token_endpoint: Url,

    /// The redirect URI registered for this client.
    pub redirect_uri: Url,

    /// Timeout applied to every token-endpoint call.
    #[serde(with = "humantime_serde", default = "AuthConfig::default_timeout")]
    pub request_timeout: Duration,

    /// Hex-encoded 256-bit key for the refresh-token vault.
    pub vault_key: String,
}

impl AuthConfig {
    fn default_timeout() -> Duration {
        DEFAULT_REQUEST_TIMEOUT
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::missing_field("client_id"));
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::missing_field("client_secret"));
        }
        if self.vault_key.is_empty() {
            return Err(ConfigError::missing_field("vault_key"));
        }
        let key = hex::decode(&self.vault_key)
            .map_err(|_| ConfigError::invalid_vault_key("not valid hex"))?;
        if key.len() != KEY_SIZE {
            return Err(ConfigError::invalid_vault_key(format!(
                "expected {KEY_SIZE} bytes, got {}",
                key.len()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authorization_endpoint", &self.authorization_endpoint.as_str())
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("vault_key", &"<redacted>")
            .finish()
    }
}

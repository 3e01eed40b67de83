//! Consent-flow error types.
//!
//! Security-relevant variants (nonce, integrity, token exchange) carry only
//! categorical messages; provider and storage detail is logged at the failure
//! site, never surfaced to the external caller.

use std::fmt;

use crate::vault::VaultError;

/// Errors that can occur while brokering or exercising a consent.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authenticated clinic identity was present on the request.
    ///
    /// Rejected before any flow state is created.
    #[error("Missing auth context: {message}")]
    MissingAuthContext {
        /// What was missing.
        message: String,
    },

    /// The `state` callback parameter could not be parsed.
    #[error("Invalid state parameter: {message}")]
    InvalidState {
        /// Which part of the parameter was malformed.
        message: String,
    },

    /// The callback nonce did not match the session-stored nonce, or no
    /// pending authorization existed for the session. Replay/CSRF suspicion;
    /// the flow fails closed with no partial progress.
    #[error("OAuth state nonce mismatch")]
    NonceMismatch,

    /// The provider rejected the authorization-code exchange, the code was
    /// already consumed, or the response lacked required fields.
    #[error("Token exchange failed: {message}")]
    TokenExchange {
        /// Categorical description, safe to surface.
        message: String,
    },

    /// The provider rejected the stored refresh token (expired/revoked).
    /// Terminal for the consent; the caller must re-initiate authorization.
    #[error("Refresh token rejected: {message}")]
    Refresh {
        /// Categorical description, safe to surface.
        message: String,
    },

    /// A concurrent rotation won the race for this consent record.
    /// Retriable by the caller.
    #[error("Concurrent refresh-token rotation detected")]
    RefreshConflict,

    /// No consent record exists for the clinic/patient pair.
    #[error("No consent on record for clinic {clinic_id}, patient ref {internal_patient_ref}")]
    ConsentNotFound {
        /// The requesting clinic.
        clinic_id: String,
        /// The clinic's internal patient reference.
        internal_patient_ref: String,
    },

    /// The stored secret envelope is corrupted or was encrypted under a
    /// different key. Fatal for that record, not for the process.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// A storage operation failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// The consent-flow configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// An outbound HTTP call failed before the provider answered
    /// (connect error, timeout). Not retried automatically.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuthError {
    /// Creates a new `MissingAuthContext` error.
    #[must_use]
    pub fn missing_auth_context(message: impl Into<String>) -> Self {
        Self::MissingAuthContext {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidState` error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates a new `TokenExchange` error.
    #[must_use]
    pub fn token_exchange(message: impl Into<String>) -> Self {
        Self::TokenExchange {
            message: message.into(),
        }
    }

    /// Creates a new `Refresh` error.
    #[must_use]
    pub fn refresh(message: impl Into<String>) -> Self {
        Self::Refresh {
            message: message.into(),
        }
    }

    /// Creates a new `ConsentNotFound` error.
    #[must_use]
    pub fn consent_not_found(
        clinic_id: impl Into<String>,
        internal_patient_ref: impl Into<String>,
    ) -> Self {
        Self::ConsentNotFound {
            clinic_id: clinic_id.into(),
            internal_patient_ref: internal_patient_ref.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` for errors raised by replay/CSRF/tamper defenses.
    #[must_use]
    pub fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::NonceMismatch | Self::TokenExchange { .. } | Self::Vault(VaultError::Integrity)
        )
    }

    /// Returns `true` if the caller should re-run the authorization flow to
    /// obtain a fresh consent.
    #[must_use]
    pub fn requires_reauthorization(&self) -> bool {
        matches!(
            self,
            Self::Refresh { .. } | Self::ConsentNotFound { .. } | Self::Vault(_)
        )
    }

    /// Returns `true` if retrying the same operation may succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::RefreshConflict)
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingAuthContext { .. } => ErrorCategory::Authentication,
            Self::InvalidState { .. } => ErrorCategory::Validation,
            Self::NonceMismatch => ErrorCategory::Security,
            Self::TokenExchange { .. } => ErrorCategory::Security,
            Self::Refresh { .. } => ErrorCategory::Consent,
            Self::RefreshConflict => ErrorCategory::Consent,
            Self::ConsentNotFound { .. } => ErrorCategory::Consent,
            Self::Vault(_) => ErrorCategory::Security,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Http(_) => ErrorCategory::Infrastructure,
        }
    }
}

/// Categories of consent-flow errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller identity problems.
    Authentication,
    /// Replay, CSRF, and secret-integrity defenses.
    Security,
    /// Consent lifecycle (rotation, revocation, missing records).
    Consent,
    /// Request validation.
    Validation,
    /// Storage and transport.
    Infrastructure,
    /// Configuration problems.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Security => write!(f, "security"),
            Self::Consent => write!(f, "consent"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::missing_auth_context("no clinic id in caller token");
        assert_eq!(
            err.to_string(),
            "Missing auth context: no clinic id in caller token"
        );

        let err = AuthError::NonceMismatch;
        assert_eq!(err.to_string(), "OAuth state nonce mismatch");

        let err = AuthError::consent_not_found("clinic-1", "pat-42");
        assert_eq!(
            err.to_string(),
            "No consent on record for clinic clinic-1, patient ref pat-42"
        );
    }

    #[test]
    fn test_security_predicates() {
        assert!(AuthError::NonceMismatch.is_security_error());
        assert!(AuthError::token_exchange("code reuse").is_security_error());
        assert!(AuthError::Vault(VaultError::Integrity).is_security_error());
        assert!(!AuthError::RefreshConflict.is_security_error());
    }

    #[test]
    fn test_reauthorization_predicate() {
        assert!(AuthError::refresh("provider rejected token").requires_reauthorization());
        assert!(AuthError::consent_not_found("c", "p").requires_reauthorization());
        assert!(
            AuthError::Vault(VaultError::format("missing delimiter")).requires_reauthorization()
        );
        assert!(!AuthError::NonceMismatch.requires_reauthorization());
    }

    #[test]
    fn test_retriable_predicate() {
        assert!(AuthError::RefreshConflict.is_retriable());
        assert!(!AuthError::refresh("rejected").is_retriable());
        assert!(!AuthError::NonceMismatch.is_retriable());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::missing_auth_context("x").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(AuthError::NonceMismatch.category(), ErrorCategory::Security);
        assert_eq!(
            AuthError::RefreshConflict.category(),
            ErrorCategory::Consent
        );
        assert_eq!(
            AuthError::storage("down").category(),
            ErrorCategory::Infrastructure
        );
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Security.to_string(), "security");
        assert_eq!(ErrorCategory::Consent.to_string(), "consent");
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}

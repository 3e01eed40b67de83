//! Claims-processing error types.

/// Errors that can occur while fetching or normalizing claims.
#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    /// A normalizer was handed a resource of the wrong kind.
    ///
    /// Raised only for a top-level resource-kind mismatch; deeper absence is
    /// tolerated via defaults. During a classification pass this degrades to
    /// dropping the single entry, never the batch.
    #[error("Invalid claim shape: expected {expected}, got {actual}")]
    InvalidClaimShape {
        /// The expected resource kind.
        expected: String,
        /// What actually arrived.
        actual: String,
    },

    /// The claims API answered with a non-success status.
    #[error("Claims API returned status {status}: {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// Categorical description, safe to surface.
        message: String,
    },

    /// An outbound HTTP call failed before the API answered
    /// (connect error, timeout, unreadable body). Not retried automatically.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The claims client configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl ClaimsError {
    /// Creates a new `InvalidClaimShape` error.
    #[must_use]
    pub fn invalid_claim_shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidClaimShape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `Api` error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
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

    /// Returns `true` for data-shape errors, which degrade to dropping a
    /// single entry rather than failing a batch.
    #[must_use]
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Self::InvalidClaimShape { .. })
    }

    /// Returns `true` for transport-level failures.
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }
}

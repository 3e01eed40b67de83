//! # claimlink-auth
//!
//! Consent brokering for the Claimlink claims gateway.
//!
//! A clinic obtains a patient's consent to read their claims data through an
//! OAuth 2.0 authorization-code flow with PKCE against the external claims
//! provider. The resulting refresh token is the durable artifact of that
//! consent: it is encrypted at rest, rotated on every use, and bound to the
//! `(clinic, patient)` pair that authorized it.
//!
//! ## Modules
//!
//! - [`config`] - provider endpoints, client credentials, vault key
//! - [`vault`] - authenticated encryption for refresh tokens at rest
//! - [`pkce`] - verifier/challenge pairs (RFC 7636, S256 only)
//! - [`state`] - the OAuth `state` parameter binding clinic identity and nonce
//! - [`session`] - ephemeral per-session authorization state, consumed once
//! - [`codes`] - single-use tracking for authorization codes
//! - [`storage`] - consent record persistence traits
//! - [`tokens`] - outbound token-endpoint client
//! - [`flow`] - the three-step consent flow: initiate, callback, rotate

pub mod codes;
pub mod config;
pub mod error;
pub mod flow;
pub mod pkce;
pub mod session;
pub mod state;
pub mod storage;
pub mod tokens;
pub mod vault;

pub use codes::{MemoryUsedCodeStore, UsedCodeStore};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use flow::{AccessGrant, AuthorizationRedirect, ConsentFlow, ConsentGrant};
pub use pkce::{CHALLENGE_METHOD, PkceChallenge, PkceError, PkcePair, PkceVerifier};
pub use session::{MemoryPendingStore, PendingAuthorization, PendingAuthorizationStore};
pub use state::StateParam;
pub use storage::{ConsentRecord, ConsentStorage, MemoryConsentStore};
pub use tokens::{CodeGrant, RefreshGrant, TokenEndpointClient};
pub use vault::{SecretVault, VaultError};

/// Type alias for consent-flow results.
pub type AuthResult<T> = Result<T, AuthError>;

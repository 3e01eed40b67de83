//! Ephemeral per-session authorization state.
//!
//! Between the initiation step and the provider callback, the flow holds
//! three session-scoped secrets: the nonce embedded in `state`, the PKCE
//! verifier (never sent to the browser), and the clinic's internal patient
//! reference being bound. The store hands this state out with take-semantics
//! so it can be consumed exactly once; a second callback for the same session
//! finds nothing and fails closed.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::AuthResult;
use crate::pkce::PkceVerifier;

/// Default pending-authorization expiry in seconds (10 minutes).
pub const DEFAULT_PENDING_EXPIRY_SECS: i64 = 600;

/// Session-scoped state created at authorization initiation and consumed at
/// the provider callback.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    /// The clinic that started the flow.
    pub clinic_id: String,

    /// One-time nonce; must match the nonce recovered from `state`.
    pub nonce: String,

    /// The PKCE verifier for the eventual code exchange.
    pub verifier: PkceVerifier,

    /// The clinic's internal reference for the patient being linked.
    /// Captured here at initiation and carried through to the consent
    /// record; never re-read from the callback request.
    pub internal_patient_ref: String,

    /// When the flow was initiated.
    pub created_at: OffsetDateTime,

    /// When this state stops being acceptable.
    pub expires_at: OffsetDateTime,
}

impl PendingAuthorization {
    /// Creates pending state with the default expiry.
    #[must_use]
    pub fn new(
        clinic_id: impl Into<String>,
        nonce: impl Into<String>,
        verifier: PkceVerifier,
        internal_patient_ref: impl Into<String>,
    ) -> Self {
        Self::with_expiry(
            clinic_id,
            nonce,
            verifier,
            internal_patient_ref,
            DEFAULT_PENDING_EXPIRY_SECS,
        )
    }

    /// Creates pending state with a custom expiry.
    #[must_use]
    pub fn with_expiry(
        clinic_id: impl Into<String>,
        nonce: impl Into<String>,
        verifier: PkceVerifier,
        internal_patient_ref: impl Into<String>,
        expiry_secs: i64,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            clinic_id: clinic_id.into(),
            nonce: nonce.into(),
            verifier,
            internal_patient_ref: internal_patient_ref.into(),
            created_at: now,
            expires_at: now + time::Duration::seconds(expiry_secs),
        }
    }

    /// Checks if the pending state has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }

    /// Constant-shape nonce comparison against the callback value.
    #[must_use]
    pub fn matches_nonce(&self, nonce: &str) -> bool {
        !self.nonce.is_empty() && self.nonce == nonce
    }
}

/// Storage for pending authorizations, keyed by an opaque session key.
///
/// `take` must remove the entry atomically with the read: the pending state
/// is consumable exactly once.
#[async_trait]
pub trait PendingAuthorizationStore: Send + Sync {
    /// Stores pending state for a session, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn put(&self, session_key: &str, pending: PendingAuthorization) -> AuthResult<()>;

    /// Removes and returns the pending state for a session, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn take(&self, session_key: &str) -> AuthResult<Option<PendingAuthorization>>;
}

/// In-memory pending-authorization store.
#[derive(Debug, Default)]
pub struct MemoryPendingStore {
    entries: Mutex<HashMap<String, PendingAuthorization>>,
}

impl MemoryPendingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingAuthorizationStore for MemoryPendingStore {
    async fn put(&self, session_key: &str, pending: PendingAuthorization) -> AuthResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(session_key.to_string(), pending);
        Ok(())
    }

    async fn take(&self, session_key: &str) -> AuthResult<Option<PendingAuthorization>> {
        let mut entries = self.entries.lock().await;
        Ok(entries.remove(session_key))
    }
}

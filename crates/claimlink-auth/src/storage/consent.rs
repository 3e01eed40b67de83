//! Consent record storage.
//!
//! A consent record is the durable binding that authorizes a clinic to read
//! one patient's claims data, anchored by an encrypted refresh token.
//!
//! # Keying
//!
//! Records are unique on `(clinic_id, internal_patient_ref)` - the clinic's
//! own patient reference, resolved at initiation time. The provider-issued
//! patient id is an attribute, refreshed on every upsert.
//!
//! # Security Considerations
//!
//! - `refresh_token_envelope` is always vault ciphertext; plaintext refresh
//!   tokens never enter this type and are never logged.
//! - `swap_refresh_token` must be atomic: rotation is a per-record critical
//!   section, and the compare-and-swap is what serializes concurrent rotors.
//! - Records are never deleted here; revocation is owned by a separate
//!   consent-revocation process.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;

/// The stored consent binding for one clinic/patient pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRecord {
    /// The clinic the patient granted access to.
    pub clinic_id: String,

    /// The clinic's internal reference for the patient. Half of the unique
    /// key.
    pub internal_patient_ref: String,

    /// The patient identifier issued by the external claims provider.
    pub patient_external_id: String,

    /// The vault envelope holding the current refresh token.
    pub refresh_token_envelope: String,

    /// When the consent was first stored.
    pub created_at: OffsetDateTime,

    /// When the record was last mutated (upsert or rotation).
    pub updated_at: OffsetDateTime,
}

impl ConsentRecord {
    /// Creates a new record with both timestamps set to now.
    #[must_use]
    pub fn new(
        clinic_id: impl Into<String>,
        internal_patient_ref: impl Into<String>,
        patient_external_id: impl Into<String>,
        refresh_token_envelope: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            clinic_id: clinic_id.into(),
            internal_patient_ref: internal_patient_ref.into(),
            patient_external_id: patient_external_id.into(),
            refresh_token_envelope: refresh_token_envelope.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Storage trait for consent records.
#[async_trait]
pub trait ConsentStorage: Send + Sync {
    /// Inserts or updates the record for its `(clinic_id,
    /// internal_patient_ref)` key.
    ///
    /// On update, `created_at` of the existing record is preserved and
    /// `updated_at` is refreshed. Returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn upsert(&self, record: ConsentRecord) -> AuthResult<ConsentRecord>;

    /// Looks up the record for a clinic/patient pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find(
        &self,
        clinic_id: &str,
        internal_patient_ref: &str,
    ) -> AuthResult<Option<ConsentRecord>>;

    /// Replaces the refresh-token envelope if and only if the stored
    /// envelope still equals `expected_envelope`.
    ///
    /// This is the rotation critical section: of two concurrent rotations
    /// reading the same envelope, exactly one swap succeeds; the other
    /// observes a changed envelope and fails.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ConsentNotFound`] if no record exists for the key.
    /// - [`AuthError::RefreshConflict`] if the stored envelope no longer
    ///   matches `expected_envelope`.
    async fn swap_refresh_token(
        &self,
        clinic_id: &str,
        internal_patient_ref: &str,
        expected_envelope: &str,
        new_envelope: &str,
    ) -> AuthResult<ConsentRecord>;
}

/// In-memory consent store.
#[derive(Debug, Default)]
pub struct MemoryConsentStore {
    records: RwLock<HashMap<(String, String), ConsentRecord>>,
}

impl MemoryConsentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsentStorage for MemoryConsentStore {
    async fn upsert(&self, mut record: ConsentRecord) -> AuthResult<ConsentRecord> {
        let key = (
            record.clinic_id.clone(),
            record.internal_patient_ref.clone(),
        );
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&key) {
            record.created_at = existing.created_at;
            record.updated_at = OffsetDateTime::now_utc();
        }
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn find(
        &self,
        clinic_id: &str,
        internal_patient_ref: &str,
    ) -> AuthResult<Option<ConsentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(clinic_id.to_string(), internal_patient_ref.to_string()))
            .cloned())
    }

    async fn swap_refresh_token(
        &self,
        clinic_id: &str,
        internal_patient_ref: &str,
        expected_envelope: &str,
        new_envelope: &str,
    ) -> AuthResult<ConsentRecord> {
        let key = (clinic_id.to_string(), internal_patient_ref.to_string());
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&key)
            .ok_or_else(|| AuthError::consent_not_found(clinic_id, internal_patient_ref))?;

        if record.refresh_token_envelope != expected_envelope {
            return Err(AuthError::RefreshConflict);
        }

        record.refresh_token_envelope = new_envelope.to_string();
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }
}

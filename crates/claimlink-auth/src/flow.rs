//! The three-step consent flow.
//!
//! # Overview
//!
//! 1. **Initiate** - an authenticated clinic asks to link a patient. The
//!    flow generates a nonce and PKCE pair, parks them (with the clinic's
//!    internal patient reference) in session-scoped state, and returns the
//!    authorization URL the patient is redirected to.
//! 2. **Callback** - the provider redirects back with `code` and `state`.
//!    The flow consumes the pending state, verifies the nonce binding,
//!    exchanges the code, encrypts the refresh token, and upserts the
//!    consent record.
//! 3. **Rotate** - every later claims request spends the stored refresh
//!    token for a fresh access token and persists the rotated replacement
//!    with a compare-and-swap, so concurrent rotors cannot both win.

use std::sync::Arc;

use url::Url;
use uuid::Uuid;

use crate::AuthResult;
use crate::codes::UsedCodeStore;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::pkce::{CHALLENGE_METHOD, PkcePair};
use crate::session::{PendingAuthorization, PendingAuthorizationStore};
use crate::state::StateParam;
use crate::storage::{ConsentRecord, ConsentStorage};
use crate::tokens::TokenEndpointClient;
use crate::vault::SecretVault;

/// Where to send the patient to grant consent.
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    /// The provider authorization URL, fully parameterized.
    pub authorization_url: Url,
    /// The `state` value embedded in that URL.
    pub state: String,
}

/// A consent established by a successful callback.
#[derive(Debug, Clone)]
pub struct ConsentGrant {
    /// The stored consent record.
    pub record: ConsentRecord,
    /// Access token from the exchange, good for immediate claims calls.
    pub access_token: String,
}

/// A fresh access token obtained by rotating a stored refresh token.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    /// The consent record after rotation.
    pub record: ConsentRecord,
    /// The new short-lived access token.
    pub access_token: String,
}

/// Orchestrates the consent flow against the external claims provider.
pub struct ConsentFlow {
    config: AuthConfig,
    vault: SecretVault,
    tokens: TokenEndpointClient,
    consents: Arc<dyn ConsentStorage>,
    pending: Arc<dyn PendingAuthorizationStore>,
    used_codes: Arc<dyn UsedCodeStore>,
}

impl ConsentFlow {
    /// Creates a flow from validated configuration and storage backends.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the configuration fails
    /// validation, and [`AuthError::Vault`] if the vault key is unusable.
    pub fn new(
        config: AuthConfig,
        consents: Arc<dyn ConsentStorage>,
        pending: Arc<dyn PendingAuthorizationStore>,
        used_codes: Arc<dyn UsedCodeStore>,
    ) -> AuthResult<Self> {
        config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;
        let vault = SecretVault::from_hex_key(&config.vault_key)?;
        let tokens = TokenEndpointClient::new(config.clone())?;
        Ok(Self {
            config,
            vault,
            tokens,
            consents,
            pending,
            used_codes,
        })
    }

    /// Starts an authorization flow for a clinic/patient pair.
    ///
    /// `clinic_id` is the authenticated caller identity; absence rejects
    /// the request before any flow state is created.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingAuthContext`] without a clinic identity,
    /// or a storage error if the pending state cannot be parked.
    pub async fn initiate(
        &self,
        session_key: &str,
        clinic_id: Option<&str>,
        internal_patient_ref: &str,
    ) -> AuthResult<AuthorizationRedirect> {
        let clinic_id = clinic_id.ok_or_else(|| {
            AuthError::missing_auth_context("no clinic identity on the request")
        })?;

        let nonce = Uuid::new_v4().to_string();
        let pkce = PkcePair::generate();
        let state = StateParam::new(clinic_id, &nonce).encode();

        self.pending
            .put(
                session_key,
                PendingAuthorization::new(clinic_id, &nonce, pkce.verifier, internal_patient_ref),
            )
            .await?;

        let mut authorization_url = self.config.authorization_endpoint.clone();
        {
            let mut params = authorization_url.query_pairs_mut();
            params.append_pair("client_id", &self.config.client_id);
            params.append_pair("redirect_uri", self.config.redirect_uri.as_str());
            params.append_pair("response_type", "code");
            params.append_pair("state", &state);
            params.append_pair("code_challenge", pkce.challenge.as_str());
            params.append_pair("code_challenge_method", CHALLENGE_METHOD);
        }

        tracing::info!(clinic_id, "initiated claims authorization flow");

        Ok(AuthorizationRedirect {
            authorization_url,
            state,
        })
    }

    /// Completes the flow from the provider callback.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidState`] if `state` cannot be parsed.
    /// - [`AuthError::NonceMismatch`] if no pending authorization exists for
    ///   the session, it expired, or the clinic/nonce binding does not hold.
    ///   Fails closed: nothing is persisted.
    /// - [`AuthError::TokenExchange`] if the code was already consumed or
    ///   the provider rejects the exchange.
    pub async fn handle_callback(
        &self,
        session_key: &str,
        code: &str,
        state: &str,
    ) -> AuthResult<ConsentGrant> {
        let state = StateParam::parse(state)?;

        let pending = self
            .pending
            .take(session_key)
            .await?
            .ok_or(AuthError::NonceMismatch)?;

        if pending.is_expired()
            || pending.clinic_id != state.clinic_id
            || !pending.matches_nonce(&state.nonce)
        {
            tracing::warn!(
                clinic_id = %state.clinic_id,
                "callback state did not match pending authorization"
            );
            return Err(AuthError::NonceMismatch);
        }

        if self.used_codes.is_used(code).await? {
            return Err(AuthError::token_exchange(
                "authorization code has already been used",
            ));
        }

        let grant = self.tokens.exchange_code(code, &pending.verifier).await?;

        // Marked only after a successful exchange; a failed exchange must not
        // burn the code for a legitimate retry of the redirect.
        if !self.used_codes.mark_used(code).await? {
            return Err(AuthError::token_exchange(
                "authorization code has already been used",
            ));
        }

        let envelope = self.vault.encrypt(&grant.refresh_token)?;
        let record = self
            .consents
            .upsert(ConsentRecord::new(
                &pending.clinic_id,
                &pending.internal_patient_ref,
                &grant.patient_id,
                envelope,
            ))
            .await?;

        tracing::info!(
            clinic_id = %record.clinic_id,
            internal_patient_ref = %record.internal_patient_ref,
            "stored claims consent"
        );

        Ok(ConsentGrant {
            record,
            access_token: grant.access_token,
        })
    }

    /// Spends the stored refresh token for a fresh access token, persisting
    /// the rotated replacement.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ConsentNotFound`] if no consent exists for the pair.
    /// - [`AuthError::Vault`] if the stored envelope is corrupt - fatal for
    ///   the record, the caller must re-initiate.
    /// - [`AuthError::Refresh`] if the provider rejects the token - same
    ///   remedy.
    /// - [`AuthError::RefreshConflict`] if a concurrent rotation won the
    ///   compare-and-swap - retriable.
    pub async fn rotate(
        &self,
        clinic_id: &str,
        internal_patient_ref: &str,
    ) -> AuthResult<AccessGrant> {
        let record = self
            .consents
            .find(clinic_id, internal_patient_ref)
            .await?
            .ok_or_else(|| AuthError::consent_not_found(clinic_id, internal_patient_ref))?;

        let current = self.vault.decrypt(&record.refresh_token_envelope)?;
        let grant = self.tokens.refresh(&current).await?;
        let new_envelope = self.vault.encrypt(&grant.refresh_token)?;

        let record = self
            .consents
            .swap_refresh_token(
                clinic_id,
                internal_patient_ref,
                &record.refresh_token_envelope,
                &new_envelope,
            )
            .await?;

        tracing::debug!(clinic_id, internal_patient_ref, "rotated refresh token");

        Ok(AccessGrant {
            record,
            access_token: grant.access_token,
        })
    }
}

impl std::fmt::Debug for ConsentFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentFlow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

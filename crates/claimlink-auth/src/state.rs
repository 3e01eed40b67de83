//! The OAuth `state` parameter.
//!
//! The state carried through the provider redirect binds two things: which
//! clinic started the flow, and the session nonce that proves the callback
//! belongs to that flow instance. It is encoded as a form-urlencoded pair
//! string (`clinicId=...&nonce=...`) so the callback can recover both without
//! any server-side lookup.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::AuthResult;
use crate::error::AuthError;

const CLINIC_ID_KEY: &str = "clinicId";
const NONCE_KEY: &str = "nonce";

/// The decoded contents of the `state` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateParam {
    /// The clinic that initiated the authorization flow.
    pub clinic_id: String,
    /// One-time nonce bound to the initiating session.
    pub nonce: String,
}

impl StateParam {
    /// Creates a new state parameter.
    #[must_use]
    pub fn new(clinic_id: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            clinic_id: clinic_id.into(),
            nonce: nonce.into(),
        }
    }

    /// Encodes the state for inclusion in the authorization URL.
    #[must_use]
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair(CLINIC_ID_KEY, &self.clinic_id)
            .append_pair(NONCE_KEY, &self.nonce)
            .finish()
    }

    /// Parses the `state` value received on the provider callback.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidState`] when either key is absent or empty.
    pub fn parse(raw: &str) -> AuthResult<Self> {
        let mut clinic_id = None;
        let mut nonce = None;
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                CLINIC_ID_KEY => clinic_id = Some(value.into_owned()),
                NONCE_KEY => nonce = Some(value.into_owned()),
                _ => {}
            }
        }

        let clinic_id = clinic_id
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::invalid_state("state is missing clinicId"))?;
        let nonce = nonce
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AuthError::invalid_state("state is missing nonce"))?;

        Ok(Self { clinic_id, nonce })
    }
}

//! PKCE (Proof Key for Code Exchange) pairs, RFC 7636 with S256 only.
//!
//! This side of the flow is the OAuth *client*: it generates the pair, sends
//! the challenge in the authorization request, keeps the verifier in
//! session-scoped state, and presents the verifier at code exchange. The
//! "plain" method is never offered.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};

/// The only challenge method this flow uses.
pub const CHALLENGE_METHOD: &str = "S256";

/// Errors that can occur during PKCE operations.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    /// Verifier length is outside the RFC 7636 range (43-128 characters).
    #[error("Invalid verifier length: must be 43-128 characters, got {0}")]
    InvalidVerifierLength(usize),

    /// Verifier contains characters outside `[A-Za-z0-9-._~]`.
    #[error("Invalid verifier characters: must be URL-safe ([A-Za-z0-9-._~])")]
    InvalidVerifierCharacters,

    /// The verifier does not match the challenge.
    #[error("PKCE verification failed: verifier does not match challenge")]
    VerificationFailed,
}

/// A freshly generated verifier/challenge pair.
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// The high-entropy secret held session-side, presented at exchange.
    pub verifier: PkceVerifier,
    /// The derived value sent in the authorization request.
    pub challenge: PkceChallenge,
}

impl PkcePair {
    /// Generates a pair from fresh randomness.
    #[must_use]
    pub fn generate() -> Self {
        let verifier = PkceVerifier::generate();
        let challenge = PkceChallenge::from_verifier(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// PKCE code verifier.
///
/// RFC 7636 §4.1: a high-entropy cryptographic random string over the
/// unreserved characters `[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`,
/// 43 to 128 characters long.
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Validates and wraps an existing verifier string.
    ///
    /// # Errors
    ///
    /// Returns an error if the length is outside 43-128 characters or the
    /// string contains characters outside the RFC 7636 set.
    pub fn new(verifier: String) -> Result<Self, PkceError> {
        let len = verifier.len();
        if !(43..=128).contains(&len) {
            return Err(PkceError::InvalidVerifierLength(len));
        }
        if !verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '~')
        {
            return Err(PkceError::InvalidVerifierCharacters);
        }
        Ok(Self(verifier))
    }

    /// Generates a cryptographically random verifier: 32 random bytes,
    /// base64url-encoded without padding (43 characters).
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        // `gen` is a reserved keyword in Rust 2024, so we use r#gen
        let bytes: [u8; 32] = rng.r#gen();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// The verifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PkceVerifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// PKCE code challenge: `BASE64URL(SHA256(ASCII(code_verifier)))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Derives the S256 challenge from a verifier.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(verifier.0.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }

    /// Verifies that a verifier hashes to this challenge.
    ///
    /// # Errors
    ///
    /// Returns [`PkceError::VerificationFailed`] on mismatch.
    pub fn verify(&self, verifier: &PkceVerifier) -> Result<(), PkceError> {
        if *self == Self::from_verifier(verifier) {
            Ok(())
        } else {
            Err(PkceError::VerificationFailed)
        }
    }

    /// The challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PkceChallenge {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_pair_is_consistent() {
        let pair = PkcePair::generate();
        assert!(pair.challenge.verify(&pair.verifier).is_ok());
    }

    #[test]
    fn test_generated_verifier_shape() {
        let verifier = PkceVerifier::generate();
        // 32 random bytes base64url-encoded without padding.
        assert_eq!(verifier.as_str().len(), 43);
        assert!(PkceVerifier::new(verifier.as_str().to_string()).is_ok());
    }

    #[test]
    fn test_generation_uniqueness() {
        let a = PkcePair::generate();
        let b = PkcePair::generate();
        assert_ne!(a.verifier.as_str(), b.verifier.as_str());
        assert_ne!(a.challenge.as_str(), b.challenge.as_str());
    }

    #[test]
    fn test_verifier_length_bounds() {
        assert!(matches!(
            PkceVerifier::new("a".repeat(42)),
            Err(PkceError::InvalidVerifierLength(42))
        ));
        assert!(PkceVerifier::new("a".repeat(43)).is_ok());
        assert!(PkceVerifier::new("a".repeat(128)).is_ok());
        assert!(matches!(
            PkceVerifier::new("a".repeat(129)),
            Err(PkceError::InvalidVerifierLength(129))
        ));
    }

    #[test]
    fn test_verifier_character_set() {
        let valid = "abcXYZ0123456789-._~".chars().cycle().take(64).collect::<String>();
        assert!(PkceVerifier::new(valid).is_ok());

        let invalid = format!("{}!@#", "a".repeat(43));
        assert!(matches!(
            PkceVerifier::new(invalid),
            Err(PkceError::InvalidVerifierCharacters)
        ));
    }

    #[test]
    fn test_challenge_mismatch() {
        let pair = PkcePair::generate();
        let other = PkceVerifier::generate();
        assert!(matches!(
            pair.challenge.verify(&other),
            Err(PkceError::VerificationFailed)
        ));
    }

    #[test]
    fn test_rfc7636_appendix_b_vector() {
        // https://tools.ietf.org/html/rfc7636#appendix-B
        let verifier =
            PkceVerifier::new("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string()).unwrap();
        let challenge = PkceChallenge::from_verifier(&verifier);
        assert_eq!(
            challenge.as_str(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }
}

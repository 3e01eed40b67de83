//! Authenticated encryption for secrets at rest.
//!
//! Refresh tokens are the only long-lived secret this system holds. They are
//! stored as AES-256-GCM envelopes with a fresh random 96-bit nonce per
//! encryption:
//!
//! ```text
//! <hex-nonce>:<hex-ciphertext>:<hex-tag>
//! ```
//!
//! The key is process-wide configuration, loaded once at startup and
//! read-only afterwards. Decryption fails with [`VaultError::Integrity`] when
//! the tag does not verify (tampered envelope or wrong key) and with
//! [`VaultError::Format`] when the envelope cannot be parsed into its three
//! parts.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;

/// Nonce size for AES-256-GCM (96 bits).
const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits).
pub const KEY_SIZE: usize = 32;

/// GCM authentication tag size (128 bits).
const TAG_SIZE: usize = 16;

/// Delimiter joining the envelope parts.
const PART_DELIMITER: char = ':';

/// Errors raised by the secret vault.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The configured key is not 32 bytes.
    #[error("Invalid vault key length: expected {KEY_SIZE} bytes, got {actual}")]
    KeyLength {
        /// Actual decoded key length.
        actual: usize,
    },

    /// The envelope could not be parsed into nonce, ciphertext, and tag.
    #[error("Malformed secret envelope: {message}")]
    Format {
        /// Which part of the envelope was malformed.
        message: String,
    },

    /// The authentication tag did not verify: the envelope was tampered
    /// with or encrypted under a different key.
    #[error("Secret envelope failed integrity verification")]
    Integrity,

    /// The cipher itself failed. Does not occur for well-formed inputs.
    #[error("Cipher operation failed")]
    Cipher,
}

impl VaultError {
    /// Creates a new `KeyLength` error.
    #[must_use]
    pub fn key_length(actual: usize) -> Self {
        Self::KeyLength { actual }
    }

    /// Creates a new `Format` error.
    #[must_use]
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }
}

/// AES-256-GCM vault for refresh tokens at rest.
pub struct SecretVault {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVault").finish_non_exhaustive()
    }
}

impl SecretVault {
    /// Creates a vault from a raw 256-bit key.
    #[must_use]
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Creates a vault from a hex-encoded 256-bit key.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Format`] if the key is not valid hex and
    /// [`VaultError::KeyLength`] if it does not decode to 32 bytes.
    pub fn from_hex_key(hex_key: &str) -> Result<Self, VaultError> {
        let bytes =
            hex::decode(hex_key).map_err(|_| VaultError::format("vault key is not valid hex"))?;
        let key: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| VaultError::key_length(b.len()))?;
        Ok(Self::new(&key))
    }

    /// Encrypts a plaintext secret into an envelope.
    ///
    /// A fresh random nonce is generated for every call, so encrypting the
    /// same plaintext twice yields different envelopes.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Cipher`] if the cipher rejects the input.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut combined = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Cipher)?;

        // aes-gcm appends the tag to the ciphertext; the envelope keeps them
        // as separate parts so tag verification failures stay diagnosable.
        let tag = combined.split_off(combined.len() - TAG_SIZE);

        Ok(format!(
            "{}{PART_DELIMITER}{}{PART_DELIMITER}{}",
            hex::encode(nonce_bytes),
            hex::encode(&combined),
            hex::encode(&tag),
        ))
    }

    /// Decrypts an envelope produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Format`] if the envelope does not split into
    /// three hex parts with a well-sized nonce and tag, and
    /// [`VaultError::Integrity`] if the authentication tag does not verify.
    pub fn decrypt(&self, envelope: &str) -> Result<String, VaultError> {
        let parts: Vec<&str> = envelope.split(PART_DELIMITER).collect();
        let [nonce_hex, ciphertext_hex, tag_hex] = parts.as_slice() else {
            return Err(VaultError::format(format!(
                "expected 3 parts, got {}",
                parts.len()
            )));
        };

        let nonce_bytes =
            hex::decode(nonce_hex).map_err(|_| VaultError::format("nonce is not valid hex"))?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(VaultError::format("nonce has wrong size"));
        }
        let mut combined = hex::decode(ciphertext_hex)
            .map_err(|_| VaultError::format("ciphertext is not valid hex"))?;
        let tag = hex::decode(tag_hex).map_err(|_| VaultError::format("tag is not valid hex"))?;
        if tag.len() != TAG_SIZE {
            return Err(VaultError::format("tag has wrong size"));
        }
        combined.extend_from_slice(&tag);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), combined.as_ref())
            .map_err(|_| VaultError::Integrity)?;

        String::from_utf8(plaintext)
            .map_err(|_| VaultError::format("decrypted secret is not UTF-8"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: [u8; KEY_SIZE] = [7u8; KEY_SIZE];

    fn vault() -> SecretVault {
        SecretVault::new(&TEST_KEY)
    }

    #[test]
    fn test_round_trip() {
        let v = vault();
        let envelope = v.encrypt("refresh-token-123").unwrap();
        assert_eq!(v.decrypt(&envelope).unwrap(), "refresh-token-123");
    }

    #[test]
    fn test_envelope_has_three_hex_parts() {
        let v = vault();
        let envelope = v.encrypt("secret").unwrap();
        let parts: Vec<&str> = envelope.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), NONCE_SIZE * 2);
        assert_eq!(parts[2].len(), TAG_SIZE * 2);
        assert!(parts.iter().all(|p| hex::decode(p).is_ok()));
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let v = vault();
        let a = v.encrypt("same plaintext").unwrap();
        let b = v.encrypt("same plaintext").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_ciphertext_fails_integrity() {
        let v = vault();
        let envelope = v.encrypt("secret").unwrap();
        let mut parts: Vec<String> = envelope.split(':').map(str::to_owned).collect();

        // Flip one byte of the ciphertext.
        let mut ct = hex::decode(&parts[1]).unwrap();
        ct[0] ^= 0x01;
        parts[1] = hex::encode(ct);

        let result = v.decrypt(&parts.join(":"));
        assert!(matches!(result, Err(VaultError::Integrity)));
    }

    #[test]
    fn test_tampered_tag_fails_integrity() {
        let v = vault();
        let envelope = v.encrypt("secret").unwrap();
        let mut parts: Vec<String> = envelope.split(':').map(str::to_owned).collect();

        let mut tag = hex::decode(&parts[2]).unwrap();
        tag[TAG_SIZE - 1] ^= 0x80;
        parts[2] = hex::encode(tag);

        let result = v.decrypt(&parts.join(":"));
        assert!(matches!(result, Err(VaultError::Integrity)));
    }

    #[test]
    fn test_wrong_key_fails_integrity() {
        let envelope = vault().encrypt("secret").unwrap();
        let other = SecretVault::new(&[8u8; KEY_SIZE]);
        assert!(matches!(other.decrypt(&envelope), Err(VaultError::Integrity)));
    }

    #[test]
    fn test_malformed_envelopes_fail_format() {
        let v = vault();
        for bad in [
            "not-an-envelope",
            "only:two",
            "zz:aabb:ccdd",
            "aabb:aabb:aabb:aabb",
            "",
        ] {
            assert!(
                matches!(v.decrypt(bad), Err(VaultError::Format { .. })),
                "expected Format error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_from_hex_key() {
        let hex_key = hex::encode(TEST_KEY);
        let v = SecretVault::from_hex_key(&hex_key).unwrap();
        let envelope = v.encrypt("secret").unwrap();
        assert_eq!(vault().decrypt(&envelope).unwrap(), "secret");
    }

    #[test]
    fn test_from_hex_key_rejects_bad_keys() {
        assert!(matches!(
            SecretVault::from_hex_key("zz"),
            Err(VaultError::Format { .. })
        ));
        assert!(matches!(
            SecretVault::from_hex_key(&hex::encode([1u8; 16])),
            Err(VaultError::KeyLength { actual: 16 })
        ));
    }
}

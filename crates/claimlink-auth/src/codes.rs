//! Single-use tracking for authorization codes.
//!
//! An authorization code may be exchanged for tokens at most once. The
//! registry records consumed codes so a replayed callback is rejected at the
//! exchange step.
//!
//! # Implementation Notes
//!
//! `mark_used` must atomically check and record the code: two concurrent
//! callbacks presenting the same code must not both observe "first use".
//! The in-memory store satisfies this within one process only; a
//! horizontally scaled deployment needs a shared store with a conditional
//! insert behind this same trait.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::AuthResult;
use crate::error::AuthError;

/// Registry of consumed authorization codes.
#[async_trait]
pub trait UsedCodeStore: Send + Sync {
    /// Atomically marks a code as used if not already used.
    ///
    /// Returns `true` if the code was recorded now (first use), `false` if
    /// it had already been consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn mark_used(&self, code: &str) -> AuthResult<bool>;

    /// Checks whether a code has already been consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn is_used(&self, code: &str) -> AuthResult<bool>;
}

/// In-memory used-code registry. Process-local: valid for a single-instance
/// deployment only.
#[derive(Debug, Default)]
pub struct MemoryUsedCodeStore {
    used: RwLock<HashSet<String>>,
}

impl MemoryUsedCodeStore {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsedCodeStore for MemoryUsedCodeStore {
    async fn mark_used(&self, code: &str) -> AuthResult<bool> {
        let mut used = self
            .used
            .write()
            .map_err(|_| AuthError::storage("used-code registry lock poisoned"))?;
        Ok(used.insert(code.to_string()))
    }

    async fn is_used(&self, code: &str) -> AuthResult<bool> {
        let used = self
            .used
            .read()
            .map_err(|_| AuthError::storage("used-code registry lock poisoned"))?;
        Ok(used.contains(code))
    }
}

//! Storage traits for consent data.
//!
//! In-memory reference implementations live alongside the traits; durable
//! backends (postgres, …) are expected to live in separate crates.

pub mod consent;

pub use consent::{ConsentRecord, ConsentStorage, MemoryConsentStore};

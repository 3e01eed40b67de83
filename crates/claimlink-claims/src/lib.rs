//! # claimlink-claims
//!
//! Claims retrieval and normalization for the Claimlink gateway.
//!
//! The external claims API returns ExplanationOfBenefit searchset bundles:
//! deeply nested, semi-structured resources with inconsistent optionality.
//! This crate fetches those bundles (one concurrent request per requested
//! claim type), partitions the entries by claim category, and flattens each
//! category into a UI-stable record - without ever throwing on missing
//! fields and without silently losing entries.
//!
//! ## Modules
//!
//! - [`types`] - claim categories and the recognized coding system
//! - [`client`] - the outbound claims API client (fan-out fetch)
//! - [`classify`] - bundle partitioning into claim categories
//! - [`normalize`] - the four category normalizers
//! - [`patient`] - demographic summary flattening

#![recursion_limit = "256"]

pub mod classify;
pub mod client;
pub mod error;
pub mod normalize;
pub mod patient;
pub mod types;

pub use classify::{CategorizedClaims, classify};
pub use client::{ClaimsClient, ClaimsClientConfig};
pub use error::ClaimsError;
pub use normalize::{CarrierClaim, InpatientClaim, OutpatientClaim, PdeClaim};
pub use patient::PatientSummary;
pub use types::{ClaimType, EOB_TYPE_SYSTEM};

/// Type alias for claims-processing results.
pub type ClaimsResult<T> = Result<T, ClaimsError>;

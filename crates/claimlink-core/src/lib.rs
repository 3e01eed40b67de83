//! # claimlink-core
//!
//! Shared value plumbing for the Claimlink workspace.
//!
//! The external claims API speaks deeply nested, semi-structured FHIR JSON
//! with inconsistent optionality. This crate provides the two pieces every
//! other crate leans on when handling that data:
//!
//! - [`path`] - tolerant dotted-path traversal over [`serde_json::Value`]
//! - [`bundle`] - searchset [`Bundle`]/[`BundleEntry`] types and merging

pub mod bundle;
pub mod path;

pub use bundle::{Bundle, BundleEntry};
pub use path::{array_at, bool_at, f64_at, str_at, string_at, u64_at, value_at};

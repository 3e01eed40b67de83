//! The four claim-category normalizers.
//!
//! Each normalizer is a pure function from a raw ExplanationOfBenefit
//! resource to a flattened, UI-stable record. They share one contract:
//!
//! - the only hard failure is a top-level resource-kind mismatch
//!   ([`crate::ClaimsError::InvalidClaimShape`]);
//! - every deeper absence becomes an absent field or a zero amount;
//! - diagnoses and care-team members are declared once at claim level and
//!   resolved into line items by sequence number, with unresolvable
//!   references dropped silently.

pub mod carrier;
pub mod common;
pub mod inpatient;
pub mod outpatient;
pub mod pde;

pub use carrier::CarrierClaim;
pub use common::{
    AdjudicationEntry, AdjudicationKind, BenefitBalance, BenefitFinancial, CareTeamMember, Coding,
    Diagnosis, FinancialSummary, Financials, Modifier, Payment, Period, Procedure,
    ProviderIdentity, ResourceMeta, SupportingInfo, TotalAmount,
};
pub use inpatient::InpatientClaim;
pub use outpatient::OutpatientClaim;
pub use pde::PdeClaim;

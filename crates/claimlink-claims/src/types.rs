//! Claim categories and the coding system that identifies them.

use std::fmt;

use crate::ClaimsResult;
use crate::error::ClaimsError;

/// The coding system the claims provider uses to tag EOB resources with
/// their claim category.
pub const EOB_TYPE_SYSTEM: &str = "https://bluebutton.cms.gov/resources/codesystem/eob-type";

/// The four claim categories this system normalizes.
///
/// Entries coded outside this set (or not coded at all) are passed through
/// unmodified in the `OTHER` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimType {
    /// Professional/carrier claims (Part B).
    Carrier,
    /// Inpatient institutional claims (Part A).
    Inpatient,
    /// Outpatient institutional claims.
    Outpatient,
    /// Prescription drug events (Part D).
    Pde,
}

impl ClaimType {
    /// All categories, in classification order.
    pub const ALL: [ClaimType; 4] = [
        ClaimType::Carrier,
        ClaimType::Inpatient,
        ClaimType::Outpatient,
        ClaimType::Pde,
    ];

    /// Parses a category from its wire code.
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError::InvalidClaimShape` for codes outside the
    /// recognized set.
    pub fn parse(code: &str) -> ClaimsResult<Self> {
        match code {
            "CARRIER" => Ok(Self::Carrier),
            "INPATIENT" => Ok(Self::Inpatient),
            "OUTPATIENT" => Ok(Self::Outpatient),
            "PDE" => Ok(Self::Pde),
            other => Err(ClaimsError::invalid_claim_shape(
                "a recognized claim category code",
                other,
            )),
        }
    }

    /// The wire code for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Carrier => "CARRIER",
            Self::Inpatient => "INPATIENT",
            Self::Outpatient => "OUTPATIENT",
            Self::Pde => "PDE",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

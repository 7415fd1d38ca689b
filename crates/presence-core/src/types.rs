//! Shared types used across the Presence workspace.
//!
//! This module defines common newtypes and records that provide type safety
//! and clear domain modeling around French organization identifiers.

use crate::error::PresenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Newtype for SIRET identifiers with validation.
///
/// A SIRET is the 14-digit identifier of one establishment of a French
/// public-sector organization. Its first 9 digits are the SIREN of the
/// parent legal entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Siret(String);

impl Siret {
    /// Create a new `Siret` from a string.
    ///
    /// # Errors
    /// Returns error if the value is not exactly 14 ASCII digits.
    pub fn new(id: impl Into<String>) -> Result<Self, PresenceError> {
        let id = id.into();
        if id.len() == 14 && id.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(id))
        } else {
            Err(PresenceError::Validation(format!(
                "invalid SIRET: must be 14 digits, got '{id}'"
            )))
        }
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the SIREN (first 9 digits) of the parent legal entity.
    #[must_use]
    pub fn siren(&self) -> &str {
        &self.0[..9]
    }
}

impl fmt::Display for Siret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two kinds of asynchronous checks performed per organization.
///
/// Each kind owns one row in the result store; the stored value is the
/// lowercase name (`"dns"` / `"website"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    /// DNS hygiene of the declared email domain (MX, SPF, DMARC)
    Dns,
    /// Reachability and redirect behavior of the declared website
    Website,
}

impl CheckType {
    /// All check types, in storage order.
    pub const ALL: [Self; 2] = [Self::Dns, Self::Website];

    /// Get the storage name of the check type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::Website => "website",
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CheckType {
    type Err = PresenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dns" => Ok(Self::Dns),
            "website" => Ok(Self::Website),
            other => Err(PresenceError::Validation(format!(
                "unknown check type '{other}'"
            ))),
        }
    }
}

/// Read-only view of an organization record.
///
/// Organizations (communes, EPCIs, departments, regions) are produced and
/// mutated entirely by the external ETL pipeline; this core only reads the
/// declared identity used for conformance evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Establishment identifier, primary key of the organizations table
    pub siret: Siret,
    /// Human-readable name (used for logging only)
    pub name: String,
    /// Email declared on Service-Public.fr, if any
    pub email_official: Option<String>,
    /// Website declared on Service-Public.fr, if any
    pub website_url: Option<String>,
}

impl Organization {
    /// Declared email, or the empty string when none is declared.
    #[must_use]
    pub fn email_official(&self) -> &str {
        self.email_official.as_deref().unwrap_or("")
    }

    /// Declared website, or the empty string when none is declared.
    #[must_use]
    pub fn website_url(&self) -> &str {
        self.website_url.as_deref().unwrap_or("")
    }
}

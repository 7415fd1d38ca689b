//! Presence Core - Foundation crate for the Presence conformance checker.
//!
//! This crate provides the shared types, the conformance rule engine and the
//! RCPNT criteria evaluation that all other Presence crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`Siret`, `CheckType`, `Organization`)
//! - [`issues`] - The closed [`Issue`] taxonomy and the [`IssueSet`] collection
//! - [`conformance`] - Declarative validation of declared email/website
//! - [`rcpnt`] - Per-criterion regulatory conformance aggregation
//!
//! # Example
//!
//! ```rust
//! use presence_core::conformance::{data_checks_doable, validate_conformance};
//! use presence_core::rcpnt::rcpnt_conformance;
//!
//! let issues = validate_conformance("mairie@maville.fr", "https://www.maville.fr", false);
//! assert!(issues.is_empty());
//!
//! // Both live checks are worth running for this organization.
//! assert_eq!(data_checks_doable(&issues).len(), 2);
//!
//! // With no issue, every RCPNT criterion is satisfied.
//! assert!(rcpnt_conformance(&issues).contains("aa"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod conformance;
pub mod error;
pub mod issues;
pub mod rcpnt;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, DatabaseConfig, DnsConfig, HttpConfig, WorkerConfig};
pub use conformance::{data_checks_doable, validate_conformance};
pub use error::{ConfigError, ConfigResult, PresenceError, Result};
pub use issues::{Issue, IssueSet};
pub use rcpnt::{rcpnt_conformance, RcpntTable};
pub use types::{CheckType, Organization, Siret};

//! Presence Website Probe
//!
//! Checks the web side of an organization's online presence: is the declared
//! site up, is HTTPS served and enforced, does the bare domain work, does a
//! redirect leave the declared domain, and is an accessibility statement
//! linked.
//!
//! The `http://` variant is deliberately fetched without certificate
//! verification so that SSL problems classify as `WEBSITE_SSL` instead of a
//! generic failure. Verdict logic is pure over fetch outcomes and tested
//! without network access.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod content;
pub mod error;
pub mod probe;
pub mod variants;

pub use content::find_accessibility_link;
pub use error::{Result, WebError};
pub use probe::{FetchFailure, FetchedPage, WebProbe};
pub use variants::UrlVariants;

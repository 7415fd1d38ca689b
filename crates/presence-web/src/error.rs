//! Website probe error types.

use thiserror::Error;

/// Probe setup errors. Request-level failures are not errors: they classify
/// into issues.
#[derive(Debug, Error)]
pub enum WebError {
    /// The HTTP client could not be constructed.
    #[error("{0}")]
    ClientBuild(String),
}

/// Result type alias for website probe operations.
pub type Result<T> = std::result::Result<T, WebError>;

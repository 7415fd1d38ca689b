//! HTTP client construction.
//!
//! The probe needs three client flavors: certificate-verifying,
//! non-verifying (so SSL problems can be diagnosed separately from
//! availability), and non-redirect-following (to observe a handshake that a
//! redirect would otherwise mask).

use crate::error::{Result, WebError};
use presence_core::HttpConfig;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;

fn base_builder(config: &HttpConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
}

/// Client that verifies certificates and follows redirects.
pub fn build_verified(config: &HttpConfig) -> Result<Client> {
    base_builder(config)
        .build()
        .map_err(|e| WebError::ClientBuild(format!("failed to create HTTP client: {e}")))
}

/// Client that accepts invalid certificates and follows redirects.
///
/// Used where availability and SSL health are assessed independently.
pub fn build_unverified(config: &HttpConfig) -> Result<Client> {
    base_builder(config)
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| WebError::ClientBuild(format!("failed to create HTTP client: {e}")))
}

/// Verifying client that does not follow redirects.
pub fn build_no_redirect(config: &HttpConfig) -> Result<Client> {
    base_builder(config)
        .redirect(Policy::none())
        .build()
        .map_err(|e| WebError::ClientBuild(format!("failed to create HTTP client: {e}")))
}

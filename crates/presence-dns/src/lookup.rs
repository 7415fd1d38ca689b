//! DNS lookups behind a mockable trait.
//!
//! The probe logic only needs three queries (MX, TXT, host addresses), so it
//! talks to [`MailDns`] instead of the resolver directly. Tests provide a
//! scripted implementation; production uses [`HickoryMailDns`].

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// A lookup failure. Distinguishing timeouts matters only for logging; both
/// variants classify as a DNS-down state.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The query did not complete within the configured deadline.
    #[error("DNS query timed out")]
    Timeout,

    /// The query failed (NXDOMAIN, SERVFAIL, network error, ...).
    #[error("DNS query failed: {0}")]
    Failed(String),
}

/// One MX record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    /// Lower is preferred.
    pub preference: u16,
    /// Exchange hostname, without trailing dot.
    pub exchange: String,
}

/// The DNS queries the mail probe needs.
#[async_trait]
pub trait MailDns: Send + Sync {
    /// MX records of `domain`. An empty vec means the name exists but
    /// carries no MX records.
    async fn mx(&self, domain: &str) -> Result<Vec<MxRecord>, LookupError>;

    /// TXT records of `name`, with multi-string chunks joined per record.
    /// An empty vec means no TXT records.
    async fn txt(&self, name: &str) -> Result<Vec<String>, LookupError>;

    /// A/AAAA addresses of `host`.
    async fn host_addrs(&self, host: &str) -> Result<Vec<IpAddr>, LookupError>;
}

/// Production [`MailDns`] backed by `hickory-resolver` with per-query
/// deadlines.
pub struct HickoryMailDns {
    resolver: TokioAsyncResolver,
    query_timeout: Duration,
}

impl HickoryMailDns {
    /// Build a resolver using the system configuration defaults.
    #[must_use]
    pub fn new(query_timeout: Duration) -> Self {
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        Self {
            resolver,
            query_timeout,
        }
    }

    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, LookupError>
    where
        F: std::future::Future<Output = Result<T, ResolveError>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(classify),
            Err(_) => Err(LookupError::Timeout),
        }
    }
}

/// Map resolver errors, letting "name exists but has no such records" pass
/// through as an empty answer rather than a failure.
fn classify(err: ResolveError) -> LookupError {
    match err.kind() {
        ResolveErrorKind::Timeout => LookupError::Timeout,
        _ => LookupError::Failed(err.to_string()),
    }
}

fn empty_answer(err: &ResolveError) -> bool {
    matches!(
        err.kind(),
        ResolveErrorKind::NoRecordsFound {
            response_code: ResponseCode::NoError,
            ..
        }
    )
}

#[async_trait]
impl MailDns for HickoryMailDns {
    async fn mx(&self, domain: &str) -> Result<Vec<MxRecord>, LookupError> {
        let lookup = tokio::time::timeout(self.query_timeout, self.resolver.mx_lookup(domain))
            .await
            .map_err(|_| LookupError::Timeout)?;

        match lookup {
            Ok(answer) => Ok(answer
                .iter()
                .map(|mx| MxRecord {
                    preference: mx.preference(),
                    exchange: mx.exchange().to_utf8().trim_end_matches('.').to_string(),
                })
                .collect()),
            Err(err) if empty_answer(&err) => Ok(Vec::new()),
            Err(err) => Err(classify(err)),
        }
    }

    async fn txt(&self, name: &str) -> Result<Vec<String>, LookupError> {
        let lookup = tokio::time::timeout(self.query_timeout, self.resolver.txt_lookup(name))
            .await
            .map_err(|_| LookupError::Timeout)?;

        match lookup {
            Ok(answer) => Ok(answer
                .iter()
                .map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                        .collect::<String>()
                })
                .collect()),
            Err(err) if empty_answer(&err) => Ok(Vec::new()),
            Err(err) => Err(classify(err)),
        }
    }

    async fn host_addrs(&self, host: &str) -> Result<Vec<IpAddr>, LookupError> {
        let lookup = self
            .with_deadline(self.resolver.lookup_ip(host))
            .await?;
        Ok(lookup.iter().collect())
    }
}

//! Presence DNS Probe
//!
//! Checks the mail side of an organization's online presence: MX presence,
//! SPF publication, DMARC policy strength, and the location of the mail
//! exchangers (EU-hosted or not) via an offline MaxMind database.
//!
//! Lookups go through the [`lookup::MailDns`] trait so probe logic is
//! testable without network access. Geolocation results are cached per
//! exchange hostname; a handful of mail providers serve most organizations.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod geoip;
pub mod lookup;
pub mod probe;

pub use cache::TtlCache;
pub use geoip::{GeoIpDb, GeoIpError, GeoLookup};
pub use lookup::{HickoryMailDns, LookupError, MailDns, MxRecord};
pub use probe::{parse_dmarc, DmarcEvaluation, DnsProbe};

use presence_core::DnsConfig;
use std::sync::Arc;
use std::time::Duration;

/// Build a production probe from configuration.
///
/// A missing or unreadable GeoIP database disables the location check
/// instead of failing the probe; everything else still runs.
#[must_use]
pub fn probe_from_config(config: &DnsConfig) -> DnsProbe {
    let dns = Arc::new(HickoryMailDns::new(Duration::from_secs(
        config.query_timeout_secs,
    )));

    let geoip = config.geoip_db_path.as_ref().and_then(|path| {
        match GeoIpDb::open(path) {
            Ok(db) => Some(Arc::new(db) as Arc<dyn GeoLookup>),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "GeoIP database unavailable, skipping MX location checks"
                );
                None
            }
        }
    });

    DnsProbe::new(
        dns,
        geoip,
        config.cache_capacity,
        Duration::from_secs(config.cache_ttl_secs),
    )
}

//! Offline IP→country lookups via a MaxMind database.

use maxminddb::geoip2;
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;

/// Failure to open the country database.
#[derive(Debug, Error)]
pub enum GeoIpError {
    /// The database file could not be read or parsed.
    #[error("failed to open GeoIP database: {0}")]
    Open(#[from] maxminddb::MaxMindDBError),
}

/// IP→country source. Implemented by [`GeoIpDb`]; tests substitute a fixed
/// mapping.
pub trait GeoLookup: Send + Sync {
    /// ISO 3166-1 alpha-2 country code of `ip`, if known.
    fn country_code(&self, ip: IpAddr) -> Option<String>;
}

/// An open MaxMind country database.
pub struct GeoIpDb {
    reader: maxminddb::Reader<Vec<u8>>,
}

impl std::fmt::Debug for GeoIpDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoIpDb").finish_non_exhaustive()
    }
}

impl GeoIpDb {
    /// Open the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GeoIpError> {
        let reader = maxminddb::Reader::open_readfile(path)?;
        Ok(Self { reader })
    }

}

impl GeoLookup for GeoIpDb {
    fn country_code(&self, ip: IpAddr) -> Option<String> {
        let country: geoip2::Country = self.reader.lookup(ip).ok()?;
        country
            .country
            .and_then(|c| c.iso_code)
            .map(ToString::to_string)
    }
}

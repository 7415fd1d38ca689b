//! Mail-domain probing: MX presence, SPF, DMARC policy strength and
//! mail-exchanger location.

use crate::cache::TtlCache;
use crate::geoip::GeoLookup;
use crate::lookup::{MailDns, MxRecord};
use presence_core::{Issue, IssueSet};
use regex::Regex;
use serde_json::{json, Value as JsonValue};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

/// EU member states (ISO 3166-1 alpha-2). Mail hosted outside this set
/// raises `DNS_MX_OUTSIDE_EU`.
const EU_COUNTRIES: &[&str] = &[
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT",
    "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
];

fn dmarc_policy_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Tag boundary required so `sp=` never matches as `p=`.
    RE.get_or_init(|| Regex::new(r"(?i)(?:^|[;\s])p\s*=\s*(\w+)").expect("valid regex"))
}

fn dmarc_pct_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:^|[;\s])pct\s*=\s*(\d+)").expect("valid regex"))
}

/// Outcome of the DMARC evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DmarcEvaluation {
    /// No `v=DMARC1` record, or the lookup failed.
    Missing,
    /// A record exists but its policy does not enforce anything.
    Weak {
        /// Parsed `p=` value, lowercased.
        policy: String,
        /// Parsed `pct=` value.
        pct: u32,
    },
    /// `p=reject`, or `p=quarantine` applied to all mail.
    Strong,
}

/// Parse `p=` and `pct=` out of a DMARC record, applying the RFC 7489 §6.3
/// defaults (`p=none`, `pct=100`).
#[must_use]
pub fn parse_dmarc(record: &str) -> (String, u32) {
    let policy = dmarc_policy_regex()
        .captures(record)
        .and_then(|c| c.get(1))
        .map_or_else(|| "none".to_string(), |m| m.as_str().to_lowercase());
    let pct = dmarc_pct_regex()
        .captures(record)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(100);
    (policy, pct)
}

#[derive(Debug, Clone)]
struct GeoResult {
    ips: Vec<String>,
    countries: Vec<String>,
}

/// The DNS check: resolves a mail domain's records and derives issues.
pub struct DnsProbe {
    dns: Arc<dyn MailDns>,
    geoip: Option<Arc<dyn GeoLookup>>,
    geo_cache: Mutex<TtlCache<String, Option<GeoResult>>>,
}

impl DnsProbe {
    /// Build a probe over the given lookup and geolocation backends.
    #[must_use]
    pub fn new(
        dns: Arc<dyn MailDns>,
        geoip: Option<Arc<dyn GeoLookup>>,
        cache_capacity: usize,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            dns,
            geoip,
            geo_cache: Mutex::new(TtlCache::new(cache_capacity, cache_ttl)),
        }
    }

    /// Run the full DNS check on an email domain.
    ///
    /// Returns `None` for an empty domain (nothing to check, nothing to
    /// persist). A failed MX resolution returns only `DNS_DOWN`: a domain
    /// whose DNS is unreachable gets no SPF/DMARC verdict.
    pub async fn check_dns(&self, domain: &str) -> Option<(IssueSet, JsonValue)> {
        if domain.is_empty() {
            return None;
        }

        let mut issues = IssueSet::new();

        let mx_records = match self.dns.mx(domain).await {
            Ok(records) => records,
            Err(err) => {
                tracing::debug!(domain, error = %err, "MX resolution failed");
                issues.insert(Issue::DnsDown, format!("DNS resolution failed: {err}"));
                return Some((issues, json!({})));
            }
        };

        let mut metadata = serde_json::Map::new();

        let mut exchanges: Vec<MxRecord> = mx_records
            .into_iter()
            .filter(|mx| !mx.exchange.is_empty())
            .collect();
        exchanges.sort_by_key(|mx| mx.preference);

        if exchanges.is_empty() {
            issues.insert(
                Issue::DnsMxMissing,
                format!("No MX records found for {domain}"),
            );
        } else if self.geoip.is_some() {
            // First exchange with resolvable geodata decides the verdict.
            for mx in &exchanges {
                let Some(geo) = self.geolocate(&mx.exchange).await else {
                    continue;
                };

                let outside_eu: Vec<String> = geo
                    .countries
                    .iter()
                    .filter(|c| !EU_COUNTRIES.contains(&c.as_str()))
                    .cloned()
                    .collect();

                metadata.insert("mx_countries".to_string(), json!(geo.countries));
                metadata.insert("mx_countries_outside_eu".to_string(), json!(outside_eu));
                metadata.insert("mx_ips".to_string(), json!(geo.ips));
                metadata.insert("mx_tld".to_string(), json!(psl::domain_str(&mx.exchange)));

                if !outside_eu.is_empty() {
                    issues.insert(
                        Issue::DnsMxOutsideEu,
                        format!("MX servers located outside the EU: {}", outside_eu.join(", ")),
                    );
                }
                break;
            }
        }

        if self.check_spf(domain).await.is_none() {
            issues.insert(Issue::DnsSpfMissing, "No SPF record found");
        }

        match self.check_dmarc(domain).await {
            DmarcEvaluation::Missing => {
                issues.insert(Issue::DnsDmarcMissing, "No DMARC record found");
            }
            DmarcEvaluation::Weak { policy, pct } => {
                issues.insert(
                    Issue::DnsDmarcWeak,
                    format!("Weak DMARC policy: p={policy}, pct={pct}"),
                );
            }
            DmarcEvaluation::Strong => {}
        }

        Some((issues, JsonValue::Object(metadata)))
    }

    /// First `v=spf1` TXT record of `domain`, if any. Lookup failures count
    /// as missing.
    pub async fn check_spf(&self, domain: &str) -> Option<String> {
        let records = self.dns.txt(domain).await.ok()?;
        records
            .into_iter()
            .map(|r| r.trim().to_string())
            .find(|r| r.starts_with("v=spf1"))
    }

    /// Evaluate the DMARC policy published under `_dmarc.<domain>`.
    pub async fn check_dmarc(&self, domain: &str) -> DmarcEvaluation {
        let name = format!("_dmarc.{domain}");
        let Ok(records) = self.dns.txt(&name).await else {
            return DmarcEvaluation::Missing;
        };

        let Some(record) = records
            .into_iter()
            .map(|r| r.trim().to_string())
            .find(|r| r.starts_with("v=DMARC1"))
        else {
            return DmarcEvaluation::Missing;
        };

        let (policy, pct) = parse_dmarc(&record);
        let strong = policy == "reject" || (policy == "quarantine" && pct >= 100);
        if strong {
            DmarcEvaluation::Strong
        } else {
            DmarcEvaluation::Weak { policy, pct }
        }
    }

    async fn geolocate(&self, exchange: &str) -> Option<GeoResult> {
        if let Ok(mut cache) = self.geo_cache.lock() {
            if let Some(cached) = cache.get(&exchange.to_string()) {
                return cached;
            }
        }

        let result = self.geolocate_uncached(exchange).await;

        if let Ok(mut cache) = self.geo_cache.lock() {
            cache.insert(exchange.to_string(), result.clone());
        }
        result
    }

    async fn geolocate_uncached(&self, exchange: &str) -> Option<GeoResult> {
        let geoip = self.geoip.as_ref()?;

        let addrs = match self.dns.host_addrs(exchange).await {
            Ok(addrs) => addrs,
            Err(err) => {
                tracing::debug!(exchange, error = %err, "MX host resolution failed");
                return None;
            }
        };

        let mut ips = Vec::new();
        let mut countries = Vec::new();
        for addr in addrs {
            ips.push(addr.to_string());
            if let Some(country) = geoip.country_code(addr) {
                if !countries.contains(&country) {
                    countries.push(country);
                }
            }
        }

        if countries.is_empty() {
            None
        } else {
            Some(GeoResult { ips, countries })
        }
    }
}

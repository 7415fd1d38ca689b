//! The closed issue taxonomy and the issue collection type.
//!
//! Issues are produced by three independent sources: declarative validation
//! of the declared email/website, the DNS probe and the website probe. Each
//! tag belongs to exactly one source; sets from different sources are merged
//! by union on the tag, last write wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A conformance issue detected for an organization.
///
/// The set is closed: a tag either comes from declarative validation of the
/// DILA-declared data, from the DNS probe, or from the website probe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Issue {
    /// No known email
    EmailMissing,
    /// Declared email has bad syntax
    EmailMalformed,
    /// No known website
    WebsiteMissing,
    /// Declared website has bad syntax
    WebsiteMalformed,
    /// Website declared with an http:// scheme
    WebsiteDeclaredHttp,
    /// Email domain does not match the website domain
    EmailDomainMismatch,
    /// Email domain belongs to a generic/ISP mail provider
    EmailDomainGeneric,
    /// Website domain extension outside the FR/EU allow list
    WebsiteDomainExtension,
    /// Email domain extension outside the FR/EU allow list
    EmailDomainExtension,

    /// Asynchronous checks have not all reported yet
    InProgress,

    /// Website timeout, unreachable, non-200 status
    WebsiteDown,
    /// SSL certificate or handshake problem
    WebsiteSsl,
    /// Website redirects to a different domain
    WebsiteDomainRedirect,
    /// Website does not redirect HTTP to HTTPS
    WebsiteHttpRedirect,
    /// HTTPS URL without "www" does not work or redirect
    WebsiteHttpsNowww,
    /// HTTP URL without "www" does not work or redirect
    WebsiteHttpNowww,
    /// No accessibility declaration link found on the home page
    WebsiteA11yMissing,

    /// DNS lookup failed on the email domain
    DnsDown,
    /// MX record missing on the email domain
    DnsMxMissing,
    /// SPF record missing on the email domain
    DnsSpfMissing,
    /// DMARC record missing on the email domain
    DnsDmarcMissing,
    /// DMARC policy below p=quarantine;pct=100
    DnsDmarcWeak,
    /// An MX of the email domain resolves outside the EU
    DnsMxOutsideEu,
}

impl Issue {
    /// Every issue tag, in declaration order.
    pub const ALL: [Self; 23] = [
        Self::EmailMissing,
        Self::EmailMalformed,
        Self::WebsiteMissing,
        Self::WebsiteMalformed,
        Self::WebsiteDeclaredHttp,
        Self::EmailDomainMismatch,
        Self::EmailDomainGeneric,
        Self::WebsiteDomainExtension,
        Self::EmailDomainExtension,
        Self::InProgress,
        Self::WebsiteDown,
        Self::WebsiteSsl,
        Self::WebsiteDomainRedirect,
        Self::WebsiteHttpRedirect,
        Self::WebsiteHttpsNowww,
        Self::WebsiteHttpNowww,
        Self::WebsiteA11yMissing,
        Self::DnsDown,
        Self::DnsMxMissing,
        Self::DnsSpfMissing,
        Self::DnsDmarcMissing,
        Self::DnsDmarcWeak,
        Self::DnsMxOutsideEu,
    ];

    /// Get the storage tag of the issue (e.g. `"DNS_DMARC_WEAK"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailMissing => "EMAIL_MISSING",
            Self::EmailMalformed => "EMAIL_MALFORMED",
            Self::WebsiteMissing => "WEBSITE_MISSING",
            Self::WebsiteMalformed => "WEBSITE_MALFORMED",
            Self::WebsiteDeclaredHttp => "WEBSITE_DECLARED_HTTP",
            Self::EmailDomainMismatch => "EMAIL_DOMAIN_MISMATCH",
            Self::EmailDomainGeneric => "EMAIL_DOMAIN_GENERIC",
            Self::WebsiteDomainExtension => "WEBSITE_DOMAIN_EXTENSION",
            Self::EmailDomainExtension => "EMAIL_DOMAIN_EXTENSION",
            Self::InProgress => "IN_PROGRESS",
            Self::WebsiteDown => "WEBSITE_DOWN",
            Self::WebsiteSsl => "WEBSITE_SSL",
            Self::WebsiteDomainRedirect => "WEBSITE_DOMAIN_REDIRECT",
            Self::WebsiteHttpRedirect => "WEBSITE_HTTP_REDIRECT",
            Self::WebsiteHttpsNowww => "WEBSITE_HTTPS_NOWWW",
            Self::WebsiteHttpNowww => "WEBSITE_HTTP_NOWWW",
            Self::WebsiteA11yMissing => "WEBSITE_A11Y_MISSING",
            Self::DnsDown => "DNS_DOWN",
            Self::DnsMxMissing => "DNS_MX_MISSING",
            Self::DnsSpfMissing => "DNS_SPF_MISSING",
            Self::DnsDmarcMissing => "DNS_DMARC_MISSING",
            Self::DnsDmarcWeak => "DNS_DMARC_WEAK",
            Self::DnsMxOutsideEu => "DNS_MX_OUTSIDE_EU",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Issue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|issue| issue.as_str() == s)
            .ok_or_else(|| format!("unknown issue tag '{s}'"))
    }
}

/// Ordered collection of issues with attached detail strings.
///
/// Conceptually a set-with-detail keyed on the issue tag. Insertion order is
/// irrelevant for evaluation; iteration is in tag order so fixtures are
/// reproducible. Inserting a tag twice keeps the latest detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueSet {
    entries: BTreeMap<Issue, String>,
}

impl IssueSet {
    /// Create an empty issue set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an issue with its explanation. Replaces any existing detail.
    pub fn insert(&mut self, issue: Issue, detail: impl Into<String>) {
        self.entries.insert(issue, detail.into());
    }

    /// Whether the set contains the given tag.
    #[must_use]
    pub fn contains(&self, issue: Issue) -> bool {
        self.entries.contains_key(&issue)
    }

    /// Detail string for a tag, if present.
    #[must_use]
    pub fn detail(&self, issue: Issue) -> Option<&str> {
        self.entries.get(&issue).map(String::as_str)
    }

    /// Number of issues in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union with another set; entries from `other` win on duplicate tags.
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Iterate over `(issue, detail)` pairs in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (Issue, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Iterate over the tags only.
    pub fn issues(&self) -> impl Iterator<Item = Issue> + '_ {
        self.entries.keys().copied()
    }

    /// Split into the parallel tag/detail arrays used by the result store.
    #[must_use]
    pub fn to_parallel(&self) -> (Vec<String>, Vec<String>) {
        let tags = self.entries.keys().map(|k| k.as_str().to_string()).collect();
        let details = self.entries.values().cloned().collect();
        (tags, details)
    }

    /// Rebuild a set from the parallel tag/detail arrays of a stored row.
    ///
    /// Tags that are no longer part of the taxonomy are skipped with a
    /// warning, so old rows survive a taxonomy revision.
    #[must_use]
    pub fn from_parallel(tags: &[String], details: &[String]) -> Self {
        let mut set = Self::new();
        for (idx, tag) in tags.iter().enumerate() {
            match tag.parse::<Issue>() {
                Ok(issue) => {
                    let detail = details.get(idx).cloned().unwrap_or_default();
                    set.insert(issue, detail);
                }
                Err(_) => {
                    tracing::warn!("Skipping unknown stored issue tag '{}'", tag);
                }
            }
        }
        set
    }
}

impl FromIterator<(Issue, String)> for IssueSet {
    fn from_iter<T: IntoIterator<Item = (Issue, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Issue, String)> for IssueSet {
    fn extend<T: IntoIterator<Item = (Issue, String)>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

//! URL variant derivation.
//!
//! From one declared website URL the probe exercises up to four variants:
//! both schemes, and when the declared host carries a `www.` prefix, both
//! schemes on the bare domain as well.

use url::Url;

/// The request targets derived from a declared URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlVariants {
    /// `http://` form of the declared URL.
    pub http: String,
    /// `https://` form of the declared URL.
    pub https: String,
    /// `http://` form without the `www.` prefix, when the host has one.
    pub http_no_www: Option<String>,
    /// `https://` form without the `www.` prefix, when the host has one.
    pub https_no_www: Option<String>,
    /// Declared host with `www.` stripped; redirect targets are compared
    /// against this.
    pub expected_domain: String,
    /// Whether the organization declared an `https://` URL.
    pub declared_https: bool,
}

impl UrlVariants {
    /// Derive the variants. Returns `None` when the URL does not parse or
    /// has no host.
    #[must_use]
    pub fn derive(declared: &str) -> Option<Self> {
        let parsed = Url::parse(declared).ok()?;
        let host = parsed.host_str()?.to_string();
        let declared_https = parsed.scheme() == "https";

        let with_scheme = |scheme: &str, host: &str| {
            let mut url = parsed.clone();
            // set_scheme/set_host only fail for non-special schemes and
            // hostless URLs, both excluded above.
            url.set_scheme(scheme).ok()?;
            url.set_host(Some(host)).ok()?;
            Some(url.to_string())
        };

        let bare = host.strip_prefix("www.");

        Some(Self {
            http: with_scheme("http", &host)?,
            https: with_scheme("https", &host)?,
            http_no_www: bare.and_then(|b| with_scheme("http", b)),
            https_no_www: bare.and_then(|b| with_scheme("https", b)),
            expected_domain: bare.unwrap_or(&host).to_string(),
            declared_https,
        })
    }
}

/// Normalize a final host for comparison with the expected domain: strip a
/// default port suffix and a `www.` prefix.
#[must_use]
pub fn normalize_domain(host: &str) -> &str {
    let host = host
        .strip_suffix(":443")
        .or_else(|| host.strip_suffix(":80"))
        .unwrap_or(host);
    host.strip_prefix("www.").unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_with_www() {
        let variants = UrlVariants::derive("https://www.maville.fr").unwrap();
        assert_eq!(variants.http, "http://www.maville.fr/");
        assert_eq!(variants.https, "https://www.maville.fr/");
        assert_eq!(variants.http_no_www.as_deref(), Some("http://maville.fr/"));
        assert_eq!(variants.https_no_www.as_deref(), Some("https://maville.fr/"));
        assert_eq!(variants.expected_domain, "maville.fr");
        assert!(variants.declared_https);
    }

    #[test]
    fn test_derive_without_www() {
        let variants = UrlVariants::derive("http://maville.fr/mairie").unwrap();
        assert_eq!(variants.http, "http://maville.fr/mairie");
        assert_eq!(variants.https, "https://maville.fr/mairie");
        assert!(variants.http_no_www.is_none());
        assert!(variants.https_no_www.is_none());
        assert!(!variants.declared_https);
    }

    #[test]
    fn test_derive_rejects_garbage() {
        assert!(UrlVariants::derive("not a url").is_none());
        assert!(UrlVariants::derive("").is_none());
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("www.maville.fr"), "maville.fr");
        assert_eq!(normalize_domain("maville.fr:443"), "maville.fr");
        assert_eq!(normalize_domain("www.maville.fr:80"), "maville.fr");
        assert_eq!(normalize_domain("maville.fr:8080"), "maville.fr:8080");
    }
}

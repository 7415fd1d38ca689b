//! Website probing: availability, HTTPS posture, redirect hygiene and
//! accessibility statement presence.
//!
//! Fetching and classification are separated: the `classify_*` functions are
//! pure over a [`FetchOutcome`], so the verdict logic is tested without any
//! network access.

use crate::client;
use crate::content::find_accessibility_link;
use crate::error::Result;
use crate::variants::{normalize_domain, UrlVariants};
use presence_core::{HttpConfig, Issue, IssueSet};
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use url::Url;

/// A completed request, redirects already followed.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the request was issued against.
    pub requested_url: String,
    /// URL the response came from, after redirects.
    pub final_url: Url,
    /// Final HTTP status.
    pub status: u16,
    /// Response body.
    pub body: String,
}

/// A request that produced no response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// TLS-level failure (handshake, certificate).
    Ssl(String),
    /// The request hit the client timeout.
    Timeout(String),
    /// Connection refused, DNS failure, protocol error, ...
    Other(String),
}

/// Outcome of one variant fetch.
pub type FetchOutcome = std::result::Result<FetchedPage, FetchFailure>;

impl FetchedPage {
    fn final_domain(&self) -> &str {
        normalize_domain(self.final_url.host_str().unwrap_or_default())
    }

    fn was_redirected(&self) -> bool {
        self.final_url.as_str() != self.requested_url
    }
}

fn classify_reqwest_error(err: &reqwest::Error) -> FetchFailure {
    if err.is_timeout() {
        return FetchFailure::Timeout(err.to_string());
    }
    let mut chain = String::new();
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        chain.push_str(&current.to_string().to_lowercase());
        chain.push(' ');
        source = current.source();
    }
    if chain.contains("certificate") || chain.contains("tls") || chain.contains("handshake") {
        FetchFailure::Ssl(err.to_string())
    } else {
        FetchFailure::Other(err.to_string())
    }
}

/// Verdict on the `http://` variant, fetched without certificate
/// verification.
///
/// A broken plain-HTTP entry point is graded differently depending on what
/// the organization declared: with a declared `https://` URL it only means
/// the HTTP→HTTPS redirect is absent, with a declared `http://` URL the site
/// is down.
fn classify_http(outcome: &FetchOutcome, declared_https: bool, expected_domain: &str) -> IssueSet {
    let mut issues = IssueSet::new();
    let no_redirect_issue = |issues: &mut IssueSet, detail: String| {
        if declared_https {
            issues.insert(Issue::WebsiteHttpRedirect, detail);
        } else {
            issues.insert(Issue::WebsiteDown, detail);
        }
    };

    match outcome {
        Ok(page) if page.status != 200 => {
            no_redirect_issue(
                &mut issues,
                format!("HTTP request returned status {}", page.status),
            );
        }
        Ok(page) if page.final_url.scheme() != "https" => {
            issues.insert(
                Issue::WebsiteHttpRedirect,
                "HTTP request was not redirected to HTTPS",
            );
        }
        Ok(page) if page.final_domain() != expected_domain => {
            issues.insert(
                Issue::WebsiteDomainRedirect,
                format!("Redirected to unexpected domain {}", page.final_domain()),
            );
        }
        Ok(_) => {}
        Err(FetchFailure::Ssl(msg)) => {
            issues.insert(Issue::WebsiteSsl, format!("SSL error: {msg}"));
        }
        Err(FetchFailure::Timeout(msg) | FetchFailure::Other(msg)) => {
            no_redirect_issue(&mut issues, format!("HTTP request failed: {msg}"));
        }
    }
    issues
}

/// Verdict on the `https://` variant, fetched with certificate verification.
fn classify_https(outcome: &FetchOutcome, expected_domain: &str) -> IssueSet {
    let mut issues = IssueSet::new();
    match outcome {
        Ok(page) if page.status != 200 => {
            issues.insert(
                Issue::WebsiteDown,
                format!("HTTPS request returned status {}", page.status),
            );
        }
        Ok(page) if page.final_domain() != expected_domain => {
            issues.insert(
                Issue::WebsiteDomainRedirect,
                format!("Redirected to unexpected domain {}", page.final_domain()),
            );
        }
        Ok(_) => {}
        Err(FetchFailure::Ssl(msg)) => {
            issues.insert(Issue::WebsiteSsl, format!("SSL error: {msg}"));
        }
        Err(FetchFailure::Timeout(msg) | FetchFailure::Other(msg)) => {
            issues.insert(Issue::WebsiteDown, format!("HTTPS request failed: {msg}"));
        }
    }
    issues
}

/// Domain the bare-domain variants are expected to land on: the final
/// domain observed by the https check, else the http check, else the
/// declared domain. A site that legitimately serves from another domain is
/// already graded by the redirect checks; the bare-domain variants only
/// have to reach the same place.
fn observed_domain<'a>(
    https_outcome: &'a FetchOutcome,
    http_outcome: &'a FetchOutcome,
    declared_domain: &'a str,
) -> &'a str {
    match (https_outcome, http_outcome) {
        (Ok(page), _) | (Err(_), Ok(page)) => page.final_domain(),
        _ => declared_domain,
    }
}

/// Verdict on a bare-domain variant. Returns the issue detail when the bare
/// domain is not properly served.
///
/// A non-200 after a redirect is not flagged here: the redirect worked and
/// the target's health is the other checks' concern.
fn classify_non_www(outcome: &FetchOutcome, expected_domain: &str) -> Option<String> {
    match outcome {
        Ok(page) if page.status != 200 && !page.was_redirected() => {
            Some(format!("Bare domain returned status {}", page.status))
        }
        Ok(page) if page.final_domain() != expected_domain => Some(format!(
            "Bare domain redirected to unexpected domain {}",
            page.final_domain()
        )),
        Ok(_) => None,
        Err(FetchFailure::Ssl(msg)) => Some(format!("SSL error on bare domain: {msg}")),
        Err(FetchFailure::Timeout(msg) | FetchFailure::Other(msg)) => {
            Some(format!("Bare domain request failed: {msg}"))
        }
    }
}

/// The website check: fetches the URL variants and derives issues.
pub struct WebProbe {
    verified: Client,
    unverified: Client,
    no_redirect: Client,
}

impl WebProbe {
    /// Build the probe's three HTTP clients from configuration.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            verified: client::build_verified(config)?,
            unverified: client::build_unverified(config)?,
            no_redirect: client::build_no_redirect(config)?,
        })
    }

    /// Run the full website check on a declared URL.
    ///
    /// Returns `None` for an empty or unparseable URL (nothing to check,
    /// nothing to persist — syntax problems are the validation layer's job).
    pub async fn check_website(&self, declared: &str) -> Option<(IssueSet, JsonValue)> {
        if declared.is_empty() {
            return None;
        }
        let variants = UrlVariants::derive(declared)?;

        let mut issues = IssueSet::new();
        let mut metadata = serde_json::Map::new();

        let http_outcome = self.fetch(&self.unverified, &variants.http).await;
        issues.merge(classify_http(
            &http_outcome,
            variants.declared_https,
            &variants.expected_domain,
        ));

        let https_outcome = self.fetch(&self.verified, &variants.https).await;
        issues.merge(classify_https(&https_outcome, &variants.expected_domain));

        let reached = observed_domain(&https_outcome, &http_outcome, &variants.expected_domain)
            .to_string();
        self.check_non_www(&variants, &reached, &mut issues).await;

        // Accessibility is assessed on the response matching the declared
        // scheme, when that response is healthy.
        let declared_outcome = if variants.declared_https {
            &https_outcome
        } else {
            &http_outcome
        };
        if let Ok(page) = declared_outcome {
            if page.status == 200 {
                match find_accessibility_link(&page.body, &page.final_url) {
                    Some(url) => {
                        metadata.insert("a11y_url".to_string(), json!(url));
                    }
                    None => {
                        issues.insert(
                            Issue::WebsiteA11yMissing,
                            "No accessibility statement link found",
                        );
                    }
                }
            }
        }

        Some((issues, JsonValue::Object(metadata)))
    }

    async fn check_non_www(&self, variants: &UrlVariants, reached: &str, issues: &mut IssueSet) {
        if let Some(url) = &variants.http_no_www {
            let outcome = self.fetch(&self.unverified, url).await;
            if let Some(detail) = classify_non_www(&outcome, reached) {
                issues.insert(Issue::WebsiteHttpNowww, detail);
            }
        }

        if let Some(url) = &variants.https_no_www {
            let outcome = self.fetch(&self.unverified, url).await;
            if let Some(detail) = classify_non_www(&outcome, reached) {
                issues.insert(Issue::WebsiteHttpsNowww, detail);
            } else {
                // The bare https domain answered, but an immediate redirect
                // can mask a broken certificate on the declared URL: request
                // it once more without following redirects, verification on.
                if let Err(FetchFailure::Ssl(msg)) =
                    self.fetch(&self.no_redirect, &variants.https).await
                {
                    issues.insert(
                        Issue::WebsiteHttpsNowww,
                        format!("SSL error: {msg}"),
                    );
                }
            }
        }
    }

    async fn fetch(&self, client: &Client, url: &str) -> FetchOutcome {
        match client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let final_url = response.url().clone();
                let body = response.text().await.unwrap_or_default();
                Ok(FetchedPage {
                    requested_url: url.to_string(),
                    final_url,
                    status,
                    body,
                })
            }
            Err(err) => {
                tracing::debug!(url, error = %err, "Request failed");
                Err(classify_reqwest_error(&err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(requested: &str, final_url: &str, status: u16) -> FetchedPage {
        FetchedPage {
            requested_url: requested.to_string(),
            final_url: Url::parse(final_url).unwrap(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_http_redirected_to_https_is_clean() {
        let outcome = Ok(page(
            "http://www.maville.fr/",
            "https://www.maville.fr/",
            200,
        ));
        let issues = classify_http(&outcome, true, "maville.fr");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_http_not_redirected() {
        let outcome = Ok(page("http://www.maville.fr/", "http://www.maville.fr/", 200));
        let issues = classify_http(&outcome, true, "maville.fr");
        let tags: Vec<Issue> = issues.issues().collect();
        assert_eq!(tags, vec![Issue::WebsiteHttpRedirect]);
    }

    #[test]
    fn test_http_non_200_declared_https() {
        let outcome = Ok(page("http://www.maville.fr/", "http://www.maville.fr/", 503));
        let issues = classify_http(&outcome, true, "maville.fr");
        assert!(issues.contains(Issue::WebsiteHttpRedirect));
        assert!(!issues.contains(Issue::WebsiteDown));
    }

    #[test]
    fn test_http_non_200_declared_http() {
        let outcome = Ok(page("http://maville.fr/", "http://maville.fr/", 404));
        let issues = classify_http(&outcome, false, "maville.fr");
        assert!(issues.contains(Issue::WebsiteDown));
    }

    #[test]
    fn test_http_domain_redirect() {
        let outcome = Ok(page(
            "http://www.maville.fr/",
            "https://www.autreville.fr/",
            200,
        ));
        let issues = classify_http(&outcome, true, "maville.fr");
        assert_eq!(
            issues.detail(Issue::WebsiteDomainRedirect),
            Some("Redirected to unexpected domain autreville.fr")
        );
    }

    #[test]
    fn test_http_www_stripping_in_comparison() {
        // www-prefixed final host still counts as the expected domain.
        let outcome = Ok(page("http://maville.fr/", "https://www.maville.fr/", 200));
        let issues = classify_http(&outcome, true, "maville.fr");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_http_ssl_failure_reported_as_ssl() {
        let outcome = Err(FetchFailure::Ssl("handshake failed".to_string()));
        let issues = classify_http(&outcome, true, "maville.fr");
        let tags: Vec<Issue> = issues.issues().collect();
        assert_eq!(tags, vec![Issue::WebsiteSsl]);
    }

    #[test]
    fn test_http_timeout_declared_http_is_down() {
        let outcome = Err(FetchFailure::Timeout("timed out".to_string()));
        let issues = classify_http(&outcome, false, "maville.fr");
        assert!(issues.contains(Issue::WebsiteDown));
    }

    #[test]
    fn test_https_healthy() {
        let outcome = Ok(page(
            "https://www.maville.fr/",
            "https://www.maville.fr/",
            200,
        ));
        assert!(classify_https(&outcome, "maville.fr").is_empty());
    }

    #[test]
    fn test_https_non_200_is_down() {
        let outcome = Ok(page(
            "https://www.maville.fr/",
            "https://www.maville.fr/",
            500,
        ));
        let issues = classify_https(&outcome, "maville.fr");
        assert!(issues.contains(Issue::WebsiteDown));
    }

    #[test]
    fn test_https_certificate_error() {
        let outcome = Err(FetchFailure::Ssl("certificate expired".to_string()));
        let issues = classify_https(&outcome, "maville.fr");
        let tags: Vec<Issue> = issues.issues().collect();
        assert_eq!(tags, vec![Issue::WebsiteSsl]);
    }

    #[test]
    fn test_https_connection_error_is_down() {
        let outcome = Err(FetchFailure::Other("connection refused".to_string()));
        let issues = classify_https(&outcome, "maville.fr");
        assert!(issues.contains(Issue::WebsiteDown));
    }

    #[test]
    fn test_non_www_redirect_to_www_is_clean() {
        let outcome = Ok(page("http://maville.fr/", "https://www.maville.fr/", 200));
        assert!(classify_non_www(&outcome, "maville.fr").is_none());
    }

    #[test]
    fn test_non_www_unserved() {
        let outcome = Ok(page("http://maville.fr/", "http://maville.fr/", 404));
        assert!(classify_non_www(&outcome, "maville.fr").is_some());
    }

    #[test]
    fn test_non_www_post_redirect_error_is_clean() {
        // Redirect happened, then the target 404'd: not this check's problem.
        let outcome = Ok(page("http://maville.fr/", "https://www.maville.fr/old", 404));
        assert!(classify_non_www(&outcome, "maville.fr").is_none());
    }

    #[test]
    fn test_non_www_redirect_to_other_domain() {
        let outcome = Ok(page("http://maville.fr/", "https://parking.example/", 200));
        let detail = classify_non_www(&outcome, "maville.fr").unwrap();
        assert!(detail.contains("parking.example"));
    }

    #[test]
    fn test_observed_domain_prefers_https_then_http() {
        let https = Ok(page(
            "https://www.maville.fr/",
            "https://www.ville-maville.fr/",
            200,
        ));
        let http = Ok(page("http://www.maville.fr/", "https://www.autre.fr/", 200));
        assert_eq!(observed_domain(&https, &http, "maville.fr"), "ville-maville.fr");

        let https_down: FetchOutcome = Err(FetchFailure::Other("refused".to_string()));
        assert_eq!(observed_domain(&https_down, &http, "maville.fr"), "autre.fr");

        let http_down: FetchOutcome = Err(FetchFailure::Timeout("timed out".to_string()));
        assert_eq!(observed_domain(&https_down, &http_down, "maville.fr"), "maville.fr");
    }

    #[test]
    fn test_non_www_follows_site_to_its_actual_domain() {
        // The main site redirects to another domain (graded elsewhere); the
        // bare domain landing on that same domain is not a second issue.
        let outcome = Ok(page(
            "https://maville.fr/",
            "https://www.ville-maville.fr/",
            200,
        ));
        assert!(classify_non_www(&outcome, "ville-maville.fr").is_none());
        assert!(classify_non_www(&outcome, "maville.fr").is_some());
    }

    #[test]
    fn test_non_www_ssl_failure() {
        let outcome = Err(FetchFailure::Ssl("self signed".to_string()));
        assert!(classify_non_www(&outcome, "maville.fr").is_some());
    }
}

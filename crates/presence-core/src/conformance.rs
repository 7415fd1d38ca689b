//! Declarative conformance validation of the declared email and website.
//!
//! These are pure functions over the strings declared on Service-Public.fr;
//! no network I/O happens here. The resulting [`IssueSet`] also decides which
//! asynchronous checks are worth running at all ([`data_checks_doable`]).

use crate::issues::{Issue, IssueSet};
use crate::types::CheckType;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Generic/ISP mail providers: an organization using one of these does not
/// own its email domain.
pub const GENERIC_EMAIL_DOMAINS: &[&str] = &[
    "wanadoo.fr",
    "orange.fr",
    "gmail.com",
    "laposte.net",
    "free.fr",
    "outlook.fr",
    "nordnet.fr",
    "yahoo.fr",
    "sfr.fr",
    "hotmail.fr",
    "ozone.net",
    "west-telecom.com",
    "mcom.fr",
    "cegetel.net",
    "akeonet.com",
    "neuf.fr",
    "outlook.com",
    "hotmail.com",
    "bbox.fr",
    "inforoutes-ardeche.fr",
    "copler.fr",
    "9business.fr",
    "numericable.fr",
    "wibox.fr",
    "inforoutes.fr",
    "yahoo.com",
    "evc.net",
    "live.fr",
    "gmx.fr",
    "tubeo.eu",
    "adeli.biz",
    "aricia.fr",
    "pole-secretariat.fr",
    "ovh.fr",
    "tv-com.net",
    "idyle-telecom.com",
    "rtvc.fr",
    "lgtel.fr",
    "alsatis.net",
    "sivucesny.fr",
    "selonnet.fr",
    "orange-business.fr",
    "telwan.fr",
    "icloud.com",
    "numericable.com",
    "vialis.net",
    "fr.oleane.com",
    "collectivite47.fr", // Distribués par le CDG47
];

/// Sovereign domain extensions accepted for a French local authority.
pub const ALLOWED_DOMAIN_EXTENSIONS: &[&str] = &[
    // National
    "fr",
    // Régional
    "alsace",
    "bzh",
    "corsica",
    "paris",
    "eu",
    // Outre-mer
    "gp", // Guadeloupe
    "gf", // Guyane
    "mq", // Martinique
    "re", // Réunion
    "yt", // Mayotte
    "pm", // Saint-Pierre-et-Miquelon
    "wf", // Wallis-et-Futuna
    "tf", // Terres australes françaises
    "nc", // Nouvelle-Calédonie
    "pf", // Polynésie française
];

// Purposefully stricter than what the RFCs allow. We want simple addresses
// and URLs that users can type.
fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-z]{2,10}$").expect("valid regex")
    })
}

fn website_regex() -> &'static Regex {
    static WEBSITE_REGEX: OnceLock<Regex> = OnceLock::new();
    WEBSITE_REGEX.get_or_init(|| {
        Regex::new(r"^https?://[-a-zA-Z0-9.]{2,256}\.[a-z]{2,10}(/[a-zA-Z0-9._/?=-]*)?$")
            .expect("valid regex")
    })
}

/// Host of a declared website URL, with any leading `www.` removed.
fn website_domain(website: &str) -> Option<&str> {
    let rest = website.split("://").nth(1)?;
    let host = rest.split('/').next()?;
    Some(host.strip_prefix("www.").unwrap_or(host))
}

fn extension(domain: &str) -> &str {
    domain.rsplit('.').next().unwrap_or(domain)
}

/// Validate the declared email and website of an organization.
///
/// Pure and deterministic. Emits the declarative issues described by the
/// RCPNT referential: missing/malformed values, declared-http websites,
/// email/website domain mismatch, generic mail providers and non-sovereign
/// domain extensions.
///
/// `bypass_website_regex` skips the website syntax check, for callers that
/// already hold a parsed URL.
#[must_use]
pub fn validate_conformance(email: &str, website: &str, bypass_website_regex: bool) -> IssueSet {
    let mut issues = IssueSet::new();

    let mut email_domain = "";
    let mut site_domain = "";

    if email.is_empty() {
        issues.insert(Issue::EmailMissing, "No email declared");
    } else if !email_regex().is_match(email) {
        issues.insert(
            Issue::EmailMalformed,
            format!("Declared email has invalid syntax: {email}"),
        );
    } else if let Some((_, domain)) = email.rsplit_once('@') {
        email_domain = domain;
    }

    if website.is_empty() {
        issues.insert(Issue::WebsiteMissing, "No website declared");
    } else if !website_regex().is_match(website) && !bypass_website_regex {
        issues.insert(
            Issue::WebsiteMalformed,
            format!("Declared website has invalid syntax: {website}"),
        );
    } else {
        site_domain = website_domain(website).unwrap_or("");

        if website.starts_with("http://") {
            issues.insert(
                Issue::WebsiteDeclaredHttp,
                format!("Website is declared with an http:// address: {website}"),
            );
        }
    }

    if !email_domain.is_empty() && !site_domain.is_empty() && email_domain != site_domain {
        issues.insert(
            Issue::EmailDomainMismatch,
            format!("Email domain {email_domain} does not match website domain {site_domain}"),
        );
    }

    if !email_domain.is_empty() && GENERIC_EMAIL_DOMAINS.contains(&email_domain) {
        issues.insert(
            Issue::EmailDomainGeneric,
            format!("Email domain {email_domain} is a generic mail provider"),
        );
    }

    if !site_domain.is_empty() && !ALLOWED_DOMAIN_EXTENSIONS.contains(&extension(site_domain)) {
        issues.insert(
            Issue::WebsiteDomainExtension,
            format!("Website domain extension .{} is not allowed", extension(site_domain)),
        );
    }

    if !email_domain.is_empty() && !ALLOWED_DOMAIN_EXTENSIONS.contains(&extension(email_domain)) {
        issues.insert(
            Issue::EmailDomainExtension,
            format!("Email domain extension .{} is not allowed", extension(email_domain)),
        );
    }

    issues
}

/// Which asynchronous checks are meaningful given the declarative issues.
///
/// Probing a missing or malformed value is pointless: the DNS check requires
/// a usable email domain, the website check a usable URL.
#[must_use]
pub fn data_checks_doable(issues: &IssueSet) -> BTreeSet<CheckType> {
    let mut doable = BTreeSet::new();
    if !issues.contains(Issue::EmailMissing) && !issues.contains(Issue::EmailMalformed) {
        doable.insert(CheckType::Dns);
    }
    if !issues.contains(Issue::WebsiteMissing) && !issues.contains(Issue::WebsiteMalformed) {
        doable.insert(CheckType::Website);
    }
    doable
}

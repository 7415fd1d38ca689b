//! RCPNT criteria evaluation.
//!
//! The "Référentiel de Conformité de la Présence Numérique des Territoires"
//! grades an organization on ~16 criteria (`1.1`..`1.8` for the website,
//! `2.1`..`2.8` for the email domain) plus aggregate grades (`1.a`, `1.aa`,
//! `2.a`, `2.aa`, `a`, `aa`). A criterion is satisfied unless one of its
//! blocking issues is present; unchecked conditions are never penalized.
//!
//! The issue→blocked-criteria mapping is data, not control flow: the
//! referential's numbering evolves and a revision should be a table edit.

use crate::issues::{Issue, IssueSet};
use std::collections::BTreeSet;

/// A criterion identifier as published by the referential (e.g. `"1.4"`).
pub type CriterionId = &'static str;

/// Atomic website criteria.
const SITE_CRITERIA: &[CriterionId] = &["1.1", "1.2", "1.3", "1.4", "1.5", "1.6", "1.7", "1.8"];

/// Atomic email criteria.
const EMAIL_CRITERIA: &[CriterionId] = &["2.1", "2.2", "2.3", "2.4", "2.5", "2.6", "2.7", "2.8"];

/// Essential website criteria (the `1.a` grade).
const SITE_ESSENTIAL: &[CriterionId] = &["1.1", "1.2", "1.3", "1.4", "1.5", "1.6", "1.7"];

/// Essential email criteria (the `2.a` grade). `2.3` membership is
/// conditional, see [`RcpntTable::conformance`].
const EMAIL_ESSENTIAL: &[CriterionId] = &["2.1", "2.2", "2.3", "2.4", "2.5", "2.8"];

/// Which criteria each issue invalidates.
const BLOCKING: &[(Issue, &[CriterionId])] = &[
    (Issue::EmailMissing, EMAIL_CRITERIA),
    (Issue::EmailMalformed, EMAIL_CRITERIA),
    (
        Issue::WebsiteMissing,
        &["1.1", "1.2", "1.3", "1.4", "1.5", "1.6", "1.7", "1.8", "2.3"],
    ),
    (
        Issue::WebsiteMalformed,
        &["1.1", "1.2", "1.3", "1.4", "1.5", "1.6", "1.7", "1.8", "2.3"],
    ),
    (Issue::WebsiteDeclaredHttp, &["1.8"]),
    (Issue::WebsiteDomainExtension, &["1.2"]),
    (Issue::EmailDomainExtension, &["2.3"]),
    (Issue::EmailDomainGeneric, &["2.2"]),
    (Issue::EmailDomainMismatch, &["2.3"]),
    (Issue::WebsiteDown, &["1.3", "1.4", "1.5", "1.6", "1.7"]),
    (Issue::WebsiteSsl, &["1.5"]),
    (Issue::WebsiteDomainRedirect, &["1.6"]),
    (Issue::WebsiteHttpRedirect, &["1.4", "1.7"]),
    (Issue::WebsiteHttpNowww, &["1.7"]),
    (Issue::WebsiteHttpsNowww, &["1.7"]),
    (Issue::DnsDown, &["2.4", "2.5", "2.6", "2.7", "2.8"]),
    (Issue::DnsMxMissing, &["2.4"]),
    (Issue::DnsSpfMissing, &["2.5"]),
    (Issue::DnsDmarcMissing, &["2.6", "2.7"]),
    (Issue::DnsDmarcWeak, &["2.7"]),
    (Issue::DnsMxOutsideEu, &["2.8"]),
    // Not graded by the current referential revision.
    (Issue::WebsiteA11yMissing, &[]),
    (Issue::InProgress, &[]),
];

/// The full criteria catalog: all atomic criteria plus aggregate grades.
#[must_use]
pub fn all_criteria() -> BTreeSet<CriterionId> {
    let mut refs: BTreeSet<CriterionId> = SITE_CRITERIA.iter().copied().collect();
    refs.extend(EMAIL_CRITERIA.iter().copied());
    refs.extend(["1.a", "1.aa", "2.a", "2.aa", "a", "aa"]);
    refs
}

/// The issue→blocked-criteria table of one referential revision.
#[derive(Debug, Clone)]
pub struct RcpntTable {
    blocking: &'static [(Issue, &'static [CriterionId])],
}

impl Default for RcpntTable {
    fn default() -> Self {
        Self { blocking: BLOCKING }
    }
}

impl RcpntTable {
    /// Criteria invalidated by the given issue.
    #[must_use]
    pub fn blocked_by(&self, issue: Issue) -> &'static [CriterionId] {
        self.blocking
            .iter()
            .find(|(tag, _)| *tag == issue)
            .map_or(&[], |(_, blocked)| blocked)
    }

    /// Compute the set of satisfied criteria for an issue set.
    ///
    /// Starts from the full catalog, removes everything blocked by a present
    /// issue, then grants each aggregate grade iff all its members survived.
    ///
    /// `2.3` (email domain matches website domain) cannot be meaningfully
    /// evaluated when the website itself is missing, malformed or on a
    /// non-sovereign extension while the email domain extension is fine; in
    /// that situation it is left out of the `2.a`/`2.aa` requirements.
    #[must_use]
    pub fn conformance(&self, issues: &IssueSet) -> BTreeSet<CriterionId> {
        let mut satisfied: BTreeSet<CriterionId> = SITE_CRITERIA.iter().copied().collect();
        satisfied.extend(EMAIL_CRITERIA.iter().copied());

        for issue in issues.issues() {
            for criterion in self.blocked_by(issue) {
                satisfied.remove(criterion);
            }
        }

        let website_unusable = issues.contains(Issue::WebsiteMissing)
            || issues.contains(Issue::WebsiteMalformed)
            || issues.contains(Issue::WebsiteDomainExtension);
        let skip_2_3 = website_unusable && !issues.contains(Issue::EmailDomainExtension);

        let group_ok = |members: &[CriterionId]| {
            members
                .iter()
                .filter(|c| !(skip_2_3 && **c == "2.3"))
                .all(|c| satisfied.contains(c))
        };

        let site_a = group_ok(SITE_ESSENTIAL);
        let site_aa = group_ok(SITE_CRITERIA);
        let email_a = group_ok(EMAIL_ESSENTIAL);
        let email_aa = group_ok(EMAIL_CRITERIA);

        if site_a {
            satisfied.insert("1.a");
        }
        if site_aa {
            satisfied.insert("1.aa");
        }
        if email_a {
            satisfied.insert("2.a");
        }
        if email_aa {
            satisfied.insert("2.aa");
        }
        if site_a && email_a {
            satisfied.insert("a");
        }
        if site_aa && email_aa {
            satisfied.insert("aa");
        }

        satisfied
    }
}

/// Satisfied RCPNT criteria for an issue set, using the built-in table.
#[must_use]
pub fn rcpnt_conformance(issues: &IssueSet) -> BTreeSet<CriterionId> {
    RcpntTable::default().conformance(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::validate_conformance;

    fn with_issues(mut base: IssueSet, extra: &[Issue]) -> IssueSet {
        for issue in extra {
            base.insert(*issue, "test");
        }
        base
    }

    fn refs(ids: &[CriterionId]) -> BTreeSet<CriterionId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_every_issue_has_a_table_entry() {
        let table = RcpntTable::default();
        for issue in Issue::ALL {
            // blocked_by must be total over the taxonomy, even when empty.
            assert!(
                table.blocking.iter().any(|(tag, _)| *tag == issue),
                "No table entry for {issue}"
            );
        }
    }

    #[test]
    fn test_nothing_satisfied_when_both_missing() {
        let issues = validate_conformance("", "", false);
        assert_eq!(rcpnt_conformance(&issues), BTreeSet::new());
    }

    #[test]
    fn test_email_only_valid() {
        let issues = validate_conformance("valide@maville.fr", "", false);
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&["2.1", "2.2", "2.4", "2.5", "2.6", "2.7", "2.8", "2.a", "2.aa"])
        );
    }

    #[test]
    fn test_email_only_with_dns_down() {
        let issues = with_issues(
            validate_conformance("valide@maville.fr", "", false),
            &[Issue::DnsDown],
        );
        assert_eq!(rcpnt_conformance(&issues), refs(&["2.1", "2.2"]));
    }

    #[test]
    fn test_email_only_with_dmarc_missing() {
        let issues = with_issues(
            validate_conformance("valide@maville.fr", "", false),
            &[Issue::DnsDmarcMissing],
        );
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&["2.1", "2.2", "2.4", "2.5", "2.8", "2.a"])
        );
    }

    #[test]
    fn test_email_only_with_mx_outside_eu() {
        let issues = with_issues(
            validate_conformance("valide@maville.fr", "", false),
            &[Issue::DnsMxOutsideEu],
        );
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&["2.1", "2.2", "2.4", "2.5", "2.6", "2.7"])
        );
    }

    #[test]
    fn test_in_progress_does_not_penalize() {
        let issues = with_issues(
            validate_conformance("valide@maville.fr", "", false),
            &[Issue::DnsDmarcMissing, Issue::InProgress],
        );
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&["2.1", "2.2", "2.4", "2.5", "2.8", "2.a"])
        );
    }

    #[test]
    fn test_fully_valid_gets_full_catalog() {
        let issues = validate_conformance("valide@maville.fr", "https://www.maville.fr", false);
        assert_eq!(rcpnt_conformance(&issues), all_criteria());
    }

    #[test]
    fn test_weak_dmarc_removes_exactly_three() {
        let issues = with_issues(
            validate_conformance("valide@maville.fr", "https://www.maville.fr", false),
            &[Issue::DnsDmarcWeak],
        );
        let mut expected = all_criteria();
        for gone in ["2.7", "2.aa", "aa"] {
            expected.remove(gone);
        }
        assert_eq!(rcpnt_conformance(&issues), expected);
    }

    #[test]
    fn test_declared_http_removes_exactly_three() {
        let issues = with_issues(
            validate_conformance("valide@maville.fr", "https://www.maville.fr", false),
            &[Issue::WebsiteDeclaredHttp],
        );
        let mut expected = all_criteria();
        for gone in ["1.8", "1.aa", "aa"] {
            expected.remove(gone);
        }
        assert_eq!(rcpnt_conformance(&issues), expected);
    }

    #[test]
    fn test_website_only_valid() {
        let issues = validate_conformance("", "https://www.maville.fr", false);
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&["1.1", "1.2", "1.3", "1.4", "1.5", "1.6", "1.7", "1.8", "1.a", "1.aa"])
        );
    }

    #[test]
    fn test_website_only_down() {
        let issues = with_issues(
            validate_conformance("", "https://www.maville.fr", false),
            &[Issue::WebsiteDown],
        );
        assert_eq!(rcpnt_conformance(&issues), refs(&["1.1", "1.2", "1.8"]));
    }

    #[test]
    fn test_website_only_bad_extension() {
        let issues = validate_conformance("", "https://www.maville.com", false);
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&["1.1", "1.3", "1.4", "1.5", "1.6", "1.7", "1.8"])
        );
    }

    #[test]
    fn test_email_only_bad_extension() {
        let issues = validate_conformance("test@maville.com", "", false);
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&["2.1", "2.2", "2.4", "2.5", "2.6", "2.7", "2.8"])
        );
    }

    #[test]
    fn test_domain_mismatch_blocks_email_aggregates() {
        let issues =
            validate_conformance("test@maville.fr", "https://www.monautreville.fr", false);
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&[
                "2.1", "2.2", "2.4", "2.5", "2.6", "2.7", "2.8", "1.1", "1.2", "1.3", "1.4",
                "1.5", "1.6", "1.7", "1.8", "1.a", "1.aa",
            ])
        );
    }

    #[test]
    fn test_unusable_website_excuses_2_3_from_aggregates() {
        let issues = validate_conformance("test@maville.fr", "http://www.monautreville.com", false);
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&[
                "2.1", "2.2", "2.4", "2.5", "2.6", "2.7", "2.8", "1.1", "1.3", "1.4", "1.5",
                "1.6", "1.7", "2.a", "2.aa",
            ])
        );
    }

    #[test]
    fn test_domain_redirect_removes_1_6() {
        let issues = with_issues(
            validate_conformance("", "https://www.maville.com", false),
            &[Issue::WebsiteDomainRedirect],
        );
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&["1.1", "1.3", "1.4", "1.5", "1.7", "1.8"])
        );
    }

    #[test]
    fn test_bad_email_extension_requires_2_3() {
        // With a .com email the domain match criterion stays in the
        // aggregate requirements, and here it is invalidated.
        let issues = validate_conformance("test@maville.com", "https://maville.com", false);
        assert_eq!(
            rcpnt_conformance(&issues),
            refs(&[
                "1.1", "1.3", "1.4", "1.5", "1.6", "1.7", "1.8", "2.1", "2.2", "2.4", "2.5",
                "2.6", "2.7", "2.8",
            ])
        );
    }
}

//! Accessibility statement detection.
//!
//! French public-sector sites must link their "déclaration d'accessibilité".
//! Anchors are matched on link text first, then on href path patterns, with
//! relative hrefs resolved against the page URL.

use scraper::{Html, Selector};
use url::Url;

/// Link-text fragments that identify an accessibility statement link.
const A11Y_KEYWORDS: &[&str] = &[
    "déclaration d'accessibilité",
    "declaration d'accessibilite",
    "accessibilité",
    "accessibilite",
    "accessibility statement",
    "accessibility",
];

/// Href path fragments that identify an accessibility statement link.
const A11Y_PATH_PATTERNS: &[&str] = &[
    "/accessibilite",
    "/accessibility",
    "/declaration-accessibilite",
    "/accessibility-statement",
];

/// Find the accessibility statement URL in a page, if any.
///
/// Link-text matches win over path-pattern matches; within each pass the
/// first matching anchor in document order wins.
#[must_use]
pub fn find_accessibility_link(html: &str, base_url: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").expect("valid selector");

    let resolve = |href: &str| -> Option<String> {
        base_url.join(href).ok().map(|u| u.to_string())
    };

    for anchor in document.select(&anchors) {
        let text = anchor.text().collect::<String>().to_lowercase();
        let text = text.trim();
        if A11Y_KEYWORDS.iter().any(|kw| text.contains(kw)) {
            if let Some(url) = anchor.value().attr("href").and_then(resolve) {
                return Some(url);
            }
        }
    }

    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let path = href.to_lowercase();
        if A11Y_PATH_PATTERNS
            .iter()
            .any(|pattern| path.contains(pattern))
        {
            if let Some(url) = resolve(href) {
                return Some(url);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.maville.fr/").unwrap()
    }

    #[test]
    fn test_link_text_match() {
        let html = r#"<html><body>
            <a href="/mentions-legales">Mentions légales</a>
            <a href="/a11y">Déclaration d'accessibilité</a>
        </body></html>"#;
        assert_eq!(
            find_accessibility_link(html, &base()),
            Some("https://www.maville.fr/a11y".to_string())
        );
    }

    #[test]
    fn test_path_pattern_match() {
        let html = r#"<html><body>
            <a href="/infos/accessibilite">En savoir plus</a>
        </body></html>"#;
        assert_eq!(
            find_accessibility_link(html, &base()),
            Some("https://www.maville.fr/infos/accessibilite".to_string())
        );
    }

    #[test]
    fn test_path_pattern_matches_anywhere_in_href() {
        let html = r#"<html><body>
            <a href="/accessibilite-numerique">En savoir plus</a>
        </body></html>"#;
        assert_eq!(
            find_accessibility_link(html, &base()),
            Some("https://www.maville.fr/accessibilite-numerique".to_string())
        );

        let html = r#"<a href="/accessibilite?lang=fr">lien</a>"#;
        assert_eq!(
            find_accessibility_link(html, &base()),
            Some("https://www.maville.fr/accessibilite?lang=fr".to_string())
        );
    }

    #[test]
    fn test_link_text_wins_over_path() {
        let html = r#"<html><body>
            <a href="/by-path/accessibility">lien</a>
            <a href="/by-text">Accessibilité</a>
        </body></html>"#;
        assert_eq!(
            find_accessibility_link(html, &base()),
            Some("https://www.maville.fr/by-text".to_string())
        );
    }

    #[test]
    fn test_absolute_href_kept() {
        let html = r#"<a href="https://autre.fr/accessibilite">Accessibilité</a>"#;
        assert_eq!(
            find_accessibility_link(html, &base()),
            Some("https://autre.fr/accessibilite".to_string())
        );
    }

    #[test]
    fn test_english_keyword() {
        let html = r#"<a href="/statement">Accessibility statement</a>"#;
        assert_eq!(
            find_accessibility_link(html, &base()),
            Some("https://www.maville.fr/statement".to_string())
        );
    }

    #[test]
    fn test_no_match() {
        let html = r#"<a href="/contact">Contact</a>"#;
        assert_eq!(find_accessibility_link(html, &base()), None);
    }
}

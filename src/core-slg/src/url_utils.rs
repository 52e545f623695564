//! URL filtering for pagination expansion: deciding which outbound links
//! point at real content.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static NON_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(/wp-admin/|/wp-content/|/wp-includes/|/feed/|/rss/|/atom/|/sitemap|/robots|/admin/|/login|/register|/contact|/about|/privacy|/terms|/cookie)",
    )
    .expect("non-content regex")
});

static CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(/\d{4}/|/\d{2}/|/post/|/article/|/blog/|/news/|/story/|/page/|/entry/)")
        .expect("content regex")
});

/// True when a link plausibly points at real content.
///
/// Anchors, mailto/tel links, and admin/feed/legal/sitemap paths are
/// excluded. Year/month/post/article-shaped paths are explicitly content;
/// everything else defaults to content-like unless explicitly excluded.
pub fn is_content_link(href: &str) -> bool {
    if href.starts_with('#') || href.starts_with("mailto:") || href.starts_with("tel:") {
        return false;
    }
    if NON_CONTENT_RE.is_match(href) {
        return false;
    }
    if CONTENT_RE.is_match(href) {
        return true;
    }
    // Bare roots and query-only links are navigation, not content.
    let path = href.split(['?', '#']).next().unwrap_or(href);
    !(path.is_empty() || path == "/")
}

/// Resolves a possibly relative `href` against `base`. Returns `None` when
/// neither parses to an absolute URL.
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    if let Ok(abs) = Url::parse(href) {
        return Some(abs.to_string());
    }
    Url::parse(base).ok()?.join(href).ok().map(|u| u.to_string())
}

/// Removes duplicates while preserving first-seen order.
pub fn dedupe_preserving_order(links: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    links.into_iter().filter(|l| seen.insert(l.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excludes_non_content() {
        assert!(!is_content_link("#top"));
        assert!(!is_content_link("mailto:hi@example.com"));
        assert!(!is_content_link("tel:+1555"));
        assert!(!is_content_link("/wp-admin/options.php"));
        assert!(!is_content_link("https://example.com/feed/"));
        assert!(!is_content_link("/privacy-policy"));
        assert!(!is_content_link("/sitemap.xml"));
    }

    #[test]
    fn test_explicit_content_patterns() {
        assert!(is_content_link("/2024/03/hello"));
        assert!(is_content_link("/post/hello"));
        assert!(is_content_link("https://example.com/blog/a-story"));
    }

    #[test]
    fn test_defaults_to_content() {
        assert!(is_content_link("/some-product-page"));
        assert!(!is_content_link("/"));
        assert!(!is_content_link("?page=2"));
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("https://example.com/blog/", "/2024/03/a").as_deref(),
            Some("https://example.com/2024/03/a")
        );
        assert_eq!(
            absolutize("https://example.com/", "https://other.com/x").as_deref(),
            Some("https://other.com/x")
        );
        assert_eq!(absolutize("not a url", "also/not"), None);
    }

    #[test]
    fn test_dedupe_preserving_order() {
        let links = vec!["a".to_string(), "b".to_string(), "a".to_string(), "c".to_string()];
        assert_eq!(dedupe_preserving_order(links), vec!["a", "b", "c"]);
    }
}

//! Shared data model: sitemap entries and scraped pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content category assigned to a URL.
///
/// `Uncategorized` is a legitimate terminal value for URLs from sitemaps with
/// no inferable type; it is tracked separately from `Page` so that per-category
/// limits on pages are not silently inflated by unclassifiable URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Blog,
    Page,
    Product,
    Uncategorized,
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageKind::Blog => write!(f, "blog"),
            PageKind::Page => write!(f, "page"),
            PageKind::Product => write!(f, "product"),
            PageKind::Uncategorized => write!(f, "uncategorized"),
        }
    }
}

/// `<changefreq>` values from the sitemap protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    /// Lenient parse: unknown strings are simply dropped by the caller.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Some(Self::Always),
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            "never" => Some(Self::Never),
            _ => None,
        }
    }
}

/// A single `<url>` entry produced by sitemap resolution.
///
/// Immutable once created. `provisional` carries the category guess inferred
/// from which child sitemap listed the URL (e.g. `sitemap-posts.xml`), before
/// the page itself has been inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: Option<ChangeFrequency>,
    pub priority: Option<f32>,
    pub provisional: Option<PageKind>,
}

impl SitemapEntry {
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            lastmod: None,
            changefreq: None,
            priority: None,
            provisional: None,
        }
    }

    pub fn with_provisional(mut self, kind: PageKind) -> Self {
        self.provisional = Some(kind);
        self
    }

    pub fn with_lastmod(mut self, lastmod: impl Into<String>) -> Self {
        self.lastmod = Some(lastmod.into());
        self
    }
}

/// A fully processed page: extracted content plus its final category.
///
/// Created per-URL by the batch that scraped it; owned by that batch until
/// merge. Serializable so batch results survive in the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: String,
    pub description: String,
    /// Body text, already truncated to the configured max content length.
    pub body_text: String,
    pub keywords: Vec<String>,
    pub scraped_at: DateTime<Utc>,
    /// Carried over from the sitemap entry when present.
    pub lastmod: Option<String>,
    pub kind: PageKind,
}

impl ScrapedPage {
    pub fn new(url: impl Into<String>, title: impl Into<String>, kind: PageKind) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: String::new(),
            body_text: String::new(),
            keywords: Vec::new(),
            scraped_at: Utc::now(),
            lastmod: None,
            kind,
        }
    }

    /// Recency key: `lastmod` when the sitemap supplied one, otherwise the
    /// scrape timestamp. Both are ISO-8601-shaped, so lexicographic order is
    /// chronological order.
    pub fn sort_key(&self) -> String {
        self.lastmod
            .clone()
            .unwrap_or_else(|| self.scraped_at.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changefreq_parse() {
        assert_eq!(ChangeFrequency::parse("daily"), Some(ChangeFrequency::Daily));
        assert_eq!(ChangeFrequency::parse(" Weekly "), Some(ChangeFrequency::Weekly));
        assert_eq!(ChangeFrequency::parse("fortnightly"), None);
    }

    #[test]
    fn test_sort_key_prefers_lastmod() {
        let page = ScrapedPage {
            url: "https://example.com/a".to_string(),
            title: "A".to_string(),
            description: String::new(),
            body_text: String::new(),
            keywords: vec![],
            scraped_at: Utc::now(),
            lastmod: Some("2024-03-01".to_string()),
            kind: PageKind::Page,
        };
        assert_eq!(page.sort_key(), "2024-03-01");
    }

    #[test]
    fn test_sort_key_falls_back_to_scraped_at() {
        let now = Utc::now();
        let page = ScrapedPage {
            url: "https://example.com/a".to_string(),
            title: "A".to_string(),
            description: String::new(),
            body_text: String::new(),
            keywords: vec![],
            scraped_at: now,
            lastmod: None,
            kind: PageKind::Page,
        };
        assert_eq!(page.sort_key(), now.to_rfc3339());
    }
}

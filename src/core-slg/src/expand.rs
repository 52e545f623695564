//! Pagination expansion: detecting index-style pages and folding the content
//! of their linked pages into a single entry.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::{Html, Selector};

use crate::extract::{ContentExtractor, ExtractedContent};
use crate::text_utils::{collapse_whitespace, truncate_chars};
use crate::url_utils::{absolutize, dedupe_preserving_order, is_content_link};

/// Content links required alongside archive vocabulary.
const MIN_CONTENT_LINKS_WITH_VOCAB: usize = 10;
/// Content links required when only the layout suggests an index.
const MIN_CONTENT_LINKS_STANDALONE: usize = 15;
/// Article elements that make a layout count as a listing.
const MIN_ARTICLE_ELEMENTS: usize = 5;

static INDEX_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(/page/\d+|[?&]page=\d+|/archives?(/|$)|/category/|/tag/|/index(\.|/|$))")
        .expect("index url regex")
});

static PAGINATION_NAV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)pagination|navigation|pager").expect("pagination nav regex"));

/// Vocabulary that marks a page as an archive or listing.
const ARCHIVE_VOCAB: &[&str] = &[
    "archive",
    "archives",
    "all posts",
    "all articles",
    "older posts",
    "recent posts",
    "blog index",
    "post index",
];

/// Words in a `<title>` that suggest an archive-style listing.
const ARCHIVE_TITLE_WORDS: &[&str] = &["archive", "blog", "posts", "articles", "recent", "latest"];

/// Why a page was judged to be an index page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexReason {
    /// The URL path itself looks like a pagination or archive URL.
    UrlPattern,
    /// Archive wording in the title or headings, backed by enough links.
    ArchiveVocabulary,
    /// A link-heavy listing layout with no archive wording.
    LinkHeavyLayout,
}

/// Decides whether a page is an index of other pages.
///
/// Only URLs containing `sitemap` are ever considered; expansion exists for
/// HTML sitemap pages that real sitemaps point at, and ordinary listing
/// pages stand on their own.
pub fn index_page_signal(url: &str, html: &str) -> Option<IndexReason> {
    if !url.to_lowercase().contains("sitemap") {
        return None;
    }
    if INDEX_URL_RE.is_match(url) {
        return Some(IndexReason::UrlPattern);
    }

    let document = Html::parse_document(html);
    let link_count = collect_links(&document, url).len();

    if has_archive_vocab(&document) && link_count >= MIN_CONTENT_LINKS_WITH_VOCAB {
        return Some(IndexReason::ArchiveVocabulary);
    }
    if link_count >= MIN_CONTENT_LINKS_STANDALONE && has_listing_layout(&document) {
        return Some(IndexReason::LinkHeavyLayout);
    }
    None
}

/// Content links found on a page, absolutized and deduplicated, capped at
/// `limit`.
pub fn content_links(html: &str, base_url: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = collect_links(&document, base_url);
    links.truncate(limit);
    links
}

fn collect_links(document: &Html, base_url: &str) -> Vec<String> {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let links = document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| is_content_link(href))
        .filter_map(|href| absolutize(base_url, href))
        .filter(|abs| abs != base_url)
        .collect();
    dedupe_preserving_order(links)
}

fn has_archive_vocab(document: &Html) -> bool {
    let mut haystack = String::new();
    for css in ["title", "h1", "h2"] {
        if let Ok(selector) = Selector::parse(css) {
            for el in document.select(&selector) {
                haystack.push_str(&el.text().collect::<String>());
                haystack.push(' ');
            }
        }
    }
    let haystack = haystack.to_lowercase();
    ARCHIVE_VOCAB.iter().any(|word| haystack.contains(word))
}

/// A link-heavy page only counts as a listing when it also carries archive
/// structure: an archive-sounding title, pagination-navigation markup, or a
/// run of article elements.
fn has_listing_layout(document: &Html) -> bool {
    if let Ok(selector) = Selector::parse("title") {
        if let Some(title) = document.select(&selector).next() {
            let title = title.text().collect::<String>().to_lowercase();
            if ARCHIVE_TITLE_WORDS.iter().any(|word| title.contains(word)) {
                return true;
            }
        }
    }
    if let Ok(selector) = Selector::parse("nav, div") {
        let has_pagination_nav = document
            .select(&selector)
            .filter_map(|el| el.value().attr("class"))
            .any(|class| PAGINATION_NAV_RE.is_match(class));
        if has_pagination_nav {
            return true;
        }
    }
    Selector::parse("article")
        .map(|s| document.select(&s).count() >= MIN_ARTICLE_ELEMENTS)
        .unwrap_or(false)
}

/// Expands index pages by fetching their linked pages and combining the
/// results into one entry.
pub struct PaginationExpander<'a> {
    extractor: &'a dyn ContentExtractor,
    max_nested_links: usize,
    max_content_length: usize,
    request_delay: Duration,
}

impl<'a> PaginationExpander<'a> {
    pub fn new(
        extractor: &'a dyn ContentExtractor,
        max_nested_links: usize,
        max_content_length: usize,
        request_delay: Duration,
    ) -> Self {
        Self { extractor, max_nested_links, max_content_length, request_delay }
    }

    /// Fetches up to `max_nested_links` linked pages and folds their content
    /// into a single [`ExtractedContent`]. When every nested fetch fails, the
    /// index page's own content is returned unchanged.
    pub async fn expand(&self, url: &str, own: &ExtractedContent) -> ExtractedContent {
        let html = match own.raw_html.as_deref() {
            Some(html) => html,
            None => return own.clone(),
        };
        let links = content_links(html, url, self.max_nested_links);
        if links.is_empty() {
            return own.clone();
        }
        tracing::debug!("Expanding index page {} via {} nested links", url, links.len());

        let mut nested = Vec::new();
        for link in &links {
            tokio::time::sleep(self.request_delay).await;
            match self.extractor.extract(link).await {
                Ok(content) => nested.push(content),
                Err(e) => tracing::warn!("Nested fetch failed for {}: {}", link, e),
            }
        }
        if nested.is_empty() {
            return own.clone();
        }
        combine(own, &nested, self.max_content_length)
    }
}

/// Combines an index page's own content with its nested pages' content.
///
/// Title comes from the first nested page with one, the description joins
/// the first three nested descriptions, body text concatenates in link
/// order, and keywords are the order-preserving union.
fn combine(own: &ExtractedContent, nested: &[ExtractedContent], max_chars: usize) -> ExtractedContent {
    let title = nested
        .iter()
        .map(|c| c.title.as_str())
        .find(|t| !t.is_empty() && *t != "Untitled")
        .unwrap_or(own.title.as_str())
        .to_string();

    let description = {
        let joined = nested
            .iter()
            .map(|c| c.description.as_str())
            .filter(|d| !d.is_empty())
            .take(3)
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() { own.description.clone() } else { joined }
    };

    let body = nested
        .iter()
        .map(|c| c.body_text.as_str())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let body_text = truncate_chars(&collapse_whitespace(&body), max_chars);

    let mut keywords = own.keywords.clone();
    for content in nested {
        for keyword in &content.keywords {
            if !keywords.contains(keyword) {
                keywords.push(keyword.clone());
            }
        }
    }

    ExtractedContent {
        title,
        description,
        body_text: if body_text.is_empty() { own.body_text.clone() } else { body_text },
        keywords,
        raw_html: own.raw_html.clone(),
    }
}

//! Selector-based HTTP extractor.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};

use crate::errors::{GenError, Result};
use crate::extract::{ContentExtractor, ExtractedContent};
use crate::robots::RobotsPolicy;
use crate::text_utils::{collapse_whitespace, truncate_chars};

/// Markup that never contributes readable text. Stripped before parsing so
/// the body fallback does not fill up with scripts and navigation chrome.
static NON_CONTENT_MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<noscript[^>]*>.*?</noscript>|<nav[^>]*>.*?</nav>|<header[^>]*>.*?</header>|<footer[^>]*>.*?</footer>",
    )
    .expect("non-content markup regex")
});

/// Containers tried, in order, when no content selector is configured. The
/// first one whose text runs past [`MIN_CONTENT_TEXT_CHARS`] wins.
const CONTENT_CONTAINER_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    ".content",
    "#content",
    ".post-content",
    ".entry-content",
    ".article-body",
];

/// Minimum text length for a container to count as the page's main content.
const MIN_CONTENT_TEXT_CHARS: usize = 50;

/// Knobs for [`HttpExtractor`]. Selectors are CSS; invalid ones are ignored
/// and the built-in fallbacks apply.
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub title_selector: String,
    pub content_selector: String,
    /// Ceiling on extracted body text, in characters.
    pub max_content_length: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            title_selector: "h1".to_string(),
            content_selector: String::new(),
            max_content_length: 500,
        }
    }
}

/// Fetches pages over HTTP and extracts content with CSS selectors.
pub struct HttpExtractor {
    client: reqwest::Client,
    options: ExtractorOptions,
    robots: Option<RobotsPolicy>,
}

impl HttpExtractor {
    pub fn new(client: reqwest::Client, options: ExtractorOptions) -> Self {
        Self { client, options, robots: None }
    }

    /// Attaches a robots.txt policy. URLs the policy disallows fail with
    /// [`GenError::RobotsDisallowed`] instead of being fetched.
    pub fn with_robots(mut self, robots: RobotsPolicy) -> Self {
        self.robots = Some(robots);
        self
    }

    /// A client configured the way the generator makes all its requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying TLS backend cannot be initialized.
    pub fn default_client() -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("slg-worker/0.1 (llms.txt generator)")
            .build()?;
        Ok(client)
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedContent> {
        if let Some(robots) = &self.robots {
            if !robots.is_allowed(url) {
                return Err(GenError::RobotsDisallowed(url.to_string()));
            }
        }
        let response = self.client.get(url).send().await?.error_for_status()?;
        let html = response.text().await?;
        Ok(build_content(&html, &self.options))
    }
}

/// Extracts title, description, body text, and keywords from raw HTML.
///
/// Pure and synchronous: the parsed DOM never crosses an await point, so
/// extraction futures stay `Send`.
pub fn build_content(html: &str, options: &ExtractorOptions) -> ExtractedContent {
    let stripped = NON_CONTENT_MARKUP_RE.replace_all(html, " ");
    let document = Html::parse_document(&stripped);

    ExtractedContent {
        title: extract_title(&document, &options.title_selector),
        description: extract_description(&document),
        body_text: extract_body_text(&document, &options.content_selector, options.max_content_length),
        keywords: extract_keywords(&document),
        raw_html: Some(html.to_string()),
    }
}

fn select_first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn extract_title(document: &Html, title_selector: &str) -> String {
    if !title_selector.is_empty() {
        if let Some(title) = select_first_text(document, title_selector) {
            return title;
        }
    }
    select_first_text(document, "title")
        .or_else(|| select_first_text(document, "h1"))
        .unwrap_or_else(|| "Untitled".to_string())
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|content| !content.is_empty())
}

fn extract_description(document: &Html) -> String {
    meta_content(document, r#"meta[name="description"]"#)
        .or_else(|| meta_content(document, r#"meta[property="og:description"]"#))
        .or_else(|| select_first_text(document, "p"))
        .unwrap_or_default()
}

fn extract_body_text(document: &Html, content_selector: &str, max_chars: usize) -> String {
    if !content_selector.is_empty() {
        if let Some(text) = select_first_text(document, content_selector) {
            return truncate_chars(&text, max_chars);
        }
    }
    // No selector configured (or it matched nothing): pick the first known
    // content container with a meaningful amount of text.
    for css in CONTENT_CONTAINER_SELECTORS {
        if let Some(text) = select_first_text(document, css) {
            if text.chars().count() > MIN_CONTENT_TEXT_CHARS {
                return truncate_chars(&text, max_chars);
            }
        }
    }
    let body = select_first_text(document, "body").unwrap_or_default();
    truncate_chars(&body, max_chars)
}

fn extract_keywords(document: &Html) -> Vec<String> {
    meta_content(document, r#"meta[name="keywords"]"#)
        .map(|raw| {
            raw.split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

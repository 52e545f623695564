//! Run configuration: every recognized option, its default, and up-front validation.

use crate::errors::{GenError, Result};

/// Ceiling on `max_concurrent_batches * max_workers_per_batch`. Courtesy
/// toward target sites is approximated through worker-count limits rather
/// than inter-request delays inside a batch, so the product stays in the
/// tens, not hundreds.
pub const MAX_TOTAL_CONCURRENCY: usize = 64;

/// Configuration for a single generation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Sitemap URL (or a plain site URL when auto-detection is used).
    pub sitemap_url: String,
    /// Site name used for the document title.
    pub site_name: String,
    /// Site description; synthesized from content when empty.
    pub site_description: String,
    /// Max page URLs to scrape (tier limit).
    pub max_pages: usize,
    /// Max blog URLs to scrape (tier limit).
    pub max_blogs: usize,
    /// Max product URLs to scrape (tier limit).
    pub max_products: usize,
    /// Max uncategorized URLs to scrape. Kept separate from `max_pages` so
    /// unclassifiable URLs never eat into the page budget.
    pub max_uncategorized: usize,
    /// Max items rendered in the Detailed Content section.
    pub max_detailed: usize,
    /// Truncation length for extracted body text, in characters.
    pub max_content_length: usize,
    /// Max child sitemaps expanded from a sitemap index; excess is discarded.
    pub max_sitemaps: usize,
    /// Max nested links followed when expanding an index/archive page.
    pub max_nested_links: usize,
    /// URLs per batch.
    pub batch_size: usize,
    /// Batches run concurrently.
    pub max_concurrent_batches: usize,
    /// URL fetches run concurrently within one batch.
    pub max_workers_per_batch: usize,
    /// Delay in seconds between sequential fetches (child sitemaps, nested links).
    pub request_delay: f64,
    /// When true, consult robots.txt before fetching.
    pub respect_robots_txt: bool,
    /// Output artifact path.
    pub output_path: String,
    /// Rename an existing output file instead of overwriting it.
    pub backup_existing: bool,
    /// Topics used when fewer than three are found in content.
    pub default_topics: Vec<String>,
    /// CSS selector(s) tried first for the page title.
    pub title_selector: String,
    /// CSS selector(s) tried first for main content.
    pub content_selector: String,
    /// Output template; `${name}` placeholders. None uses the built-in template.
    pub template: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sitemap_url: String::new(),
            site_name: "My Website".to_string(),
            site_description: String::new(),
            max_pages: 10,
            max_blogs: 10,
            max_products: 10,
            max_uncategorized: 10,
            max_detailed: 10,
            max_content_length: 500,
            max_sitemaps: 5,
            max_nested_links: 5,
            batch_size: 50,
            max_concurrent_batches: 10,
            max_workers_per_batch: 4,
            request_delay: 1.0,
            respect_robots_txt: false,
            output_path: "llms.txt".to_string(),
            backup_existing: true,
            default_topics: Vec::new(),
            title_selector: "h1, .title, .post-title, .entry-title, .page-title".to_string(),
            content_selector:
                ".content, #main, article, .post-content, .entry-content, .page-content, .post, .entry"
                    .to_string(),
            template: None,
        }
    }
}

impl RunConfig {
    /// Creates a new builder for RunConfig.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Validates the configuration. Called once before any work starts;
    /// every failure here aborts the run immediately.
    pub fn validate(&self) -> Result<()> {
        if self.sitemap_url.is_empty() {
            return Err(GenError::Config("sitemap_url is required".to_string()));
        }
        let parsed = url::Url::parse(&self.sitemap_url)
            .map_err(|e| GenError::Config(format!("sitemap_url is not a valid URL: {}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(GenError::Config(format!(
                "sitemap_url must be http(s), got scheme '{}'",
                parsed.scheme()
            )));
        }
        if self.batch_size == 0 {
            return Err(GenError::Config("batch_size must be at least 1".to_string()));
        }
        if self.max_concurrent_batches == 0 {
            return Err(GenError::Config(
                "max_concurrent_batches must be at least 1".to_string(),
            ));
        }
        if self.max_workers_per_batch == 0 {
            return Err(GenError::Config(
                "max_workers_per_batch must be at least 1".to_string(),
            ));
        }
        let total = self.max_concurrent_batches * self.max_workers_per_batch;
        if total > MAX_TOTAL_CONCURRENCY {
            return Err(GenError::Config(format!(
                "max_concurrent_batches * max_workers_per_batch = {} exceeds the ceiling of {}",
                total, MAX_TOTAL_CONCURRENCY
            )));
        }
        if self.request_delay < 0.0 || !self.request_delay.is_finite() {
            return Err(GenError::Config(
                "request_delay must be a non-negative number".to_string(),
            ));
        }
        if self.output_path.is_empty() {
            return Err(GenError::Config("output_path is required".to_string()));
        }
        Ok(())
    }
}

/// Builder for RunConfig.
#[derive(Debug, Clone, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn sitemap_url(mut self, url: impl Into<String>) -> Self {
        self.config.sitemap_url = url.into();
        self
    }

    pub fn site_name(mut self, name: impl Into<String>) -> Self {
        self.config.site_name = name.into();
        self
    }

    pub fn site_description(mut self, description: impl Into<String>) -> Self {
        self.config.site_description = description.into();
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn max_blogs(mut self, n: usize) -> Self {
        self.config.max_blogs = n;
        self
    }

    pub fn max_products(mut self, n: usize) -> Self {
        self.config.max_products = n;
        self
    }

    pub fn max_uncategorized(mut self, n: usize) -> Self {
        self.config.max_uncategorized = n;
        self
    }

    pub fn max_detailed(mut self, n: usize) -> Self {
        self.config.max_detailed = n;
        self
    }

    pub fn max_content_length(mut self, n: usize) -> Self {
        self.config.max_content_length = n;
        self
    }

    pub fn max_sitemaps(mut self, n: usize) -> Self {
        self.config.max_sitemaps = n;
        self
    }

    pub fn max_nested_links(mut self, n: usize) -> Self {
        self.config.max_nested_links = n;
        self
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n;
        self
    }

    pub fn max_concurrent_batches(mut self, n: usize) -> Self {
        self.config.max_concurrent_batches = n;
        self
    }

    pub fn max_workers_per_batch(mut self, n: usize) -> Self {
        self.config.max_workers_per_batch = n;
        self
    }

    pub fn request_delay(mut self, seconds: f64) -> Self {
        self.config.request_delay = seconds;
        self
    }

    pub fn respect_robots_txt(mut self, yes: bool) -> Self {
        self.config.respect_robots_txt = yes;
        self
    }

    pub fn output_path(mut self, path: impl Into<String>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn backup_existing(mut self, yes: bool) -> Self {
        self.config.backup_existing = yes;
        self
    }

    pub fn default_topics(mut self, topics: Vec<String>) -> Self {
        self.config.default_topics = topics;
        self
    }

    pub fn title_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.title_selector = selector.into();
        self
    }

    pub fn content_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.content_selector = selector.into();
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.config.template = Some(template.into());
        self
    }

    /// Builds the RunConfig without validating it; call
    /// [`RunConfig::validate`] at run start.
    pub fn build(self) -> RunConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RunConfig {
        RunConfig::builder()
            .sitemap_url("https://example.com/sitemap.xml")
            .build()
    }

    #[test]
    fn test_default_config_validates_with_url() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_missing_sitemap_url() {
        let config = RunConfig::default();
        assert!(matches!(config.validate(), Err(GenError::Config(_))));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = RunConfig::builder().sitemap_url("ftp://example.com/sitemap.xml").build();
        assert!(matches!(config.validate(), Err(GenError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let mut config = valid();
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_excessive_concurrency_product() {
        let mut config = valid();
        config.max_concurrent_batches = 20;
        config.max_workers_per_batch = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_delay() {
        let mut config = valid();
        config.request_delay = -1.0;
        assert!(config.validate().is_err());
    }
}

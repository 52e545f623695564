//! Content extraction capability.
//!
//! The pipeline only depends on the [`ContentExtractor`] contract: given a
//! URL, return title/description/body text or fail. [`HttpExtractor`] is the
//! built-in selector-based implementation; a managed-extraction backend can
//! implement the same trait and ignore the selector options.

mod http;

use async_trait::async_trait;

pub use http::{ExtractorOptions, HttpExtractor, build_content};

use crate::errors::Result;

/// Raw extraction output for a single URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    pub title: String,
    pub description: String,
    /// Body text, truncated to the extractor's max content length.
    pub body_text: String,
    pub keywords: Vec<String>,
    /// Original page HTML, when the backend can supply it. Pagination
    /// expansion needs it to harvest outbound links.
    pub raw_html: Option<String>,
}

/// Capability contract for fetching and extracting one page.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Fetches `url` and extracts its content. Any failure (network,
    /// timeout, robots denial) is an error; callers treat errors as
    /// omissions, never as run-fatal.
    async fn extract(&self, url: &str) -> Result<ExtractedContent>;
}

//! Error types for the llms.txt generation core.

use thiserror::Error;

/// Main error type for llms.txt generation operations.
#[derive(Debug, Error)]
pub enum GenError {
    /// HTTP request failed (network error or timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL format.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Sitemap XML could not be parsed, or yielded no URLs.
    #[error("Sitemap parsing failed: {0}")]
    SitemapParse(String),

    /// No sitemap could be located for a site URL.
    #[error("Sitemap detection failed: {0}")]
    SitemapDetection(String),

    /// Fetch skipped because robots.txt disallows the URL. Treated as an
    /// omission by callers, like any other failed extraction.
    #[error("Disallowed by robots.txt: {0}")]
    RobotsDisallowed(String),

    /// Run configuration is invalid. Raised before any work starts.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Template placeholder substitution failed.
    #[error("Template rendering failed: {0}")]
    Template(#[from] subst::Error),

    /// Filesystem error writing the output artifact or its backup.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with GenError.
pub type Result<T> = std::result::Result<T, GenError>;

//! Core building blocks for sitemap-driven llms.txt generation: sitemap
//! resolution, page classification, content extraction, pagination
//! expansion, and document assembly.
//!
//! The scheduling and durable-storage layers live in the worker crate; this
//! crate is the functional core they drive.

pub mod assemble;
pub mod classify;
pub mod common;
pub mod config;
pub mod detect;
pub mod errors;
pub mod expand;
pub mod extract;
pub mod models;
pub mod robots;
pub mod sitemap;
pub mod text_utils;
pub mod topics;
pub mod url_utils;

pub use assemble::DocumentAssembler;
pub use classify::classify;
pub use config::{RunConfig, RunConfigBuilder, MAX_TOTAL_CONCURRENCY};
pub use errors::{GenError, Result};
pub use expand::{index_page_signal, IndexReason, PaginationExpander};
pub use extract::{ContentExtractor, ExtractedContent, ExtractorOptions, HttpExtractor};
pub use models::{ChangeFrequency, PageKind, ScrapedPage, SitemapEntry};
pub use robots::RobotsPolicy;
pub use sitemap::SitemapResolver;

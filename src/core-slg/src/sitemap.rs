//! Sitemap fetching and resolution: leaf sitemaps, sitemap indexes, and
//! provisional content-type inference from child sitemap locations.

use std::time::Duration;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::errors::{GenError, Result};
use crate::models::{ChangeFrequency, PageKind, SitemapEntry};

/// A `<sitemap>` child inside a sitemap index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

/// A parsed sitemap document: either an index of other sitemaps or a leaf
/// `<urlset>`.
///
/// Any document containing `<sitemap>` children is an index, even if it
/// nominally also has stray `<url>` children.
#[derive(Debug, Clone, PartialEq)]
pub enum SitemapDocument {
    Index(Vec<IndexEntry>),
    Urlset(Vec<SitemapEntry>),
}

/// Which element we are currently inside while walking the XML.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    None,
    Sitemap,
    Url,
}

/// Parses sitemap XML into a [`SitemapDocument`].
///
/// Tolerates missing optional fields (`lastmod`, `changefreq`, `priority`).
/// An entry without a `<loc>` is dropped. A document with neither `<sitemap>`
/// nor `<url>` entries is an error.
pub fn parse_sitemap_document(xml: &str) -> Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut index_entries: Vec<IndexEntry> = Vec::new();
    let mut url_entries: Vec<SitemapEntry> = Vec::new();

    let mut scope = Scope::None;
    let mut current_tag: Option<Vec<u8>> = None;
    let mut loc: Option<String> = None;
    let mut lastmod: Option<String> = None;
    let mut changefreq: Option<ChangeFrequency> = None;
    let mut priority: Option<f32> = None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"sitemap" => {
                    scope = Scope::Sitemap;
                    loc = None;
                    lastmod = None;
                }
                b"url" => {
                    scope = Scope::Url;
                    loc = None;
                    lastmod = None;
                    changefreq = None;
                    priority = None;
                }
                name @ (b"loc" | b"lastmod" | b"changefreq" | b"priority") => {
                    current_tag = Some(name.to_vec());
                }
                _ => {}
            },
            Ok(Event::Text(text)) => {
                if scope != Scope::None {
                    if let Some(tag) = current_tag.as_deref() {
                        let value = text
                            .unescape()
                            .map_err(|e| GenError::SitemapParse(format!("Invalid XML: {}", e)))?
                            .trim()
                            .to_string();
                        match tag {
                            b"loc" => loc = Some(value),
                            b"lastmod" => lastmod = Some(value),
                            b"changefreq" => changefreq = ChangeFrequency::parse(&value),
                            b"priority" => priority = value.parse::<f32>().ok(),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"sitemap" => {
                    if let Some(loc) = loc.take() {
                        index_entries.push(IndexEntry {
                            loc,
                            lastmod: lastmod.take(),
                        });
                    }
                    scope = Scope::None;
                }
                b"url" => {
                    if let Some(loc) = loc.take() {
                        url_entries.push(SitemapEntry {
                            loc,
                            lastmod: lastmod.take(),
                            changefreq: changefreq.take(),
                            priority: priority.take(),
                            provisional: None,
                        });
                    }
                    scope = Scope::None;
                }
                b"loc" | b"lastmod" | b"changefreq" | b"priority" => {
                    current_tag = None;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(GenError::SitemapParse(format!("XML parsing error: {}", e)));
            }
            _ => {}
        }
        buf.clear();
    }

    if !index_entries.is_empty() {
        Ok(SitemapDocument::Index(index_entries))
    } else if !url_entries.is_empty() {
        Ok(SitemapDocument::Urlset(url_entries))
    } else {
        Err(GenError::SitemapParse("No URLs found in sitemap".to_string()))
    }
}

/// Infers a provisional content category from a child sitemap's own location.
///
/// `sitemap-posts.xml` / `blog-sitemap.xml` tag their URLs as blogs,
/// `page-sitemap.xml` as pages, `product-sitemap.xml` as products. Anything
/// else gets no provisional type.
pub fn infer_provisional(sitemap_loc: &str) -> Option<PageKind> {
    let loc = sitemap_loc.to_lowercase();
    if loc.contains("post") || loc.contains("blog") {
        Some(PageKind::Blog)
    } else if loc.contains("page") {
        Some(PageKind::Page)
    } else if loc.contains("product") {
        Some(PageKind::Product)
    } else {
        None
    }
}

/// Fetches and resolves sitemaps, recursively expanding sitemap indexes into
/// a flat, ordered list of URL entries.
pub struct SitemapResolver {
    client: reqwest::Client,
    /// Cap on child sitemaps expanded from an index; excess is discarded.
    max_sitemaps: usize,
    /// Polite delay between sequential child sitemap fetches.
    request_delay: Duration,
}

impl SitemapResolver {
    pub fn new(client: reqwest::Client, max_sitemaps: usize, request_delay: Duration) -> Self {
        Self {
            client,
            max_sitemaps,
            request_delay,
        }
    }

    /// Resolves `sitemap_url` into URL entries.
    ///
    /// A sitemap index expands up to `max_sitemaps` children in document
    /// order; each child's entries inherit the provisional type inferred from
    /// the child's location. A failed child fetch/parse is logged and
    /// skipped. Document order is preserved within each sitemap and index
    /// order across sitemaps.
    ///
    /// # Errors
    ///
    /// Fails when the root document cannot be fetched or parsed, or when
    /// resolution yields no URLs at all.
    pub async fn resolve(&self, sitemap_url: &str) -> Result<Vec<SitemapEntry>> {
        tracing::info!("Parsing sitemap: {}", sitemap_url);
        let xml = self.fetch_text(sitemap_url).await?;

        match parse_sitemap_document(&xml)? {
            SitemapDocument::Urlset(entries) => {
                tracing::info!("Found {} URLs in sitemap", entries.len());
                Ok(entries)
            }
            SitemapDocument::Index(children) => {
                tracing::info!("Detected sitemap index with {} sitemaps", children.len());
                let total = children.len().min(self.max_sitemaps);
                let mut all = Vec::new();
                for (i, child) in children.into_iter().take(self.max_sitemaps).enumerate() {
                    if i > 0 && !self.request_delay.is_zero() {
                        tokio::time::sleep(self.request_delay).await;
                    }
                    tracing::info!("Processing sitemap {}/{}: {}", i + 1, total, child.loc);
                    match self.resolve_leaf(&child).await {
                        Ok(mut entries) => all.append(&mut entries),
                        Err(e) => {
                            tracing::warn!("Error processing sitemap {}: {}", child.loc, e);
                            continue;
                        }
                    }
                }
                if all.is_empty() {
                    return Err(GenError::SitemapParse(
                        "No URLs found in any child sitemap".to_string(),
                    ));
                }
                tracing::info!("Total URLs from all sitemaps: {}", all.len());
                Ok(all)
            }
        }
    }

    async fn resolve_leaf(&self, child: &IndexEntry) -> Result<Vec<SitemapEntry>> {
        let xml = self.fetch_text(&child.loc).await?;
        let provisional = infer_provisional(&child.loc);
        match parse_sitemap_document(&xml)? {
            SitemapDocument::Urlset(entries) => Ok(entries
                .into_iter()
                .map(|mut entry| {
                    entry.provisional = provisional;
                    entry
                })
                .collect()),
            SitemapDocument::Index(_) => Err(GenError::SitemapParse(format!(
                "Nested sitemap index not supported: {}",
                child.loc
            ))),
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

//! The generation run: sitemap to written document, end to end.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use core_slg::classify::{classify, PageFacts};
use core_slg::detect::{detect_sitemap, looks_like_sitemap_url};
use core_slg::models::{PageKind, SitemapEntry};
use core_slg::{
    DocumentAssembler, ExtractorOptions, HttpExtractor, PaginationExpander, RobotsPolicy,
    RunConfig, ScrapedPage, SitemapResolver,
};

use crate::batch::{partition, BatchScheduler, PageProducer};
use crate::errors::Result;
use crate::merge::merge_results;
use crate::progress::{ProgressEvent, RunStats};
use crate::store::BatchStore;

use core_slg::extract::ContentExtractor;
use core_slg::expand::index_page_signal;

/// The production [`PageProducer`]: fetch, expand index pages, classify.
pub struct SiteProducer {
    extractor: HttpExtractor,
    max_nested_links: usize,
    max_content_length: usize,
    request_delay: Duration,
}

impl SiteProducer {
    pub fn new(extractor: HttpExtractor, config: &RunConfig) -> Self {
        Self {
            extractor,
            max_nested_links: config.max_nested_links,
            max_content_length: config.max_content_length,
            request_delay: Duration::from_secs_f64(config.request_delay),
        }
    }
}

#[async_trait]
impl PageProducer for SiteProducer {
    async fn produce(&self, entry: &SitemapEntry) -> core_slg::Result<ScrapedPage> {
        let mut content = self.extractor.extract(&entry.loc).await?;

        let index_reason = content
            .raw_html
            .as_deref()
            .and_then(|html| index_page_signal(&entry.loc, html));
        if let Some(reason) = index_reason {
            tracing::debug!("Treating {} as an index page ({:?})", entry.loc, reason);
            let expander = PaginationExpander::new(
                &self.extractor,
                self.max_nested_links,
                self.max_content_length,
                self.request_delay,
            );
            let expanded = expander.expand(&entry.loc, &content).await;
            content = expanded;
        }

        let facts = PageFacts {
            url: &entry.loc,
            title: &content.title,
            description: &content.description,
            body: &content.body_text,
        };
        let kind = classify(&facts, entry.provisional);

        let mut page = ScrapedPage::new(&entry.loc, &content.title, kind);
        page.description = content.description;
        page.body_text = content.body_text;
        page.keywords = content.keywords;
        page.lastmod = entry.lastmod.clone();
        Ok(page)
    }
}

/// Runs a full generation and writes the document. Emits progress events
/// throughout; on failure an `Error` event is emitted before returning.
pub async fn execute(
    config: RunConfig,
    store: Arc<dyn BatchStore>,
    progress: mpsc::Sender<ProgressEvent>,
) -> Result<RunStats> {
    match run_inner(&config, store, &progress).await {
        Ok(stats) => Ok(stats),
        Err(e) => {
            let _ = progress
                .send(ProgressEvent::Error { message: e.to_string() })
                .await;
            Err(e)
        }
    }
}

async fn run_inner(
    config: &RunConfig,
    store: Arc<dyn BatchStore>,
    progress: &mpsc::Sender<ProgressEvent>,
) -> Result<RunStats> {
    config.validate()?;
    let run_id = Uuid::new_v4().to_string();
    let client = HttpExtractor::default_client()?;
    let delay = Duration::from_secs_f64(config.request_delay);

    let sitemap_url = if looks_like_sitemap_url(&config.sitemap_url) {
        config.sitemap_url.clone()
    } else {
        detect_sitemap(&client, &config.sitemap_url).await?
    };

    let resolver = SitemapResolver::new(client.clone(), config.max_sitemaps, delay);
    let entries = resolver.resolve(&sitemap_url).await?;
    let total_discovered = entries.len();
    tracing::info!("Resolved {} URLs from {}", total_discovered, sitemap_url);

    let selected = select_entries(entries, config);
    let total_urls = selected.len();
    let batches = partition(selected, config.batch_size);
    let total_batches = batches.len();
    let _ = progress
        .send(ProgressEvent::Discovered { total_urls, total_batches })
        .await;

    let options = ExtractorOptions {
        title_selector: config.title_selector.clone(),
        content_selector: config.content_selector.clone(),
        max_content_length: config.max_content_length,
    };
    let mut extractor = HttpExtractor::new(client.clone(), options);
    if config.respect_robots_txt {
        let policy = RobotsPolicy::load(&client, &config.sitemap_url).await;
        extractor = extractor.with_robots(policy);
    }

    let producer = Arc::new(SiteProducer::new(extractor, config));
    let scheduler = BatchScheduler::new(
        producer,
        Arc::clone(&store),
        config.max_concurrent_batches,
        config.max_workers_per_batch,
        progress.clone(),
    );
    let completed_batches = scheduler.run(&run_id, batches).await;

    let outcome = merge_results(store.as_ref(), &run_id, total_batches).await?;
    store.clear_run(&run_id).await?;

    let stats = build_stats(
        &outcome.pages,
        total_urls,
        total_batches,
        completed_batches,
        outcome.merged_batches,
    );

    let assembler = DocumentAssembler::new(config);
    let document = assembler.assemble(&outcome.pages, Some(total_discovered))?;
    let backup = assembler.write_output(&document)?;

    let _ = progress
        .send(ProgressEvent::Complete {
            stats: stats.clone(),
            output_path: config.output_path.clone(),
            backup_path: backup.map(|p| p.to_string_lossy().to_string()),
        })
        .await;
    Ok(stats)
}

/// Applies the per-category limits, in a fixed category order: blogs, pages,
/// products, then uncategorized. Within a category, sitemap order is kept.
fn select_entries(entries: Vec<SitemapEntry>, config: &RunConfig) -> Vec<SitemapEntry> {
    let tiers = [
        (Some(PageKind::Blog), config.max_blogs),
        (Some(PageKind::Page), config.max_pages),
        (Some(PageKind::Product), config.max_products),
        (None, config.max_uncategorized),
    ];
    let mut selected = Vec::new();
    for (kind, cap) in tiers {
        selected.extend(
            entries
                .iter()
                .filter(|e| e.provisional == kind)
                .take(cap)
                .cloned(),
        );
    }
    selected
}

fn build_stats(
    pages: &[ScrapedPage],
    total_urls: usize,
    total_batches: usize,
    completed_batches: usize,
    merged_batches: usize,
) -> RunStats {
    let count = |kind: PageKind| pages.iter().filter(|p| p.kind == kind).count();
    RunStats {
        total_urls,
        total_batches,
        completed_batches,
        merged_batches,
        scraped_pages: pages.len(),
        blog_count: count(PageKind::Blog),
        page_count: count(PageKind::Page),
        product_count: count(PageKind::Product),
        uncategorized_count: count(PageKind::Uncategorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(loc: &str, provisional: Option<PageKind>) -> SitemapEntry {
        let entry = SitemapEntry::new(loc);
        match provisional {
            Some(kind) => entry.with_provisional(kind),
            None => entry,
        }
    }

    #[test]
    fn test_select_entries_applies_caps_per_tier() {
        let entries = vec![
            entry("https://example.com/blog/1", Some(PageKind::Blog)),
            entry("https://example.com/blog/2", Some(PageKind::Blog)),
            entry("https://example.com/blog/3", Some(PageKind::Blog)),
            entry("https://example.com/about", Some(PageKind::Page)),
            entry("https://example.com/misc", None),
        ];
        let config = RunConfig::builder()
            .sitemap_url("https://example.com/sitemap.xml")
            .max_blogs(2)
            .max_uncategorized(0)
            .build();
        let selected = select_entries(entries, &config);
        let locs: Vec<&str> = selected.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            vec![
                "https://example.com/blog/1",
                "https://example.com/blog/2",
                "https://example.com/about",
            ]
        );
    }

    #[test]
    fn test_select_entries_orders_categories() {
        let entries = vec![
            entry("https://example.com/misc", None),
            entry("https://example.com/product/1", Some(PageKind::Product)),
            entry("https://example.com/blog/1", Some(PageKind::Blog)),
        ];
        let config = RunConfig::builder()
            .sitemap_url("https://example.com/sitemap.xml")
            .build();
        let selected = select_entries(entries, &config);
        let locs: Vec<&str> = selected.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(
            locs,
            vec![
                "https://example.com/blog/1",
                "https://example.com/product/1",
                "https://example.com/misc",
            ]
        );
    }

    #[test]
    fn test_build_stats_counts_categories() {
        let pages = vec![
            ScrapedPage::new("https://example.com/b", "B", PageKind::Blog),
            ScrapedPage::new("https://example.com/p", "P", PageKind::Page),
            ScrapedPage::new("https://example.com/u", "U", PageKind::Uncategorized),
        ];
        let stats = build_stats(&pages, 5, 2, 2, 2);
        assert_eq!(stats.scraped_pages, 3);
        assert_eq!(stats.blog_count, 1);
        assert_eq!(stats.page_count, 1);
        assert_eq!(stats.product_count, 0);
        assert_eq!(stats.uncategorized_count, 1);
    }
}

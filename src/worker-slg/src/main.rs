use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use core_slg::common::logging::setup_logging;
use core_slg::RunConfig;
use worker_slg::{execute, FsBatchStore, ProgressEvent};

/// Generate an llms.txt document from a site's XML sitemap.
#[derive(Debug, Parser)]
#[command(name = "slg-worker", version)]
struct Args {
    /// Sitemap URL, or a plain site URL (the sitemap is then auto-detected).
    url: String,

    /// Site name used for the document title.
    #[arg(long, default_value = "My Website")]
    site_name: String,

    /// Site description; synthesized from scraped content when omitted.
    #[arg(long, default_value = "")]
    site_description: String,

    /// Max page URLs to scrape.
    #[arg(long, default_value_t = 10)]
    max_pages: usize,

    /// Max blog URLs to scrape.
    #[arg(long, default_value_t = 10)]
    max_blogs: usize,

    /// Max product URLs to scrape.
    #[arg(long, default_value_t = 10)]
    max_products: usize,

    /// Max uncategorized URLs to scrape.
    #[arg(long, default_value_t = 10)]
    max_uncategorized: usize,

    /// Max entries in the Detailed Content section.
    #[arg(long, default_value_t = 10)]
    max_detailed: usize,

    /// Truncation length for extracted body text, in characters.
    #[arg(long, default_value_t = 500)]
    max_content_length: usize,

    /// Max child sitemaps expanded from a sitemap index.
    #[arg(long, default_value_t = 5)]
    max_sitemaps: usize,

    /// Max nested links followed when expanding an index page.
    #[arg(long, default_value_t = 5)]
    max_nested_links: usize,

    /// URLs per batch.
    #[arg(long, default_value_t = 50)]
    batch_size: usize,

    /// Batches run concurrently.
    #[arg(long, default_value_t = 10)]
    max_concurrent_batches: usize,

    /// URL fetches run concurrently within one batch.
    #[arg(long, default_value_t = 4)]
    max_workers_per_batch: usize,

    /// Delay in seconds between sequential fetches.
    #[arg(long, default_value_t = 1.0)]
    request_delay: f64,

    /// Consult robots.txt before fetching pages.
    #[arg(long)]
    respect_robots: bool,

    /// Output file path.
    #[arg(long, default_value = "llms.txt")]
    output: String,

    /// Overwrite an existing output file instead of backing it up.
    #[arg(long)]
    no_backup: bool,

    /// Topics used when fewer than three are derived from content.
    #[arg(long, value_delimiter = ',')]
    default_topics: Vec<String>,

    /// CSS selector(s) tried first for page titles.
    #[arg(long)]
    title_selector: Option<String>,

    /// CSS selector(s) tried first for main content.
    #[arg(long)]
    content_selector: Option<String>,

    /// File containing a custom output template with ${name} placeholders.
    #[arg(long)]
    template_file: Option<PathBuf>,

    /// Directory for durable batch results. Defaults to SLG_STORE_DIR or a
    /// directory under the system temp dir.
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let mut builder = RunConfig::builder()
            .sitemap_url(self.url)
            .site_name(self.site_name)
            .site_description(self.site_description)
            .max_pages(self.max_pages)
            .max_blogs(self.max_blogs)
            .max_products(self.max_products)
            .max_uncategorized(self.max_uncategorized)
            .max_detailed(self.max_detailed)
            .max_content_length(self.max_content_length)
            .max_sitemaps(self.max_sitemaps)
            .max_nested_links(self.max_nested_links)
            .batch_size(self.batch_size)
            .max_concurrent_batches(self.max_concurrent_batches)
            .max_workers_per_batch(self.max_workers_per_batch)
            .request_delay(self.request_delay)
            .respect_robots_txt(self.respect_robots)
            .output_path(self.output)
            .backup_existing(!self.no_backup)
            .default_topics(self.default_topics);

        if let Some(selector) = self.title_selector {
            builder = builder.title_selector(selector);
        }
        if let Some(selector) = self.content_selector {
            builder = builder.content_selector(selector);
        }
        if let Some(path) = self.template_file {
            let template = std::fs::read_to_string(&path)?;
            builder = builder.template(template);
        }
        Ok(builder.build())
    }
}

fn store_root(arg: Option<PathBuf>) -> PathBuf {
    arg.or_else(|| std::env::var_os("SLG_STORE_DIR").map(PathBuf::from))
        .unwrap_or_else(|| std::env::temp_dir().join("slg-batches"))
}

/// Tails progress events into log output until the run ends.
async fn report_progress(mut rx: mpsc::Receiver<ProgressEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Discovered { total_urls, total_batches } => {
                tracing::info!("Discovered {} URLs across {} batches", total_urls, total_batches);
            }
            ProgressEvent::BatchCompleted { batch_id, pages, percent, .. } => {
                tracing::info!("Batch {} done ({} pages) - {:.0}% complete", batch_id, pages, percent);
            }
            ProgressEvent::BatchFailed { batch_id, error } => {
                tracing::warn!("Batch {} failed: {}", batch_id, error);
            }
            ProgressEvent::Complete { stats, output_path, backup_path } => {
                if let Some(backup) = backup_path {
                    tracing::info!("Previous output backed up to {}", backup);
                }
                tracing::info!(
                    "Wrote {} with {} pages ({} blog, {} page, {} product, {} other)",
                    output_path,
                    stats.scraped_pages,
                    stats.blog_count,
                    stats.page_count,
                    stats.product_count,
                    stats.uncategorized_count
                );
            }
            ProgressEvent::Error { message } => {
                tracing::error!("Run failed: {}", message);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if it exists
    dotenvy::dotenv().ok();

    setup_logging("worker_slg=info,core_slg=info");

    let args = Args::parse();
    let store = Arc::new(FsBatchStore::new(store_root(args.store_dir.clone())));
    let config = args.into_config()?;

    let (tx, rx) = mpsc::channel(64);
    let reporter = tokio::spawn(report_progress(rx));

    let result = execute(config, store, tx).await;
    let _ = reporter.await;

    result?;
    Ok(())
}

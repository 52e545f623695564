//! Pipeline walk-through with a fake producer: partition, schedule, merge,
//! assemble, write.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use core_slg::models::{PageKind, SitemapEntry};
use core_slg::{DocumentAssembler, RunConfig, ScrapedPage};
use worker_slg::{
    merge_results, partition, BatchScheduler, MemoryBatchStore, PageProducer, ProgressEvent,
};

/// Produces deterministic pages: the final category mirrors the provisional
/// type, and lastmod carries through.
struct ScriptedProducer;

#[async_trait]
impl PageProducer for ScriptedProducer {
    async fn produce(&self, entry: &SitemapEntry) -> core_slg::Result<ScrapedPage> {
        let kind = entry.provisional.unwrap_or(PageKind::Uncategorized);
        let title = entry.loc.rsplit('/').next().unwrap_or("page").to_string();
        let mut page = ScrapedPage::new(&entry.loc, &title, kind);
        page.description = format!("Description of {title}.");
        page.body_text = format!("Body text for {title}, long enough to appear in detail.");
        page.lastmod = entry.lastmod.clone();
        Ok(page)
    }
}

fn blog(slug: &str, lastmod: &str) -> SitemapEntry {
    SitemapEntry::new(format!("https://example.com/blog/{slug}"))
        .with_provisional(PageKind::Blog)
        .with_lastmod(lastmod)
}

fn page(slug: &str) -> SitemapEntry {
    SitemapEntry::new(format!("https://example.com/{slug}")).with_provisional(PageKind::Page)
}

#[tokio::test]
async fn test_sitemap_to_document() {
    // Caps applied upstream: 2 of 3 blogs kept, both pages kept.
    let selected = vec![
        blog("first-post", "2024-05-01"),
        blog("second-post", "2024-06-01"),
        page("about"),
        page("contact"),
    ];

    let batches = partition(selected, 2);
    assert_eq!(batches.len(), 2);

    let store = Arc::new(MemoryBatchStore::new());
    let (tx, mut rx) = mpsc::channel(64);
    let scheduler = BatchScheduler::new(Arc::new(ScriptedProducer), store.clone(), 2, 2, tx);
    let completed = scheduler.run("run-e2e", batches).await;
    assert_eq!(completed, 2);
    drop(scheduler);

    let mut completions = 0;
    while let Some(event) = rx.recv().await {
        if matches!(event, ProgressEvent::BatchCompleted { .. }) {
            completions += 1;
        }
    }
    assert_eq!(completions, 2);

    let outcome = merge_results(store.as_ref(), "run-e2e", 2).await.unwrap();
    assert_eq!(outcome.pages.len(), 4);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("llms.txt");
    let config = RunConfig::builder()
        .sitemap_url("https://example.com/sitemap.xml")
        .site_name("Example Site")
        .output_path(out.to_string_lossy().to_string())
        .build();
    let assembler = DocumentAssembler::new(&config);
    let document = assembler.assemble(&outcome.pages, Some(5)).unwrap();
    assembler.write_output(&document).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("# Example Site"));
    assert!(written.contains("## Recent Blog Posts"));
    assert!(written.contains("## Important Pages"));
    assert!(!written.contains("## Products"));
    assert!(written.contains("- URLs discovered: 5"));
    assert!(written.contains("- Total pages scraped: 4"));
    assert!(written.contains("- Pages listed: 2"));
    assert!(written.contains("- Blog posts listed: 2"));
    assert!(written.contains("- Last updated: 2024-06-01"));

    // Blog entries most recent first.
    let second = written.find("[second-post]").unwrap();
    let first = written.find("[first-post]").unwrap();
    assert!(second < first);
}

#[tokio::test]
async fn test_rerun_backs_up_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("llms.txt");
    let config = RunConfig::builder()
        .sitemap_url("https://example.com/sitemap.xml")
        .site_name("Example Site")
        .output_path(out.to_string_lossy().to_string())
        .build();
    let assembler = DocumentAssembler::new(&config);

    assembler.write_output("first run").unwrap();
    let backup = assembler.write_output("second run").unwrap();

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "second run");
    let backup = backup.expect("second write should back up the first");
    assert!(backup
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("llms.txt.backup."));
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), "first run");
}

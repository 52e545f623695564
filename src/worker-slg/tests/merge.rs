//! Merge semantics: sequential reads, gap handling, single consumption.

use core_slg::models::PageKind;
use core_slg::ScrapedPage;
use worker_slg::{merge_results, BatchResult, BatchStore, MemoryBatchStore};

fn result(batch_id: usize, urls: &[&str]) -> BatchResult {
    let mut result = BatchResult::new(batch_id);
    for url in urls {
        result
            .content
            .insert(url.to_string(), ScrapedPage::new(*url, "Title", PageKind::Page));
    }
    result
}

#[tokio::test]
async fn test_merges_all_batches_in_order() {
    let store = MemoryBatchStore::new();
    store.put("run-1", &result(0, &["https://example.com/a"])).await.unwrap();
    store.put("run-1", &result(1, &["https://example.com/b"])).await.unwrap();
    store.put("run-1", &result(2, &["https://example.com/c"])).await.unwrap();

    let outcome = merge_results(&store, "run-1", 3).await.unwrap();
    assert_eq!(outcome.merged_batches, 3);
    let urls: Vec<&str> = outcome.pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://example.com/a", "https://example.com/b", "https://example.com/c"]
    );
}

#[tokio::test]
async fn test_stops_at_first_gap() {
    let store = MemoryBatchStore::new();
    store.put("run-1", &result(0, &["https://example.com/a"])).await.unwrap();
    // Batch 1 never completed; batch 2 did.
    store.put("run-1", &result(2, &["https://example.com/c"])).await.unwrap();

    let outcome = merge_results(&store, "run-1", 3).await.unwrap();
    assert_eq!(outcome.merged_batches, 1);
    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.pages[0].url, "https://example.com/a");

    // Batch 2 is still in the store, for cleanup to remove.
    assert!(store.take("run-1", 2).await.unwrap().is_some());
}

#[tokio::test]
async fn test_first_write_wins_for_duplicate_urls() {
    let store = MemoryBatchStore::new();
    let mut early = result(0, &[]);
    let mut page = ScrapedPage::new("https://example.com/dup", "Early", PageKind::Blog);
    page.description = "from batch 0".to_string();
    early.content.insert(page.url.clone(), page);
    store.put("run-1", &early).await.unwrap();

    let mut late = result(1, &[]);
    let mut page = ScrapedPage::new("https://example.com/dup", "Late", PageKind::Blog);
    page.description = "from batch 1".to_string();
    late.content.insert(page.url.clone(), page);
    store.put("run-1", &late).await.unwrap();

    let outcome = merge_results(&store, "run-1", 2).await.unwrap();
    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.pages[0].title, "Early");
}

#[tokio::test]
async fn test_results_consumed_exactly_once() {
    let store = MemoryBatchStore::new();
    store.put("run-1", &result(0, &["https://example.com/a"])).await.unwrap();

    let first = merge_results(&store, "run-1", 1).await.unwrap();
    assert_eq!(first.merged_batches, 1);

    let second = merge_results(&store, "run-1", 1).await.unwrap();
    assert_eq!(second.merged_batches, 0);
    assert!(second.pages.is_empty());
}

#[tokio::test]
async fn test_empty_run_merges_to_nothing() {
    let store = MemoryBatchStore::new();
    let outcome = merge_results(&store, "run-1", 0).await.unwrap();
    assert_eq!(outcome.merged_batches, 0);
    assert!(outcome.pages.is_empty());
}

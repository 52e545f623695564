//! Batch partitioning and the two-level concurrent scheduler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use core_slg::models::SitemapEntry;
use core_slg::ScrapedPage;

use crate::progress::{percent_complete, ProgressEvent};
use crate::store::{BatchResult, BatchStore};

/// A contiguous slice of the run's URL list. Batch ids start at 0 and have
/// no holes, which is what lets the merge step read until the first gap.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub batch_id: usize,
    pub entries: Vec<SitemapEntry>,
}

/// Splits the selected URL list into batches of at most `batch_size`.
pub fn partition(entries: Vec<SitemapEntry>, batch_size: usize) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut entries = entries.into_iter().peekable();
    let mut batch_id = 0;
    while entries.peek().is_some() {
        let chunk: Vec<SitemapEntry> = entries.by_ref().take(batch_size).collect();
        batches.push(Batch { batch_id, entries: chunk });
        batch_id += 1;
    }
    batches
}

/// Turns one sitemap entry into a scraped page. The real implementation
/// fetches, optionally expands, and classifies; tests substitute fakes.
#[async_trait]
pub trait PageProducer: Send + Sync {
    async fn produce(&self, entry: &SitemapEntry) -> core_slg::Result<ScrapedPage>;
}

/// Runs batches with bounded concurrency at two levels: at most
/// `max_concurrent_batches` batches in flight, each fetching at most
/// `max_workers_per_batch` URLs at a time.
pub struct BatchScheduler {
    producer: Arc<dyn PageProducer>,
    store: Arc<dyn BatchStore>,
    max_concurrent_batches: usize,
    max_workers_per_batch: usize,
    progress: mpsc::Sender<ProgressEvent>,
}

impl BatchScheduler {
    pub fn new(
        producer: Arc<dyn PageProducer>,
        store: Arc<dyn BatchStore>,
        max_concurrent_batches: usize,
        max_workers_per_batch: usize,
        progress: mpsc::Sender<ProgressEvent>,
    ) -> Self {
        Self {
            producer,
            store,
            max_concurrent_batches,
            max_workers_per_batch,
            progress,
        }
    }

    /// Processes every batch, persisting each result as it completes.
    /// Returns how many batches were persisted; failed batches are reported
    /// and skipped, never fatal.
    pub async fn run(&self, run_id: &str, batches: Vec<Batch>) -> usize {
        let total_batches = batches.len();
        let total_requested: usize = batches.iter().map(|b| b.entries.len()).sum();
        let completed = AtomicUsize::new(0);
        let scraped = AtomicUsize::new(0);

        futures::stream::iter(batches)
            .map(|batch| self.process_batch(run_id, batch, total_batches, total_requested, &completed, &scraped))
            .buffer_unordered(self.max_concurrent_batches)
            .collect::<Vec<()>>()
            .await;

        completed.load(Ordering::SeqCst)
    }

    async fn process_batch(
        &self,
        run_id: &str,
        batch: Batch,
        total_batches: usize,
        total_requested: usize,
        completed: &AtomicUsize,
        scraped: &AtomicUsize,
    ) {
        let batch_id = batch.batch_id;
        tracing::debug!("Starting batch {} with {} URLs", batch_id, batch.entries.len());

        // `buffered` (not `buffer_unordered`) keeps pages in entry order, so
        // persisted content order is deterministic.
        let pages: Vec<Option<ScrapedPage>> = futures::stream::iter(batch.entries.iter())
            .map(|entry| {
                let producer = Arc::clone(&self.producer);
                async move {
                    match producer.produce(entry).await {
                        Ok(page) => Some(page),
                        Err(e) => {
                            tracing::warn!("Skipping {} in batch {}: {}", entry.loc, batch_id, e);
                            None
                        }
                    }
                }
            })
            .buffered(self.max_workers_per_batch)
            .collect()
            .await;

        let mut result = BatchResult::new(batch_id);
        for page in pages.into_iter().flatten() {
            result.content.insert(page.url.clone(), page);
        }

        match self.store.put(run_id, &result).await {
            Ok(()) => {
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                let scraped_so_far = scraped.fetch_add(result.content.len(), Ordering::SeqCst)
                    + result.content.len();
                self.emit(ProgressEvent::BatchCompleted {
                    batch_id,
                    pages: result.content.len(),
                    scraped_so_far,
                    total_requested,
                    completed_batches: done,
                    total_batches,
                    percent: percent_complete(done, total_batches),
                })
                .await;
            }
            Err(e) => {
                tracing::error!("Failed to persist batch {}: {}", batch_id, e);
                self.emit(ProgressEvent::BatchFailed { batch_id, error: e.to_string() }).await;
            }
        }
    }

    /// Progress delivery is best-effort; a departed consumer never stalls
    /// the run.
    async fn emit(&self, event: ProgressEvent) {
        if self.progress.send(event).await.is_err() {
            tracing::debug!("Progress consumer gone; event dropped");
        }
    }
}

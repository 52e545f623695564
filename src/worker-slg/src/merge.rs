//! Merging persisted batch results into the final page list.

use indexmap::IndexMap;

use core_slg::ScrapedPage;

use crate::store::{BatchStore, StoreError};

/// What the merge step recovered from the store.
#[derive(Debug)]
pub struct MergeOutcome {
    /// Union of all merged batches, in batch order. The first page stored
    /// for a URL wins; later duplicates are dropped.
    pub pages: Vec<ScrapedPage>,
    /// Batches folded in before the first gap.
    pub merged_batches: usize,
}

/// Reads batch results from id 0 upward until the first gap, consuming each
/// as it goes.
///
/// Batch ids are assigned contiguously, so a missing id means that batch
/// never completed; everything past it is unreachable by design and left in
/// the store for [`BatchStore::clear_run`] to sweep.
pub async fn merge_results(
    store: &dyn BatchStore,
    run_id: &str,
    total_batches: usize,
) -> Result<MergeOutcome, StoreError> {
    let mut merged: IndexMap<String, ScrapedPage> = IndexMap::new();
    let mut merged_batches = 0;

    for batch_id in 0.. {
        match store.take(run_id, batch_id).await? {
            Some(result) => {
                for (url, page) in result.content {
                    merged.entry(url).or_insert(page);
                }
                merged_batches += 1;
            }
            None => break,
        }
    }

    if merged_batches < total_batches {
        tracing::warn!(
            "Merged {} of {} batches for run {}; stopping at first gap",
            merged_batches,
            total_batches,
            run_id
        );
    } else {
        tracing::info!("Merged all {} batches for run {}", merged_batches, run_id);
    }

    Ok(MergeOutcome {
        pages: merged.into_values().collect(),
        merged_batches,
    })
}

//! Progress reporting for a generation run.
//!
//! The scheduler and run driver emit [`ProgressEvent`]s over an mpsc channel;
//! the CLI tails them into log output. [`RunState`] folds the same events
//! into a queryable snapshot.

use serde::Serialize;

/// Aggregate counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub total_urls: usize,
    pub total_batches: usize,
    pub completed_batches: usize,
    /// Batches actually folded into the document; trails `completed_batches`
    /// when a gap cut the merge short.
    pub merged_batches: usize,
    pub scraped_pages: usize,
    pub blog_count: usize,
    pub page_count: usize,
    pub product_count: usize,
    pub uncategorized_count: usize,
}

/// What happened, as it happens.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Sitemap resolution finished and work has been partitioned.
    Discovered { total_urls: usize, total_batches: usize },
    /// One batch scraped and persisted.
    BatchCompleted {
        batch_id: usize,
        pages: usize,
        scraped_so_far: usize,
        total_requested: usize,
        completed_batches: usize,
        total_batches: usize,
        percent: f64,
    },
    /// One batch failed to persist; the run continues without it.
    BatchFailed { batch_id: usize, error: String },
    /// The document was written.
    Complete {
        stats: RunStats,
        output_path: String,
        backup_path: Option<String>,
    },
    /// The run aborted before producing a document.
    Error { message: String },
}

/// Completion percentage, as batches completed out of batches total.
pub fn percent_complete(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Event-folded view of a run in flight.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub total_urls: usize,
    pub total_batches: usize,
    pub completed_batches: usize,
    pub failed_batches: usize,
    pub finished: bool,
    pub failed: bool,
}

impl RunState {
    pub fn apply(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Discovered { total_urls, total_batches } => {
                self.total_urls = *total_urls;
                self.total_batches = *total_batches;
            }
            ProgressEvent::BatchCompleted { completed_batches, .. } => {
                self.completed_batches = *completed_batches;
            }
            ProgressEvent::BatchFailed { .. } => {
                self.failed_batches += 1;
            }
            ProgressEvent::Complete { .. } => {
                self.finished = true;
            }
            ProgressEvent::Error { .. } => {
                self.finished = true;
                self.failed = true;
            }
        }
    }

    pub fn percent(&self) -> f64 {
        percent_complete(self.completed_batches, self.total_batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_complete() {
        assert_eq!(percent_complete(0, 4), 0.0);
        assert_eq!(percent_complete(1, 4), 25.0);
        assert_eq!(percent_complete(4, 4), 100.0);
        // Zero total means there was nothing to do.
        assert_eq!(percent_complete(0, 0), 100.0);
    }

    #[test]
    fn test_state_folds_events() {
        let mut state = RunState::default();
        state.apply(&ProgressEvent::Discovered { total_urls: 100, total_batches: 2 });
        state.apply(&ProgressEvent::BatchCompleted {
            batch_id: 0,
            pages: 50,
            scraped_so_far: 50,
            total_requested: 100,
            completed_batches: 1,
            total_batches: 2,
            percent: 50.0,
        });
        assert_eq!(state.percent(), 50.0);
        assert!(!state.finished);

        state.apply(&ProgressEvent::BatchFailed { batch_id: 1, error: "boom".to_string() });
        assert_eq!(state.failed_batches, 1);

        state.apply(&ProgressEvent::Complete {
            stats: RunStats::default(),
            output_path: "llms.txt".to_string(),
            backup_path: None,
        });
        assert!(state.finished);
        assert!(!state.failed);
    }
}

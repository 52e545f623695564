//! Worker crate: batch scheduling, durable batch storage, result merging,
//! and the end-to-end generation run. The scraping and assembly logic lives
//! in `core-slg`; this crate drives it.

pub mod batch;
pub mod errors;
pub mod merge;
pub mod progress;
pub mod run;
pub mod store;

pub use batch::{partition, Batch, BatchScheduler, PageProducer};
pub use errors::Error;
pub use merge::{merge_results, MergeOutcome};
pub use progress::{ProgressEvent, RunState, RunStats};
pub use run::{execute, SiteProducer};
pub use store::{BatchResult, BatchStore, FsBatchStore, MemoryBatchStore, StoreError};

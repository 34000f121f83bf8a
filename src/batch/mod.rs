//! 批处理模块：有界并发的分批执行、逐项结果收集与运行汇总。
//!
//! # Bounded Concurrent Batch Module
//!
//! This module runs an asynchronous operation over a list of work items in
//! fixed-size groups, paces successive groups with a delay, and aggregates
//! the per-item results.
//!
//! ## Overview
//!
//! Batching is used for:
//! - Bounding how many provider calls are in flight at once
//! - Keeping a large send within provider rate limits via inter-batch pauses
//! - Isolating per-item failures so one bad recipient never aborts a campaign
//! - Reporting progress after every batch
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchRunner`] | Executes items batch by batch, preserving input order |
//! | [`BatchRunConfig`] | Batch size, delay, large-volume heuristic, per-item timeout |
//! | [`ItemOutcome`] | Success or failure record for one item |
//! | [`BatchCompletion`] | Progress event emitted after each batch |
//! | [`RunSummary`] | Counts, success rate and error categories for a run |
//!
//! ## Example
//!
//! ```rust,no_run
//! use campaign_dispatch::batch::{summarize, BatchRunConfig, BatchRunner};
//!
//! # async fn demo() -> campaign_dispatch::Result<()> {
//! let runner = BatchRunner::with_config(BatchRunConfig::new().with_batch_size(3))
//!     .on_batch_complete(|e| println!("batch {}/{} done", e.batch_number, e.total_batches));
//!
//! let outcomes = runner
//!     .run(vec!["a@example.com", "b@example.com"], |to, _index| async move {
//!         Ok::<_, String>(format!("sent to {to}"))
//!     })
//!     .await?;
//!
//! let summary = summarize(&outcomes);
//! assert!(summary.is_full_success);
//! # Ok(())
//! # }
//! ```

mod config;
mod outcome;
mod runner;
mod summary;

pub use config::{
    BatchRunConfig, ExecutionPlan, LargeVolumeTuning, ENV_BATCH_DELAY_MS, ENV_BATCH_SIZE,
    ENV_ITEM_TIMEOUT_MS, ENV_LARGE_VOLUME,
};
pub use outcome::{BatchCompletion, ItemOutcome, UNKNOWN_ERROR};
pub use runner::{BatchRunner, CompletionCallback};
pub use summary::{error_label, report, summarize, RunSummary};

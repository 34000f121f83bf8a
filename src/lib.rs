//! # campaign-dispatch
//!
//! 营销邮件批量发送的核心运行时：有界并发分批执行器与定时发送处理。
//!
//! Bounded concurrent batch execution and scheduled email dispatch for
//! marketing campaigns.
//!
//! ## Overview
//!
//! Sending a campaign means calling a mail provider once per recipient. This
//! crate runs those calls in fixed-size concurrent batches with a pause
//! between batches, records a success or failure for every recipient in input
//! order, and summarizes the run for the dashboard.
//!
//! ## Key Features
//!
//! - **Batch Runner**: [`batch::BatchRunner`] with ordered outcomes and failure isolation
//! - **Large-Volume Heuristic**: bigger batches and shorter pauses for very large sends
//! - **Progress Events**: per-batch [`batch::BatchCompletion`] callbacks
//! - **Summaries**: [`batch::RunSummary`] with success rate and error categories
//! - **Scheduled Dispatch**: [`dispatch::Dispatcher`] writing `pendente`/`enviado`/`erro` back
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use campaign_dispatch::batch::{report, summarize, BatchRunConfig, BatchRunner};
//!
//! #[tokio::main]
//! async fn main() -> campaign_dispatch::Result<()> {
//!     let runner = BatchRunner::with_config(BatchRunConfig::new().with_env_overrides());
//!     let recipients = vec!["a@example.com", "b@example.com", "c@example.com"];
//!
//!     let outcomes = runner
//!         .run(recipients, |to, _| async move { Ok::<_, String>(to.len()) })
//!         .await?;
//!
//!     report(&summarize(&outcomes), "send campaign");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | Bounded concurrent batch runner, outcomes and summaries |
//! | [`dispatch`] | Scheduled email records, sender seam and dispatcher |
//! | [`error`] | Crate error type |

pub mod batch;
pub mod dispatch;

pub use batch::{BatchRunConfig, BatchRunner, ItemOutcome, RunSummary};
pub use dispatch::{DeliveryStatus, Dispatcher, EmailSender, ScheduledEmail};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};

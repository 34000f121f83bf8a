//! Periodic processing of due scheduled emails.

use super::email::{DeliveryStatus, ScheduledEmail};
use super::sender::EmailSender;
use crate::batch::{
    summarize, BatchCompletion, BatchRunConfig, BatchRunner, ItemOutcome, RunSummary,
};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Result of one dispatch pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Ids of the emails sent in this pass, in processing order.
    pub attempted: Vec<String>,
    pub summary: RunSummary,
}

pub struct Dispatcher<S> {
    sender: S,
    runner: BatchRunner,
}

impl<S: EmailSender> Dispatcher<S> {
    pub fn new(sender: S, config: BatchRunConfig) -> Self {
        Self {
            sender,
            runner: BatchRunner::with_config(config),
        }
    }

    pub fn on_batch_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&BatchCompletion) + Send + Sync + 'static,
    {
        self.runner = self.runner.on_batch_complete(f);
        self
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Send every pending email due at `now` (unix seconds) and write the
    /// resulting status back into `emails`.
    pub async fn dispatch_due(
        &self,
        emails: &mut [ScheduledEmail],
        now: u64,
    ) -> Result<DispatchReport> {
        let due: Vec<usize> = emails
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_pending() && e.is_due(now))
            .map(|(i, _)| i)
            .collect();

        info!(due = due.len(), total = emails.len(), "dispatching scheduled emails");

        let batch: Vec<ScheduledEmail> = due.iter().map(|&i| emails[i].clone()).collect();
        // Outcomes only keep the error text, so the provider's classification
        // is captured here, indexed like `batch`.
        let permanent: Vec<AtomicBool> = due.iter().map(|_| AtomicBool::new(false)).collect();
        let sender = &self.sender;
        let permanent_ref = &permanent;
        let outcomes = self
            .runner
            .run(batch, |email, index| async move {
                let sent = sender.send(&email).await;
                if let Err(e) = &sent {
                    permanent_ref[index].store(!e.is_transient(), Ordering::Relaxed);
                }
                sent
            })
            .await?;

        let summary = summarize(&outcomes);
        let mut attempted = Vec::with_capacity(due.len());
        for ((i, outcome), permanent) in due.into_iter().zip(outcomes).zip(&permanent) {
            let email = &mut emails[i];
            attempted.push(email.id.clone());
            match outcome {
                ItemOutcome::Success { result } => email.mark_sent(result),
                ItemOutcome::Failure { error } => {
                    email.mark_failed(error, permanent.load(Ordering::Relaxed))
                }
            }
        }

        summary.log("dispatch scheduled emails");
        Ok(DispatchReport { attempted, summary })
    }
}

/// Put failed emails back in the queue. Permanent failures stay in `erro`.
/// The last error is kept for display until the next attempt overwrites it.
/// Returns how many were reset.
pub fn retry_failed(emails: &mut [ScheduledEmail]) -> usize {
    let mut reset = 0;
    for email in emails
        .iter_mut()
        .filter(|e| e.status == DeliveryStatus::Failed && !e.permanent_failure)
    {
        email.status = DeliveryStatus::Pending;
        reset += 1;
    }
    reset
}

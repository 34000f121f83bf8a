//! Bounded concurrent batch runner.

use super::config::BatchRunConfig;
use super::outcome::{BatchCompletion, ItemOutcome, UNKNOWN_ERROR};
use crate::Result;
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Callback invoked synchronously after every batch.
pub type CompletionCallback = Arc<dyn Fn(&BatchCompletion) + Send + Sync>;

/// Runs an async operation over a sequence of items in strictly sequential,
/// internally concurrent batches.
///
/// - At most `batch_size` operations are in flight at any instant.
/// - Batch N+1 starts only after every item of batch N has settled and the
///   inter-batch delay has elapsed.
/// - `outcomes[i]` always corresponds to `items[i]`.
/// - Item failures (including panics and optional timeouts) are recorded as
///   [`ItemOutcome::Failure`] and never abort the run or affect siblings.
#[derive(Clone, Default)]
pub struct BatchRunner {
    config: BatchRunConfig,
    on_batch_complete: Option<CompletionCallback>,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BatchRunConfig) -> Self {
        Self {
            config,
            on_batch_complete: None,
        }
    }

    pub fn config(&self) -> &BatchRunConfig {
        &self.config
    }

    pub fn on_batch_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&BatchCompletion) + Send + Sync + 'static,
    {
        self.on_batch_complete = Some(Arc::new(f));
        self
    }

    /// Run `operation(item, global_index)` over every item.
    ///
    /// Fails only when the configuration is malformed.
    pub async fn run<T, R, E, F, Fut>(
        &self,
        items: Vec<T>,
        operation: F,
    ) -> Result<Vec<ItemOutcome<R>>>
    where
        F: Fn(T, usize) -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        E: Display,
    {
        self.config.validate()?;

        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let plan = self.config.plan(total);
        let item_timeout = self.config.item_timeout();
        let start = Instant::now();
        debug!(
            items = total,
            batch_size = plan.batch_size,
            total_batches = plan.total_batches,
            delay_ms = plan.delay.as_millis() as u64,
            large_volume = plan.large_volume,
            "starting batch run"
        );

        let mut outcomes = Vec::with_capacity(total);
        let mut pending = items.into_iter().enumerate();
        let operation = &operation;

        for batch_number in 1..=plan.total_batches {
            let settled = join_all(
                pending
                    .by_ref()
                    .take(plan.batch_size)
                    .map(|(index, item)| settle(move || operation(item, index), item_timeout)),
            )
            .await;

            let failed = settled.iter().filter(|o| !o.is_success()).count();
            let event = BatchCompletion {
                batch_number,
                total_batches: plan.total_batches,
                succeeded: settled.len() - failed,
                failed,
            };
            outcomes.extend(settled);

            debug!(
                batch = batch_number,
                total_batches = plan.total_batches,
                succeeded = event.succeeded,
                failed = event.failed,
                "batch settled"
            );
            if let Some(cb) = &self.on_batch_complete {
                cb(&event);
            }

            if batch_number < plan.total_batches && !plan.delay.is_zero() {
                tokio::time::sleep(plan.delay).await;
            }
        }

        debug!(
            items = total,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch run finished"
        );
        Ok(outcomes)
    }
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("config", &self.config)
            .field("on_batch_complete", &self.on_batch_complete.is_some())
            .finish()
    }
}

async fn settle<R, E, M, Fut>(start: M, item_timeout: Option<Duration>) -> ItemOutcome<R>
where
    M: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<R, E>>,
    E: Display,
{
    // The operation may panic before it hands back a future.
    let fut = match std::panic::catch_unwind(AssertUnwindSafe(start)) {
        Ok(fut) => fut,
        Err(payload) => return ItemOutcome::failure(panic_message(payload.as_ref())),
    };
    let guarded = AssertUnwindSafe(fut).catch_unwind();
    let settled = match item_timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(r) => r,
            Err(_) => {
                return ItemOutcome::failure(format!(
                    "Timeout: operation exceeded {}ms",
                    limit.as_millis()
                ))
            }
        },
        None => guarded.await,
    };
    match settled {
        Ok(r) => r.into(),
        Err(payload) => ItemOutcome::failure(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

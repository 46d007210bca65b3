//! Batch Writer
//!
//! Managed key-value stores accept only a handful of items per batch-write
//! request and may refuse part of a request under load. The batch writer
//! turns "write these N records" into a sequence of bounded requests and keeps
//! resubmitting refused records until everything is durable or the retry
//! budget runs out.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │  write_all(N recs) │
//! └─────────┬──────────┘
//!           │ split into groups of ≤ max_batch_size
//!           ▼
//! ┌────────────────────┐   rejected subset   ┌──────────────┐
//! │  batch_write(grp)  │ ──────────────────→ │ backoff, then │
//! │  one at a time     │ ←────────────────── │ resubmit      │
//! └─────────┬──────────┘                     └──────────────┘
//!           │ all groups done
//!           ▼
//!        Ok(N)
//! ```
//!
//! ## Failure Semantics
//!
//! - Only the rejected subset of a group is resubmitted.
//! - Throttled/unavailable request errors consume the same retry budget.
//! - When the budget is exhausted, or the store returns a permanent error,
//!   the writer stops and returns `ClientError::PartialWrite` with the count
//!   written so far and every record not yet durable (the failed group's
//!   remainder followed by all groups never submitted).
//! - Not transactional. Records are keyed by `(subjectKey, timestamp)`, so
//!   resubmitting an `unwritten` list is safe.
//!
//! ## Backpressure
//!
//! Exactly one batch request is outstanding at a time.

use crate::error::{ClientError, Result, StoreError};
use crate::retry::RetryPolicy;
use crate::store::RangeStore;
use rangeseries_core::EventRecord;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

/// Drives bounded batch-write requests against one table.
#[derive(Clone)]
pub struct BatchWriter {
    store: Arc<dyn RangeStore>,
    table: String,
    max_batch_size: usize,
    retry_policy: RetryPolicy,
    jitter: bool,
}

impl BatchWriter {
    /// Group size is the smaller of `max_batch_size` and the store's own limit.
    pub fn new(
        store: Arc<dyn RangeStore>,
        table: impl Into<String>,
        max_batch_size: usize,
        retry_policy: RetryPolicy,
    ) -> Self {
        let max_batch_size = max_batch_size.min(store.max_batch_size()).max(1);
        Self {
            store,
            table: table.into(),
            max_batch_size,
            retry_policy,
            jitter: true,
        }
    }

    /// Disable backoff jitter (deterministic waits).
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Write every record, returning how many were written (always `records.len()` on success).
    pub async fn write_all(&self, records: Vec<EventRecord>) -> Result<usize> {
        let total = records.len();
        if total == 0 {
            return Ok(0);
        }

        debug!(
            table = %self.table,
            records = total,
            max_batch_size = self.max_batch_size,
            "Writing records in batches"
        );

        let mut written = 0;
        let mut remaining = records.into_iter();
        loop {
            let group: Vec<EventRecord> = remaining.by_ref().take(self.max_batch_size).collect();
            if group.is_empty() {
                break;
            }

            match self.write_group(group).await {
                Ok(count) => {
                    written += count;
                    trace!(table = %self.table, written, total, "Group written");
                }
                Err((count, mut unwritten, source)) => {
                    written += count;
                    unwritten.extend(remaining);
                    warn!(
                        table = %self.table,
                        written,
                        unwritten = unwritten.len(),
                        "Batch write gave up"
                    );
                    return Err(ClientError::PartialWrite {
                        written,
                        unwritten,
                        source,
                    });
                }
            }
        }

        Ok(written)
    }

    /// Write one group, resubmitting rejected records.
    ///
    /// On failure returns `(written, unwritten, cause)` for this group.
    async fn write_group(
        &self,
        group: Vec<EventRecord>,
    ) -> std::result::Result<usize, (usize, Vec<EventRecord>, Option<StoreError>)> {
        let mut pending = group;
        let mut written = 0;
        let mut attempt = 0;

        loop {
            let submitted = pending.len();
            let cause = match self.store.batch_write(&self.table, pending.clone()).await {
                Ok(outcome) => {
                    written += outcome.written;
                    if outcome.rejected.is_empty() {
                        if attempt > 0 {
                            debug!(attempt = attempt + 1, "Group succeeded after retry");
                        }
                        return Ok(written);
                    }
                    trace!(
                        submitted,
                        rejected = outcome.rejected.len(),
                        "Store rejected part of the group"
                    );
                    pending = outcome.rejected;
                    None
                }
                Err(e) if self.retry_policy.is_retryable(e.kind()) => Some(e),
                Err(e) => {
                    warn!(
                        kind = %e.kind(),
                        message = e.message(),
                        "Non-retryable store error, giving up"
                    );
                    return Err((written, pending, Some(e)));
                }
            };

            if attempt >= self.retry_policy.max_retries {
                warn!(
                    attempt = attempt + 1,
                    max_retries = self.retry_policy.max_retries,
                    pending = pending.len(),
                    "Max retries exhausted, giving up"
                );
                return Err((written, pending, cause));
            }

            let backoff = self.backoff(attempt);
            warn!(
                attempt = attempt + 1,
                max_retries = self.retry_policy.max_retries,
                backoff_ms = backoff.as_millis() as u64,
                pending = pending.len(),
                error = ?cause.as_ref().map(|e| e.kind()),
                "Retrying batch write, backing off"
            );
            sleep(backoff).await;
            attempt += 1;
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        if self.jitter {
            self.retry_policy.jittered_backoff(attempt)
        } else {
            self.retry_policy.backoff(attempt)
        }
    }
}

//! Batched, conflict-aware writes of tenement records.
//!
//! Input is split into fixed-size batches and each batch is written with one
//! [`TenementStore::upsert_batch`] call. A batch that still fails after the
//! retry policy is exhausted is recorded as a single error string and the
//! next batch is attempted; a failed batch never aborts the run.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::RetryPolicy;
use crate::retry::{retry_with_policy, sleep_or_cancel};
use crate::traits::TenementStore;
use crate::TenementRecord;

/// Result of an upsert pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Rows written by successful batches.
    pub imported: u64,
    /// One `"Batch {n}: {message}"` entry per failed batch.
    pub errors: Vec<String>,
    /// Number of batches attempted.
    pub batches: usize,
    /// True when cancellation stopped the pass before all batches ran.
    pub cancelled: bool,
}

impl UpsertReport {
    /// Folds another report into this one.
    pub fn merge(&mut self, other: UpsertReport) {
        self.imported += other.imported;
        self.errors.extend(other.errors);
        self.batches += other.batches;
        self.cancelled |= other.cancelled;
    }
}

/// Running totals passed to the progress callback after each batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Rows written so far in this pass, including this batch.
    pub imported: u64,
    /// Records attempted so far in this pass, including this batch.
    pub attempted: u64,
}

/// Writes records to a [`TenementStore`] in batches.
#[derive(Clone)]
pub struct BatchUpserter<S: TenementStore> {
    store: S,
    retry: RetryPolicy,
    batch_delay: Duration,
}

impl<S: TenementStore> BatchUpserter<S> {
    /// Creates an upserter with the default retry policy and no inter-batch delay.
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
            batch_delay: Duration::ZERO,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Pause inserted between consecutive batches.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Upserts all records in batches of `batch_size`.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let report = BatchUpserter::new(repo).upsert(&records, 250).await;
    /// println!("{} imported, {} failed batches", report.imported, report.errors.len());
    /// ```
    pub async fn upsert(&self, records: &[TenementRecord], batch_size: usize) -> UpsertReport {
        self.upsert_with_progress(records, batch_size, 1, &CancellationToken::new(), |_| {})
            .await
    }

    /// Upserts records, reporting after every batch.
    ///
    /// # Arguments
    ///
    /// * `records` - Records to write, in order
    /// * `batch_size` - Records per batch (values below 1 are treated as 1)
    /// * `first_batch` - Number given to the first batch, so numbering can
    ///   continue across several calls within one run
    /// * `cancel_token` - Checked before each batch and during delays
    /// * `on_batch` - Called once per attempted batch
    pub async fn upsert_with_progress<F>(
        &self,
        records: &[TenementRecord],
        batch_size: usize,
        first_batch: usize,
        cancel_token: &CancellationToken,
        mut on_batch: F,
    ) -> UpsertReport
    where
        F: FnMut(&BatchOutcome),
    {
        let batch_size = batch_size.max(1);
        let mut report = UpsertReport::default();
        let mut attempted: u64 = 0;
        let store = &self.store;

        for (i, chunk) in records.chunks(batch_size).enumerate() {
            if i > 0 && !sleep_or_cancel(self.batch_delay, cancel_token).await {
                report.cancelled = true;
                break;
            }
            if cancel_token.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let batch = first_batch + i;
            let result = retry_with_policy(&self.retry, cancel_token, "upsert_batch", move || {
                store.upsert_batch(chunk)
            })
            .await;

            report.batches += 1;
            attempted += chunk.len() as u64;

            match result {
                Ok(_) => {
                    report.imported += chunk.len() as u64;
                    tracing::debug!(batch, size = chunk.len(), "Batch upserted");
                }
                Err(crate::AppError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(batch, size = chunk.len(), error = %e, "Batch upsert failed");
                    report.errors.push(format!("Batch {}: {}", batch, e));
                }
            }

            on_batch(&BatchOutcome {
                imported: report.imported,
                attempted,
            });
        }

        report
    }
}

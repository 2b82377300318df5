//! Sync service: per-jurisdiction orchestration and full syncs.
//!
//! # Architecture
//!
//! The [`SyncService`] is generic over two traits:
//! - [`TenementStore`] - for persistence
//! - [`SourceFactory`] - for creating jurisdiction sources
//!
//! A jurisdiction run drives source → normalize → identity → batch upsert,
//! publishing progress to the shared [`ProgressStore`] after every batch:
//!
//! 1. Count query. Failure is a run-level error.
//! 2. Pages in increasing offset order, each fetched under the retry policy.
//!    A failed or empty first page is a run-level error; a later page that
//!    still fails is recorded and paging stops.
//! 3. Each page is stamped with derived ids and the run's start time, then
//!    written in batches. Failed batches are recorded and skipped.
//!
//! Run-level errors never escape as `Err`; they are reported through
//! [`SyncSummary`] and the progress snapshot.
//!
//! # Cancellation Support
//!
//! The `*_cancellable` methods accept a `CancellationToken`. It is checked at
//! every suspension point; a cancelled run ends with status `error` and the
//! message `"Sync cancelled"`, keeping whatever was already written.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::{JurisdictionsConfig, SyncConfig};
use crate::progress::{ProgressStore, RunProgress, SyncState};
use crate::retry::{retry_with_policy, sleep_or_cancel};
use crate::traits::{SourceFactory, TenementSource, TenementStore};
use crate::upsert::{BatchUpserter, UpsertReport};
use crate::{AppError, Jurisdiction, TenementRecord};

/// Message recorded when a run is stopped by its cancellation token.
pub const CANCELLED_MESSAGE: &str = "Sync cancelled";

/// Final result of one jurisdiction run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    /// False only for run-level errors and cancellation.
    pub success: bool,
    pub imported: u64,
    /// Batch and page errors, plus the run-level error if any.
    pub errors: Vec<String>,
    pub jurisdiction: Jurisdiction,
    /// When the run started; also the `last_sync_at` of every row it wrote.
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub status: SyncState,
    /// Total reported by the source's count query.
    pub total_records: u64,
}

impl SyncSummary {
    pub fn is_cancelled(&self) -> bool {
        !self.success && self.message == CANCELLED_MESSAGE
    }
}

/// Aggregate result of a full sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSyncSummary {
    /// True when every planned jurisdiction completed.
    pub success: bool,
    pub total_imported: u64,
    pub successful_syncs: usize,
    pub total_jurisdictions: usize,
    pub results: Vec<SyncSummary>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub cancelled: bool,
}

impl FullSyncSummary {
    fn from_results(
        results: Vec<SyncSummary>,
        total_jurisdictions: usize,
        timestamp: DateTime<Utc>,
        cancelled: bool,
    ) -> Self {
        let total_imported = results.iter().map(|r| r.imported).sum();
        let successful_syncs = results.iter().filter(|r| r.success).count();
        let success = !cancelled && successful_syncs == total_jurisdictions;

        let message = if cancelled {
            format!(
                "Full sync cancelled after {} of {} jurisdictions; {} tenements imported",
                results.len(),
                total_jurisdictions,
                total_imported
            )
        } else {
            format!(
                "Synced {}/{} jurisdictions; {} tenements imported",
                successful_syncs, total_jurisdictions, total_imported
            )
        };

        Self {
            success,
            total_imported,
            successful_syncs,
            total_jurisdictions,
            results,
            timestamp,
            message,
            cancelled,
        }
    }
}

/// Service orchestrating tenement syncs.
///
/// # Type Parameters
///
/// * `S` - Tenement store implementation (e.g., `TenementRepository`)
/// * `F` - Source factory implementation (e.g., `DataSourceFactory`)
///
/// # Example
///
/// ```ignore
/// use tenement_core::{Jurisdiction, ProgressStore, SyncService};
///
/// let service = SyncService::new(repo, DataSourceFactory::default(), ProgressStore::new());
/// let summary = service.sync_jurisdiction(Jurisdiction::Tas).await;
/// println!("{}: {} imported", summary.jurisdiction, summary.imported);
/// ```
pub struct SyncService<S, F>
where
    S: TenementStore,
    F: SourceFactory,
{
    store: S,
    factory: F,
    progress: ProgressStore,
    config: SyncConfig,
    jurisdictions: JurisdictionsConfig,
}

impl<S, F> Clone for SyncService<S, F>
where
    S: TenementStore,
    F: SourceFactory,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            factory: self.factory.clone(),
            progress: self.progress.clone(),
            config: self.config.clone(),
            jurisdictions: self.jurisdictions.clone(),
        }
    }
}

impl<S, F> SyncService<S, F>
where
    S: TenementStore,
    F: SourceFactory,
{
    /// Creates a sync service with default configuration.
    pub fn new(store: S, factory: F, progress: ProgressStore) -> Self {
        Self::with_config(store, factory, progress, SyncConfig::default())
    }

    /// Creates a sync service with custom configuration.
    pub fn with_config(store: S, factory: F, progress: ProgressStore, config: SyncConfig) -> Self {
        Self {
            store,
            factory,
            progress,
            config,
            jurisdictions: JurisdictionsConfig::default(),
        }
    }

    /// Applies per-jurisdiction batch sizes and full-sync membership.
    pub fn with_jurisdictions(mut self, jurisdictions: JurisdictionsConfig) -> Self {
        self.jurisdictions = jurisdictions;
        self
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Synchronizes one jurisdiction.
    pub async fn sync_jurisdiction(&self, jurisdiction: Jurisdiction) -> SyncSummary {
        self.sync_jurisdiction_cancellable(jurisdiction, CancellationToken::new())
            .await
    }

    /// Synchronizes one jurisdiction with cancellation support.
    pub async fn sync_jurisdiction_cancellable(
        &self,
        jurisdiction: Jurisdiction,
        cancel_token: CancellationToken,
    ) -> SyncSummary {
        let started_at = Utc::now();
        let run = self.progress.begin_run(
            jurisdiction,
            format!("Starting {} sync", jurisdiction.display_name()),
        );
        tracing::info!(jurisdiction = %jurisdiction, "Starting sync");

        let mut total_records = 0;
        let result = self
            .run(jurisdiction, &run, started_at, &mut total_records, &cancel_token)
            .await;

        let summary = |success, imported, errors, message: String, status| SyncSummary {
            success,
            imported,
            errors,
            jurisdiction,
            timestamp: started_at,
            message,
            status,
            total_records,
        };

        match result {
            Ok(report) if report.cancelled => {
                tracing::info!(
                    jurisdiction = %jurisdiction,
                    imported = report.imported,
                    "Sync cancelled"
                );
                run.fail(CANCELLED_MESSAGE);
                summary(
                    false,
                    report.imported,
                    report.errors,
                    CANCELLED_MESSAGE.to_string(),
                    SyncState::Error,
                )
            }
            Ok(report) => {
                let message = if report.errors.is_empty() {
                    format!(
                        "Successfully imported {} {} tenements",
                        report.imported, jurisdiction
                    )
                } else {
                    format!(
                        "Imported {} {} tenements with {} errors",
                        report.imported,
                        jurisdiction,
                        report.errors.len()
                    )
                };
                tracing::info!(
                    jurisdiction = %jurisdiction,
                    imported = report.imported,
                    errors = report.errors.len(),
                    "Sync completed"
                );
                run.complete(message.clone());
                summary(
                    true,
                    report.imported,
                    report.errors,
                    message,
                    SyncState::Completed,
                )
            }
            Err(AppError::Cancelled) => {
                tracing::info!(jurisdiction = %jurisdiction, "Sync cancelled");
                run.fail(CANCELLED_MESSAGE);
                summary(
                    false,
                    0,
                    Vec::new(),
                    CANCELLED_MESSAGE.to_string(),
                    SyncState::Error,
                )
            }
            Err(e) => {
                tracing::error!(jurisdiction = %jurisdiction, error = %e, "Sync failed");
                let message = format!("{} sync failed: {}", jurisdiction, e);
                run.fail(message.clone());
                summary(false, 0, vec![e.to_string()], message, SyncState::Error)
            }
        }
    }

    /// The body of a run. Returns `Err` only for run-level errors.
    async fn run(
        &self,
        jurisdiction: Jurisdiction,
        run: &RunProgress,
        started_at: DateTime<Utc>,
        total_records: &mut u64,
        cancel_token: &CancellationToken,
    ) -> Result<UpsertReport, AppError> {
        let source = self.factory.create(jurisdiction)?;
        let source = &source;
        let retry = &self.config.retry;

        let total = retry_with_policy(retry, cancel_token, "count", move || source.count()).await?;
        *total_records = total;
        run.set_total(total, format!("Found {} tenements", total));
        tracing::info!(jurisdiction = %jurisdiction, total, "Count query completed");

        let upserter = BatchUpserter::new(self.store.clone())
            .with_retry(self.config.retry)
            .with_batch_delay(self.config.batch_delay);
        let batch_size = self
            .jurisdictions
            .batch_size(jurisdiction, self.config.default_batch_size);
        let page_size = source.page_size().max(1);

        let mut report = UpsertReport::default();
        let mut offset: u64 = 0;

        while offset < total {
            if offset > 0 && !sleep_or_cancel(self.config.page_delay, cancel_token).await {
                report.cancelled = true;
                break;
            }

            let limit = page_size.min((total - offset) as usize);
            let page = retry_with_policy(retry, cancel_token, "fetch_page", move || async move {
                let page = source.fetch_page(offset, limit).await?;
                if page.is_empty() {
                    return Err(AppError::EmptyResponse);
                }
                Ok(page)
            })
            .await;

            let page = match page {
                Ok(page) => page,
                Err(AppError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) if offset == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        jurisdiction = %jurisdiction,
                        offset,
                        error = %e,
                        "Page fetch failed, stopping pagination"
                    );
                    report
                        .errors
                        .push(format!("Page at offset {}: {}", offset, e));
                    break;
                }
            };

            tracing::debug!(
                jurisdiction = %jurisdiction,
                offset,
                fetched = page.fetched,
                records = page.records.len(),
                "Fetched page"
            );
            let fetched = page.fetched as u64;
            let records: Vec<TenementRecord> = page
                .records
                .into_iter()
                .map(|t| TenementRecord::from_new(t, started_at))
                .collect();

            let imported_before = report.imported;
            let page_report = upserter
                .upsert_with_progress(
                    &records,
                    batch_size,
                    report.batches + 1,
                    cancel_token,
                    |outcome| {
                        run.advance(
                            offset + outcome.attempted,
                            format!(
                                "Imported {} of {} tenements",
                                imported_before + outcome.imported,
                                total
                            ),
                        );
                    },
                )
                .await;
            report.merge(page_report);

            if report.cancelled {
                break;
            }
            offset += fetched;
            // Rows dropped during normalization still count as processed.
            run.advance(
                offset,
                format!("Imported {} of {} tenements", report.imported, total),
            );
        }

        Ok(report)
    }

    /// Synchronizes every enabled jurisdiction in canonical order.
    pub async fn sync_all(&self) -> FullSyncSummary {
        self.sync_all_cancellable(CancellationToken::new()).await
    }

    /// Synchronizes every enabled jurisdiction with cancellation support.
    ///
    /// Jurisdictions run one at a time with `jurisdiction_delay` between
    /// them. A failed jurisdiction never stops the loop; cancellation does,
    /// and the remaining jurisdictions are not attempted.
    pub async fn sync_all_cancellable(&self, cancel_token: CancellationToken) -> FullSyncSummary {
        let timestamp = Utc::now();
        let planned = self.jurisdictions.enabled_jurisdictions();
        let total = planned.len();
        let mut results = Vec::with_capacity(total);
        let mut cancelled = false;

        tracing::info!(jurisdictions = total, "Starting full sync");

        for (i, jurisdiction) in planned.into_iter().enumerate() {
            if i > 0 && !sleep_or_cancel(self.config.jurisdiction_delay, &cancel_token).await {
                cancelled = true;
                break;
            }
            if cancel_token.is_cancelled() {
                cancelled = true;
                break;
            }

            let summary = self
                .sync_jurisdiction_cancellable(jurisdiction, cancel_token.clone())
                .await;
            let was_cancelled = summary.is_cancelled();
            results.push(summary);

            if was_cancelled {
                cancelled = true;
                break;
            }
        }

        let summary = FullSyncSummary::from_results(results, total, timestamp, cancelled);
        tracing::info!(
            successful = summary.successful_syncs,
            total = summary.total_jurisdictions,
            imported = summary.total_imported,
            "Full sync finished"
        );
        summary
    }
}

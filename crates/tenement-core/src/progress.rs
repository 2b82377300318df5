//! In-memory sync progress tracking.
//!
//! A [`ProgressStore`] holds one snapshot per jurisdiction. It is created
//! empty at process start, shared by cloning, and never persisted. The
//! orchestrator writes through a [`RunProgress`] handle which keeps
//! `currentRecord` and `progress` monotonic within a run and only moves the
//! status forward (`idle → syncing → completed | error`). The HTTP layer may
//! overwrite a snapshot wholesale through [`ProgressStore::set`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::models::Jurisdiction;

/// Lifecycle state of a jurisdiction's sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Completed,
    Error,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned to pollers.
///
/// Serialized in camelCase for the frontend poller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    pub status: SyncState,
    /// Percentage complete, 0 to 100.
    pub progress: u8,
    pub current_record: u64,
    pub total_records: u64,
    pub message: String,
    /// Seconds remaining, derived from throughput so far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<u64>,
}

impl SyncProgress {
    /// The snapshot reported for a jurisdiction that has never been synced.
    pub fn idle() -> Self {
        Self {
            status: SyncState::Idle,
            progress: 0,
            current_record: 0,
            total_records: 0,
            message: "Ready to sync".to_string(),
            estimated_time_remaining: None,
        }
    }
}

/// A full overwrite of a jurisdiction's snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub status: SyncState,
    pub progress: u8,
    pub current_record: u64,
    pub total_records: u64,
    pub message: String,
}

#[derive(Debug, Clone)]
struct Entry {
    status: SyncState,
    progress: u8,
    current_record: u64,
    total_records: u64,
    message: String,
    started_at: Option<Instant>,
    generation: u64,
}

impl Entry {
    fn snapshot(&self) -> SyncProgress {
        SyncProgress {
            status: self.status,
            progress: self.progress,
            current_record: self.current_record,
            total_records: self.total_records,
            message: self.message.clone(),
            estimated_time_remaining: self.estimate_remaining(),
        }
    }

    fn estimate_remaining(&self) -> Option<u64> {
        if self.status != SyncState::Syncing || self.current_record == 0 {
            return None;
        }
        let started = self.started_at?;
        let remaining = self.total_records.saturating_sub(self.current_record);
        let per_record = started.elapsed().as_secs_f64() / self.current_record as f64;
        Some((per_record * remaining as f64).round() as u64)
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<Jurisdiction, Entry>,
    next_generation: u64,
}

/// Shared store of per-jurisdiction sync progress.
#[derive(Clone, Default)]
pub struct ProgressStore {
    inner: Arc<RwLock<Inner>>,
}

/// Percentage of `current` over `total`, clamped to 0..=100.
pub fn percent(current: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((current as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

impl ProgressStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the current snapshot, or the idle snapshot if none exists.
    pub fn get(&self, jurisdiction: Jurisdiction) -> SyncProgress {
        self.read()
            .entries
            .get(&jurisdiction)
            .map(Entry::snapshot)
            .unwrap_or_else(SyncProgress::idle)
    }

    /// Overwrites the snapshot for a jurisdiction.
    ///
    /// The throughput clock starts when the status becomes `syncing` and is
    /// kept across further `syncing` updates.
    pub fn set(&self, jurisdiction: Jurisdiction, update: ProgressUpdate) {
        let mut inner = self.write();
        let previous = inner.entries.get(&jurisdiction);
        let started_at = match (update.status, previous) {
            (SyncState::Syncing, Some(prev)) if prev.status == SyncState::Syncing => {
                prev.started_at.or_else(|| Some(Instant::now()))
            }
            (SyncState::Syncing, _) => Some(Instant::now()),
            (_, Some(prev)) => prev.started_at,
            (_, None) => None,
        };
        let generation = previous.map(|p| p.generation).unwrap_or(0);

        inner.entries.insert(
            jurisdiction,
            Entry {
                status: update.status,
                progress: update.progress.min(100),
                current_record: update.current_record,
                total_records: update.total_records,
                message: update.message,
                started_at,
                generation,
            },
        );
    }

    /// Returns every snapshot that has been written, in canonical order.
    pub fn snapshot_all(&self) -> Vec<(Jurisdiction, SyncProgress)> {
        let inner = self.read();
        Jurisdiction::ALL
            .into_iter()
            .filter_map(|j| inner.entries.get(&j).map(|e| (j, e.snapshot())))
            .collect()
    }

    /// Starts a new run, overwriting any previous snapshot.
    ///
    /// The returned handle is the only writer for this run. Once another run
    /// starts for the same jurisdiction, the old handle's writes are ignored.
    pub fn begin_run(
        &self,
        jurisdiction: Jurisdiction,
        message: impl Into<String>,
    ) -> RunProgress {
        let mut inner = self.write();
        inner.next_generation += 1;
        let generation = inner.next_generation;
        inner.entries.insert(
            jurisdiction,
            Entry {
                status: SyncState::Syncing,
                progress: 0,
                current_record: 0,
                total_records: 0,
                message: message.into(),
                started_at: Some(Instant::now()),
                generation,
            },
        );

        RunProgress {
            store: self.clone(),
            jurisdiction,
            generation,
        }
    }

    fn with_run_entry(
        &self,
        jurisdiction: Jurisdiction,
        generation: u64,
        f: impl FnOnce(&mut Entry),
    ) {
        let mut inner = self.write();
        match inner.entries.get_mut(&jurisdiction) {
            Some(entry) if entry.generation == generation && entry.status == SyncState::Syncing => {
                f(entry)
            }
            _ => {}
        }
    }
}

/// Write handle for one sync run.
#[derive(Clone)]
pub struct RunProgress {
    store: ProgressStore,
    jurisdiction: Jurisdiction,
    generation: u64,
}

impl RunProgress {
    /// Records the total once the count query has answered.
    pub fn set_total(&self, total: u64, message: impl Into<String>) {
        let message = message.into();
        self.store
            .with_run_entry(self.jurisdiction, self.generation, |entry| {
                entry.total_records = total;
                entry.progress = entry.progress.max(percent(entry.current_record, total));
                entry.message = message;
            });
    }

    /// Records work done so far. Values lower than the current ones are
    /// ignored so the snapshot never moves backward.
    pub fn advance(&self, current_record: u64, message: impl Into<String>) {
        let message = message.into();
        self.store
            .with_run_entry(self.jurisdiction, self.generation, |entry| {
                entry.current_record = entry.current_record.max(current_record);
                let pct = percent(entry.current_record, entry.total_records);
                // 100 is reserved for completion.
                entry.progress = entry.progress.max(pct.min(99));
                entry.message = message;
            });
    }

    /// Marks the run completed.
    pub fn complete(&self, message: impl Into<String>) {
        let message = message.into();
        self.store
            .with_run_entry(self.jurisdiction, self.generation, |entry| {
                entry.status = SyncState::Completed;
                entry.progress = 100;
                entry.message = message;
            });
    }

    /// Marks the run failed, keeping the progress reached so far.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.store
            .with_run_entry(self.jurisdiction, self.generation, |entry| {
                entry.status = SyncState::Error;
                entry.message = message;
            });
    }
}

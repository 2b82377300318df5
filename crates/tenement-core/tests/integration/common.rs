//! Test utilities and mock implementations for integration tests.
//!
//! Provides mock implementations of the core traits for testing
//! `SyncService` in isolation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tenement_core::traits::{SourceFactory, TenementSource, TenementStore};
use tenement_core::{
    AppError, Jurisdiction, JurisdictionEntry, JurisdictionsConfig, NewTenement, ProgressStore,
    SourcePage, SyncConfig, SyncService, TenementRecord,
};
use tokio::time::sleep;
use uuid::Uuid;

// =============================================================================
// MockSource
// =============================================================================

/// How a mock source fails its count query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountBehavior {
    Ok,
    Fail,
}

/// In-memory jurisdiction source with configurable failures.
#[derive(Clone)]
pub struct MockSource {
    jurisdiction: Jurisdiction,
    records: Arc<Vec<NewTenement>>,
    page_size: usize,
    count: CountBehavior,
    /// Offsets that always fail.
    failing_offsets: HashSet<u64>,
    /// Number of page calls that fail before pages start succeeding.
    transient_failures: Arc<AtomicUsize>,
    /// Return empty pages instead of data.
    empty_pages: bool,
    /// Row indices the source returns but cannot normalize.
    dropped_rows: HashSet<u64>,
    /// Offsets requested, in call order.
    pub requested_offsets: Arc<Mutex<Vec<u64>>>,
}

impl MockSource {
    pub fn new(jurisdiction: Jurisdiction, count: usize) -> Self {
        Self {
            jurisdiction,
            records: Arc::new(sample_tenements(jurisdiction, count)),
            page_size: 1000,
            count: CountBehavior::Ok,
            failing_offsets: HashSet::new(),
            transient_failures: Arc::new(AtomicUsize::new(0)),
            empty_pages: false,
            dropped_rows: HashSet::new(),
            requested_offsets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_records(jurisdiction: Jurisdiction, records: Vec<NewTenement>) -> Self {
        Self {
            records: Arc::new(records),
            ..Self::new(jurisdiction, 0)
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn failing_count(mut self) -> Self {
        self.count = CountBehavior::Fail;
        self
    }

    pub fn failing_at_offset(mut self, offset: u64) -> Self {
        self.failing_offsets.insert(offset);
        self
    }

    pub fn with_transient_failures(self, n: usize) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_empty_pages(mut self) -> Self {
        self.empty_pages = true;
        self
    }

    /// Marks upstream rows that are fetched but dropped during normalization.
    pub fn dropping_rows(mut self, rows: impl IntoIterator<Item = u64>) -> Self {
        self.dropped_rows.extend(rows);
        self
    }
}

impl TenementSource for MockSource {
    fn jurisdiction(&self) -> Jurisdiction {
        self.jurisdiction
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn count(&self) -> Result<u64, AppError> {
        match self.count {
            CountBehavior::Ok => Ok(self.records.len() as u64),
            CountBehavior::Fail => Err(AppError::ClientError(
                "HTTP 400 from mock count query".to_string(),
            )),
        }
    }

    async fn fetch_page(&self, offset: u64, limit: usize) -> Result<SourcePage, AppError> {
        self.requested_offsets.lock().unwrap().push(offset);

        if self.failing_offsets.contains(&offset) {
            return Err(AppError::NetworkError("connection reset".to_string()));
        }
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::Timeout(30));
        }
        if self.empty_pages {
            return Ok(SourcePage::default());
        }

        let start = (offset as usize).min(self.records.len());
        let end = (start + limit).min(self.records.len());
        let records = (start..end)
            .filter(|i| !self.dropped_rows.contains(&(*i as u64)))
            .map(|i| self.records[i].clone())
            .collect();
        Ok(SourcePage {
            records,
            fetched: end - start,
        })
    }
}

/// Generates `count` simple tenements for a jurisdiction.
pub fn sample_tenements(jurisdiction: Jurisdiction, count: usize) -> Vec<NewTenement> {
    (0..count)
        .map(|i| {
            let mut t = NewTenement::new(jurisdiction, format!("EL {}", 1000 + i));
            t.tenement_type = Some("Exploration Licence".to_string());
            t.status = Some("Granted".to_string());
            t.holder_name = Some(format!("Holder {}", i % 7));
            t
        })
        .collect()
}

// =============================================================================
// MockSourceFactory
// =============================================================================

/// Factory handing out pre-configured mock sources.
///
/// Jurisdictions without an explicit source get a healthy one with
/// `default_count` records.
#[derive(Clone)]
pub struct MockSourceFactory {
    sources: HashMap<Jurisdiction, MockSource>,
    default_count: usize,
}

impl MockSourceFactory {
    pub fn new(default_count: usize) -> Self {
        Self {
            sources: HashMap::new(),
            default_count,
        }
    }

    pub fn with_source(mut self, source: MockSource) -> Self {
        self.sources.insert(source.jurisdiction, source);
        self
    }
}

impl SourceFactory for MockSourceFactory {
    type Source = MockSource;

    fn create(&self, jurisdiction: Jurisdiction) -> Result<Self::Source, AppError> {
        Ok(self
            .sources
            .get(&jurisdiction)
            .cloned()
            .unwrap_or_else(|| MockSource::new(jurisdiction, self.default_count)))
    }
}

// =============================================================================
// MockTenementStore
// =============================================================================

/// In-memory tenement store keyed by id.
#[derive(Clone, Default)]
pub struct MockTenementStore {
    rows: Arc<Mutex<HashMap<Uuid, TenementRecord>>>,
    calls: Arc<AtomicUsize>,
    /// 1-based call numbers that fail permanently.
    failing_calls: Arc<Mutex<HashSet<usize>>>,
    delay: Option<Duration>,
    /// Progress snapshots observed at each write, when probing is enabled.
    probe: Option<(ProgressStore, Jurisdiction)>,
    pub observed_progress: Arc<Mutex<Vec<(u64, u8)>>>,
}

impl MockTenementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_call(self, call: usize) -> Self {
        self.failing_calls.lock().unwrap().insert(call);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn probing(mut self, progress: ProgressStore, jurisdiction: Jurisdiction) -> Self {
        self.probe = Some((progress, jurisdiction));
        self
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: Uuid) -> Option<TenementRecord> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn count_for(&self, jurisdiction: Jurisdiction) -> usize {
        self.rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.tenement.jurisdiction == jurisdiction)
            .count()
    }
}

impl TenementStore for MockTenementStore {
    async fn upsert_batch(&self, records: &[TenementRecord]) -> Result<u64, AppError> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        if let Some((progress, jurisdiction)) = &self.probe {
            let snapshot = progress.get(*jurisdiction);
            self.observed_progress
                .lock()
                .unwrap()
                .push((snapshot.current_record, snapshot.progress));
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_calls.lock().unwrap().contains(&call) {
            return Err(AppError::Generic(format!(
                "simulated write failure on call {}",
                call
            )));
        }

        let mut rows = self.rows.lock().unwrap();
        for record in records {
            rows.insert(record.id, record.clone());
        }
        Ok(records.len() as u64)
    }

    async fn count(&self, jurisdiction: Option<Jurisdiction>) -> Result<u64, AppError> {
        Ok(match jurisdiction {
            Some(j) => self.count_for(j) as u64,
            None => self.len() as u64,
        })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Test config: no artificial pauses, default retry attempts.
pub fn fast_config() -> SyncConfig {
    SyncConfig::default().without_delays()
}

/// Jurisdiction overrides setting one batch size.
pub fn batch_size_config(jurisdiction: Jurisdiction, batch_size: usize) -> JurisdictionsConfig {
    JurisdictionsConfig {
        jurisdictions: vec![JurisdictionEntry {
            code: jurisdiction,
            enabled: true,
            batch_size: Some(batch_size),
            target_count: None,
        }],
        ..Default::default()
    }
}

/// Builds a service with fast config around the given store and factory.
pub fn service(
    store: MockTenementStore,
    factory: MockSourceFactory,
    progress: ProgressStore,
) -> SyncService<MockTenementStore, MockSourceFactory> {
    SyncService::with_config(store, factory, progress, fast_config())
}

//! Integration tests for SyncService using mock implementations.

use tenement_core::identity::derive;
use tenement_core::{
    Jurisdiction, JurisdictionEntry, JurisdictionsConfig, NewTenement, ProgressStore, SyncService,
    SyncState,
};

use crate::integration::common::{
    MockSource, MockSourceFactory, MockTenementStore, batch_size_config, fast_config,
    sample_tenements, service,
};

// =============================================================================
// Single-jurisdiction runs
// =============================================================================

#[tokio::test]
async fn test_sync_tas_imports_every_record() {
    // Arrange
    let store = MockTenementStore::new();
    let factory = MockSourceFactory::new(0).with_source(MockSource::new(Jurisdiction::Tas, 1247));
    let progress = ProgressStore::new();
    let service = service(store.clone(), factory, progress.clone())
        .with_jurisdictions(batch_size_config(Jurisdiction::Tas, 250));

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Tas).await;

    // Assert
    assert!(summary.success);
    assert_eq!(summary.imported, 1247);
    assert_eq!(summary.jurisdiction, Jurisdiction::Tas);
    assert!(summary.errors.is_empty());
    assert_eq!(store.len(), 1247);
    assert_eq!(store.calls(), 5);

    let snapshot = progress.get(Jurisdiction::Tas);
    assert_eq!(snapshot.status, SyncState::Completed);
    assert_eq!(snapshot.progress, 100);
    assert_eq!(snapshot.current_record, 1247);
    assert_eq!(snapshot.total_records, 1247);
}

#[tokio::test]
async fn test_failed_batch_does_not_stop_later_batches() {
    // Arrange: 100 records in batches of 10, the third write fails permanently
    let store = MockTenementStore::new().failing_on_call(3);
    let factory = MockSourceFactory::new(0).with_source(MockSource::new(Jurisdiction::Nsw, 100));
    let service = service(store.clone(), factory, ProgressStore::new())
        .with_jurisdictions(batch_size_config(Jurisdiction::Nsw, 10));

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Nsw).await;

    // Assert: batch 3 is retried then recorded; batches 4-10 still run
    assert!(summary.success, "batch errors are not run-level errors");
    assert_eq!(summary.status, SyncState::Completed);
    assert_eq!(summary.imported, 90);
    assert_eq!(summary.errors.len(), 1);
    assert!(
        summary.errors[0].starts_with("Batch 3: "),
        "unexpected error: {}",
        summary.errors[0]
    );
    assert_eq!(store.calls(), 10);
    assert_eq!(store.len(), 90);
}

#[tokio::test]
async fn test_resync_is_idempotent() {
    // Arrange
    let store = MockTenementStore::new();
    let factory = MockSourceFactory::new(0).with_source(MockSource::new(Jurisdiction::Qld, 321));
    let service = service(store.clone(), factory, ProgressStore::new());

    // Act
    let first = service.sync_jurisdiction(Jurisdiction::Qld).await;
    let second = service.sync_jurisdiction(Jurisdiction::Qld).await;

    // Assert: the second run overwrites the same rows
    assert_eq!(first.imported, 321);
    assert_eq!(second.imported, 321);
    assert_eq!(store.len(), 321);

    let id = derive(Jurisdiction::Qld, "EL 1000");
    let row = store.get(id).expect("row should exist");
    assert_eq!(row.last_sync_at, second.timestamp);
}

#[tokio::test]
async fn test_records_carry_derived_id_and_run_timestamp() {
    // Arrange
    let mut tenement = NewTenement::new(Jurisdiction::Wa, "M 15/1789");
    tenement.holder_name = Some("Example Mining Pty Ltd".to_string());
    let store = MockTenementStore::new();
    let factory = MockSourceFactory::new(0)
        .with_source(MockSource::with_records(Jurisdiction::Wa, vec![tenement]));
    let service = service(store.clone(), factory, ProgressStore::new());

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Wa).await;

    // Assert
    let id = derive(Jurisdiction::Wa, "M 15/1789");
    assert_eq!(id.to_string().as_bytes()[14], b'4');
    let row = store.get(id).expect("WA row should be stored under its derived id");
    assert_eq!(row.tenement.number, "M 15/1789");
    assert_eq!(row.last_sync_at, summary.timestamp);
}

#[tokio::test]
async fn test_count_failure_is_run_level_error() {
    // Arrange
    let store = MockTenementStore::new();
    let factory = MockSourceFactory::new(0)
        .with_source(MockSource::new(Jurisdiction::Wa, 50).failing_count());
    let progress = ProgressStore::new();
    let service = service(store.clone(), factory, progress.clone());

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Wa).await;

    // Assert
    assert!(!summary.success);
    assert_eq!(summary.status, SyncState::Error);
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(store.len(), 0);

    let snapshot = progress.get(Jurisdiction::Wa);
    assert_eq!(snapshot.status, SyncState::Error);
    assert!(snapshot.message.contains("WA sync failed"));
}

#[tokio::test]
async fn test_empty_first_page_is_run_level_error() {
    // Arrange: count says 20 but every page is empty
    let source = MockSource::new(Jurisdiction::Wa, 20).with_empty_pages();
    let offsets = source.requested_offsets.clone();
    let factory = MockSourceFactory::new(0).with_source(source);
    let service = service(MockTenementStore::new(), factory, ProgressStore::new());

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Wa).await;

    // Assert: first page retried up to the policy limit, then the run fails
    assert!(!summary.success);
    assert_eq!(summary.status, SyncState::Error);
    assert_eq!(offsets.lock().unwrap().as_slice(), &[0, 0, 0]);
}

#[tokio::test]
async fn test_zero_count_completes_without_paging() {
    // Arrange
    let source = MockSource::new(Jurisdiction::Nt, 0);
    let offsets = source.requested_offsets.clone();
    let factory = MockSourceFactory::new(0).with_source(source);
    let service = service(MockTenementStore::new(), factory, ProgressStore::new());

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Nt).await;

    // Assert
    assert!(summary.success);
    assert_eq!(summary.imported, 0);
    assert!(offsets.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_later_page_failure_is_partial_success() {
    // Arrange: three pages of 10, the third page keeps failing
    let source = MockSource::new(Jurisdiction::Wa, 30)
        .with_page_size(10)
        .failing_at_offset(20);
    let factory = MockSourceFactory::new(0).with_source(source);
    let store = MockTenementStore::new();
    let service = service(store.clone(), factory, ProgressStore::new());

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Wa).await;

    // Assert
    assert!(summary.success);
    assert_eq!(summary.status, SyncState::Completed);
    assert_eq!(summary.imported, 20);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("offset 20"));
    assert_eq!(store.len(), 20);
}

#[tokio::test]
async fn test_transient_page_failures_are_retried() {
    // Arrange: the first two page calls time out
    let source = MockSource::new(Jurisdiction::Wa, 25)
        .with_page_size(10)
        .with_transient_failures(2);
    let offsets = source.requested_offsets.clone();
    let factory = MockSourceFactory::new(0).with_source(source);
    let service = service(MockTenementStore::new(), factory, ProgressStore::new());

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Wa).await;

    // Assert
    assert!(summary.success);
    assert_eq!(summary.imported, 25);
    assert!(summary.errors.is_empty());
    assert_eq!(offsets.lock().unwrap().as_slice(), &[0, 0, 0, 10, 20]);
}

#[tokio::test]
async fn test_pages_fetched_in_increasing_offset_order() {
    // Arrange
    let source = MockSource::new(Jurisdiction::Wa, 2500).with_page_size(1000);
    let offsets = source.requested_offsets.clone();
    let factory = MockSourceFactory::new(0).with_source(source);
    let service = service(MockTenementStore::new(), factory, ProgressStore::new());

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Wa).await;

    // Assert
    assert_eq!(summary.imported, 2500);
    assert_eq!(offsets.lock().unwrap().as_slice(), &[0, 1000, 2000]);
}

#[tokio::test]
async fn test_dropped_rows_still_advance_offset() {
    // Arrange: row 1 comes back from the source but has no tenement number
    let source = MockSource::new(Jurisdiction::Wa, 4)
        .with_page_size(2)
        .dropping_rows([1]);
    let offsets = source.requested_offsets.clone();
    let store = MockTenementStore::new();
    let progress = ProgressStore::new();
    let factory = MockSourceFactory::new(0).with_source(source);
    let service = service(store.clone(), factory, progress.clone());

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Wa).await;

    // Assert: no page is fetched twice and only distinct rows are counted
    assert!(summary.success);
    assert_eq!(offsets.lock().unwrap().as_slice(), &[0, 2]);
    assert_eq!(summary.imported, 3);
    assert_eq!(store.len(), 3);
    let snapshot = progress.get(Jurisdiction::Wa);
    assert_eq!(snapshot.current_record, 4);
    assert_eq!(snapshot.status, SyncState::Completed);
}

#[tokio::test]
async fn test_page_of_only_dropped_rows_does_not_stop_paging() {
    // Arrange: the whole middle page fails normalization
    let source = MockSource::new(Jurisdiction::Wa, 6)
        .with_page_size(2)
        .dropping_rows([2, 3]);
    let offsets = source.requested_offsets.clone();
    let store = MockTenementStore::new();
    let factory = MockSourceFactory::new(0).with_source(source);
    let service = service(store.clone(), factory, ProgressStore::new());

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Wa).await;

    // Assert
    assert!(summary.success);
    assert!(summary.errors.is_empty(), "errors: {:?}", summary.errors);
    assert_eq!(offsets.lock().unwrap().as_slice(), &[0, 2, 4]);
    assert_eq!(summary.imported, 4);
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn test_default_batch_size_applies_without_jurisdiction_entry() {
    // Arrange: NT's built-in batch size (100) would write this in one call
    let store = MockTenementStore::new();
    let factory = MockSourceFactory::new(0).with_source(MockSource::new(Jurisdiction::Nt, 100));
    let config = fast_config().with_default_batch_size(25);
    let service = SyncService::with_config(store.clone(), factory, ProgressStore::new(), config);

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Nt).await;

    // Assert
    assert_eq!(summary.imported, 100);
    assert_eq!(store.calls(), 4);
}

#[tokio::test]
async fn test_jurisdiction_entry_overrides_default_batch_size() {
    // Arrange
    let store = MockTenementStore::new();
    let factory = MockSourceFactory::new(0).with_source(MockSource::new(Jurisdiction::Nt, 100));
    let config = fast_config().with_default_batch_size(25);
    let service = SyncService::with_config(store.clone(), factory, ProgressStore::new(), config)
        .with_jurisdictions(batch_size_config(Jurisdiction::Nt, 50));

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Nt).await;

    // Assert
    assert_eq!(summary.imported, 100);
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_progress_is_monotonic_within_a_run() {
    // Arrange: the store samples the snapshot before each write
    let progress = ProgressStore::new();
    let store = MockTenementStore::new().probing(progress.clone(), Jurisdiction::Vic);
    let source = MockSource::new(Jurisdiction::Vic, 1834).with_page_size(500);
    let factory = MockSourceFactory::new(0).with_source(source);
    let service = service(store.clone(), factory, progress.clone())
        .with_jurisdictions(batch_size_config(Jurisdiction::Vic, 100));

    // Act
    let summary = service.sync_jurisdiction(Jurisdiction::Vic).await;

    // Assert
    assert_eq!(summary.imported, 1834);
    let observed = store.observed_progress.lock().unwrap().clone();
    assert_eq!(observed.len(), 19);
    for pair in observed.windows(2) {
        assert!(pair[1].0 >= pair[0].0, "currentRecord decreased: {:?}", pair);
        assert!(pair[1].1 >= pair[0].1, "progress decreased: {:?}", pair);
    }
    assert!(observed.iter().all(|(_, pct)| *pct < 100));
    assert_eq!(progress.get(Jurisdiction::Vic).progress, 100);
}

// =============================================================================
// Full sync
// =============================================================================

#[tokio::test]
async fn test_full_sync_continues_after_failure() {
    // Arrange: VIC's count query fails
    let store = MockTenementStore::new();
    let factory = MockSourceFactory::new(12)
        .with_source(MockSource::new(Jurisdiction::Vic, 12).failing_count());
    let progress = ProgressStore::new();
    let service = service(store.clone(), factory, progress.clone());

    // Act
    let summary = service.sync_all().await;

    // Assert
    assert!(!summary.success);
    assert_eq!(summary.total_jurisdictions, 6);
    assert_eq!(summary.successful_syncs, 5);
    assert_eq!(summary.total_imported, 60);
    assert_eq!(summary.results.len(), 6);

    let vic = summary
        .results
        .iter()
        .find(|r| r.jurisdiction == Jurisdiction::Vic)
        .expect("VIC result present");
    assert!(!vic.success);

    for j in [Jurisdiction::Nt, Jurisdiction::Qld, Jurisdiction::Tas] {
        assert_eq!(store.count_for(j), 12, "{} should have been synced", j);
        assert_eq!(progress.get(j).status, SyncState::Completed);
    }
    assert_eq!(progress.get(Jurisdiction::Vic).status, SyncState::Error);
}

#[tokio::test]
async fn test_full_sync_runs_in_canonical_order() {
    // Arrange
    let service = service(
        MockTenementStore::new(),
        MockSourceFactory::new(3),
        ProgressStore::new(),
    );

    // Act
    let summary = service.sync_all().await;

    // Assert
    assert!(summary.success);
    let order: Vec<Jurisdiction> = summary.results.iter().map(|r| r.jurisdiction).collect();
    assert_eq!(order, Jurisdiction::ALL.to_vec());
    assert_eq!(summary.total_imported, 18);
}

#[tokio::test]
async fn test_full_sync_skips_disabled_jurisdictions() {
    // Arrange
    let jurisdictions = JurisdictionsConfig {
        jurisdictions: vec![JurisdictionEntry {
            code: Jurisdiction::Nt,
            enabled: false,
            batch_size: None,
            target_count: None,
        }],
        ..Default::default()
    };
    let store = MockTenementStore::new();
    let service = service(store.clone(), MockSourceFactory::new(4), ProgressStore::new())
        .with_jurisdictions(jurisdictions);

    // Act
    let summary = service.sync_all().await;

    // Assert
    assert!(summary.success);
    assert_eq!(summary.total_jurisdictions, 5);
    assert_eq!(store.count_for(Jurisdiction::Nt), 0);
}

#[tokio::test]
async fn test_same_number_in_two_jurisdictions_is_two_rows() {
    // Arrange
    let store = MockTenementStore::new();
    let factory = MockSourceFactory::new(0)
        .with_source(MockSource::with_records(
            Jurisdiction::Nsw,
            sample_tenements(Jurisdiction::Nsw, 5),
        ))
        .with_source(MockSource::with_records(
            Jurisdiction::Vic,
            sample_tenements(Jurisdiction::Vic, 5),
        ));
    let service = service(store.clone(), factory, ProgressStore::new());

    // Act
    service.sync_jurisdiction(Jurisdiction::Nsw).await;
    service.sync_jurisdiction(Jurisdiction::Vic).await;

    // Assert
    assert_eq!(store.len(), 10);
}

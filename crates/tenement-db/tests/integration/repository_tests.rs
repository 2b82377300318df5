//! Integration tests for TenementRepository.
//!
//! These tests verify the repository layer against a real PostgreSQL
//! database. Each test runs in an isolated container.

use chrono::{TimeZone, Utc};
use tenement_core::identity;
use tenement_core::{Jurisdiction, TenementRecord};
use tenement_db::TenementRepository;

use crate::integration::common::{sample_record, setup_test_db};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_upsert_inserts_new_tenements() {
    let (pool, _container) = setup_test_db().await;
    let repo = TenementRepository::new(pool);

    let records = vec![
        sample_record(Jurisdiction::Wa, "M 15/1789"),
        sample_record(Jurisdiction::Wa, "E 09/2231"),
    ];
    let written = repo.upsert_batch(&records).await.expect("upsert should succeed");
    assert_eq!(written, 2);

    let id = identity::derive(Jurisdiction::Wa, "M 15/1789");
    let stored = repo
        .get(id)
        .await
        .expect("get should succeed")
        .expect("tenement should exist");

    assert_eq!(stored, records[0]);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_upsert_is_idempotent() {
    let (pool, _container) = setup_test_db().await;
    let repo = TenementRepository::new(pool);

    let records: Vec<TenementRecord> = (0..50)
        .map(|i| sample_record(Jurisdiction::Tas, &format!("EL {}", 1000 + i)))
        .collect();

    repo.upsert_batch(&records).await.expect("first upsert");
    repo.upsert_batch(&records).await.expect("second upsert");

    assert_eq!(repo.count(Some(Jurisdiction::Tas)).await.unwrap(), 50);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_upsert_overwrites_changed_fields() {
    let (pool, _container) = setup_test_db().await;
    let repo = TenementRepository::new(pool);

    let original = sample_record(Jurisdiction::Qld, "EPM 27001");
    repo.upsert_batch(std::slice::from_ref(&original))
        .await
        .expect("first upsert");

    let mut changed = original.clone();
    changed.tenement.holder_name = Some("New Holder Pty Ltd".to_string());
    changed.tenement.status = Some("Surrendered".to_string());
    changed.last_sync_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    repo.upsert_batch(std::slice::from_ref(&changed))
        .await
        .expect("second upsert");

    let stored = repo.get(original.id).await.unwrap().unwrap();
    assert_eq!(stored.tenement.holder_name.as_deref(), Some("New Holder Pty Ltd"));
    assert_eq!(stored.tenement.status.as_deref(), Some("Surrendered"));
    assert_eq!(stored.last_sync_at, changed.last_sync_at);
    assert_eq!(repo.count(None).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_upsert_collapses_duplicate_ids_in_batch() {
    let (pool, _container) = setup_test_db().await;
    let repo = TenementRepository::new(pool);

    let first = sample_record(Jurisdiction::Nt, "EL 1000");
    let mut second = first.clone();
    second.tenement.holder_name = Some("Later Holder".to_string());

    let written = repo
        .upsert_batch(&[first.clone(), second])
        .await
        .expect("duplicate ids in one batch should not fail");
    assert_eq!(written, 1);

    let stored = repo.get(first.id).await.unwrap().unwrap();
    assert_eq!(stored.tenement.holder_name.as_deref(), Some("Later Holder"));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_same_number_in_two_jurisdictions() {
    let (pool, _container) = setup_test_db().await;
    let repo = TenementRepository::new(pool);

    let records = vec![
        sample_record(Jurisdiction::Nsw, "EL 1000"),
        sample_record(Jurisdiction::Vic, "EL 1000"),
    ];
    repo.upsert_batch(&records).await.unwrap();

    assert_eq!(repo.count(Some(Jurisdiction::Nsw)).await.unwrap(), 1);
    assert_eq!(repo.count(Some(Jurisdiction::Vic)).await.unwrap(), 1);
    assert_eq!(repo.count(None).await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_empty_batch_and_missing_rows() {
    let (pool, _container) = setup_test_db().await;
    let repo = TenementRepository::new(pool);

    assert_eq!(repo.upsert_batch(&[]).await.unwrap(), 0);
    assert!(repo.get(uuid::Uuid::nil()).await.unwrap().is_none());
    assert!(repo.last_sync_at(Jurisdiction::Wa).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_last_sync_at_and_health_check() {
    let (pool, _container) = setup_test_db().await;
    let repo = TenementRepository::new(pool);

    let record = sample_record(Jurisdiction::Wa, "P 16/3001");
    repo.upsert_batch(std::slice::from_ref(&record)).await.unwrap();

    assert_eq!(
        repo.last_sync_at(Jurisdiction::Wa).await.unwrap(),
        Some(record.last_sync_at)
    );
    repo.health_check().await.expect("health check should pass");
}

//! Trait definitions for external dependencies.
//!
//! This module defines traits that abstract over external dependencies
//! (jurisdiction data sources, the tenement store), enabling:
//!
//! - **Testability**: Mock implementations for unit testing
//! - **Flexibility**: A live feed can replace a placeholder generator without
//!   touching the orchestrator
//! - **Decoupling**: Core business logic doesn't depend on specific implementations
//!
//! # Example
//!
//! ```
//! use tenement_core::traits::{TenementSource, TenementStore};
//! use tenement_core::{AppError, TenementRecord};
//! use chrono::Utc;
//!
//! // Business logic uses traits, not concrete types
//! async fn copy_first_page<Src, S>(source: &Src, store: &S) -> Result<u64, AppError>
//! where
//!     Src: TenementSource,
//!     S: TenementStore,
//! {
//!     let now = Utc::now();
//!     let page = source.fetch_page(0, source.page_size()).await?;
//!     let records: Vec<TenementRecord> = page
//!         .records
//!         .into_iter()
//!         .map(|t| TenementRecord::from_new(t, now))
//!         .collect();
//!     store.upsert_batch(&records).await
//! }
//! ```

use std::future::Future;

use crate::{AppError, Jurisdiction, SourcePage, TenementRecord};

/// Source of normalized tenements for one jurisdiction.
///
/// Implementations either page through a live API or synthesize records.
pub trait TenementSource: Send + Sync + Clone {
    /// The jurisdiction this source serves.
    fn jurisdiction(&self) -> Jurisdiction;

    /// Maximum number of records a single `fetch_page` call may return.
    fn page_size(&self) -> usize;

    /// Returns the total number of records available.
    ///
    /// Called once before paging so progress percentages are accurate.
    fn count(&self) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Fetches one page of records.
    ///
    /// The returned [`SourcePage::fetched`] counts every upstream row in the
    /// page, including rows dropped during normalization; callers advance
    /// `offset` by it.
    ///
    /// # Arguments
    ///
    /// * `offset` - Zero-based index of the first record
    /// * `limit` - Maximum records to return, at most [`page_size`](Self::page_size)
    fn fetch_page(
        &self,
        offset: u64,
        limit: usize,
    ) -> impl Future<Output = Result<SourcePage, AppError>> + Send;
}

/// Factory for creating jurisdiction sources.
///
/// Separate from TenementSource to avoid issues with async trait constructors.
pub trait SourceFactory: Send + Sync + Clone {
    /// The type of source this factory creates.
    type Source: TenementSource;

    /// Creates the source for the given jurisdiction.
    fn create(&self, jurisdiction: Jurisdiction) -> Result<Self::Source, AppError>;
}

/// Store for tenement persistence.
pub trait TenementStore: Send + Sync + Clone {
    /// Inserts or replaces a batch of tenements keyed on `id`.
    ///
    /// The batch is written atomically: either every row lands or none does.
    ///
    /// # Returns
    ///
    /// The number of rows written.
    fn upsert_batch(
        &self,
        records: &[TenementRecord],
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Counts stored tenements, optionally for one jurisdiction.
    fn count(
        &self,
        jurisdiction: Option<Jurisdiction>,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Checks that the store is reachable.
    fn health_check(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}

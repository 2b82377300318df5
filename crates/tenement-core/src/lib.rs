//! Tenement Core - Domain types, business logic, and services.
//!
//! This crate provides the core functionality of the tenement sync pipeline:
//!
//! - **Domain models**: [`Jurisdiction`], [`NewTenement`], [`TenementRecord`]
//! - **Identity**: [`identity::derive`] maps `(jurisdiction, number)` to a stable UUID
//! - **Progress**: [`ProgressStore`] holds the per-jurisdiction snapshot pollers read
//! - **Services**: [`SyncService`] runs single-jurisdiction and full syncs,
//!   [`BatchUpserter`] writes records in fault-isolated batches
//! - **Traits**: [`TenementSource`], [`SourceFactory`], [`TenementStore`] for dependency injection
//!
//! # Architecture
//!
//! This crate is designed to be reusable by different frontends (CLI, server, etc.).
//! Business logic is decoupled from I/O concerns through traits:
//!
//! - [`TenementSource`] - abstracts a jurisdiction feed (e.g., the WA ArcGIS service)
//! - [`SourceFactory`] - creates the source for a jurisdiction
//! - [`TenementStore`] - abstracts persistence (e.g., PostgreSQL)
//!
//! # Example
//!
//! ```ignore
//! use tenement_core::{Jurisdiction, ProgressStore, SyncService};
//!
//! let progress = ProgressStore::new();
//! let service = SyncService::new(repo, factory, progress.clone());
//! let summary = service.sync_jurisdiction(Jurisdiction::Wa).await;
//! println!("{}", progress.get(Jurisdiction::Wa).message);
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod progress;
pub mod retry;
pub mod sync;
pub mod traits;
pub mod upsert;

// Configuration
pub use config::{
    HttpConfig, JurisdictionEntry, JurisdictionsConfig, RetryPolicy, SyncConfig, WaSourceConfig,
    default_config_path, load_jurisdictions_config,
};

// Error handling
pub use error::AppError;

// Domain models
pub use models::{Jurisdiction, NewTenement, SourcePage, TenementRecord};

// Progress tracking
pub use progress::{ProgressStore, ProgressUpdate, RunProgress, SyncProgress, SyncState};

// Traits for dependency injection
pub use traits::{SourceFactory, TenementSource, TenementStore};

// Services (generic over trait implementations)
pub use sync::{FullSyncSummary, SyncService, SyncSummary};
pub use upsert::{BatchOutcome, BatchUpserter, UpsertReport};

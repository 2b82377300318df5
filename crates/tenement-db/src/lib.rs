//! Tenement DB - PostgreSQL persistence for synchronised tenements
//!
//! # Overview
//!
//! - [`TenementRepository`] - batched upserts keyed by the derived tenement id,
//!   plus lookups used by the server and tests
//!
//! The schema lives in `migrations/0001_tenements.sql` at the workspace root.

mod repository;

pub use repository::TenementRepository;

//! Tenement Client - jurisdiction data sources
//!
//! This crate provides the feeds the sync pipeline pulls from:
//!
//! - [`wa`] - the WA DMIRS-003 ArcGIS feature service
//! - [`placeholder`] - deterministic generators for NSW, VIC, NT, QLD and TAS
//! - [`source`] - the [`DataSource`] enum and [`DataSourceFactory`]
//!
//! # Overview
//!
//! Every source implements [`tenement_core::TenementSource`]: a count query
//! followed by offset-based pages of normalized tenements.

pub mod placeholder;
pub mod source;
pub mod wa;

// Re-export main source types
pub use placeholder::{PlaceholderProfile, PlaceholderSource};
pub use source::{DataSource, DataSourceFactory};
pub use wa::WaClient;

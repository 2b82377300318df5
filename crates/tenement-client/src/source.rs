//! Data source factory and enum dispatch.
//!
//! This module provides a unified interface over the jurisdiction feeds
//! through the [`DataSource`] enum.
//!
//! # Why an Enum Instead of `dyn Trait`?
//!
//! The [`TenementSource`] trait uses `impl Future` return types (RPITIT),
//! making it not object-safe. We use an enum for static dispatch. When a
//! live integration lands for a jurisdiction that is still generated, only
//! the variant [`DataSourceFactory`] picks for it changes.

use tenement_core::error::AppError;
use tenement_core::traits::{SourceFactory, TenementSource};
use tenement_core::{HttpConfig, Jurisdiction, JurisdictionsConfig, SourcePage};

use crate::placeholder::PlaceholderSource;
use crate::wa::WaClient;

/// Unified jurisdiction source wrapping the concrete implementations.
#[derive(Clone)]
pub enum DataSource {
    /// Live feature service (WA).
    LiveApi(WaClient),
    /// Deterministic synthetic records.
    Placeholder(PlaceholderSource),
}

impl DataSource {
    /// Whether records come from a live upstream service.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::LiveApi(_))
    }
}

impl TenementSource for DataSource {
    fn jurisdiction(&self) -> Jurisdiction {
        match self {
            Self::LiveApi(c) => c.jurisdiction(),
            Self::Placeholder(p) => p.jurisdiction(),
        }
    }

    fn page_size(&self) -> usize {
        match self {
            Self::LiveApi(c) => c.page_size(),
            Self::Placeholder(p) => p.page_size(),
        }
    }

    async fn count(&self) -> Result<u64, AppError> {
        match self {
            Self::LiveApi(c) => c.count().await,
            Self::Placeholder(p) => p.count().await,
        }
    }

    async fn fetch_page(&self, offset: u64, limit: usize) -> Result<SourcePage, AppError> {
        match self {
            Self::LiveApi(c) => c.fetch_page(offset, limit).await,
            Self::Placeholder(p) => p.fetch_page(offset, limit).await,
        }
    }
}

/// Production factory: WA uses the live client, every other jurisdiction a
/// placeholder generator.
#[derive(Debug, Clone, Default)]
pub struct DataSourceFactory {
    jurisdictions: JurisdictionsConfig,
    http: HttpConfig,
}

impl DataSourceFactory {
    /// Creates a factory with built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory from loaded configuration.
    pub fn with_config(jurisdictions: JurisdictionsConfig, http: HttpConfig) -> Self {
        Self {
            jurisdictions,
            http,
        }
    }
}

impl SourceFactory for DataSourceFactory {
    type Source = DataSource;

    fn create(&self, jurisdiction: Jurisdiction) -> Result<Self::Source, AppError> {
        match jurisdiction {
            Jurisdiction::Wa => Ok(DataSource::LiveApi(WaClient::with_config(
                &self.jurisdictions.wa.endpoint,
                &self.http,
                self.jurisdictions.wa_page_size(),
            )?)),
            other => Ok(DataSource::Placeholder(PlaceholderSource::new(
                other,
                self.jurisdictions.target_count(other),
            )?)),
        }
    }
}

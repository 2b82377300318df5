use tokio_util::sync::CancellationToken;

use tenement_client::DataSourceFactory;
use tenement_core::traits::TenementStore;
use tenement_core::{HttpConfig, JurisdictionsConfig, ProgressStore, SyncConfig, SyncService};
use tenement_db::TenementRepository;

/// Shared application state for all handlers.
///
/// Generic over the store so handlers can be exercised without PostgreSQL;
/// the binary uses [`TenementRepository`].
#[derive(Clone)]
pub struct AppState<S: TenementStore = TenementRepository> {
    /// Sync service shared by the sync endpoints
    pub sync_service: SyncService<S, DataSourceFactory>,

    /// Progress snapshots read by pollers
    pub progress: ProgressStore,

    /// Store used for health checks
    pub store: S,

    /// Cancelled on shutdown; in-flight runs receive child tokens
    pub shutdown_token: CancellationToken,
}

impl<S: TenementStore> AppState<S> {
    /// Creates the application state around a store.
    pub fn new(
        store: S,
        jurisdictions: JurisdictionsConfig,
        sync_config: SyncConfig,
        http_config: HttpConfig,
        shutdown_token: CancellationToken,
    ) -> Self {
        let progress = ProgressStore::new();
        let factory = DataSourceFactory::with_config(jurisdictions.clone(), http_config);
        let sync_service =
            SyncService::with_config(store.clone(), factory, progress.clone(), sync_config)
                .with_jurisdictions(jurisdictions);

        Self {
            sync_service,
            progress,
            store,
            shutdown_token,
        }
    }
}

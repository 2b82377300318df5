//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::dto::{
    AckResponse, FullSyncResponse, HealthResponse, ProgressUpdateRequest, ServiceStatus,
    SyncProgressResponse, SyncResponse,
};
use crate::error::ErrorResponse;
use crate::handlers::{health, progress, sync};

/// OpenAPI documentation for the tenement sync API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tenement Sync API",
        version = "1.0.0",
        description = "Synchronises Australian mining tenements into PostgreSQL.

WA is read from the DMIRS-003 ArcGIS feature service; NSW, VIC, NT, QLD and
TAS are generated until live feeds are integrated.

## Quick Start

1. Check server health: `GET /health`
2. Sync one jurisdiction: `POST /sync/TAS`
3. Poll its progress: `GET /sync-progress/TAS`
",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        health::health_check,
        sync::sync_jurisdiction,
        sync::sync_all,
        progress::get_progress,
        progress::set_progress,
    ),
    components(
        schemas(
            // Request types
            ProgressUpdateRequest,
            // Response types
            HealthResponse,
            ServiceStatus,
            SyncResponse,
            FullSyncResponse,
            SyncProgressResponse,
            AckResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "system", description = "System health"),
        (name = "sync", description = "Jurisdiction sync operations"),
        (name = "progress", description = "Sync progress polling"),
    )
)]
pub struct ApiDoc;

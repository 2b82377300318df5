//! Health check endpoint.

use axum::{Json, extract::State};

use tenement_core::traits::TenementStore;

use crate::dto::{HealthResponse, ServiceStatus};
use crate::state::AppState;

/// Health check endpoint.
///
/// Returns the server version and database reachability. A failing database
/// reports `degraded` rather than an error status.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server health", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health_check<S: TenementStore + 'static>(
    State(state): State<AppState<S>>,
) -> Json<HealthResponse> {
    let database = match state.store.health_check().await {
        Ok(()) => ServiceStatus {
            healthy: true,
            message: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            ServiceStatus {
                healthy: false,
                message: Some(e.user_message()),
            }
        }
    };

    Json(HealthResponse {
        status: if database.healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    })
}

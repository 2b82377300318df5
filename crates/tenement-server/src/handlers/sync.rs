//! Sync endpoints.
//!
//! Runs execute on a spawned task so a client disconnect does not abort a
//! half-written jurisdiction; the request waits for the result.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use tenement_core::Jurisdiction;
use tenement_core::traits::TenementStore;

use crate::dto::{FullSyncResponse, SyncResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Synchronize one jurisdiction.
///
/// Returns 200 when the run completed, possibly with batch errors, and 500
/// with the same body when the run failed or was cancelled.
#[utoipa::path(
    post,
    path = "/sync/{jurisdiction}",
    params(
        ("jurisdiction" = String, Path, description = "Jurisdiction code, e.g. WA or NSW")
    ),
    responses(
        (status = 200, description = "Sync completed", body = SyncResponse),
        (status = 400, description = "Unknown jurisdiction", body = crate::error::ErrorResponse),
        (status = 500, description = "Sync failed", body = SyncResponse),
    ),
    tag = "sync"
)]
pub async fn sync_jurisdiction<S: TenementStore + 'static>(
    State(state): State<AppState<S>>,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<SyncResponse>), ApiError> {
    let jurisdiction: Jurisdiction = code.parse()?;

    let service = state.sync_service.clone();
    let token = state.shutdown_token.child_token();
    let summary = tokio::spawn(async move {
        service
            .sync_jurisdiction_cancellable(jurisdiction, token)
            .await
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Sync task failed: {}", e)))?;

    let status = if summary.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(SyncResponse::from(summary))))
}

/// Synchronize every enabled jurisdiction in order.
///
/// A failing jurisdiction does not stop the others; its result is reported
/// in `results`.
#[utoipa::path(
    post,
    path = "/sync/all",
    responses(
        (status = 200, description = "Full sync finished", body = FullSyncResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sync"
)]
pub async fn sync_all<S: TenementStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<FullSyncResponse>, ApiError> {
    let service = state.sync_service.clone();
    let token = state.shutdown_token.child_token();
    let summary = tokio::spawn(async move { service.sync_all_cancellable(token).await })
        .await
        .map_err(|e| ApiError::Internal(format!("Sync task failed: {}", e)))?;

    Ok(Json(FullSyncResponse::from(summary)))
}

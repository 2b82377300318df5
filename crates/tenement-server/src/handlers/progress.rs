//! Progress polling endpoints.

use axum::{
    Json,
    extract::{Path, State},
};

use tenement_core::Jurisdiction;
use tenement_core::traits::TenementStore;

use crate::dto::{AckResponse, ProgressUpdateRequest, SyncProgressResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Get the progress snapshot for a jurisdiction.
///
/// Jurisdictions that have never synced report `idle`.
#[utoipa::path(
    get,
    path = "/sync-progress/{jurisdiction}",
    params(
        ("jurisdiction" = String, Path, description = "Jurisdiction code")
    ),
    responses(
        (status = 200, description = "Current snapshot", body = SyncProgressResponse),
        (status = 400, description = "Unknown jurisdiction", body = crate::error::ErrorResponse),
    ),
    tag = "progress"
)]
pub async fn get_progress<S: TenementStore + 'static>(
    State(state): State<AppState<S>>,
    Path(code): Path<String>,
) -> Result<Json<SyncProgressResponse>, ApiError> {
    let jurisdiction: Jurisdiction = code.parse()?;
    Ok(Json(state.progress.get(jurisdiction).into()))
}

/// Overwrite the progress snapshot for a jurisdiction.
#[utoipa::path(
    post,
    path = "/sync-progress/{jurisdiction}",
    params(
        ("jurisdiction" = String, Path, description = "Jurisdiction code")
    ),
    request_body = ProgressUpdateRequest,
    responses(
        (status = 200, description = "Snapshot stored", body = AckResponse),
        (status = 400, description = "Unknown jurisdiction", body = crate::error::ErrorResponse),
    ),
    tag = "progress"
)]
pub async fn set_progress<S: TenementStore + 'static>(
    State(state): State<AppState<S>>,
    Path(code): Path<String>,
    Json(request): Json<ProgressUpdateRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    let jurisdiction: Jurisdiction = code.parse()?;
    state.progress.set(jurisdiction, request.into());
    Ok(Json(AckResponse { success: true }))
}

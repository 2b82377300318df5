//! Request DTOs for API endpoints.

use serde::Deserialize;
use utoipa::ToSchema;

use tenement_core::{ProgressUpdate, SyncState};

/// Body for overwriting a jurisdiction's progress snapshot.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdateRequest {
    /// One of `idle`, `syncing`, `completed`, `error`
    #[schema(value_type = String, example = "syncing")]
    pub status: SyncState,

    /// Percentage complete; values above 100 are clamped
    #[schema(example = 40)]
    pub progress: u8,

    #[serde(default)]
    #[schema(example = 400)]
    pub current_record: u64,

    #[serde(default)]
    #[schema(example = 1000)]
    pub total_records: u64,

    #[serde(default)]
    #[schema(example = "Imported 400 of 1000 tenements")]
    pub message: String,
}

impl From<ProgressUpdateRequest> for ProgressUpdate {
    fn from(r: ProgressUpdateRequest) -> Self {
        Self {
            status: r.status,
            progress: r.progress,
            current_record: r.current_record,
            total_records: r.total_records,
            message: r.message,
        }
    }
}

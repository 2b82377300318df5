//! Response DTOs for API endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use tenement_core::{FullSyncSummary, SyncProgress, SyncSummary};

// =============================================================================
// Health
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("healthy" or "degraded")
    pub status: String,
    /// Server version
    pub version: String,
    /// Database connectivity status
    pub database: ServiceStatus,
}

/// Status of an individual service component.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    /// Whether the service is reachable
    pub healthy: bool,
    /// Optional message (e.g., error details)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// Sync
// =============================================================================

/// Result of a single-jurisdiction sync.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// False for run-level errors and cancellation; batch errors alone keep it true
    pub success: bool,
    /// Records written
    pub imported: u64,
    /// Batch, page and run-level error messages
    pub errors: Vec<String>,
    /// Jurisdiction code
    #[schema(example = "TAS")]
    pub jurisdiction: String,
    /// Run start time
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Final progress status
    #[schema(example = "completed")]
    pub status: String,
    /// Total reported by the source
    pub total_records: u64,
}

impl From<SyncSummary> for SyncResponse {
    fn from(s: SyncSummary) -> Self {
        Self {
            success: s.success,
            imported: s.imported,
            errors: s.errors,
            jurisdiction: s.jurisdiction.code().to_string(),
            timestamp: s.timestamp,
            message: s.message,
            status: s.status.to_string(),
            total_records: s.total_records,
        }
    }
}

/// Result of a full sync across enabled jurisdictions.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FullSyncResponse {
    /// True when every planned jurisdiction completed
    pub success: bool,
    pub total_imported: u64,
    pub successful_syncs: usize,
    pub total_jurisdictions: usize,
    /// Per-jurisdiction results in sync order
    pub results: Vec<SyncResponse>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Whether shutdown stopped the run early
    pub cancelled: bool,
}

impl From<FullSyncSummary> for FullSyncResponse {
    fn from(s: FullSyncSummary) -> Self {
        Self {
            success: s.success,
            total_imported: s.total_imported,
            successful_syncs: s.successful_syncs,
            total_jurisdictions: s.total_jurisdictions,
            results: s.results.into_iter().map(SyncResponse::from).collect(),
            timestamp: s.timestamp,
            message: s.message,
            cancelled: s.cancelled,
        }
    }
}

// =============================================================================
// Progress
// =============================================================================

/// Progress snapshot for one jurisdiction.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgressResponse {
    /// One of `idle`, `syncing`, `completed`, `error`
    #[schema(example = "syncing")]
    pub status: String,
    /// Percentage complete (0-100)
    pub progress: u8,
    pub current_record: u64,
    pub total_records: u64,
    pub message: String,
    /// Seconds remaining, estimated from throughput so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<u64>,
}

impl From<SyncProgress> for SyncProgressResponse {
    fn from(p: SyncProgress) -> Self {
        Self {
            status: p.status.to_string(),
            progress: p.progress,
            current_record: p.current_record,
            total_records: p.total_records,
            message: p.message,
            estimated_time_remaining: p.estimated_time_remaining,
        }
    }
}

/// Acknowledgement for progress writes.
#[derive(Debug, Serialize, ToSchema)]
pub struct AckResponse {
    pub success: bool,
}

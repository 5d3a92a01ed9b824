use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::service::{BulkItemResult, TransitionOutcome};
use crate::errors::AppError;
use crate::models::application::{
    ApplicationRecord, ApplicationStatus, TrackingEntry, TransitionMetadata,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    /// Score at application time. Computed from the stored resume when omitted.
    pub score_snapshot: Option<f64>,
}

#[derive(Serialize)]
pub struct ApplyResponse {
    pub application: ApplicationRecord,
    pub created: bool,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub new_status: ApplicationStatus,
    #[serde(default)]
    pub metadata: TransitionMetadata,
}

#[derive(Deserialize)]
pub struct BulkTransitionRequest {
    /// Parsed per item by the service so one bad item cannot reject the batch.
    pub items: Vec<Value>,
}

#[derive(Serialize)]
pub struct BulkTransitionResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkItemResult>,
}

/// POST /api/v1/applications
/// Idempotent per (candidate, job): 201 on first apply, 200 with the
/// existing application afterwards.
pub async fn handle_apply(
    State(state): State<AppState>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplyResponse>), AppError> {
    let score_snapshot = match req.score_snapshot {
        Some(s) if !s.is_finite() || !(0.0..=100.0).contains(&s) => {
            return Err(AppError::Validation(format!(
                "score_snapshot must be within [0, 100], got {s}"
            )));
        }
        Some(s) => Some(s),
        None => snapshot_score(&state, req.candidate_id, req.job_id).await,
    };

    let (application, created) = state
        .tracking
        .apply(req.candidate_id, req.job_id, score_snapshot)
        .await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApplyResponse { application, created })))
}

/// Best-effort score for the snapshot. Missing data or a scoring failure
/// leaves the snapshot empty; prediction then rescores on demand.
async fn snapshot_score(state: &AppState, candidate_id: Uuid, job_id: Uuid) -> Option<f64> {
    let resume = state.resumes.get_resume(candidate_id).await.ok().flatten()?;
    let job = state.jobs.get_job(job_id).await.ok().flatten()?;
    match state
        .scoring
        .score_pair(candidate_id, &resume.profile, job_id, &job.posting)
        .await
    {
        Ok(result) if !result.insufficient_data => Some(result.final_score),
        Ok(_) => None,
        Err(e) => {
            warn!("Could not snapshot score for candidate {candidate_id} / job {job_id}: {e}");
            None
        }
    }
}

/// POST /api/v1/applications/:id/transition
pub async fn handle_transition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<TransitionOutcome>, AppError> {
    let outcome = state
        .tracking
        .transition(id, req.new_status, req.metadata)
        .await?;
    Ok(Json(outcome))
}

/// GET /api/v1/applications/:id/history
pub async fn handle_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TrackingEntry>>, AppError> {
    Ok(Json(state.tracking.get_history(id).await?))
}

/// POST /api/v1/applications/bulk-transition
/// Always 200; per-item failures are reported in `results`.
pub async fn handle_bulk_transition(
    State(state): State<AppState>,
    Json(req): Json<BulkTransitionRequest>,
) -> Json<BulkTransitionResponse> {
    let results = state.tracking.bulk_transition(req.items).await;
    let succeeded = results.iter().filter(|r| r.success).count();
    Json(BulkTransitionResponse {
        succeeded,
        failed: results.len() - succeeded,
        results,
    })
}

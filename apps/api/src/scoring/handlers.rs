use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::MatchResult;
use crate::errors::AppError;
use crate::state::AppState;

/// Either ad-hoc JSON records or the ids of stored ones.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum MatchRequest {
    Inline { profile: Value, job: Value },
    Stored { candidate_id: Uuid, job_id: Uuid },
}

/// POST /api/v1/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResult>, AppError> {
    let result = match req {
        MatchRequest::Inline { profile, job } => state.scoring.score_value(&profile, &job).await?,
        MatchRequest::Stored {
            candidate_id,
            job_id,
        } => {
            let resume = state
                .resumes
                .get_resume(candidate_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("No resume for candidate {candidate_id}")))?;
            let job = state
                .jobs
                .get_job(job_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
            state
                .scoring
                .score_pair(candidate_id, &resume.profile, job_id, &job.posting)
                .await?
        }
    };
    Ok(Json(result))
}

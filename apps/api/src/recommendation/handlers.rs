use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use super::{recommend_jobs, RecommendationLimits, RecommendationSet};
use crate::errors::AppError;
use crate::state::AppState;

/// Most recent postings considered when the caller names no jobs.
const MAX_CANDIDATE_JOBS: i64 = 500;

#[derive(Deserialize)]
pub struct RecommendationRequest {
    pub candidate_id: Uuid,
    pub top_n: Option<usize>,
    /// Restrict ranking to these postings; unknown ids are skipped.
    pub job_ids: Option<Vec<Uuid>>,
}

/// POST /api/v1/recommendations
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Json(req): Json<RecommendationRequest>,
) -> Result<Json<RecommendationSet>, AppError> {
    let resume = state
        .resumes
        .get_resume(req.candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No resume for candidate {}", req.candidate_id)))?;

    let jobs = match req.job_ids {
        Some(ids) => {
            let mut jobs = Vec::with_capacity(ids.len());
            for id in ids {
                match state.jobs.get_job(id).await? {
                    Some(job) => jobs.push(job),
                    None => warn!("Recommendation request names unknown job {id}"),
                }
            }
            jobs
        }
        None => state.jobs.list_jobs(MAX_CANDIDATE_JOBS).await?,
    };

    let limits = RecommendationLimits {
        top_n: req.top_n.unwrap_or(state.config.recommendation_top_n),
        workers: state.config.recommendation_workers,
        deadline: state.config.recommendation_deadline,
    };
    let set = recommend_jobs(
        &state.scoring,
        req.candidate_id,
        &resume.profile,
        jobs,
        limits,
    )
    .await;
    Ok(Json(set))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::ExtractionSource;
use crate::errors::AppError;
use crate::matching::{calculate_experience, ExperienceTotal};
use crate::normalizer::normalize_job;
use crate::state::AppState;
use crate::store::{StoredJob, StoredResume};

#[derive(Deserialize)]
pub struct ParseResumeRequest {
    pub candidate_id: Uuid,
    pub text: String,
}

#[derive(Serialize)]
pub struct ParsedResumeResponse {
    pub resume: StoredResume,
    pub source: ExtractionSource,
    pub issues: Vec<String>,
}

#[derive(Serialize)]
pub struct ResumeView {
    pub resume: StoredResume,
    /// Experience summed as of today.
    pub experience: ExperienceTotal,
}

#[derive(Deserialize)]
pub struct CreateJobRequest {
    /// Existing id to replace, or none for a new posting.
    pub job_id: Option<Uuid>,
    pub posting: Value,
}

#[derive(Deserialize)]
pub struct ParseJobRequest {
    pub job_id: Option<Uuid>,
    pub text: String,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub job: StoredJob,
    pub degraded: bool,
    pub source: Option<ExtractionSource>,
    pub issues: Vec<String>,
}

fn require_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }
    Ok(())
}

/// POST /api/v1/resumes/parse
/// Extracts a profile from raw resume text and replaces the stored one.
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    Json(req): Json<ParseResumeRequest>,
) -> Result<Json<ParsedResumeResponse>, AppError> {
    require_text(&req.text)?;

    let extraction = state.extraction.extract_resume(&req.text).await;
    let resume = state
        .resumes
        .save_resume(req.candidate_id, &extraction.record, extraction.degraded)
        .await?;
    info!(
        "Stored resume for candidate {} (source={:?}, degraded={})",
        req.candidate_id, extraction.source, extraction.degraded
    );

    Ok(Json(ParsedResumeResponse {
        resume,
        source: extraction.source,
        issues: extraction.issues,
    }))
}

/// GET /api/v1/resumes/:candidate_id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<ResumeView>, AppError> {
    let resume = state
        .resumes
        .get_resume(candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No resume for candidate {candidate_id}")))?;
    let experience = calculate_experience(&resume.profile.experience);
    Ok(Json(ResumeView { resume, experience }))
}

/// POST /api/v1/jobs
/// Stores an already-structured posting after normalizing it.
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    if !req.posting.is_object() {
        return Err(AppError::InvalidInput("posting must be a JSON object".to_string()));
    }

    let normalized = normalize_job(&req.posting);
    let job_id = req.job_id.unwrap_or_else(Uuid::new_v4);
    let job = state.jobs.save_job(job_id, &normalized.value).await?;

    Ok((
        StatusCode::CREATED,
        Json(JobResponse {
            job,
            degraded: normalized.degraded,
            source: None,
            issues: normalized.issues,
        }),
    ))
}

/// POST /api/v1/jobs/parse
/// Extracts a posting from raw text and stores it.
pub async fn handle_parse_job(
    State(state): State<AppState>,
    Json(req): Json<ParseJobRequest>,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    require_text(&req.text)?;

    let extraction = state.extraction.extract_job(&req.text).await;
    let job_id = req.job_id.unwrap_or_else(Uuid::new_v4);
    let job = state.jobs.save_job(job_id, &extraction.record).await?;
    info!("Stored job {job_id} (source={:?})", extraction.source);

    Ok((
        StatusCode::CREATED,
        Json(JobResponse {
            job,
            degraded: extraction.degraded,
            source: Some(extraction.source),
            issues: extraction.issues,
        }),
    ))
}

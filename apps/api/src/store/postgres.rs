use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    ApplicationRepository, JobRepository, NewApplication, ResumeRepository, StatusUpdate,
    StoredJob, StoredResume, INITIAL_NOTE,
};
use crate::errors::AppError;
use crate::models::application::{
    ApplicationRecord, ApplicationStatus, HistoricalOutcome, InterviewMode, TrackingEntry,
};
use crate::models::profile::{JobPosting, ResumeProfile};
use crate::prediction::cohort::infer_industry;

/// PostgreSQL-backed repositories. Schema lives in `apps/api/migrations`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ─── Row types ──────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct ResumeRow {
    candidate_id: Uuid,
    profile: Json<ResumeProfile>,
    degraded: bool,
    updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for StoredResume {
    fn from(row: ResumeRow) -> Self {
        StoredResume {
            candidate_id: row.candidate_id,
            profile: row.profile.0,
            degraded: row.degraded,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    industry: String,
    posting: Json<JobPosting>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<JobRow> for StoredJob {
    fn from(row: JobRow) -> Self {
        StoredJob {
            id: row.id,
            posting: row.posting.0,
            industry: row.industry,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    candidate_id: Uuid,
    job_id: Uuid,
    status: String,
    score_snapshot: Option<f64>,
    interview_date: Option<DateTime<Utc>>,
    interview_mode: Option<String>,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for ApplicationRecord {
    type Error = AppError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        Ok(ApplicationRecord {
            id: row.id,
            candidate_id: row.candidate_id,
            job_id: row.job_id,
            status: parse_status(&row.status)?,
            score_snapshot: row.score_snapshot,
            interview_date: row.interview_date,
            interview_mode: row.interview_mode.as_deref().and_then(InterviewMode::parse),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TrackingRow {
    seq: i64,
    id: Uuid,
    application_id: Uuid,
    status: String,
    notes: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<TrackingRow> for TrackingEntry {
    type Error = AppError;

    fn try_from(row: TrackingRow) -> Result<Self, Self::Error> {
        Ok(TrackingEntry {
            id: row.id,
            sequence: row.seq,
            application_id: row.application_id,
            status: parse_status(&row.status)?,
            notes: row.notes,
            recorded_at: row.recorded_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OutcomeRow {
    company: String,
    industry: String,
    status: String,
}

fn parse_status(raw: &str) -> Result<ApplicationStatus, AppError> {
    raw.parse()
        .map_err(|e| AppError::Internal(anyhow!("corrupt status column: {e}")))
}

fn into_outcomes(rows: Vec<OutcomeRow>) -> Vec<HistoricalOutcome> {
    rows.into_iter()
        .filter_map(|row| match row.status.parse() {
            Ok(status) => Some(HistoricalOutcome {
                company: row.company,
                industry: row.industry,
                status,
            }),
            Err(e) => {
                warn!("Skipping historical application: {e}");
                None
            }
        })
        .collect()
}

// ─── Repositories ───────────────────────────────────────────────────────────

#[async_trait]
impl ResumeRepository for PgStore {
    async fn save_resume(
        &self,
        candidate_id: Uuid,
        profile: &ResumeProfile,
        degraded: bool,
    ) -> Result<StoredResume, AppError> {
        let row: ResumeRow = sqlx::query_as(
            r#"
            INSERT INTO resumes (candidate_id, profile, degraded, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (candidate_id)
            DO UPDATE SET profile = EXCLUDED.profile,
                          degraded = EXCLUDED.degraded,
                          updated_at = NOW()
            RETURNING candidate_id, profile, degraded, updated_at
            "#,
        )
        .bind(candidate_id)
        .bind(Json(profile))
        .bind(degraded)
        .fetch_one(&self.pool)
        .await?;

        debug!("Saved resume for candidate {candidate_id} (degraded={degraded})");
        Ok(row.into())
    }

    async fn get_resume(&self, candidate_id: Uuid) -> Result<Option<StoredResume>, AppError> {
        let row: Option<ResumeRow> = sqlx::query_as(
            "SELECT candidate_id, profile, degraded, updated_at FROM resumes WHERE candidate_id = $1",
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl JobRepository for PgStore {
    async fn save_job(&self, job_id: Uuid, posting: &JobPosting) -> Result<StoredJob, AppError> {
        let row: JobRow = sqlx::query_as(
            r#"
            INSERT INTO jobs (id, company, industry, posting)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET company = EXCLUDED.company,
                          industry = EXCLUDED.industry,
                          posting = EXCLUDED.posting,
                          updated_at = NOW()
            RETURNING id, industry, posting, created_at, updated_at
            "#,
        )
        .bind(job_id)
        .bind(&posting.company)
        .bind(infer_industry(posting))
        .bind(Json(posting))
        .fetch_one(&self.pool)
        .await?;

        debug!("Saved job {job_id}");
        Ok(row.into())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<StoredJob>, AppError> {
        let row: Option<JobRow> = sqlx::query_as(
            "SELECT id, industry, posting, created_at, updated_at FROM jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_jobs(&self, limit: i64) -> Result<Vec<StoredJob>, AppError> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT id, industry, posting, created_at, updated_at
            FROM jobs
            ORDER BY created_at DESC, id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ApplicationRepository for PgStore {
    async fn create_application(
        &self,
        new: NewApplication,
    ) -> Result<(ApplicationRecord, bool), AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<ApplicationRow> = sqlx::query_as(
            r#"
            INSERT INTO applications (id, candidate_id, job_id, status, score_snapshot)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (candidate_id, job_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.candidate_id)
        .bind(new.job_id)
        .bind(ApplicationStatus::Pending.as_str())
        .bind(new.score_snapshot)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = inserted else {
            tx.rollback().await?;
            let existing = self
                .find_application(new.candidate_id, new.job_id)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(anyhow!(
                        "application for candidate {} and job {} vanished after conflict",
                        new.candidate_id,
                        new.job_id
                    ))
                })?;
            return Ok((existing, false));
        };

        // Every application starts with its initial audit entry.
        sqlx::query(
            "INSERT INTO tracking_entries (id, application_id, status, notes) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(row.id)
        .bind(ApplicationStatus::Pending.as_str())
        .bind(INITIAL_NOTE)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Created application {} (candidate {}, job {})",
            row.id, row.candidate_id, row.job_id
        );
        Ok((row.try_into()?, true))
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError> {
        let row: Option<ApplicationRow> =
            sqlx::query_as("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<ApplicationRecord>, AppError> {
        let row: Option<ApplicationRow> =
            sqlx::query_as("SELECT * FROM applications WHERE candidate_id = $1 AND job_id = $2")
                .bind(candidate_id)
                .bind(job_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn update_status(
        &self,
        update: StatusUpdate,
    ) -> Result<(ApplicationRecord, TrackingEntry), AppError> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-set on version: the write only lands if nobody else
        // changed the record since it was read.
        let updated: Option<ApplicationRow> = sqlx::query_as(
            r#"
            UPDATE applications
            SET status = $1,
                interview_date = COALESCE($2, interview_date),
                interview_mode = COALESCE($3, interview_mode),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $4 AND version = $5
            RETURNING *
            "#,
        )
        .bind(update.status.as_str())
        .bind(update.interview_date)
        .bind(update.interview_mode.map(|m| m.as_str()))
        .bind(update.application_id)
        .bind(update.expected_version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = updated else {
            tx.rollback().await?;
            return Err(match self.get_application(update.application_id).await? {
                Some(_) => AppError::ConcurrencyConflict {
                    application_id: update.application_id,
                    expected_version: update.expected_version,
                },
                None => AppError::NotFound(format!(
                    "Application {} not found",
                    update.application_id
                )),
            });
        };

        let entry: TrackingRow = sqlx::query_as(
            r#"
            INSERT INTO tracking_entries (id, application_id, status, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING seq, id, application_id, status, notes, recorded_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.id)
        .bind(update.status.as_str())
        .bind(&update.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((row.try_into()?, entry.try_into()?))
    }

    async fn tracking_entries(&self, application_id: Uuid) -> Result<Vec<TrackingEntry>, AppError> {
        let rows: Vec<TrackingRow> = sqlx::query_as(
            r#"
            SELECT seq, id, application_id, status, notes, recorded_at
            FROM tracking_entries
            WHERE application_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn candidate_outcomes(
        &self,
        candidate_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<Vec<HistoricalOutcome>, AppError> {
        let rows: Vec<OutcomeRow> = sqlx::query_as(
            r#"
            SELECT j.company, j.industry, a.status
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.candidate_id = $1
              AND ($2::uuid IS NULL OR a.id <> $2)
            "#,
        )
        .bind(candidate_id)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;
        Ok(into_outcomes(rows))
    }

    async fn population_outcomes(
        &self,
        exclude: Option<Uuid>,
    ) -> Result<Vec<HistoricalOutcome>, AppError> {
        let rows: Vec<OutcomeRow> = sqlx::query_as(
            r#"
            SELECT j.company, j.industry, a.status
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE ($1::uuid IS NULL OR a.id <> $1)
            "#,
        )
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;
        Ok(into_outcomes(rows))
    }
}

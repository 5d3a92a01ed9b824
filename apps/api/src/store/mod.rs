//! Repository interfaces over the persistent store.
//!
//! Services receive these as `Arc<dyn …>` through `AppState`; nothing reaches
//! for a global connection. `PgStore` backs production, `MemoryStore` backs
//! tests and database-less local runs with the same semantics.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{
    ApplicationRecord, ApplicationStatus, HistoricalOutcome, InterviewMode, TrackingEntry,
};
use crate::models::profile::{JobPosting, ResumeProfile};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Note written on the tracking entry created with every application.
pub const INITIAL_NOTE: &str = "Application submitted";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredResume {
    pub candidate_id: Uuid,
    pub profile: ResumeProfile,
    pub degraded: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredJob {
    pub id: Uuid,
    pub posting: JobPosting,
    /// Industry as stated on the posting or inferred from its text; this is
    /// the value cohort lookups group by.
    pub industry: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub score_snapshot: Option<f64>,
}

/// A compare-and-set status write. Applied only if the stored record is
/// still at `expected_version`.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub application_id: Uuid,
    pub expected_version: i32,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_mode: Option<InterviewMode>,
}

#[async_trait]
pub trait ResumeRepository: Send + Sync {
    /// Replaces any previous profile for the candidate wholesale.
    async fn save_resume(
        &self,
        candidate_id: Uuid,
        profile: &ResumeProfile,
        degraded: bool,
    ) -> Result<StoredResume, AppError>;

    async fn get_resume(&self, candidate_id: Uuid) -> Result<Option<StoredResume>, AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn save_job(&self, job_id: Uuid, posting: &JobPosting) -> Result<StoredJob, AppError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<StoredJob>, AppError>;

    /// Most recently created first.
    async fn list_jobs(&self, limit: i64) -> Result<Vec<StoredJob>, AppError>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Idempotent on `(candidate_id, job_id)`. Returns the record and whether
    /// it was created by this call; the initial `pending` tracking entry is
    /// appended only when it was.
    async fn create_application(
        &self,
        new: NewApplication,
    ) -> Result<(ApplicationRecord, bool), AppError>;

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError>;

    async fn find_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<ApplicationRecord>, AppError>;

    /// Writes the new status and appends exactly one tracking entry,
    /// atomically. Fails with `ConcurrencyConflict` when the version moved.
    async fn update_status(
        &self,
        update: StatusUpdate,
    ) -> Result<(ApplicationRecord, TrackingEntry), AppError>;

    /// Insertion order.
    async fn tracking_entries(&self, application_id: Uuid) -> Result<Vec<TrackingEntry>, AppError>;

    /// The candidate's applications joined with their job's company and
    /// industry, optionally leaving one application out.
    async fn candidate_outcomes(
        &self,
        candidate_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<Vec<HistoricalOutcome>, AppError>;

    async fn population_outcomes(
        &self,
        exclude: Option<Uuid>,
    ) -> Result<Vec<HistoricalOutcome>, AppError>;
}

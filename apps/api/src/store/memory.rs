use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    ApplicationRepository, JobRepository, NewApplication, ResumeRepository, StatusUpdate,
    StoredJob, StoredResume, INITIAL_NOTE,
};
use crate::errors::AppError;
use crate::models::application::{
    ApplicationRecord, ApplicationStatus, HistoricalOutcome, TrackingEntry,
};
use crate::models::profile::{JobPosting, ResumeProfile};
use crate::prediction::cohort::infer_industry;

/// In-process store with the same semantics as `PgStore`. Used by tests and
/// when no `DATABASE_URL` is configured. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    resumes: HashMap<Uuid, StoredResume>,
    jobs: HashMap<Uuid, StoredJob>,
    /// Job ids in creation order.
    job_order: Vec<Uuid>,
    applications: HashMap<Uuid, ApplicationRecord>,
    by_pair: HashMap<(Uuid, Uuid), Uuid>,
    tracking: Vec<TrackingEntry>,
    next_seq: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal(anyhow!("memory store lock poisoned")))
    }
}

impl Inner {
    fn append_entry(
        &mut self,
        application_id: Uuid,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> TrackingEntry {
        self.next_seq += 1;
        let entry = TrackingEntry {
            id: Uuid::new_v4(),
            sequence: self.next_seq,
            application_id,
            status,
            notes,
            recorded_at: Utc::now(),
        };
        self.tracking.push(entry.clone());
        entry
    }

    fn outcome(&self, record: &ApplicationRecord) -> Option<HistoricalOutcome> {
        self.jobs.get(&record.job_id).map(|job| HistoricalOutcome {
            company: job.posting.company.clone(),
            industry: job.industry.clone(),
            status: record.status,
        })
    }

    fn outcomes(&self, keep: impl Fn(&ApplicationRecord) -> bool) -> Vec<HistoricalOutcome> {
        let mut records: Vec<&ApplicationRecord> =
            self.applications.values().filter(|r| keep(r)).collect();
        records.sort_by_key(|r| (r.created_at, r.id));
        records.into_iter().filter_map(|r| self.outcome(r)).collect()
    }
}

#[async_trait]
impl ResumeRepository for MemoryStore {
    async fn save_resume(
        &self,
        candidate_id: Uuid,
        profile: &ResumeProfile,
        degraded: bool,
    ) -> Result<StoredResume, AppError> {
        let stored = StoredResume {
            candidate_id,
            profile: profile.clone(),
            degraded,
            updated_at: Utc::now(),
        };
        self.lock()?.resumes.insert(candidate_id, stored.clone());
        debug!("Saved resume for candidate {candidate_id} (degraded={degraded})");
        Ok(stored)
    }

    async fn get_resume(&self, candidate_id: Uuid) -> Result<Option<StoredResume>, AppError> {
        Ok(self.lock()?.resumes.get(&candidate_id).cloned())
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn save_job(&self, job_id: Uuid, posting: &JobPosting) -> Result<StoredJob, AppError> {
        let mut inner = self.lock()?;
        let now = Utc::now();
        let existing = inner.jobs.get(&job_id).map(|job| job.created_at);
        let created_at = match existing {
            Some(created_at) => created_at,
            None => {
                inner.job_order.push(job_id);
                now
            }
        };
        let stored = StoredJob {
            id: job_id,
            posting: posting.clone(),
            industry: infer_industry(posting),
            created_at,
            updated_at: now,
        };
        inner.jobs.insert(job_id, stored.clone());
        debug!("Saved job {job_id}");
        Ok(stored)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<StoredJob>, AppError> {
        Ok(self.lock()?.jobs.get(&job_id).cloned())
    }

    async fn list_jobs(&self, limit: i64) -> Result<Vec<StoredJob>, AppError> {
        let inner = self.lock()?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(inner
            .job_order
            .iter()
            .rev()
            .filter_map(|id| inner.jobs.get(id).cloned())
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl ApplicationRepository for MemoryStore {
    async fn create_application(
        &self,
        new: NewApplication,
    ) -> Result<(ApplicationRecord, bool), AppError> {
        let mut inner = self.lock()?;
        let pair = (new.candidate_id, new.job_id);

        if let Some(existing) = inner.by_pair.get(&pair).and_then(|id| inner.applications.get(id)) {
            return Ok((existing.clone(), false));
        }
        if !inner.jobs.contains_key(&new.job_id) {
            return Err(AppError::NotFound(format!("Job {} not found", new.job_id)));
        }

        let now = Utc::now();
        let record = ApplicationRecord {
            id: Uuid::new_v4(),
            candidate_id: new.candidate_id,
            job_id: new.job_id,
            status: ApplicationStatus::Pending,
            score_snapshot: new.score_snapshot,
            interview_date: None,
            interview_mode: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        inner.applications.insert(record.id, record.clone());
        inner.by_pair.insert(pair, record.id);
        inner.append_entry(record.id, ApplicationStatus::Pending, Some(INITIAL_NOTE.to_string()));

        info!(
            "Created application {} (candidate {}, job {})",
            record.id, record.candidate_id, record.job_id
        );
        Ok((record, true))
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    async fn find_application(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<ApplicationRecord>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .by_pair
            .get(&(candidate_id, job_id))
            .and_then(|id| inner.applications.get(id))
            .cloned())
    }

    async fn update_status(
        &self,
        update: StatusUpdate,
    ) -> Result<(ApplicationRecord, TrackingEntry), AppError> {
        let mut inner = self.lock()?;
        let record = inner
            .applications
            .get_mut(&update.application_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Application {} not found", update.application_id))
            })?;

        if record.version != update.expected_version {
            return Err(AppError::ConcurrencyConflict {
                application_id: update.application_id,
                expected_version: update.expected_version,
            });
        }

        record.status = update.status;
        if update.interview_date.is_some() {
            record.interview_date = update.interview_date;
        }
        if update.interview_mode.is_some() {
            record.interview_mode = update.interview_mode;
        }
        record.version += 1;
        record.updated_at = Utc::now();
        let record = record.clone();

        let entry = inner.append_entry(record.id, update.status, update.notes);
        Ok((record, entry))
    }

    async fn tracking_entries(&self, application_id: Uuid) -> Result<Vec<TrackingEntry>, AppError> {
        Ok(self
            .lock()?
            .tracking
            .iter()
            .filter(|e| e.application_id == application_id)
            .cloned()
            .collect())
    }

    async fn candidate_outcomes(
        &self,
        candidate_id: Uuid,
        exclude: Option<Uuid>,
    ) -> Result<Vec<HistoricalOutcome>, AppError> {
        let inner = self.lock()?;
        Ok(inner.outcomes(move |r| r.candidate_id == candidate_id && Some(r.id) != exclude))
    }

    async fn population_outcomes(
        &self,
        exclude: Option<Uuid>,
    ) -> Result<Vec<HistoricalOutcome>, AppError> {
        let inner = self.lock()?;
        Ok(inner.outcomes(move |r| Some(r.id) != exclude))
    }
}

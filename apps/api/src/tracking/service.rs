use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::state_machine::validate_transition;
use crate::errors::AppError;
use crate::models::application::{
    ApplicationRecord, ApplicationStatus, TrackingEntry, TransitionMetadata,
};
use crate::store::{ApplicationRepository, JobRepository, NewApplication, StatusUpdate};

/// Identifies an application either directly or by its `(candidate, job)` pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApplicationKey {
    Id { application_id: Uuid },
    Pair { candidate_id: Uuid, job_id: Uuid },
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkTransitionItem {
    #[serde(flatten)]
    pub key: ApplicationKey,
    pub new_status: ApplicationStatus,
    #[serde(default)]
    pub metadata: TransitionMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub application: ApplicationRecord,
    pub entry: TrackingEntry,
}

/// Result for one item of a bulk transition. Failures carry the error code
/// and message instead of aborting the batch.
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemResult {
    pub index: usize,
    pub application_id: Option<Uuid>,
    pub success: bool,
    pub status: Option<ApplicationStatus>,
    pub error: Option<String>,
    pub error_code: Option<&'static str>,
}

/// Application lifecycle: creation, validated status changes and the
/// append-only audit trail.
#[derive(Clone)]
pub struct TrackingService {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
}

impl TrackingService {
    pub fn new(applications: Arc<dyn ApplicationRepository>, jobs: Arc<dyn JobRepository>) -> Self {
        Self { applications, jobs }
    }

    /// Creates the application (status `pending`, one tracking entry), or
    /// returns the existing one for the same pair. The flag tells which.
    pub async fn apply(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        score_snapshot: Option<f64>,
    ) -> Result<(ApplicationRecord, bool), AppError> {
        self.require_job(job_id).await?;
        self.applications
            .create_application(NewApplication {
                candidate_id,
                job_id,
                score_snapshot,
            })
            .await
    }

    /// Validates and applies one status change, appending exactly one
    /// tracking entry. Rejects illegal transitions and stale versions.
    pub async fn transition(
        &self,
        application_id: Uuid,
        new_status: ApplicationStatus,
        metadata: TransitionMetadata,
    ) -> Result<TransitionOutcome, AppError> {
        let record = self.require_application(application_id).await?;

        if let Some(expected) = metadata.expected_version {
            if expected != record.version {
                warn!(
                    "Stale transition on application {application_id}: caller saw v{expected}, store has v{}",
                    record.version
                );
                return Err(AppError::ConcurrencyConflict {
                    application_id,
                    expected_version: expected,
                });
            }
        }

        validate_transition(record.status, new_status)?;

        let update = StatusUpdate {
            application_id,
            expected_version: record.version,
            status: new_status,
            notes: metadata.notes,
            interview_date: metadata.interview_date,
            interview_mode: metadata.interview_mode,
        };
        let (application, entry) = match self.applications.update_status(update).await {
            Ok(written) => written,
            Err(e @ AppError::ConcurrencyConflict { .. }) => {
                warn!("Concurrent update on application {application_id} lost the race");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        info!(
            "Application {application_id}: {} -> {} (v{})",
            record.status, application.status, application.version
        );
        if application.status.is_terminal() {
            info!("Application {application_id} closed as {}", application.status);
        }
        Ok(TransitionOutcome { application, entry })
    }

    /// Tracking entries, most recent first. Entries recorded in the same
    /// instant keep their insertion order reversed.
    pub async fn get_history(&self, application_id: Uuid) -> Result<Vec<TrackingEntry>, AppError> {
        self.require_application(application_id).await?;
        let mut entries = self.applications.tracking_entries(application_id).await?;
        entries.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then(b.sequence.cmp(&a.sequence))
        });
        Ok(entries)
    }

    /// Applies each item independently. Items are parsed one at a time, so a
    /// malformed item fails alone with `VALIDATION_ERROR`. One item failing
    /// never aborts or rolls back the others; the call itself never fails.
    pub async fn bulk_transition(&self, items: Vec<Value>) -> Vec<BulkItemResult> {
        let mut results = Vec::with_capacity(items.len());
        for (index, raw) in items.into_iter().enumerate() {
            let mut application_id = None;
            let outcome = match serde_json::from_value::<BulkTransitionItem>(raw) {
                Ok(item) => match self.resolve(&item.key).await {
                    Ok(id) => {
                        application_id = Some(id);
                        self.transition(id, item.new_status, item.metadata).await
                    }
                    Err(e) => Err(e),
                },
                Err(e) => Err(AppError::Validation(format!("malformed item: {e}"))),
            };
            results.push(match outcome {
                Ok(done) => BulkItemResult {
                    index,
                    application_id,
                    success: true,
                    status: Some(done.application.status),
                    error: None,
                    error_code: None,
                },
                Err(e) => {
                    warn!("Bulk transition item {index} failed: {e}");
                    BulkItemResult {
                        index,
                        application_id,
                        success: false,
                        status: None,
                        error_code: Some(e.code()),
                        error: Some(e.to_string()),
                    }
                }
            });
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        info!("Bulk transition: {succeeded}/{} succeeded", results.len());
        results
    }

    async fn resolve(&self, key: &ApplicationKey) -> Result<Uuid, AppError> {
        match *key {
            ApplicationKey::Id { application_id } => Ok(application_id),
            ApplicationKey::Pair {
                candidate_id,
                job_id,
            } => {
                self.require_job(job_id).await?;
                self.applications
                    .find_application(candidate_id, job_id)
                    .await?
                    .map(|record| record.id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "No application for candidate {candidate_id} and job {job_id}"
                        ))
                    })
            }
        }
    }

    async fn require_job(&self, job_id: Uuid) -> Result<(), AppError> {
        match self.jobs.get_job(job_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Job {job_id} not found"))),
        }
    }

    async fn require_application(&self, id: Uuid) -> Result<ApplicationRecord, AppError> {
        self.applications
            .get_application(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::models::profile::JobPosting;
    use crate::store::MemoryStore;
    use crate::models::application::ApplicationStatus::*;

    async fn setup() -> (TrackingService, Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let job_id = Uuid::new_v4();
        store
            .save_job(
                job_id,
                &JobPosting {
                    title: "Backend Engineer".to_string(),
                    company: "Acme Corp".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (TrackingService::new(store.clone(), store.clone()), store, job_id)
    }

    fn meta(notes: &str) -> TransitionMetadata {
        TransitionMetadata {
            notes: Some(notes.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_each_transition_appends_one_entry() {
        let (service, _, job_id) = setup().await;
        let (app, _) = service.apply(Uuid::new_v4(), job_id, Some(72.5)).await.unwrap();
        assert_eq!(service.get_history(app.id).await.unwrap().len(), 1);

        let path = [AiScreening, Reviewing, Shortlisted, Interview, Hired];
        for (i, status) in path.into_iter().enumerate() {
            let done = service.transition(app.id, status, meta("moved")).await.unwrap();
            assert_eq!(done.application.status, status);
            assert_eq!(done.entry.status, status);
            assert_eq!(service.get_history(app.id).await.unwrap().len(), i + 2);
        }

        let history = service.get_history(app.id).await.unwrap();
        assert_eq!(history.first().unwrap().status, Hired);
        assert_eq!(history.last().unwrap().status, Pending);
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected_without_entry() {
        let (service, _, job_id) = setup().await;
        let (app, _) = service.apply(Uuid::new_v4(), job_id, None).await.unwrap();

        let err = service
            .transition(app.id, Hired, TransitionMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { from: Pending, to: Hired }));
        assert_eq!(service.get_history(app.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_override_to_rejected_then_terminal() {
        let (service, _, job_id) = setup().await;
        let (app, _) = service.apply(Uuid::new_v4(), job_id, None).await.unwrap();
        service.transition(app.id, AiScreening, meta("auto")).await.unwrap();

        let done = service.transition(app.id, Rejected, meta("not a fit")).await.unwrap();
        assert_eq!(done.entry.notes.as_deref(), Some("not a fit"));

        let err = service
            .transition(app.id, Reviewing, TransitionMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { from: Rejected, .. }));
    }

    #[tokio::test]
    async fn test_stale_expected_version_conflicts() {
        let (service, _, job_id) = setup().await;
        let (app, _) = service.apply(Uuid::new_v4(), job_id, None).await.unwrap();

        // Two recruiters both saw version 1.
        let seen = TransitionMetadata {
            expected_version: Some(app.version),
            ..Default::default()
        };
        service.transition(app.id, AiScreening, seen.clone()).await.unwrap();
        let err = service.transition(app.id, Rejected, seen).await.unwrap_err();

        assert!(matches!(err, AppError::ConcurrencyConflict { expected_version: 1, .. }));
        assert_eq!(service.get_history(app.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_interview_metadata_is_recorded() {
        let (service, store, job_id) = setup().await;
        let (app, _) = service.apply(Uuid::new_v4(), job_id, None).await.unwrap();
        for status in [AiScreening, Reviewing, Shortlisted] {
            service.transition(app.id, status, TransitionMetadata::default()).await.unwrap();
        }
        let when = chrono::Utc::now();
        service
            .transition(
                app.id,
                Interview,
                TransitionMetadata {
                    interview_date: Some(when),
                    interview_mode: Some(crate::models::application::InterviewMode::Online),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = store.get_application(app.id).await.unwrap().unwrap();
        assert_eq!(stored.interview_date, Some(when));
        assert_eq!(stored.version, 5);
    }

    #[tokio::test]
    async fn test_bulk_transition_isolates_failures() {
        let (service, _, job_id) = setup().await;
        let (a, _) = service.apply(Uuid::new_v4(), job_id, None).await.unwrap();
        let (b, _) = service.apply(Uuid::new_v4(), job_id, None).await.unwrap();

        let items = vec![
            json!({"candidate_id": a.candidate_id, "job_id": job_id, "new_status": "ai_screening"}),
            json!({"candidate_id": b.candidate_id, "job_id": Uuid::new_v4(), "new_status": "ai_screening"}),
            json!({"application_id": b.id, "new_status": "rejected", "metadata": {"notes": "position filled"}}),
        ];

        let results = service.bulk_transition(items).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|r| r.success).count(), 2);
        assert!(!results[1].success);
        assert_eq!(results[1].error_code, Some("NOT_FOUND"));
        assert_eq!(results[2].status, Some(Rejected));
        assert_eq!(service.get_history(a.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_malformed_item_fails_alone() {
        let (service, _, job_id) = setup().await;
        let (a, _) = service.apply(Uuid::new_v4(), job_id, None).await.unwrap();
        let (b, _) = service.apply(Uuid::new_v4(), job_id, None).await.unwrap();

        let items = vec![
            json!({"application_id": a.id, "new_status": "ai_screening"}),
            json!({"application_id": b.id, "new_status": "archived"}),
            json!({"application_id": "not-a-uuid", "new_status": "rejected"}),
            json!({"application_id": b.id, "new_status": "rejected"}),
        ];
        let results = service.bulk_transition(items).await;

        assert_eq!(results.len(), 4);
        assert!(results[0].success);
        for bad in &results[1..3] {
            assert!(!bad.success);
            assert_eq!(bad.error_code, Some("VALIDATION_ERROR"));
            assert_eq!(bad.application_id, None);
        }
        assert_eq!(results[3].status, Some(Rejected));
        assert_eq!(service.get_history(b.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_item_deserializes_either_key() {
        let by_id: BulkTransitionItem = serde_json::from_value(serde_json::json!({
            "application_id": Uuid::nil(),
            "new_status": "reviewing"
        }))
        .unwrap();
        assert!(matches!(by_id.key, ApplicationKey::Id { .. }));

        let by_pair: BulkTransitionItem = serde_json::from_value(serde_json::json!({
            "candidate_id": Uuid::nil(),
            "job_id": Uuid::nil(),
            "new_status": "rejected",
            "metadata": {"notes": "closed"}
        }))
        .unwrap();
        assert!(matches!(by_pair.key, ApplicationKey::Pair { .. }));
        assert_eq!(by_pair.metadata.notes.as_deref(), Some("closed"));
    }

    #[tokio::test]
    async fn test_unknown_application_is_not_found() {
        let (service, _, _) = setup().await;
        let err = service.get_history(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

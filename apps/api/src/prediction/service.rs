use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::{CohortHistory, OutcomePredictor, PredictionResult};
use crate::errors::AppError;
use crate::models::application::{ApplicationRecord, HistoricalOutcome};
use crate::models::profile::{JobPosting, ResumeProfile};
use crate::scoring::ScoringService;
use crate::store::{ApplicationRepository, JobRepository, ResumeRepository};

/// Loads history and the match score for an application and hands them to
/// the pure predictor.
#[derive(Clone)]
pub struct PredictionService {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
    resumes: Arc<dyn ResumeRepository>,
    scoring: ScoringService,
    predictor: OutcomePredictor,
}

impl PredictionService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
        resumes: Arc<dyn ResumeRepository>,
        scoring: ScoringService,
        predictor: OutcomePredictor,
    ) -> Self {
        Self {
            applications,
            jobs,
            resumes,
            scoring,
            predictor,
        }
    }

    /// Only a missing application or job is an error. Missing history or
    /// profile lowers the information used, never the availability.
    pub async fn predict_application(
        &self,
        application_id: Uuid,
    ) -> Result<PredictionResult, AppError> {
        let record = self
            .applications
            .get_application(application_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
        let job = self
            .jobs
            .get_job(record.job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", record.job_id)))?;
        let profile = match self.resumes.get_resume(record.candidate_id).await {
            Ok(stored) => stored.map(|s| s.profile),
            Err(e) => {
                warn!("Resume lookup failed for candidate {}: {e}", record.candidate_id);
                None
            }
        };

        Ok(self.predict(&record, &job.posting, profile.as_ref()).await)
    }

    /// Prediction for a known record and posting. Never fails.
    pub async fn predict(
        &self,
        record: &ApplicationRecord,
        job: &JobPosting,
        profile: Option<&ResumeProfile>,
    ) -> PredictionResult {
        let candidate = absorb(
            self.applications
                .candidate_outcomes(record.candidate_id, Some(record.id))
                .await,
            "candidate",
        );
        let population = absorb(
            self.applications.population_outcomes(Some(record.id)).await,
            "population",
        );

        let match_score = match (record.score_snapshot, profile) {
            (Some(snapshot), _) => Some(snapshot),
            (None, Some(profile)) => {
                match self
                    .scoring
                    .score_pair(record.candidate_id, profile, record.job_id, job)
                    .await
                {
                    Ok(result) if !result.insufficient_data => Some(result.final_score),
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Match scoring for prediction failed: {e}");
                        None
                    }
                }
            }
            (None, None) => None,
        };

        let result = self.predictor.predict_success_probability(
            job,
            CohortHistory {
                candidate: &candidate,
                population: &population,
            },
            match_score,
        );
        debug!(
            "Prediction for application {}: p={} ({:?})",
            record.id, result.probability, result.confidence
        );
        result
    }
}

fn absorb(
    history: Result<Vec<HistoricalOutcome>, AppError>,
    scope: &str,
) -> Vec<HistoricalOutcome> {
    history.unwrap_or_else(|e| {
        warn!("Could not load {scope} history, predicting without it: {e}");
        vec![]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::SkillMatchMode;
    use crate::models::application::{ApplicationStatus, TransitionMetadata};
    use crate::prediction::{Confidence, PredictorConfig, RateSource};
    use crate::scoring::{LexicalSimilarity, MatchEngine, ScoreWeights};
    use crate::store::MemoryStore;
    use crate::tracking::TrackingService;

    fn service(store: &Arc<MemoryStore>) -> PredictionService {
        let scoring = ScoringService::new(
            MatchEngine::new(ScoreWeights::default(), SkillMatchMode::Exact),
            Arc::new(LexicalSimilarity),
            None,
        );
        PredictionService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            scoring,
            OutcomePredictor::new(PredictorConfig::default()),
        )
    }

    async fn job(store: &MemoryStore, company: &str) -> Uuid {
        let id = Uuid::new_v4();
        store
            .save_job(
                id,
                &JobPosting {
                    title: "Engineer".to_string(),
                    company: company.to_string(),
                    industry: "technology".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn test_candidate_cohort_drives_prediction() {
        let store = Arc::new(MemoryStore::new());
        let tracking = TrackingService::new(store.clone(), store.clone());
        let candidate = Uuid::new_v4();

        // Ten past applications to large companies, three of them shortlisted.
        for i in 0..10 {
            let job_id = job(&store, &format!("Company{i} Corp")).await;
            let (app, _) = tracking.apply(candidate, job_id, None).await.unwrap();
            let path: &[ApplicationStatus] = if i < 3 {
                &[ApplicationStatus::AiScreening, ApplicationStatus::Reviewing, ApplicationStatus::Shortlisted]
            } else {
                &[ApplicationStatus::Rejected]
            };
            for status in path {
                tracking
                    .transition(app.id, *status, TransitionMetadata::default())
                    .await
                    .unwrap();
            }
        }

        let target_job = job(&store, "Initech Inc").await;
        let (app, _) = tracking.apply(candidate, target_job, None).await.unwrap();

        let result = service(&store).predict_application(app.id).await.unwrap();
        assert_eq!(result.signals[0].source, RateSource::Candidate);
        assert_eq!(result.signals[0].sample_size, 10);
        assert_eq!(result.cohort_rate, 0.3);
        assert_eq!(result.match_component, None);
        assert_eq!(result.probability, 0.3);
        assert_eq!(result.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn test_snapshot_score_is_blended() {
        let store = Arc::new(MemoryStore::new());
        let tracking = TrackingService::new(store.clone(), store.clone());
        let job_id = job(&store, "Acme").await;
        let (app, _) = tracking.apply(Uuid::new_v4(), job_id, Some(80.0)).await.unwrap();

        let result = service(&store).predict_application(app.id).await.unwrap();
        // No history anywhere: neutral 0.5 blended with 0.8.
        assert_eq!(result.signals[0].source, RateSource::Default);
        assert_eq!(result.probability, 0.65);
    }

    #[tokio::test]
    async fn test_unknown_application_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let err = service(&store).predict_application(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

use std::sync::Arc;

use crate::config::Config;
use crate::extraction::ExtractionPipeline;
use crate::llm_client::TextCompleter;
use crate::prediction::{OutcomePredictor, PredictionService};
use crate::scoring::{LexicalSimilarity, MatchCache, MatchEngine, ScoringService};
use crate::store::{ApplicationRepository, JobRepository, ResumeRepository};
use crate::tracking::TrackingService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub resumes: Arc<dyn ResumeRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub scoring: ScoringService,
    pub extraction: ExtractionPipeline,
    pub tracking: TrackingService,
    pub prediction: PredictionService,
}

/// Store handles, one per repository. Both store implementations back all three.
pub struct Repositories {
    pub resumes: Arc<dyn ResumeRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
}

impl AppState {
    /// Wires the services on top of the repositories. `cache` and `llm` are
    /// optional collaborators; without them scoring skips the cache and
    /// extraction uses the heuristic parser only.
    pub fn new(
        config: Config,
        repos: Repositories,
        cache: Option<MatchCache>,
        llm: Option<Arc<dyn TextCompleter>>,
    ) -> Self {
        let engine = MatchEngine::new(config.score_weights, config.skill_match_mode);
        let scoring = ScoringService::new(engine, Arc::new(LexicalSimilarity), cache);
        let extraction = ExtractionPipeline::new(llm, config.extraction_deadline());
        let tracking = TrackingService::new(repos.applications.clone(), repos.jobs.clone());
        let prediction = PredictionService::new(
            repos.applications.clone(),
            repos.jobs.clone(),
            repos.resumes.clone(),
            scoring.clone(),
            OutcomePredictor::new(config.predictor),
        );

        Self {
            config,
            resumes: repos.resumes,
            jobs: repos.jobs,
            applications: repos.applications,
            scoring,
            extraction,
            tracking,
            prediction,
        }
    }
}

//! Score Fusion Engine and the service wrapping it.

pub mod cache;
pub mod engine;
pub mod fusion;
pub mod handlers;
pub mod similarity;
pub mod weights;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{JobPosting, ResumeProfile};

pub use cache::MatchCache;
pub use engine::{MatchEngine, MatchResult};
pub use similarity::{LexicalSimilarity, SimilarityProvider};
pub use weights::ScoreWeights;

/// Scores pairs: asks the similarity collaborator, runs the engine, and
/// consults the cache when one is configured.
#[derive(Clone)]
pub struct ScoringService {
    engine: MatchEngine,
    similarity: Arc<dyn SimilarityProvider>,
    cache: Option<MatchCache>,
}

impl ScoringService {
    pub fn new(
        engine: MatchEngine,
        similarity: Arc<dyn SimilarityProvider>,
        cache: Option<MatchCache>,
    ) -> Self {
        Self {
            engine,
            similarity,
            cache,
        }
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    /// A similarity failure or out-of-range value leaves the semantic
    /// sub-score unavailable; its weight moves to the other criteria.
    pub async fn score(
        &self,
        profile: &ResumeProfile,
        job: &JobPosting,
    ) -> Result<MatchResult, AppError> {
        let semantic = match self
            .similarity
            .similarity(&profile.as_text(), &job.as_text())
            .await
        {
            Ok(s) if s.is_finite() && (0.0..=1.0).contains(&s) => Some(s),
            Ok(s) => {
                warn!("Similarity provider '{}' returned {s}, ignoring", self.similarity.name());
                None
            }
            Err(e) => {
                warn!("Similarity provider '{}' failed: {e}", self.similarity.name());
                None
            }
        };
        self.engine.score(profile, job, semantic)
    }

    /// Scores loosely-typed JSON input. Only non-object input is an error.
    pub async fn score_value(&self, profile: &Value, job: &Value) -> Result<MatchResult, AppError> {
        let (profile, job) = MatchEngine::normalize_inputs(profile, job)?;
        self.score(&profile, &job).await
    }

    /// Like [`score`](Self::score), for stored records, going through the
    /// cache when configured.
    pub async fn score_pair(
        &self,
        candidate_id: Uuid,
        profile: &ResumeProfile,
        job_id: Uuid,
        job: &JobPosting,
    ) -> Result<MatchResult, AppError> {
        let Some(cache) = &self.cache else {
            return self.score(profile, job).await;
        };

        let key = MatchCache::key(candidate_id, job_id, profile, job, self.engine.weights());
        if let Some(hit) = cache.get(&key).await {
            return Ok(hit);
        }
        let result = self.score(profile, job).await?;
        cache.put(&key, &result).await;
        debug!(
            "Scored candidate {candidate_id} against job {job_id}: {}",
            result.final_score
        );
        Ok(result)
    }
}

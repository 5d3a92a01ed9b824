//! Top-N job recommendations for one candidate.
//!
//! Pairs are scored on a bounded pool of tokio tasks. The whole call runs
//! under a deadline: whatever has been scored when it expires is ranked and
//! returned, and the remaining tasks are aborted.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::profile::ResumeProfile;
use crate::scoring::{MatchResult, ScoringService};
use crate::store::StoredJob;

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub job_id: Uuid,
    pub title: String,
    pub company: String,
    pub score: f64,
    pub result: MatchResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<Recommendation>,
    /// Jobs scored before the deadline.
    pub scored: usize,
    /// Jobs considered.
    pub total: usize,
    pub deadline_exceeded: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RecommendationLimits {
    pub top_n: usize,
    pub workers: usize,
    pub deadline: Duration,
}

pub async fn recommend_jobs(
    scoring: &ScoringService,
    candidate_id: Uuid,
    profile: &ResumeProfile,
    jobs: Vec<StoredJob>,
    limits: RecommendationLimits,
) -> RecommendationSet {
    let total = jobs.len();
    let deadline = Instant::now() + limits.deadline;
    let permits = Arc::new(Semaphore::new(limits.workers.max(1)));
    let profile = Arc::new(profile.clone());

    let mut set = JoinSet::new();
    for job in jobs {
        let scoring = scoring.clone();
        let profile = Arc::clone(&profile);
        let permits = Arc::clone(&permits);
        set.spawn(async move {
            let _permit = permits.acquire_owned().await.ok()?;
            match scoring
                .score_pair(candidate_id, &profile, job.id, &job.posting)
                .await
            {
                Ok(result) => Some(Recommendation {
                    job_id: job.id,
                    title: job.posting.title,
                    company: job.posting.company,
                    score: result.final_score,
                    result,
                }),
                Err(e) => {
                    warn!("Skipping job {} in recommendations: {e}", job.id);
                    None
                }
            }
        });
    }

    let mut ranked = Vec::with_capacity(total);
    let mut deadline_exceeded = false;
    loop {
        match tokio::time::timeout_at(deadline, set.join_next()).await {
            Ok(Some(Ok(Some(rec)))) => ranked.push(rec),
            Ok(Some(Ok(None))) => {}
            Ok(Some(Err(e))) => warn!("Recommendation task failed: {e}"),
            Ok(None) => break,
            Err(_) => {
                deadline_exceeded = true;
                set.abort_all();
                warn!(
                    "Recommendation deadline of {:?} hit after scoring {}/{total} jobs",
                    limits.deadline,
                    ranked.len()
                );
                break;
            }
        }
    }

    let scored = ranked.len();
    rank(&mut ranked);
    ranked.truncate(limits.top_n);
    debug!("Recommended {} of {scored} scored jobs for candidate {candidate_id}", ranked.len());

    RecommendationSet {
        recommendations: ranked,
        scored,
        total,
        deadline_exceeded,
    }
}

/// Highest score first; equal scores by job id so the order is stable
/// regardless of completion order.
fn rank(recs: &mut [Recommendation]) {
    recs.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.job_id.cmp(&b.job_id)));
}

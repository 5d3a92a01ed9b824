use std::fmt::Write as _;
use std::time::Duration;

use redis::Client as RedisClient;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use super::engine::MatchResult;
use super::weights::ScoreWeights;
use crate::errors::AppError;
use crate::models::profile::{JobPosting, ResumeProfile};

/// Redis cache of match results. Best effort: every failure is logged and
/// treated as a miss, scoring never depends on it.
#[derive(Clone)]
pub struct MatchCache {
    client: RedisClient,
    ttl: Duration,
}

impl MatchCache {
    pub fn new(client: RedisClient, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    /// Key for one pair. The fingerprint covers the profile, the posting and
    /// the weights, so a re-uploaded resume or edited job never reads a stale
    /// entry; old entries just expire. SHA-256 keeps the suffix identical
    /// across builds and hosts sharing one Redis.
    pub fn key(
        candidate_id: Uuid,
        job_id: Uuid,
        profile: &ResumeProfile,
        job: &JobPosting,
        weights: &ScoreWeights,
    ) -> String {
        let mut hasher = Sha256::new();
        // serde_json output is stable for these structs (fixed field order).
        for part in [
            serde_json::to_vec(profile),
            serde_json::to_vec(job),
            serde_json::to_vec(weights),
        ] {
            let bytes = part.unwrap_or_default();
            // Length prefix keeps part boundaries unambiguous.
            hasher.update((bytes.len() as u64).to_be_bytes());
            hasher.update(&bytes);
        }
        format!("match:{candidate_id}:{job_id}:{}", hex(&hasher.finalize()))
    }

    pub async fn get(&self, key: &str) -> Option<MatchResult> {
        match self.fetch(key).await {
            Ok(hit) => {
                debug!("Match cache {} for {key}", if hit.is_some() { "hit" } else { "miss" });
                hit
            }
            Err(e) => {
                warn!("Match cache read failed, scoring without it: {e}");
                None
            }
        }
    }

    pub async fn put(&self, key: &str, result: &MatchResult) {
        if let Err(e) = self.store(key, result).await {
            warn!("Match cache write failed: {e}");
        }
    }

    async fn fetch(&self, key: &str) -> Result<Option<MatchResult>, AppError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| AppError::Cache(format!("undecodable entry {key}: {e}")))
        })
        .transpose()
    }

    async fn store(&self, key: &str, result: &MatchResult) -> Result<(), AppError> {
        let json = serde_json::to_string(result).map_err(|e| AppError::Cache(e.to_string()))?;
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        redis::cmd("SET")
            .arg(key)
            .arg(json)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_changes_with_content() {
        let (candidate, job_id) = (Uuid::new_v4(), Uuid::new_v4());
        let weights = ScoreWeights::default();
        let mut profile = ResumeProfile {
            skills: vec!["Rust".to_string()],
            ..Default::default()
        };
        let job = JobPosting::default();

        let before = MatchCache::key(candidate, job_id, &profile, &job, &weights);
        assert_eq!(before, MatchCache::key(candidate, job_id, &profile, &job, &weights));
        assert!(before.starts_with(&format!("match:{candidate}:{job_id}:")));

        profile.skills.push("Go".to_string());
        assert_ne!(before, MatchCache::key(candidate, job_id, &profile, &job, &weights));
    }

    #[test]
    fn test_key_suffix_is_sha256_hex() {
        let (candidate, job_id) = (Uuid::nil(), Uuid::nil());
        let key = MatchCache::key(
            candidate,
            job_id,
            &ResumeProfile::default(),
            &JobPosting::default(),
            &ScoreWeights::default(),
        );
        let suffix = key.rsplit(':').next().unwrap();
        assert_eq!(suffix.len(), 64);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_hex_encoding() {
        assert_eq!(hex(&[0x00, 0x0f, 0xab, 0xff]), "000fabff");
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_a_miss() {
        let client = RedisClient::open("redis://127.0.0.1:1/").unwrap();
        let cache = MatchCache::new(client, Duration::from_secs(60));
        assert!(cache.get("match:any").await.is_none());
    }
}

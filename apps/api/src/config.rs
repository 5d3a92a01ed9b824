use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::matching::SkillMatchMode;
use crate::prediction::PredictorConfig;
use crate::scoring::ScoreWeights;

/// Application configuration loaded from environment variables.
/// Startup fails if a variable is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent: in-process memory store.
    pub database_url: Option<String>,
    /// Absent: no match cache.
    pub redis_url: Option<String>,
    /// Absent: heuristic extraction only.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub llm_timeout: Duration,
    pub llm_max_retries: u32,
    pub score_weights: ScoreWeights,
    pub skill_match_mode: SkillMatchMode,
    pub recommendation_workers: usize,
    pub recommendation_deadline: Duration,
    pub recommendation_top_n: usize,
    pub match_cache_ttl: Duration,
    pub predictor: PredictorConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = ScoreWeights::default();
        let score_weights = ScoreWeights {
            skills: env_or("SCORE_WEIGHT_SKILLS", defaults.skills)?,
            education: env_or("SCORE_WEIGHT_EDUCATION", defaults.education)?,
            experience: env_or("SCORE_WEIGHT_EXPERIENCE", defaults.experience)?,
            certifications: env_or("SCORE_WEIGHT_CERTIFICATIONS", defaults.certifications)?,
            semantic: env_or("SCORE_WEIGHT_SEMANTIC", defaults.semantic)?,
        };
        if let Err(reason) = score_weights.validate() {
            bail!("Invalid SCORE_WEIGHT_* configuration: {reason}");
        }

        let predictor = PredictorConfig {
            cohort_weight: env_or("PREDICTION_COHORT_WEIGHT", 0.5)?,
            neutral_base_rate: env_or("PREDICTION_BASE_RATE", 0.5)?,
        };
        for (key, value) in [
            ("PREDICTION_COHORT_WEIGHT", predictor.cohort_weight),
            ("PREDICTION_BASE_RATE", predictor.neutral_base_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{key} must be within [0, 1], got {value}");
            }
        }

        let recommendation_workers: usize = env_or("RECOMMENDATION_WORKERS", 8)?;
        if recommendation_workers == 0 {
            bail!("RECOMMENDATION_WORKERS must be at least 1");
        }

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_timeout: Duration::from_secs(env_or("LLM_TIMEOUT_SECS", 30)?),
            llm_max_retries: env_or("LLM_MAX_RETRIES", 3)?,
            score_weights,
            skill_match_mode: if env_or("SKILL_MATCH_CASE_INSENSITIVE", false)? {
                SkillMatchMode::CaseInsensitive
            } else {
                SkillMatchMode::Exact
            },
            recommendation_workers,
            recommendation_deadline: Duration::from_millis(env_or(
                "RECOMMENDATION_DEADLINE_MS",
                2000,
            )?),
            recommendation_top_n: env_or("RECOMMENDATION_TOP_N", 10)?,
            match_cache_ttl: Duration::from_secs(env_or("MATCH_CACHE_TTL_SECS", 3600)?),
            predictor,
        })
    }

    /// Hard bound on one LLM extraction: every attempt may use the full
    /// request timeout.
    pub fn extraction_deadline(&self) -> Duration {
        self.llm_timeout * (self.llm_max_retries + 1)
    }
}

/// Set and non-blank, else `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_parses_and_defaults() {
        std::env::set_var("TALENTMATCH_TEST_PORT", " 9090 ");
        assert_eq!(env_or::<u16>("TALENTMATCH_TEST_PORT", 1).unwrap(), 9090);
        assert_eq!(env_or::<u16>("TALENTMATCH_TEST_UNSET", 7).unwrap(), 7);

        std::env::set_var("TALENTMATCH_TEST_BAD", "eighty");
        let err = env_or::<u16>("TALENTMATCH_TEST_BAD", 1).unwrap_err();
        assert!(err.to_string().contains("TALENTMATCH_TEST_BAD"));
    }

    #[test]
    fn test_blank_optional_is_none() {
        std::env::set_var("TALENTMATCH_TEST_BLANK", "  ");
        assert_eq!(optional_env("TALENTMATCH_TEST_BLANK"), None);
    }
}

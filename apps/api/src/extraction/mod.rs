//! Extraction pipeline: raw resume / job text to canonical records.
//!
//! The LLM collaborator is tried first, bounded by a deadline. Any failure,
//! timeout or unusable output falls back to the deterministic heuristic
//! extractor. Parser errors never reach the caller; they show up as the
//! `degraded` flag and `issues` instead.

pub mod handlers;
pub mod heuristic;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::llm_client::TextCompleter;
use crate::models::profile::{JobPosting, ResumeProfile};
use crate::normalizer::{self, Normalized};
use prompts::{JOB_PROMPT_TEMPLATE, JOB_SYSTEM, RESUME_PROMPT_TEMPLATE, RESUME_SYSTEM};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Llm,
    Heuristic,
}

#[derive(Debug, Clone, Serialize)]
pub struct Extraction<T> {
    pub record: T,
    pub degraded: bool,
    pub issues: Vec<String>,
    pub source: ExtractionSource,
}

#[derive(Clone)]
pub struct ExtractionPipeline {
    llm: Option<Arc<dyn TextCompleter>>,
    /// Upper bound on one LLM extraction, retries included.
    deadline: Duration,
}

impl ExtractionPipeline {
    pub fn new(llm: Option<Arc<dyn TextCompleter>>, deadline: Duration) -> Self {
        Self { llm, deadline }
    }

    pub async fn extract_resume(&self, text: &str) -> Extraction<ResumeProfile> {
        let prompt = RESUME_PROMPT_TEMPLATE
            .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
            .replace("{resume_text}", text);
        self.extract(
            "resume",
            &prompt,
            RESUME_SYSTEM,
            |raw| normalizer::normalize_resume_text(raw),
            || normalizer::normalize_resume(&heuristic::extract_resume(text)),
            ResumeProfile::is_empty,
        )
        .await
    }

    pub async fn extract_job(&self, text: &str) -> Extraction<JobPosting> {
        let prompt = JOB_PROMPT_TEMPLATE
            .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
            .replace("{job_text}", text);
        self.extract(
            "job",
            &prompt,
            JOB_SYSTEM,
            |raw| normalizer::normalize_job_text(raw),
            || normalizer::normalize_job(&heuristic::extract_job(text)),
            |job: &JobPosting| *job == JobPosting::default(),
        )
        .await
    }

    async fn extract<T>(
        &self,
        kind: &str,
        prompt: &str,
        system: &str,
        from_llm: impl Fn(&str) -> Normalized<T>,
        from_heuristic: impl Fn() -> Normalized<T>,
        is_empty: impl Fn(&T) -> bool,
    ) -> Extraction<T> {
        let mut issues = Vec::new();

        if let Some(llm) = &self.llm {
            match tokio::time::timeout(self.deadline, llm.complete(prompt, system)).await {
                Ok(Ok(raw)) => {
                    let normalized = from_llm(&raw);
                    if !is_empty(&normalized.value) {
                        info!("Extracted {kind} via LLM (degraded={})", normalized.degraded);
                        return Extraction {
                            record: normalized.value,
                            degraded: normalized.degraded,
                            issues: normalized.issues,
                            source: ExtractionSource::Llm,
                        };
                    }
                    warn!("LLM {kind} extraction was unusable, using heuristic extractor");
                    issues.extend(normalized.issues);
                    issues.push("llm: output contained no usable fields".to_string());
                }
                Ok(Err(e)) => {
                    warn!("LLM {kind} extraction failed, using heuristic extractor: {e}");
                    issues.push(format!("llm: {e}"));
                }
                Err(_) => {
                    warn!(
                        "LLM {kind} extraction exceeded {:?}, using heuristic extractor",
                        self.deadline
                    );
                    issues.push(format!("llm: timed out after {:?}", self.deadline));
                }
            }
        }

        let normalized = from_heuristic();
        let empty = is_empty(&normalized.value);
        if empty {
            issues.push("heuristic: no recognisable sections".to_string());
        }
        issues.extend(normalized.issues);
        info!("Extracted {kind} via heuristic extractor");
        Extraction {
            record: normalized.value,
            degraded: normalized.degraded || empty || self.llm.is_some(),
            issues,
            source: ExtractionSource::Heuristic,
        }
    }
}

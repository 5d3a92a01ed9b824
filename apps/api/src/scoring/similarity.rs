//! Similarity collaborator: a pluggable source of the semantic-closeness
//! scalar consumed by fusion.
//!
//! Default: `LexicalSimilarity` (term-frequency cosine, deterministic, no I/O).
//! An embedding-backed provider can be swapped in behind the same trait.
//!
//! `AppState` holds an `Arc<dyn SimilarityProvider>`.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::AppError;

/// Returns a scalar in [0, 1] for how close a resume text is to a job text.
/// Fusion treats the value as opaque.
#[async_trait]
pub trait SimilarityProvider: Send + Sync {
    async fn similarity(&self, resume_text: &str, job_text: &str) -> Result<f64, AppError>;

    /// Backend label, reported in match breakdowns.
    fn name(&self) -> &'static str;
}

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on",
    "or", "our", "the", "to", "we", "will", "with", "you", "your",
];

/// Cosine similarity over lowercase alphanumeric term frequencies.
pub struct LexicalSimilarity;

#[async_trait]
impl SimilarityProvider for LexicalSimilarity {
    async fn similarity(&self, resume_text: &str, job_text: &str) -> Result<f64, AppError> {
        Ok(cosine(&term_frequencies(resume_text), &term_frequencies(job_text)))
    }

    fn name(&self) -> &'static str {
        "lexical"
    }
}

fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut tf = HashMap::new();
    for token in text
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
    {
        *tf.entry(token.to_string()).or_insert(0.0) += 1.0;
    }
    tf
}

fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, wa)| b.get(term).map(|wb| wa * wb))
        .sum();
    let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

//! Criteria matchers: pure functions comparing one profile field against one
//! job requirement. No I/O, no shared state; safe to run on any thread.
//!
//! Every matcher returns a [`CriterionMatch`] whose `score` lies in [0, 100].
//! Missing or odd data lowers a score; it never produces an error.

pub mod certifications;
pub mod dates;
pub mod education;
pub mod experience;
pub mod skills;

use serde::{Deserialize, Serialize};

pub use certifications::match_certifications;
pub use education::match_education;
pub use experience::{calculate_experience, match_experience, ExperienceMatch, ExperienceTotal};
pub use skills::{match_skills, SkillMatchMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriterionStatus {
    Met,
    #[serde(rename = "Partially Met")]
    PartiallyMet,
    #[serde(rename = "Not Met")]
    NotMet,
    /// The job states no requirement for this criterion.
    #[serde(rename = "Not Required")]
    NotRequired,
}

impl CriterionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CriterionStatus::Met => "Met",
            CriterionStatus::PartiallyMet => "Partially Met",
            CriterionStatus::NotMet => "Not Met",
            CriterionStatus::NotRequired => "Not Required",
        }
    }
}

/// Outcome of one matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionMatch {
    pub status: CriterionStatus,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub score: f64,
    pub detail: String,
}

impl CriterionMatch {
    fn not_required(detail: &str) -> Self {
        Self {
            status: CriterionStatus::NotRequired,
            matched: vec![],
            missing: vec![],
            score: 100.0,
            detail: detail.to_string(),
        }
    }
}

//! Cohort signals and empirical success rates over historical applications.
//!
//! The company-size and industry classifiers are crude name/keyword
//! heuristics. They group history coarsely; they are not a contract.

use serde::{Deserialize, Serialize};

use crate::models::application::HistoricalOutcome;
use crate::models::profile::JobPosting;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Startup,
    Medium,
    Large,
}

impl CompanySize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanySize::Startup => "startup",
            CompanySize::Medium => "medium",
            CompanySize::Large => "large",
        }
    }
}

/// "corp"/"inc" style names are large; "startup"/"labs" are startups.
pub fn classify_company_size(company: &str) -> CompanySize {
    let name = company.to_lowercase();
    let words: Vec<&str> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if has_any(&words, &["startup", "labs", "lab", "ventures"]) {
        CompanySize::Startup
    } else if has_any(
        &words,
        &["corp", "corporation", "inc", "incorporated", "plc", "group", "global"],
    ) {
        CompanySize::Large
    } else {
        CompanySize::Medium
    }
}

fn has_any(words: &[&str], needles: &[&str]) -> bool {
    words.iter().any(|w| needles.contains(w))
}

const INDUSTRY_KEYWORDS: &[(&str, &[&str])] = &[
    ("finance", &["bank", "banking", "finance", "financial", "fintech", "capital", "insurance", "trading"]),
    ("healthcare", &["health", "healthcare", "hospital", "medical", "clinic", "pharma", "biotech"]),
    ("education", &["school", "university", "edtech", "education", "learning", "academy"]),
    ("retail", &["retail", "ecommerce", "e-commerce", "store", "shop"]),
    ("technology", &["software", "cloud", "saas", "tech", "technology", "platform", "data", "ai"]),
];

/// The posting's stated industry, else the first keyword family found in its
/// company name, title or description, else "general".
pub fn infer_industry(job: &JobPosting) -> String {
    let stated = job.industry.trim().to_lowercase();
    if !stated.is_empty() {
        return stated;
    }
    let text = format!("{} {} {}", job.company, job.title, job.description).to_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .collect();
    INDUSTRY_KEYWORDS
        .iter()
        .find(|(_, keywords)| words.iter().any(|w| keywords.contains(w)))
        .map(|(industry, _)| industry.to_string())
        .unwrap_or_else(|| "general".to_string())
}

/// Successes over total for one cohort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortStats {
    pub successes: u32,
    pub total: u32,
}

impl CohortStats {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a HistoricalOutcome>) -> Self {
        outcomes.into_iter().fold(Self::default(), |mut acc, o| {
            acc.total += 1;
            if o.status.is_success() {
                acc.successes += 1;
            }
            acc
        })
    }

    /// `None` for an empty cohort.
    pub fn rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.successes as f64 / self.total as f64)
    }
}

/// Categorical signal used to group history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    CompanySize,
    Industry,
}

/// Value of each signal for a job, used to select matching history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSignals {
    pub size: CompanySize,
    pub industry: String,
}

impl JobSignals {
    pub fn of(job: &JobPosting) -> Self {
        Self {
            size: classify_company_size(&job.company),
            industry: infer_industry(job),
        }
    }

    pub fn matches(&self, signal: Signal, outcome: &HistoricalOutcome) -> bool {
        match signal {
            Signal::CompanySize => classify_company_size(&outcome.company) == self.size,
            Signal::Industry => outcome.industry.trim().eq_ignore_ascii_case(&self.industry),
        }
    }

    pub fn label(&self, signal: Signal) -> String {
        match signal {
            Signal::CompanySize => self.size.as_str().to_string(),
            Signal::Industry => self.industry.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationStatus;

    fn outcome(status: ApplicationStatus) -> HistoricalOutcome {
        HistoricalOutcome {
            company: "Globex Corp".to_string(),
            industry: "technology".to_string(),
            status,
        }
    }

    #[test]
    fn test_company_size_heuristic() {
        assert_eq!(classify_company_size("Globex Corp"), CompanySize::Large);
        assert_eq!(classify_company_size("Initech, Inc."), CompanySize::Large);
        assert_eq!(classify_company_size("Rocket Labs"), CompanySize::Startup);
        assert_eq!(classify_company_size("Tiny Startup Co"), CompanySize::Startup);
        assert_eq!(classify_company_size("Corner Bakery"), CompanySize::Medium);
        // substring inside a word is not a match
        assert_eq!(classify_company_size("Incognito Systems"), CompanySize::Medium);
    }

    #[test]
    fn test_industry_prefers_stated_value() {
        let job = JobPosting {
            industry: " Finance ".to_string(),
            company: "General Hospital".to_string(),
            ..Default::default()
        };
        assert_eq!(infer_industry(&job), "finance");
    }

    #[test]
    fn test_industry_inferred_from_text() {
        let job = JobPosting {
            company: "St. Mary Hospital".to_string(),
            ..Default::default()
        };
        assert_eq!(infer_industry(&job), "healthcare");
        assert_eq!(infer_industry(&JobPosting::default()), "general");
    }

    #[test]
    fn test_cohort_rate() {
        let mut history: Vec<_> = (0..7).map(|_| outcome(ApplicationStatus::Rejected)).collect();
        history.extend((0..3).map(|_| outcome(ApplicationStatus::Hired)));
        let stats = CohortStats::from_outcomes(&history);
        assert_eq!(stats, CohortStats { successes: 3, total: 10 });
        assert_eq!(stats.rate(), Some(0.3));
        assert_eq!(CohortStats::default().rate(), None);
    }
}

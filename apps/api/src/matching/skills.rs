use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{CriterionMatch, CriterionStatus};

/// How skill names are compared.
///
/// `Exact` reproduces the historical ranking behaviour (case-sensitive after
/// trimming). `CaseInsensitive` is opt-in via `SKILL_MATCH_CASE_INSENSITIVE`
/// until product signs off on changing externally visible rankings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillMatchMode {
    #[default]
    Exact,
    CaseInsensitive,
}

impl SkillMatchMode {
    fn key(&self, skill: &str) -> String {
        match self {
            SkillMatchMode::Exact => skill.trim().to_string(),
            SkillMatchMode::CaseInsensitive => skill.trim().to_lowercase(),
        }
    }
}

/// Splits a free-text requirement ("Python, Java; SQL") into skills.
/// Order is preserved and duplicates are dropped.
pub fn tokenize_requirements(requirement: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    requirement
        .split([',', ';', '\n'])
        .map(|s| s.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(String::from)
        .collect()
}

/// Partitions `required` into `matched` and `missing`, preserving requirement
/// order. `score = 100 × |matched| / |required|`, or 0 with no requirements.
///
/// Requirements stated as one comma-separated string are split with
/// [`tokenize_requirements`] when the posting is normalized.
pub fn match_skills(
    candidate: &[String],
    required: &[String],
    mode: SkillMatchMode,
) -> CriterionMatch {
    let mut seen = HashSet::new();
    let required: Vec<&String> = required
        .iter()
        .filter(|r| !r.trim().is_empty())
        .filter(|r| seen.insert(mode.key(r)))
        .collect();

    if required.is_empty() {
        return CriterionMatch {
            status: CriterionStatus::NotRequired,
            matched: vec![],
            missing: vec![],
            score: 0.0,
            detail: "No skills required".to_string(),
        };
    }

    let owned: HashSet<String> = candidate.iter().map(|s| mode.key(s)).collect();
    let (matched, missing): (Vec<String>, Vec<String>) = required
        .iter()
        .map(|r| r.trim().to_string())
        .partition(|r| owned.contains(&mode.key(r)));

    let score = 100.0 * matched.len() as f64 / required.len() as f64;
    let status = if missing.is_empty() {
        CriterionStatus::Met
    } else if matched.is_empty() {
        CriterionStatus::NotMet
    } else {
        CriterionStatus::PartiallyMet
    };
    let detail = format!("{} of {} required skills matched", matched.len(), required.len());

    CriterionMatch {
        status,
        matched,
        missing,
        score,
        detail,
    }
}

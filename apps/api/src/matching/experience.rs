use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::dates::{months_between, parse_date_bound};
use super::{CriterionMatch, CriterionStatus};
use crate::models::profile::ExperienceEntry;

/// An experience entry that could not be counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRange {
    pub index: usize,
    pub reason: String,
}

/// Total experience across all entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceTotal {
    pub total_months: u32,
    pub counted: usize,
    pub skipped: Vec<SkippedRange>,
}

/// Sums experience months as of today. See [`calculate_experience_as_of`].
pub fn calculate_experience(entries: &[ExperienceEntry]) -> ExperienceTotal {
    calculate_experience_as_of(entries, Utc::now().date_naive())
}

/// Sums the months of every parsable entry. Entries whose range is missing,
/// unparsable or inverted are skipped and reported; they never abort the sum.
/// The result does not depend on entry order.
pub fn calculate_experience_as_of(entries: &[ExperienceEntry], today: NaiveDate) -> ExperienceTotal {
    let mut total = ExperienceTotal::default();

    for (index, entry) in entries.iter().enumerate() {
        let start = parse_date_bound(&entry.start_date);
        let end = parse_date_bound(&entry.end_date);

        let months = match (start, end) {
            (Some(start), Some(end)) => months_between(start, end, today),
            _ => None,
        };

        match months {
            Some(months) => {
                total.total_months += months;
                total.counted += 1;
            }
            None => {
                let reason = format!(
                    "unparsable range '{}' – '{}'",
                    entry.start_date, entry.end_date
                );
                warn!(index, title = %entry.title, "Skipping experience entry: {reason}");
                total.skipped.push(SkippedRange { index, reason });
            }
        }
    }

    total
}

/// Experience matcher output with the numbers behind the status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceMatch {
    #[serde(flatten)]
    pub criterion: CriterionMatch,
    pub candidate_years: f64,
    pub required_years: u32,
    pub deficit_years: f64,
    /// False when the requirement text held no number and 0 years was assumed.
    pub requirement_parsed: bool,
}

/// Extracts the first integer from free text such as "3+ years" or "at least 5 years".
pub fn parse_required_years(requirement: &str) -> Option<u32> {
    let digits: String = requirement
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Classifies total experience against a free-text requirement.
///
/// - **Met**: candidate years ≥ required years (always when 0 are required)
/// - **Partially Met**: some experience, with the deficit in years
/// - **Not Met**: no experience at all
///
/// An unparsable requirement is read as 0 years required.
pub fn match_experience(total_months: u32, requirement: &str) -> ExperienceMatch {
    let candidate_years = round1(total_months as f64 / 12.0);

    if requirement.trim().is_empty() {
        return ExperienceMatch {
            criterion: CriterionMatch::not_required("No experience requirement"),
            candidate_years,
            required_years: 0,
            deficit_years: 0.0,
            requirement_parsed: true,
        };
    }

    let parsed = parse_required_years(requirement);
    let required_years = parsed.unwrap_or(0);
    let years = total_months as f64 / 12.0;

    let (status, score, deficit_years) = if years >= required_years as f64 {
        (CriterionStatus::Met, 100.0, 0.0)
    } else if total_months > 0 {
        let deficit = round1(required_years as f64 - years);
        let score = 100.0 * years / required_years as f64;
        (CriterionStatus::PartiallyMet, score, deficit)
    } else {
        (CriterionStatus::NotMet, 0.0, required_years as f64)
    };

    let mut detail = match status {
        CriterionStatus::Met => format!(
            "{candidate_years} years of experience meets the {required_years}-year requirement"
        ),
        CriterionStatus::PartiallyMet => format!(
            "{candidate_years} years of experience, {deficit_years} short of {required_years} required"
        ),
        _ => format!("No relevant experience; {required_years} years required"),
    };
    if parsed.is_none() {
        detail.push_str(&format!(
            " (could not read '{}', assumed no minimum)",
            requirement.trim()
        ));
    }

    let missing = if deficit_years > 0.0 {
        vec![format!("{deficit_years} more years of experience")]
    } else {
        vec![]
    };

    ExperienceMatch {
        criterion: CriterionMatch {
            status,
            matched: vec![],
            missing,
            score,
            detail,
        },
        candidate_years,
        required_years,
        deficit_years,
        requirement_parsed: parsed.is_some(),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

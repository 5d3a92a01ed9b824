use super::{CriterionMatch, CriterionStatus};

/// Words that carry no information about which degree is wanted.
const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "degree", "degrees", "in", "of", "or", "and", "equivalent", "related",
    "relevant", "field", "fields", "any", "with", "similar",
];

/// Checks each required degree against the candidate's degrees.
///
/// A requirement is satisfied when, case-insensitively, a candidate degree
/// contains it as whole words, or contains every significant word of it
/// ("Bachelor's degree" reduces to `bachelor`). **Met** when any requirement
/// is satisfied; the rest are reported as missing.
pub fn match_education(candidate_degrees: &[String], required: &[String]) -> CriterionMatch {
    let required: Vec<&String> = required.iter().filter(|r| !r.trim().is_empty()).collect();
    if required.is_empty() {
        return CriterionMatch::not_required("No education requirement");
    }

    let candidates: Vec<String> = candidate_degrees
        .iter()
        .map(|d| normalize(d))
        .filter(|d| !d.is_empty())
        .collect();

    let (matched, missing): (Vec<String>, Vec<String>) = required
        .iter()
        .map(|r| r.trim().to_string())
        .partition(|r| candidates.iter().any(|c| degree_satisfies(c, r)));

    if matched.is_empty() {
        let detail = format!("Unmet education requirements: {}", missing.join(", "));
        return CriterionMatch {
            status: CriterionStatus::NotMet,
            matched,
            missing,
            score: 0.0,
            detail,
        };
    }

    let detail = format!("Satisfies: {}", matched.join(", "));
    CriterionMatch {
        status: CriterionStatus::Met,
        matched,
        missing,
        score: 100.0,
        detail,
    }
}

fn degree_satisfies(candidate: &str, requirement: &str) -> bool {
    let requirement = normalize(requirement);
    if requirement.is_empty() || format!(" {candidate} ").contains(&format!(" {requirement} ")) {
        return true;
    }
    let significant: Vec<&str> = requirement
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(w))
        .collect();
    // Whole words only, so "ms" never matches inside "systems".
    let words: Vec<&str> = candidate.split_whitespace().collect();
    // "Degree" alone asks for any degree at all
    significant.is_empty()
        || significant
            .iter()
            .all(|w| words.iter().any(|c| c == w || c.strip_suffix('s') == Some(*w)))
}

/// Lowercases, drops possessives and dots, and collapses punctuation to spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace("'s", "")
        .replace("’s", "")
        .replace('.', "")
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

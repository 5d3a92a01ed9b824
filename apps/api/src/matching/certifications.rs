use std::collections::HashSet;

use super::{CriterionMatch, CriterionStatus};

/// Membership test of required certifications in the candidate's list
/// (trimmed, case-insensitive). **Met** when any required certification is held.
pub fn match_certifications(candidate: &[String], required: &[String]) -> CriterionMatch {
    let required: Vec<&String> = required.iter().filter(|r| !r.trim().is_empty()).collect();
    if required.is_empty() {
        return CriterionMatch::not_required("No Certifications Required");
    }

    let held: HashSet<String> = candidate.iter().map(|c| c.trim().to_lowercase()).collect();
    let (matched, missing): (Vec<String>, Vec<String>) = required
        .iter()
        .map(|r| r.trim().to_string())
        .partition(|r| held.contains(&r.to_lowercase()));

    let (status, score) = if matched.is_empty() {
        (CriterionStatus::NotMet, 0.0)
    } else {
        (CriterionStatus::Met, 100.0)
    };
    let detail = match status {
        CriterionStatus::Met => format!("Holds: {}", matched.join(", ")),
        _ => format!("Missing certifications: {}", missing.join(", ")),
    };

    CriterionMatch {
        status,
        matched,
        missing,
        score,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_certifications_required() {
        let result = match_certifications(&list(&["CKA"]), &[]);
        assert_eq!(result.status, CriterionStatus::NotRequired);
        assert_eq!(result.detail, "No Certifications Required");
    }

    #[test]
    fn test_any_held_certification_meets() {
        let result = match_certifications(
            &list(&["aws certified solutions architect", "PMP"]),
            &list(&["AWS Certified Solutions Architect", "CISSP"]),
        );
        assert_eq!(result.status, CriterionStatus::Met);
        assert_eq!(result.matched, list(&["AWS Certified Solutions Architect"]));
        assert_eq!(result.missing, list(&["CISSP"]));
    }

    #[test]
    fn test_none_held() {
        let result = match_certifications(&[], &list(&["CKA"]));
        assert_eq!(result.status, CriterionStatus::NotMet);
        assert_eq!(result.score, 0.0);
    }
}

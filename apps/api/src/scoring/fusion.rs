//! Weighted fusion of criterion sub-scores into one explainable score.

use serde::{Deserialize, Serialize};

use super::weights::{Criterion, ScoreWeights};

/// One criterion's input to fusion. `score` is `None` when the criterion is
/// unavailable (the job states no requirement, or the similarity collaborator
/// gave no answer).
#[derive(Debug, Clone, PartialEq)]
pub struct SubScore {
    pub criterion: Criterion,
    pub score: Option<f64>,
    pub detail: String,
}

/// How one criterion contributed to the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionBreakdown {
    pub criterion: Criterion,
    pub score: Option<f64>,
    pub configured_weight: f64,
    /// Share of the final score after redistributing unavailable weights.
    pub effective_weight: f64,
    pub contribution: f64,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fused {
    pub final_score: f64,
    pub breakdown: Vec<CriterionBreakdown>,
    /// No criterion with a positive weight was available.
    pub insufficient_data: bool,
}

/// Fuses sub-scores (each 0–100) using `weights`.
///
/// Unavailable criteria do not count as zero: their weight is redistributed
/// proportionally across the available ones. The result is clamped to
/// [0, 100] and rounded to one decimal.
pub fn fuse(sub_scores: &[SubScore], weights: &ScoreWeights) -> Fused {
    let available_weight: f64 = sub_scores
        .iter()
        .filter(|s| s.score.is_some())
        .map(|s| weights.weight(s.criterion))
        .sum();

    let breakdown: Vec<CriterionBreakdown> = sub_scores
        .iter()
        .map(|s| {
            let configured_weight = weights.weight(s.criterion);
            let score = s.score.map(|v| v.clamp(0.0, 100.0));
            let effective_weight = match score {
                Some(_) if available_weight > 0.0 => configured_weight / available_weight,
                _ => 0.0,
            };
            CriterionBreakdown {
                criterion: s.criterion,
                score: score.map(round1),
                configured_weight,
                effective_weight,
                contribution: round1(effective_weight * score.unwrap_or(0.0)),
                detail: s.detail.clone(),
            }
        })
        .collect();

    let raw: f64 = sub_scores
        .iter()
        .zip(&breakdown)
        .map(|(s, b)| b.effective_weight * s.score.unwrap_or(0.0).clamp(0.0, 100.0))
        .sum();

    Fused {
        final_score: round1(raw.clamp(0.0, 100.0)),
        breakdown,
        insufficient_data: available_weight <= 0.0,
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(criterion: Criterion, score: Option<f64>) -> SubScore {
        SubScore {
            criterion,
            score,
            detail: String::new(),
        }
    }

    #[test]
    fn test_default_weighting() {
        let scores = vec![
            sub(Criterion::Skills, Some(50.0)),
            sub(Criterion::Education, Some(100.0)),
            sub(Criterion::Experience, Some(100.0)),
            sub(Criterion::SemanticSimilarity, Some(60.0)),
        ];
        // 0.4*50 + 0.3*100 + 0.2*100 + 0.1*60 = 76
        let fused = fuse(&scores, &ScoreWeights::default());
        assert_eq!(fused.final_score, 76.0);
        assert!(!fused.insufficient_data);
    }

    #[test]
    fn test_missing_score_weight_is_redistributed() {
        let scores = vec![
            sub(Criterion::Skills, Some(100.0)),
            sub(Criterion::Education, None),
            sub(Criterion::Experience, Some(100.0)),
            sub(Criterion::SemanticSimilarity, Some(100.0)),
        ];
        let fused = fuse(&scores, &ScoreWeights::default());
        assert_eq!(fused.final_score, 100.0);
        let education = &fused.breakdown[1];
        assert_eq!(education.effective_weight, 0.0);
        let skills = &fused.breakdown[0];
        assert!((skills.effective_weight - 0.4 / 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_available_is_insufficient_data() {
        let scores = vec![sub(Criterion::Skills, None), sub(Criterion::Education, None)];
        let fused = fuse(&scores, &ScoreWeights::default());
        assert_eq!(fused.final_score, 0.0);
        assert!(fused.insufficient_data);
    }

    #[test]
    fn test_zero_weight_criterion_does_not_affect_score() {
        let scores = vec![
            sub(Criterion::Skills, Some(80.0)),
            sub(Criterion::Certifications, Some(0.0)),
        ];
        let fused = fuse(&scores, &ScoreWeights::default());
        assert_eq!(fused.final_score, 80.0);
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        let scores = vec![sub(Criterion::Skills, Some(250.0)), sub(Criterion::Education, Some(-5.0))];
        let fused = fuse(&scores, &ScoreWeights::default());
        assert!((0.0..=100.0).contains(&fused.final_score));
    }

    #[test]
    fn test_custom_weights_shift_the_score() {
        let scores = vec![sub(Criterion::Skills, Some(100.0)), sub(Criterion::Education, Some(0.0))];
        let skills_heavy = ScoreWeights {
            skills: 0.9,
            education: 0.1,
            ..Default::default()
        };
        assert_eq!(fuse(&scores, &skills_heavy).final_score, 90.0);
    }
}

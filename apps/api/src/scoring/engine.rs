use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fusion::{fuse, round1, CriterionBreakdown, SubScore};
use super::weights::{Criterion, ScoreWeights};
use crate::errors::AppError;
use crate::matching::experience::calculate_experience_as_of;
use crate::matching::{
    match_certifications, match_education, match_experience, match_skills, CriterionMatch,
    CriterionStatus, ExperienceMatch, ExperienceTotal, SkillMatchMode,
};
use crate::models::profile::{JobPosting, ResumeProfile};
use crate::normalizer::{normalize_job, normalize_resume};

/// Per-matcher detail kept alongside the fused score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    pub skills: CriterionMatch,
    pub education: CriterionMatch,
    pub experience: ExperienceMatch,
    pub experience_total: ExperienceTotal,
    pub certifications: CriterionMatch,
}

/// Explainable score for one (candidate, job) pair. Computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub skill_score: f64,
    pub education_score: f64,
    pub experience_score: f64,
    pub certification_score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    /// Input from the similarity collaborator, if it answered.
    pub semantic_similarity: Option<f64>,
    pub final_score: f64,
    pub breakdown: Vec<CriterionBreakdown>,
    pub details: MatchDetails,
    pub summary: String,
    pub insufficient_data: bool,
}

/// Runs the four matchers and fuses their scores.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    weights: ScoreWeights,
    skill_mode: SkillMatchMode,
}

impl MatchEngine {
    pub fn new(weights: ScoreWeights, skill_mode: SkillMatchMode) -> Self {
        Self {
            weights,
            skill_mode,
        }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn score(
        &self,
        profile: &ResumeProfile,
        job: &JobPosting,
        semantic_similarity: Option<f64>,
    ) -> Result<MatchResult, AppError> {
        self.score_as_of(profile, job, semantic_similarity, Utc::now().date_naive())
    }

    /// Both sides must be JSON objects; their fields are normalized leniently.
    pub fn normalize_inputs(
        profile: &Value,
        job: &Value,
    ) -> Result<(ResumeProfile, JobPosting), AppError> {
        if !profile.is_object() {
            return Err(AppError::InvalidInput("resume profile must be a JSON object".to_string()));
        }
        if !job.is_object() {
            return Err(AppError::InvalidInput("job posting must be a JSON object".to_string()));
        }
        Ok((normalize_resume(profile).value, normalize_job(job).value))
    }

    pub fn score_as_of(
        &self,
        profile: &ResumeProfile,
        job: &JobPosting,
        semantic_similarity: Option<f64>,
        today: NaiveDate,
    ) -> Result<MatchResult, AppError> {
        if let Some(s) = semantic_similarity {
            if !s.is_finite() || !(0.0..=1.0).contains(&s) {
                return Err(AppError::InvalidInput(format!(
                    "semantic similarity must be within [0, 1], got {s}"
                )));
            }
        }

        let skills = match_skills(&profile.skills, &job.required_skills, self.skill_mode);

        let degrees: Vec<String> = profile.education.iter().map(|e| e.degree.clone()).collect();
        let education = match_education(&degrees, &job.required_education);

        let experience_total = calculate_experience_as_of(&profile.experience, today);
        let experience = match_experience(experience_total.total_months, &job.required_experience);

        let certifications =
            match_certifications(&profile.certifications, &job.required_certifications);

        let sub_scores = vec![
            criterion_sub_score(Criterion::Skills, &skills),
            criterion_sub_score(Criterion::Education, &education),
            criterion_sub_score(Criterion::Experience, &experience.criterion),
            criterion_sub_score(Criterion::Certifications, &certifications),
            SubScore {
                criterion: Criterion::SemanticSimilarity,
                score: semantic_similarity.map(|s| s * 100.0),
                detail: match semantic_similarity {
                    Some(s) => format!("Semantic similarity {:.2}", s),
                    None => "Semantic similarity unavailable".to_string(),
                },
            },
        ];
        let fused = fuse(&sub_scores, &self.weights);
        let summary = build_summary(fused.final_score, &fused.breakdown, fused.insufficient_data);

        Ok(MatchResult {
            skill_score: round1(skills.score),
            education_score: round1(education.score),
            experience_score: round1(experience.criterion.score),
            certification_score: round1(certifications.score),
            matched_skills: skills.matched.clone(),
            missing_skills: skills.missing.clone(),
            semantic_similarity,
            final_score: fused.final_score,
            breakdown: fused.breakdown,
            details: MatchDetails {
                skills,
                education,
                experience,
                experience_total,
                certifications,
            },
            summary,
            insufficient_data: fused.insufficient_data,
        })
    }
}

/// A criterion the job does not ask for is unavailable, not zero.
fn criterion_sub_score(criterion: Criterion, result: &CriterionMatch) -> SubScore {
    let score = match result.status {
        CriterionStatus::NotRequired => None,
        _ => Some(result.score),
    };
    SubScore {
        criterion,
        score,
        detail: format!("{}: {}", result.status.label(), result.detail),
    }
}

fn build_summary(final_score: f64, breakdown: &[CriterionBreakdown], insufficient: bool) -> String {
    if insufficient {
        return "Insufficient data to score this match: the job states no requirements \
                and no similarity signal was available."
            .to_string();
    }
    let parts: Vec<String> = breakdown
        .iter()
        .filter(|b| b.effective_weight > 0.0)
        .map(|b| {
            format!(
                "{} {:.1} × {:.0}% = {:.1}",
                b.criterion.label(),
                b.score.unwrap_or(0.0),
                b.effective_weight * 100.0,
                b.contribution
            )
        })
        .collect();
    format!("Final score {final_score:.1}/100 ({})", parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{EducationEntry, ExperienceEntry};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn profile() -> ResumeProfile {
        ResumeProfile {
            name: "Ada".to_string(),
            skills: vec!["Python".into(), "React".into(), "SQL".into()],
            education: vec![EducationEntry {
                degree: "Bachelor of Science in CS".to_string(),
                ..Default::default()
            }],
            experience: vec![
                ExperienceEntry {
                    start_date: "Jan 2020".into(),
                    end_date: "Dec 2021".into(),
                    ..Default::default()
                },
                ExperienceEntry {
                    start_date: "Jan 2022".into(),
                    end_date: "Present".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    fn job() -> JobPosting {
        JobPosting {
            title: "Data Engineer".to_string(),
            company: "Acme Corp".to_string(),
            required_skills: vec!["Python".into(), "Java".into(), "SQL".into(), "Docker".into()],
            required_education: vec!["Bachelor's degree".into()],
            required_experience: "3+ years".to_string(),
            ..Default::default()
        }
    }

    fn engine() -> MatchEngine {
        MatchEngine::new(ScoreWeights::default(), SkillMatchMode::Exact)
    }

    #[test]
    fn test_full_match_result() {
        let result = engine()
            .score_as_of(&profile(), &job(), Some(0.6), today())
            .unwrap();
        assert_eq!(result.skill_score, 50.0);
        assert_eq!(result.matched_skills, vec!["Python", "SQL"]);
        assert_eq!(result.missing_skills, vec!["Java", "Docker"]);
        assert_eq!(result.education_score, 100.0);
        assert_eq!(result.experience_score, 100.0);
        // 0.4*50 + 0.3*100 + 0.2*100 + 0.1*60; certifications not required
        assert_eq!(result.final_score, 76.0);
        assert!(result.summary.contains("Final score 76.0/100"));
    }

    #[test]
    fn test_missing_similarity_redistributes_weight() {
        let result = engine()
            .score_as_of(&profile(), &job(), None, today())
            .unwrap();
        // (0.4*50 + 0.3*100 + 0.2*100) / 0.9
        assert_eq!(result.final_score, 77.8);
        assert_eq!(result.semantic_similarity, None);
    }

    #[test]
    fn test_empty_inputs_score_within_bounds() {
        let result = engine()
            .score_as_of(&ResumeProfile::default(), &JobPosting::default(), None, today())
            .unwrap();
        assert_eq!(result.final_score, 0.0);
        assert!(result.insufficient_data);
        assert!(result.summary.starts_with("Insufficient data"));
    }

    #[test]
    fn test_final_score_bounded_for_varied_inputs() {
        let jobs = [
            job(),
            JobPosting::default(),
            JobPosting {
                required_certifications: vec!["CKA".into()],
                required_experience: "20 years".into(),
                ..job()
            },
        ];
        for job in &jobs {
            for sim in [None, Some(0.0), Some(1.0)] {
                let r = engine().score_as_of(&profile(), job, sim, today()).unwrap();
                assert!((0.0..=100.0).contains(&r.final_score));
            }
        }
    }

    #[test]
    fn test_out_of_range_similarity_is_invalid_input() {
        let err = engine().score(&profile(), &job(), Some(1.5)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        let err = engine().score(&profile(), &job(), Some(f64::NAN)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_non_object_profile_is_invalid_input() {
        let err = MatchEngine::normalize_inputs(&json!(["not", "a", "profile"]), &json!({}))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_json_input_tolerates_malformed_fields() {
        let (profile, job) = MatchEngine::normalize_inputs(
            &json!({"skills": "Python, SQL", "education": 42}),
            &json!({"skills_required": "Python, Go"}),
        )
        .unwrap();
        let result = engine().score(&profile, &job, None).unwrap();
        assert_eq!(result.skill_score, 50.0);
    }

    #[test]
    fn test_matching_does_not_mutate_job() {
        let posting = job();
        let before = posting.clone();
        engine().score(&profile(), &posting, Some(0.3)).unwrap();
        assert_eq!(posting, before);
    }
}

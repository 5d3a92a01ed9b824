use serde::{Deserialize, Serialize};

/// A scored criterion of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Skills,
    Education,
    Experience,
    Certifications,
    SemanticSimilarity,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Skills,
        Criterion::Education,
        Criterion::Experience,
        Criterion::Certifications,
        Criterion::SemanticSimilarity,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Criterion::Skills => "Skills",
            Criterion::Education => "Education",
            Criterion::Experience => "Experience",
            Criterion::Certifications => "Certifications",
            Criterion::SemanticSimilarity => "Semantic similarity",
        }
    }
}

/// Fusion weights. Loaded from configuration; they need not sum to 1 because
/// fusion renormalises over the criteria that are available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub skills: f64,
    pub education: f64,
    pub experience: f64,
    pub certifications: f64,
    pub semantic: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            skills: 0.4,
            education: 0.3,
            experience: 0.2,
            certifications: 0.0,
            semantic: 0.1,
        }
    }
}

impl ScoreWeights {
    pub fn weight(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Skills => self.skills,
            Criterion::Education => self.education,
            Criterion::Experience => self.experience,
            Criterion::Certifications => self.certifications,
            Criterion::SemanticSimilarity => self.semantic,
        }
    }

    pub fn sum(&self) -> f64 {
        Criterion::ALL.iter().map(|c| self.weight(*c)).sum()
    }

    /// Weights must be finite, non-negative and not all zero.
    pub fn validate(&self) -> Result<(), String> {
        for criterion in Criterion::ALL {
            let w = self.weight(criterion);
            if !w.is_finite() || w < 0.0 {
                return Err(format!(
                    "{} weight must be a non-negative number, got {w}",
                    criterion.label()
                ));
            }
        }
        if self.sum() <= 0.0 {
            return Err("at least one score weight must be positive".to_string());
        }
        Ok(())
    }
}

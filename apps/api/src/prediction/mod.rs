//! Outcome Predictor: estimates an application's chance of success from
//! historical cohort statistics blended with the match score.
//!
//! NOTE: this is a descriptive heuristic over past outcomes, not a trained or
//! calibrated classifier. Treat the number as a summary of history, and the
//! confidence label as "how far from a coin flip", nothing more.

pub mod cohort;
pub mod handlers;
pub mod service;

use serde::{Deserialize, Serialize};

use crate::models::application::HistoricalOutcome;
use crate::models::profile::JobPosting;
use cohort::{CohortStats, JobSignals, Signal};

pub use service::PredictionService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
}

/// **High** when the probability lies strictly outside [0.3, 0.7]; the
/// boundaries themselves are **Medium**.
pub fn classify_confidence(probability: f64) -> Confidence {
    if probability < 0.3 || probability > 0.7 {
        Confidence::High
    } else {
        Confidence::Medium
    }
}

/// Where a cohort rate came from, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// The candidate's own applications in this cohort.
    Candidate,
    /// Every candidate's applications in this cohort.
    Population,
    /// Every application on record, regardless of cohort.
    PopulationBaseRate,
    /// No history at all; the configured neutral rate.
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSignal {
    pub signal: Option<Signal>,
    pub cohort: String,
    pub source: RateSource,
    pub rate: f64,
    pub sample_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability: f64,
    pub confidence: Confidence,
    pub explanations: Vec<String>,
    pub cohort_rate: f64,
    /// Match score scaled to [0, 1], when one was available.
    pub match_component: Option<f64>,
    /// Contributing signals, dominant first.
    pub signals: Vec<CohortSignal>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorConfig {
    /// Share of the cohort rate in the blend; the match score gets the rest.
    pub cohort_weight: f64,
    /// Rate assumed when there is no history at all.
    pub neutral_base_rate: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            cohort_weight: 0.5,
            neutral_base_rate: 0.5,
        }
    }
}

/// History available to one prediction.
#[derive(Debug, Clone, Copy)]
pub struct CohortHistory<'a> {
    pub candidate: &'a [HistoricalOutcome],
    pub population: &'a [HistoricalOutcome],
}

#[derive(Debug, Clone)]
pub struct OutcomePredictor {
    config: PredictorConfig,
}

impl OutcomePredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self {
            config: PredictorConfig {
                cohort_weight: config.cohort_weight.clamp(0.0, 1.0),
                neutral_base_rate: config.neutral_base_rate.clamp(0.0, 1.0),
            },
        }
    }

    /// Blends the cohort success rate with the match score (0–100, if any).
    /// Never fails: empty cohorts fall back to broader ones, then to the
    /// neutral base rate.
    pub fn predict_success_probability(
        &self,
        job: &JobPosting,
        history: CohortHistory<'_>,
        match_score: Option<f64>,
    ) -> PredictionResult {
        let job_signals = JobSignals::of(job);
        let signals = self.resolve_signals(&job_signals, history);

        let sample_total: u32 = signals.iter().map(|s| s.sample_size).sum();
        let cohort_rate = if sample_total > 0 {
            signals
                .iter()
                .map(|s| s.rate * s.sample_size as f64)
                .sum::<f64>()
                / sample_total as f64
        } else {
            signals.first().map(|s| s.rate).unwrap_or(self.config.neutral_base_rate)
        };

        let match_component = match_score
            .filter(|s| s.is_finite())
            .map(|s| (s / 100.0).clamp(0.0, 1.0));
        let blended = match match_component {
            Some(m) => self.config.cohort_weight * cohort_rate + (1.0 - self.config.cohort_weight) * m,
            None => cohort_rate,
        };
        let probability = round4(blended.clamp(0.0, 1.0));
        let confidence = classify_confidence(probability);

        let mut result = PredictionResult {
            probability,
            confidence,
            explanations: vec![],
            cohort_rate: round4(cohort_rate),
            match_component,
            signals,
        };
        result.explanations = get_prediction_explanation(&result, self.config.cohort_weight);
        result
    }

    fn resolve_signals(&self, job: &JobSignals, history: CohortHistory<'_>) -> Vec<CohortSignal> {
        let mut signals: Vec<CohortSignal> = [Signal::CompanySize, Signal::Industry]
            .into_iter()
            .filter_map(|signal| {
                let candidate = CohortStats::from_outcomes(
                    history.candidate.iter().filter(|o| job.matches(signal, o)),
                );
                let population = CohortStats::from_outcomes(
                    history.population.iter().filter(|o| job.matches(signal, o)),
                );
                let (source, stats) = if candidate.total > 0 {
                    (RateSource::Candidate, candidate)
                } else if population.total > 0 {
                    (RateSource::Population, population)
                } else {
                    return None;
                };
                Some(CohortSignal {
                    signal: Some(signal),
                    cohort: job.label(signal),
                    source,
                    rate: stats.rate().unwrap_or(0.0),
                    sample_size: stats.total,
                })
            })
            .collect();

        if signals.is_empty() {
            let base = CohortStats::from_outcomes(history.population);
            signals.push(match base.rate() {
                Some(rate) => CohortSignal {
                    signal: None,
                    cohort: "all applications".to_string(),
                    source: RateSource::PopulationBaseRate,
                    rate,
                    sample_size: base.total,
                },
                None => CohortSignal {
                    signal: None,
                    cohort: "none".to_string(),
                    source: RateSource::Default,
                    rate: self.config.neutral_base_rate,
                    sample_size: 0,
                },
            });
        }

        // Most specific source first, then the larger sample; stable for ties.
        signals.sort_by_key(|s| (s.source as u8, std::cmp::Reverse(s.sample_size)));
        signals
    }
}

/// Human-readable bullets for a prediction, dominant cohort signal first,
/// always ending with the heuristic disclaimer.
pub fn get_prediction_explanation(result: &PredictionResult, cohort_weight: f64) -> Vec<String> {
    let mut bullets: Vec<String> = result.signals.iter().map(describe_signal).collect();

    match result.match_component {
        Some(m) => bullets.push(format!(
            "Your match score of {:.1}/100 accounts for {:.0}% of this estimate",
            m * 100.0,
            (1.0 - cohort_weight) * 100.0
        )),
        None => bullets.push(
            "Insufficient data to compute a match score; the estimate uses history only"
                .to_string(),
        ),
    }

    bullets.push(format!(
        "Estimated success probability {}% ({:?} confidence)",
        percent(result.probability),
        result.confidence
    ));
    bullets.push(
        "This is a descriptive estimate from past application outcomes, not a validated prediction"
            .to_string(),
    );
    bullets
}

fn describe_signal(signal: &CohortSignal) -> String {
    let rate = percent(signal.rate);
    let n = signal.sample_size;
    match (signal.source, signal.signal) {
        (RateSource::Candidate, Some(Signal::CompanySize)) => format!(
            "Your success rate with similarly-sized companies is {rate}% ({n} past applications to {} companies)",
            signal.cohort
        ),
        (RateSource::Candidate, Some(Signal::Industry)) => format!(
            "Your success rate in the {} industry is {rate}% ({n} past applications)",
            signal.cohort
        ),
        (RateSource::Population, Some(Signal::CompanySize)) => format!(
            "No personal history with {} companies yet; applicants to them succeed {rate}% of the time ({n} applications)",
            signal.cohort
        ),
        (RateSource::Population, Some(Signal::Industry)) => format!(
            "No personal history in the {} industry yet; applicants there succeed {rate}% of the time ({n} applications)",
            signal.cohort
        ),
        (RateSource::PopulationBaseRate, _) => format!(
            "No history for similar companies; using the overall success rate of {rate}% across {n} applications"
        ),
        _ => format!("Insufficient data: no application history yet, assuming a neutral {rate}%"),
    }
}

fn percent(rate: f64) -> String {
    format!("{:.0}", rate * 100.0)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationStatus;

    fn outcome(company: &str, industry: &str, status: ApplicationStatus) -> HistoricalOutcome {
        HistoricalOutcome {
            company: company.to_string(),
            industry: industry.to_string(),
            status,
        }
    }

    fn large_company_history() -> Vec<HistoricalOutcome> {
        let mut history: Vec<_> = (0..7)
            .map(|_| outcome("Globex Corp", "technology", ApplicationStatus::Rejected))
            .collect();
        history.extend((0..3).map(|_| outcome("Umbrella Inc", "technology", ApplicationStatus::Hired)));
        history
    }

    fn large_job() -> JobPosting {
        JobPosting {
            title: "Platform Engineer".to_string(),
            company: "Initech Corp".to_string(),
            industry: "technology".to_string(),
            ..Default::default()
        }
    }

    fn predictor() -> OutcomePredictor {
        OutcomePredictor::new(PredictorConfig::default())
    }

    #[test]
    fn test_large_company_cohort_rate_is_thirty_percent() {
        let history = large_company_history();
        let result = predictor().predict_success_probability(
            &large_job(),
            CohortHistory {
                candidate: &history,
                population: &history,
            },
            None,
        );
        assert_eq!(result.cohort_rate, 0.3);
        assert_eq!(result.probability, 0.3);
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(
            result.explanations[0],
            "Your success rate with similarly-sized companies is 30% (10 past applications to large companies)"
        );
    }

    #[test]
    fn test_confidence_boundaries_are_medium() {
        assert_eq!(classify_confidence(0.3), Confidence::Medium);
        assert_eq!(classify_confidence(0.7), Confidence::Medium);
        assert_eq!(classify_confidence(0.5), Confidence::Medium);
        assert_eq!(classify_confidence(0.2999), Confidence::High);
        assert_eq!(classify_confidence(0.7001), Confidence::High);
        assert_eq!(classify_confidence(0.0), Confidence::High);
        assert_eq!(classify_confidence(1.0), Confidence::High);
    }

    #[test]
    fn test_blend_with_match_score() {
        let history = large_company_history();
        let result = predictor().predict_success_probability(
            &large_job(),
            CohortHistory {
                candidate: &history,
                population: &history,
            },
            Some(90.0),
        );
        // 0.5 * 0.3 + 0.5 * 0.9
        assert_eq!(result.probability, 0.6);
        assert_eq!(result.match_component, Some(0.9));
        assert!(result.explanations[2].contains("90.0/100"));
    }

    #[test]
    fn test_cold_start_uses_population_cohort() {
        let population = vec![
            outcome("Globex Corp", "retail", ApplicationStatus::Hired),
            outcome("Umbrella Inc", "retail", ApplicationStatus::Rejected),
            outcome("Hooli Inc", "retail", ApplicationStatus::Rejected),
            outcome("Massive Corp", "retail", ApplicationStatus::Rejected),
        ];
        let result = predictor().predict_success_probability(
            &large_job(),
            CohortHistory {
                candidate: &[],
                population: &population,
            },
            None,
        );
        assert_eq!(result.signals.len(), 1);
        assert_eq!(result.signals[0].source, RateSource::Population);
        assert_eq!(result.probability, 0.25);
        assert_eq!(result.confidence, Confidence::High);
        assert!(result.explanations[0].starts_with("No personal history with large companies"));
    }

    #[test]
    fn test_unrelated_population_falls_back_to_base_rate() {
        let population = vec![
            outcome("Rocket Labs", "retail", ApplicationStatus::Hired),
            outcome("Tiny Startup", "retail", ApplicationStatus::Rejected),
        ];
        let result = predictor().predict_success_probability(
            &large_job(),
            CohortHistory {
                candidate: &[],
                population: &population,
            },
            None,
        );
        assert_eq!(result.signals[0].source, RateSource::PopulationBaseRate);
        assert_eq!(result.probability, 0.5);
    }

    #[test]
    fn test_no_history_at_all_is_neutral_and_explained() {
        let result = predictor().predict_success_probability(
            &large_job(),
            CohortHistory {
                candidate: &[],
                population: &[],
            },
            None,
        );
        assert_eq!(result.probability, 0.5);
        assert_eq!(result.signals[0].source, RateSource::Default);
        assert!(result.explanations[0].starts_with("Insufficient data"));
        assert!(result.explanations.last().unwrap().contains("not a validated prediction"));
    }

    #[test]
    fn test_probability_always_in_unit_interval() {
        let history = large_company_history();
        for score in [None, Some(-50.0), Some(0.0), Some(100.0), Some(500.0), Some(f64::NAN)] {
            let r = predictor().predict_success_probability(
                &large_job(),
                CohortHistory {
                    candidate: &history,
                    population: &history,
                },
                score,
            );
            assert!((0.0..=1.0).contains(&r.probability));
        }
    }
}

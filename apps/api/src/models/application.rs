use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an application. Transitions are validated by
/// `tracking::state_machine`; nothing else may assign a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    AiScreening,
    Reviewing,
    Shortlisted,
    Interview,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::Pending,
        ApplicationStatus::AiScreening,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interview,
        ApplicationStatus::Hired,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::AiScreening => "ai_screening",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Hired | ApplicationStatus::Rejected)
    }

    /// Statuses counted as a success when computing cohort rates.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Shortlisted | ApplicationStatus::Interview | ApplicationStatus::Hired
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown application status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    Online,
    InPerson,
    Phone,
}

impl InterviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewMode::Online => "online",
            InterviewMode::InPerson => "in_person",
            InterviewMode::Phone => "phone",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "online" => Some(InterviewMode::Online),
            "in_person" => Some(InterviewMode::InPerson),
            "phone" => Some(InterviewMode::Phone),
            _ => None,
        }
    }
}

/// One application of a candidate to a job; unique per `(candidate_id, job_id)`.
/// `version` increments on every status change and guards concurrent updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub status: ApplicationStatus,
    pub score_snapshot: Option<f64>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_mode: Option<InterviewMode>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable audit record of one status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub id: Uuid,
    /// Store-assigned insertion order, used to break timestamp ties.
    pub sequence: i64,
    pub application_id: Uuid,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Optional data attached to a transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionMetadata {
    pub notes: Option<String>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_mode: Option<InterviewMode>,
    /// Version the caller last saw. When absent the version read just before
    /// the write is used, which still detects writes racing this one.
    pub expected_version: Option<i32>,
}

/// Historical application joined with the categorical data of its job.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalOutcome {
    pub company: String,
    pub industry: String,
    pub status: ApplicationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = "archived".parse::<ApplicationStatus>().unwrap_err();
        assert_eq!(err, UnknownStatus("archived".to_string()));
    }

    #[test]
    fn test_status_serde_is_snake_case() {
        let json = serde_json::to_string(&ApplicationStatus::AiScreening).unwrap();
        assert_eq!(json, r#""ai_screening""#);
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = ApplicationStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![ApplicationStatus::Hired, ApplicationStatus::Rejected]);
    }

    #[test]
    fn test_interview_mode_parse() {
        assert_eq!(InterviewMode::parse("in_person"), Some(InterviewMode::InPerson));
        assert_eq!(InterviewMode::parse("carrier pigeon"), None);
    }
}

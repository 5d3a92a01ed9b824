//! The one place that decides which status changes are legal.
//!
//! Forward path: pending → ai_screening → reviewing → shortlisted →
//! interview → {hired, rejected}. Any non-terminal status may also jump
//! straight to rejected (recruiter override). hired and rejected are
//! terminal. A status never transitions to itself.

use crate::errors::AppError;
use crate::models::application::ApplicationStatus::{self, *};

/// Statuses reachable from `from` in one step.
pub fn allowed_transitions(from: ApplicationStatus) -> &'static [ApplicationStatus] {
    match from {
        Pending => &[AiScreening, Rejected],
        AiScreening => &[Reviewing, Rejected],
        Reviewing => &[Shortlisted, Rejected],
        Shortlisted => &[Interview, Rejected],
        Interview => &[Hired, Rejected],
        Hired | Rejected => &[],
    }
}

pub fn can_transition(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

pub fn validate_transition(from: ApplicationStatus, to: ApplicationStatus) -> Result<(), AppError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

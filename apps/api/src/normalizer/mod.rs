//! Schema Normalizer: turns loosely-structured extraction output into
//! canonical `ResumeProfile` / `JobPosting` records.
//!
//! All defaulting happens here, once. Downstream code never sees a missing
//! field. A field that fails to parse is dropped and flagged (`degraded`);
//! the rest of the record is kept.

pub mod fields;
pub mod repair;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::matching::dates::split_date_range;
use crate::models::profile::{
    EducationEntry, ExperienceEntry, JobPosting, ProjectEntry, ResumeProfile,
};
use fields::{records, split_text, text, text_list, Issues, Split};

/// A normalized record plus what went wrong on the way.
#[derive(Debug, Clone, Serialize)]
pub struct Normalized<T> {
    pub value: T,
    pub degraded: bool,
    pub issues: Vec<String>,
}

impl<T> Normalized<T> {
    fn from_issues(value: T, issues: Issues) -> Self {
        Self {
            degraded: !issues.0.is_empty(),
            value,
            issues: issues.0,
        }
    }
}

/// Normalizes raw extraction text (possibly fenced or damaged JSON).
pub fn normalize_resume_text(raw: &str) -> Normalized<ResumeProfile> {
    match repair::parse_lenient(raw) {
        Some(value) => normalize_resume(&value),
        None => unparsable(),
    }
}

pub fn normalize_job_text(raw: &str) -> Normalized<JobPosting> {
    match repair::parse_lenient(raw) {
        Some(value) => normalize_job(&value),
        None => unparsable(),
    }
}

fn unparsable<T: Default>() -> Normalized<T> {
    warn!("Extraction output could not be parsed even after repair");
    Normalized {
        value: T::default(),
        degraded: true,
        issues: vec!["extraction output is not parsable JSON".to_string()],
    }
}

fn non_object<T: Default>(value: &Value) -> Normalized<T> {
    warn!("Extraction output is not a JSON object: {}", json_type(value));
    Normalized {
        value: T::default(),
        degraded: true,
        issues: vec![format!("expected a JSON object, got {}", json_type(value))],
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalizes the extraction contract
/// `{name, profile_summary, skills[], education[], experience[], certificates[], projects[]}`
/// and its common aliases.
pub fn normalize_resume(value: &Value) -> Normalized<ResumeProfile> {
    let Some(obj) = value.as_object() else {
        return non_object(value);
    };
    let mut issues = Issues::default();

    let profile = ResumeProfile {
        name: text(obj, &["name", "full_name", "candidate_name"], &mut issues),
        summary: text(obj, &["profile_summary", "summary", "objective", "about"], &mut issues),
        skills: text_list(obj, &["skills", "technical_skills"], Split::Items, &mut issues),
        education: records(
            obj,
            &["education", "educations"],
            &mut issues,
            read_education,
            |line| EducationEntry {
                degree: line.to_string(),
                ..Default::default()
            },
        ),
        experience: records(
            obj,
            &["experience", "work_experience", "experiences"],
            &mut issues,
            read_experience,
            |line| ExperienceEntry {
                title: line.to_string(),
                ..Default::default()
            },
        ),
        certifications: text_list(
            obj,
            &["certificates", "certifications", "certs"],
            Split::Lines,
            &mut issues,
        ),
        projects: records(obj, &["projects"], &mut issues, read_project, |line| ProjectEntry {
            name: line.to_string(),
            ..Default::default()
        }),
    };

    Normalized::from_issues(profile, issues)
}

fn read_education(obj: &Map<String, Value>, issues: &mut Issues) -> EducationEntry {
    let (start_date, end_date) = read_range(obj, issues);
    EducationEntry {
        degree: text(obj, &["degree", "qualification", "title"], issues),
        institution: text(obj, &["institution", "university", "school", "college"], issues),
        start_date,
        end_date,
    }
}

fn read_experience(obj: &Map<String, Value>, issues: &mut Issues) -> ExperienceEntry {
    let (start_date, end_date) = read_range(obj, issues);
    ExperienceEntry {
        title: text(obj, &["title", "role", "position", "designation"], issues),
        company: text(obj, &["company", "organization", "employer"], issues),
        start_date,
        end_date,
        responsibilities: text_list(
            obj,
            &["responsibilities", "description", "highlights", "achievements"],
            Split::Lines,
            issues,
        ),
    }
}

fn read_project(obj: &Map<String, Value>, issues: &mut Issues) -> ProjectEntry {
    ProjectEntry {
        name: text(obj, &["name", "title"], issues),
        description: text(obj, &["description", "summary"], issues),
        technologies: text_list(
            obj,
            &["technologies", "tech_stack", "tools", "skills"],
            Split::Items,
            issues,
        ),
    }
}

/// Start/end from explicit fields, else from a combined "duration" string.
fn read_range(obj: &Map<String, Value>, issues: &mut Issues) -> (String, String) {
    let start = text(obj, &["start_date", "start", "from"], issues);
    let end = text(obj, &["end_date", "end", "to", "graduation_year"], issues);
    if !start.is_empty() {
        return (start, end);
    }
    let duration = text(obj, &["duration", "dates", "period", "date_range", "years"], issues);
    match split_date_range(&duration) {
        Some((start, end)) => (start, end),
        None => (duration, end),
    }
}

/// Normalizes a job extraction, accepting both `skills_required` and
/// `required_skills` spellings, and free text or lists for requirements.
pub fn normalize_job(value: &Value) -> Normalized<JobPosting> {
    let Some(obj) = value.as_object() else {
        return non_object(value);
    };
    let mut issues = Issues::default();

    let required_experience = match fields::lookup(
        obj,
        &["experience_required", "required_experience", "experience"],
    ) {
        Some((_, Value::Number(n))) => format!("{n} years"),
        _ => text(
            obj,
            &["experience_required", "required_experience", "experience"],
            &mut issues,
        ),
    };

    let posting = JobPosting {
        title: text(obj, &["title", "job_title", "position"], &mut issues),
        company: text(obj, &["company", "company_name", "organization"], &mut issues),
        industry: text(obj, &["industry", "sector"], &mut issues),
        required_skills: text_list(
            obj,
            &["skills_required", "required_skills", "skills"],
            Split::Items,
            &mut issues,
        ),
        required_education: text_list(
            obj,
            &["education_required", "required_education", "education"],
            Split::Lines,
            &mut issues,
        ),
        required_experience,
        required_certifications: text_list(
            obj,
            &["certifications_required", "required_certifications", "certifications"],
            Split::Lines,
            &mut issues,
        ),
        description: text(obj, &["description", "job_description", "summary"], &mut issues),
        responsibilities: match fields::lookup(obj, &["responsibilities", "duties"]) {
            Some((_, Value::String(s))) => split_text(s, Split::Lines),
            _ => text_list(obj, &["responsibilities", "duties"], Split::Lines, &mut issues),
        },
    };

    Normalized::from_issues(posting, issues)
}

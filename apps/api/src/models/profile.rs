use serde::{Deserialize, Serialize};

/// Canonical candidate profile. Every field is present; absent data is an
/// empty string or empty list, never `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeProfile {
    pub name: String,
    pub summary: String,
    pub skills: Vec<String>,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub certifications: Vec<String>,
    pub projects: Vec<ProjectEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub start_date: String,
    pub end_date: String,
}

/// Dates are kept as written on the resume ("Jan 2020", "Present"); they are
/// parsed only when experience is totalled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
}

/// Canonical job posting. Matching reads it and never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    /// Optional; inferred from the posting text when empty.
    pub industry: String,
    pub required_skills: Vec<String>,
    pub required_education: Vec<String>,
    /// Free text such as "3+ years".
    pub required_experience: String,
    pub required_certifications: Vec<String>,
    pub description: String,
    pub responsibilities: Vec<String>,
}

impl ResumeProfile {
    /// Flattened text used by the similarity collaborator.
    pub fn as_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.name.as_str(), self.summary.as_str()];
        parts.extend(self.skills.iter().map(String::as_str));
        for edu in &self.education {
            parts.push(&edu.degree);
            parts.push(&edu.institution);
        }
        for exp in &self.experience {
            parts.push(&exp.title);
            parts.push(&exp.company);
            parts.extend(exp.responsibilities.iter().map(String::as_str));
        }
        parts.extend(self.certifications.iter().map(String::as_str));
        for project in &self.projects {
            parts.push(&project.name);
            parts.push(&project.description);
            parts.extend(project.technologies.iter().map(String::as_str));
        }
        join_non_empty(&parts)
    }

    pub fn is_empty(&self) -> bool {
        self == &ResumeProfile::default()
    }
}

impl JobPosting {
    pub fn as_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.title.as_str(), self.company.as_str()];
        parts.extend(self.required_skills.iter().map(String::as_str));
        parts.extend(self.required_education.iter().map(String::as_str));
        parts.push(&self.required_experience);
        parts.extend(self.required_certifications.iter().map(String::as_str));
        parts.push(&self.description);
        parts.extend(self.responsibilities.iter().map(String::as_str));
        join_non_empty(&parts)
    }
}

fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_with_missing_fields() {
        let profile: ResumeProfile = serde_json::from_str(r#"{"name": "Ada"}"#).unwrap();
        assert_eq!(profile.name, "Ada");
        assert!(profile.skills.is_empty());
        assert!(profile.experience.is_empty());
    }

    #[test]
    fn test_as_text_skips_blank_fields() {
        let job = JobPosting {
            title: "Backend Engineer".to_string(),
            required_skills: vec!["Rust".to_string()],
            ..Default::default()
        };
        assert_eq!(job.as_text(), "Backend Engineer\nRust");
    }

    #[test]
    fn test_default_profile_is_empty() {
        assert!(ResumeProfile::default().is_empty());
    }
}

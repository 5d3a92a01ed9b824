//! Deterministic fallback extractor. Reads section headings out of plain
//! resume or job text and emits the same JSON contract the LLM returns, so
//! both paths go through one normalizer.
//!
//! Crude by nature: it recognises common headings, bullets and date ranges.
//! Anything it cannot place is left out, never guessed.

use serde_json::{json, Value};

use crate::matching::dates::{parse_date_bound, split_date_range};
use crate::matching::skills::tokenize_requirements;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResumeSection {
    Summary,
    Skills,
    Education,
    Experience,
    Certifications,
    Projects,
}

fn classify_resume_heading(heading: &str) -> Option<ResumeSection> {
    use ResumeSection::*;
    Some(match heading {
        "summary" | "profile" | "profile summary" | "professional summary" | "objective"
        | "about" | "about me" => Summary,
        "skills" | "technical skills" | "core competencies" | "key skills" | "technologies" => {
            Skills
        }
        "education" | "academic background" | "qualifications" => Education,
        "experience" | "work experience" | "professional experience" | "employment"
        | "employment history" | "work history" => Experience,
        "certifications" | "certificates" | "licenses" | "licenses and certifications" => {
            Certifications
        }
        "projects" | "personal projects" | "key projects" => Projects,
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobSection {
    Skills,
    Education,
    Experience,
    Certifications,
    Responsibilities,
    Description,
}

fn classify_job_heading(heading: &str) -> Option<JobSection> {
    use JobSection::*;
    Some(match heading {
        "skills" | "required skills" | "requirements" | "must have" | "tech stack"
        | "qualifications" => Skills,
        "education" | "education required" | "education requirements" => Education,
        "experience" | "experience required" => Experience,
        "certifications" | "certifications required" | "licenses" => Certifications,
        "responsibilities" | "duties" | "what you'll do" | "what you will do" | "the role" => {
            Responsibilities
        }
        "description" | "job description" | "about the role" | "overview" => Description,
        _ => return None,
    })
}

/// Lines grouped under the heading they follow. Lines before any heading
/// are grouped under `None`. `Heading: content` lines switch section and
/// keep their content.
fn split_sections<S: Copy>(
    text: &str,
    classify: impl Fn(&str) -> Option<S>,
) -> Vec<(Option<S>, Vec<String>)> {
    let mut sections: Vec<(Option<S>, Vec<String>)> = vec![(None, vec![])];

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (head, rest) = match line.split_once(':') {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        match classify(&heading_key(head)) {
            Some(section) => {
                let mut lines = vec![];
                if !rest.is_empty() {
                    lines.push(rest.to_string());
                }
                sections.push((Some(section), lines));
            }
            None => {
                if let Some((_, lines)) = sections.last_mut() {
                    lines.push(line.to_string());
                }
            }
        }
    }
    sections
}

fn heading_key(line: &str) -> String {
    line.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
        .replace('&', "and")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn lines_in<S: Copy + PartialEq>(sections: &[(Option<S>, Vec<String>)], wanted: S) -> Vec<&str> {
    sections
        .iter()
        .filter(|(s, _)| *s == Some(wanted))
        .flat_map(|(_, lines)| lines.iter().map(String::as_str))
        .collect()
}

fn strip_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches(['-', '*', '•', '·', '▪', '–']);
    (trimmed.len() != line.len()).then(|| trimmed.trim())
}

fn unbullet(line: &str) -> &str {
    strip_bullet(line).unwrap_or(line).trim()
}

/// A date range somewhere in the line, plus what is left of the line.
fn find_date_range(line: &str) -> Option<(String, String, String)> {
    let segments: Vec<&str> = line
        .split(['|', ',', '(', ')', '\t'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    for (i, segment) in segments.iter().enumerate() {
        let Some((start, end)) = split_date_range(segment) else {
            continue;
        };
        if parse_date_bound(&end).is_none() {
            continue;
        }
        // "Engineer Jan 2020 - Present": the start may carry leading words.
        let words: Vec<&str> = start.split_whitespace().collect();
        for take in [words.len(), 2, 1] {
            if take == 0 || take > words.len() {
                continue;
            }
            let (lead, tail) = words.split_at(words.len() - take);
            let start = tail.join(" ");
            if parse_date_bound(&start).is_some() {
                let mut rest: Vec<String> = segments[..i].iter().map(|s| s.to_string()).collect();
                if !lead.is_empty() {
                    rest.push(lead.join(" "));
                }
                rest.extend(segments[i + 1..].iter().map(|s| s.to_string()));
                return Some((start, end, rest.join(", ")));
            }
        }
    }
    None
}

/// "Engineer at Acme", "Engineer | Acme", "Engineer, Acme", "Engineer - Acme".
fn split_title_company(line: &str) -> (String, String) {
    for sep in [" at ", " | ", ", ", " - ", " – ", " @ "] {
        if let Some((title, company)) = line.split_once(sep) {
            return (title.trim().to_string(), company.trim().to_string());
        }
    }
    (line.trim().to_string(), String::new())
}

const DEGREE_WORDS: &[&str] = &[
    "bachelor", "master", "phd", "ph.d", "doctor", "diploma", "degree", "b.sc", "bsc", "m.sc",
    "msc", "b.tech", "m.tech", "b.e", "mba", "associate", "b.a", "m.a", "b.s", "m.s",
];

fn mentions_degree(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '.'))
        .any(|w| DEGREE_WORDS.contains(&w.trim_end_matches('.')) || DEGREE_WORDS.contains(&w))
        || lower.contains("bachelor")
        || lower.contains("master")
}

fn looks_like_name(line: &str) -> bool {
    let words = line.split_whitespace().count();
    (1..=5).contains(&words)
        && !line.contains('@')
        && !line.chars().any(|c| c.is_ascii_digit())
        && line.chars().all(|c| c.is_alphabetic() || c.is_whitespace() || ".'-".contains(c))
}

fn list_items(lines: &[&str]) -> Vec<String> {
    let mut items = Vec::new();
    for line in lines {
        let line = unbullet(line);
        // "Languages: Rust, Go" keeps only the list part.
        let list = line.split_once(':').map_or(line, |(_, rest)| rest);
        for item in tokenize_requirements(&list.replace(['|', '•'], ",")) {
            if !items.contains(&item) {
                items.push(item);
            }
        }
    }
    items
}

// ─── Resume ─────────────────────────────────────────────────────────────────

/// Best-effort resume extraction in the `{name, profile_summary, skills,
/// education, experience, certificates, projects}` shape.
pub fn extract_resume(text: &str) -> Value {
    let sections = split_sections(text, classify_resume_heading);
    let header: Vec<&str> = sections
        .first()
        .map(|(_, lines)| lines.iter().map(String::as_str).collect())
        .unwrap_or_default();

    let name = header
        .iter()
        .find(|l| looks_like_name(l))
        .map(|l| l.to_string())
        .unwrap_or_default();

    let summary = lines_in(&sections, ResumeSection::Summary).join(" ");

    json!({
        "name": name,
        "profile_summary": summary,
        "skills": list_items(&lines_in(&sections, ResumeSection::Skills)),
        "education": education_entries(&lines_in(&sections, ResumeSection::Education)),
        "experience": experience_entries(&lines_in(&sections, ResumeSection::Experience)),
        "certificates": lines_in(&sections, ResumeSection::Certifications)
            .into_iter()
            .map(unbullet)
            .collect::<Vec<_>>(),
        "projects": project_entries(&lines_in(&sections, ResumeSection::Projects)),
    })
}

fn education_entries(lines: &[&str]) -> Vec<Value> {
    let mut entries: Vec<Value> = Vec::new();
    for line in lines {
        let line = unbullet(line);
        let (start, end, rest) = match find_date_range(line) {
            Some(found) => found,
            None => (String::new(), String::new(), line.to_string()),
        };
        if mentions_degree(&rest) || entries.is_empty() {
            let (degree, institution) = match rest.split_once(',') {
                Some((d, i)) if mentions_degree(d) => (d.trim().to_string(), i.trim().to_string()),
                _ => (rest.trim().to_string(), String::new()),
            };
            entries.push(json!({
                "degree": degree, "institution": institution,
                "start_date": start, "end_date": end,
            }));
        } else if let Some(current) = entries.last_mut() {
            if current["institution"] == "" && !rest.is_empty() {
                current["institution"] = json!(rest);
            }
            if current["start_date"] == "" && !start.is_empty() {
                current["start_date"] = json!(start);
                current["end_date"] = json!(end);
            }
        }
    }
    entries
}

#[derive(Default)]
struct Job {
    title: String,
    company: String,
    start: String,
    end: String,
    responsibilities: Vec<String>,
}

impl Job {
    fn into_value(self) -> Value {
        json!({
            "title": self.title, "company": self.company,
            "start_date": self.start, "end_date": self.end,
            "responsibilities": self.responsibilities,
        })
    }
}

fn experience_entries(lines: &[&str]) -> Vec<Value> {
    let mut done: Vec<Job> = Vec::new();
    let mut current: Option<Job> = None;

    for line in lines {
        if let Some(bullet) = strip_bullet(line) {
            let job = current.get_or_insert_with(Job::default);
            job.responsibilities.push(bullet.to_string());
            continue;
        }

        let (dates, rest) = match find_date_range(line) {
            Some((start, end, rest)) => (Some((start, end)), rest),
            None => (None, line.to_string()),
        };

        // A new heading line starts a new job once the current one has
        // dates and details, or when a second date range shows up.
        let starts_new = match &current {
            None => true,
            Some(job) => {
                (!job.start.is_empty() && (dates.is_some() || !job.responsibilities.is_empty()))
                    || (!job.title.is_empty() && !job.company.is_empty() && !rest.is_empty())
            }
        };
        if starts_new {
            if let Some(job) = current.take() {
                done.push(job);
            }
            current = Some(Job::default());
        }

        let job = current.get_or_insert_with(Job::default);
        if let Some((start, end)) = dates {
            job.start = start;
            job.end = end;
        }
        if rest.is_empty() {
            continue;
        }
        if job.title.is_empty() {
            let (title, company) = split_title_company(&rest);
            job.title = title;
            job.company = company;
        } else if job.company.is_empty() {
            job.company = rest;
        } else {
            job.responsibilities.push(rest);
        }
    }

    done.extend(current);
    done.into_iter().map(Job::into_value).collect()
}

fn project_entries(lines: &[&str]) -> Vec<Value> {
    let mut entries: Vec<Value> = Vec::new();
    for line in lines {
        match strip_bullet(line) {
            Some(detail) if !entries.is_empty() => {
                if let Some(current) = entries.last_mut() {
                    let description = current["description"].as_str().unwrap_or_default();
                    let joined = if description.is_empty() {
                        detail.to_string()
                    } else {
                        format!("{description} {detail}")
                    };
                    current["description"] = json!(joined);
                }
            }
            _ => {
                let line = unbullet(line);
                let (name, description) = match line.split_once(':') {
                    Some((n, d)) => (n.trim(), d.trim()),
                    None => (line, ""),
                };
                entries.push(json!({"name": name, "description": description}));
            }
        }
    }
    entries
}

// ─── Job posting ────────────────────────────────────────────────────────────

/// Value of the first `Label: value` line whose label is one of `labels`.
fn labelled_field(lines: &[&str], labels: &[&str]) -> String {
    lines
        .iter()
        .find_map(|line| {
            let (head, rest) = line.split_once(':')?;
            let key = heading_key(head);
            labels.contains(&key.as_str()).then(|| rest.trim().to_string())
        })
        .unwrap_or_default()
}

/// Best-effort job extraction in the `{title, company, industry,
/// skills_required, education_required, experience_required,
/// certifications_required, description, responsibilities}` shape.
pub fn extract_job(text: &str) -> Value {
    let sections = split_sections(text, classify_job_heading);
    let all_lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let title = {
        let labelled = labelled_field(&all_lines, &["title", "job title", "position", "role"]);
        if labelled.is_empty() {
            all_lines
                .first()
                .filter(|l| !l.contains(':'))
                .map(|l| l.to_string())
                .unwrap_or_default()
        } else {
            labelled
        }
    };

    let mut education: Vec<String> = lines_in(&sections, JobSection::Education)
        .into_iter()
        .map(|l| unbullet(l).to_string())
        .collect();
    if education.is_empty() {
        education = all_lines
            .iter()
            .map(|l| unbullet(l))
            .filter(|l| mentions_degree(l))
            .map(String::from)
            .collect();
    }

    let experience = lines_in(&sections, JobSection::Experience)
        .into_iter()
        .chain(all_lines.iter().copied())
        .map(unbullet)
        .find(|l| l.to_lowercase().contains("year") && l.chars().any(|c| c.is_ascii_digit()))
        .unwrap_or_default()
        .to_string();

    let skill_lines: Vec<&str> = lines_in(&sections, JobSection::Skills)
        .into_iter()
        .filter(|l| !mentions_degree(l) && !l.to_lowercase().contains("year"))
        .collect();

    let description_lines = lines_in(&sections, JobSection::Description);
    let description = if description_lines.is_empty() {
        text.trim().to_string()
    } else {
        description_lines.join(" ")
    };

    json!({
        "title": title,
        "company": labelled_field(&all_lines, &["company", "company name", "organization", "employer"]),
        "industry": labelled_field(&all_lines, &["industry", "sector"]),
        "skills_required": list_items(&skill_lines),
        "education_required": education,
        "experience_required": experience,
        "certifications_required": lines_in(&sections, JobSection::Certifications)
            .into_iter()
            .map(unbullet)
            .collect::<Vec<_>>(),
        "description": description,
        "responsibilities": lines_in(&sections, JobSection::Responsibilities)
            .into_iter()
            .map(unbullet)
            .collect::<Vec<_>>(),
    })
}

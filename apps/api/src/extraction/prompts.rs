// LLM prompt constants for the extraction pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for resume extraction.
pub const RESUME_SYSTEM: &str = "You are a precise resume parser. \
    Convert a resume into structured JSON. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Resume extraction prompt. Replace `{resume_text}` before sending.
pub const RESUME_PROMPT_TEMPLATE: &str = r#"Extract the following resume into a JSON object with this EXACT schema:
{
  "name": "Full Name",
  "profile_summary": "One paragraph summary as written",
  "skills": ["Python", "SQL"],
  "education": [
    {"degree": "Bachelor of Science in Computer Science", "institution": "University", "start_date": "Sep 2015", "end_date": "Jun 2019"}
  ],
  "experience": [
    {"title": "Data Engineer", "company": "Acme", "start_date": "Jan 2020", "end_date": "Present", "responsibilities": ["Built pipelines"]}
  ],
  "certificates": ["AWS Certified Solutions Architect"],
  "projects": [
    {"name": "Crawler", "description": "Async web crawler", "technologies": ["Rust"]}
  ]
}

Rules:
- Keep dates exactly as written ("Jan 2020", "2020-01", "Present").
- Keep skill names exactly as written; one skill per list item.
- {no_invention}

RESUME:
{resume_text}"#;

/// System prompt for job posting extraction.
pub const JOB_SYSTEM: &str = "You are a precise job description parser. \
    Convert a job posting into structured JSON. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Job extraction prompt. Replace `{job_text}` before sending.
pub const JOB_PROMPT_TEMPLATE: &str = r#"Extract the following job posting into a JSON object with this EXACT schema:
{
  "title": "Senior Data Engineer",
  "company": "Acme Corp",
  "industry": "finance",
  "skills_required": ["Python", "SQL"],
  "education_required": ["Bachelor's degree in Computer Science"],
  "experience_required": "3+ years",
  "certifications_required": [],
  "description": "Short description as written",
  "responsibilities": ["Build pipelines"]
}

Rules:
- "experience_required" is the minimum experience as written, e.g. "3+ years"; empty string if none.
- "industry" is one lowercase word if the posting states or clearly implies it, else empty.
- {no_invention}

JOB POSTING:
{job_text}"#;

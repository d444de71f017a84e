// Tailoring prompt constants, one per refinement mode.
// Placeholders are filled with `.replace("{name}", ...)` by the pipeline.

/// Full language names for the output-language tags the pipeline passes through.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("zh", "Chinese (Simplified)"),
    ("ja", "Japanese"),
    ("pt", "Brazilian Portuguese"),
];

/// Maps a language tag (`en`, `pt-BR`, ...) to the name used in prompts.
/// Unknown tags fall back to English.
pub fn language_name(tag: &str) -> &'static str {
    let primary = tag.split(['-', '_']).next().unwrap_or("").to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(code, _)| *code == primary)
        .map(|(_, name)| *name)
        .unwrap_or("English")
}

/// Truthfulness rules shared by every mode. `{mode_rule}` carries the one rule
/// that differs between modes.
pub const TRUTHFULNESS_RULES_TEMPLATE: &str = "\
CRITICAL TRUTHFULNESS RULES (NEVER VIOLATE):
1. DO NOT add company names that are not in the original resume
2. DO NOT upgrade experience level (e.g. \"Junior\" to \"Senior\")
3. DO NOT extend employment dates or change timelines; start and end dates stay exact
4. Company name, location and duration of every position are preserved exactly
5. DO NOT modify the certificationsTraining array in any way; copy it as-is
6. DO NOT add sections for languages spoken, hobbies, interests or references
7. {mode_rule}

Breaking these rules can cause serious problems for the candidate in interviews.";

pub const NUDGE_RULE: &str =
    "DO NOT add new bullet points or content; only rephrase existing content";

pub const KEYWORDS_RULE: &str =
    "You may rephrase existing bullet points to include keywords, but DO NOT add new bullet points";

pub const FULL_RULE: &str = "You may expand existing bullet points or add new ones that \
    elaborate on existing work, but DO NOT invent entirely new responsibilities";

pub const CUSTOM_RULE: &str = "You MAY add relevant technical skills from the job description. \
    You MAY introduce realistic quantitative metrics (percentages, team sizes, dollar amounts) \
    to strengthen bullet points. Job titles MAY be aligned with the job description.";

/// Example document shown to the collaborator so it returns the exact schema.
pub const RESUME_SCHEMA_EXAMPLE: &str = r#"{
  "personalInfo": {
    "name": "John Doe",
    "title": "Software Engineer",
    "email": "john@example.com",
    "phone": "+1-555-0100",
    "location": "San Francisco, CA",
    "website": "https://johndoe.dev",
    "linkedin": "linkedin.com/in/johndoe",
    "github": "github.com/johndoe"
  },
  "summary": "Software engineer with 5+ years of experience...",
  "workExperience": [
    {
      "id": 1,
      "title": "Senior Software Engineer",
      "company": "Tech Corp",
      "location": "San Francisco, CA",
      "years": "2020 - Present",
      "description": [
        "Led development of a microservices platform",
        "Cut p95 API latency by 30%"
      ]
    }
  ],
  "education": [
    {
      "id": 1,
      "institution": "University of California",
      "degree": "B.S. Computer Science",
      "years": "2014 - 2018"
    }
  ],
  "personalProjects": [
    {
      "id": 1,
      "name": "Open Source Tool",
      "role": "Creator & Maintainer",
      "years": "2021 - Present",
      "description": ["Built a CLI tool with 1000+ GitHub stars"]
    }
  ],
  "additional": {
    "technicalSkills": ["Python", "JavaScript", "AWS", "Docker"],
    "languages": [],
    "certificationsTraining": ["AWS Solutions Architect"],
    "awards": ["Employee of the Year 2022"]
  },
  "customSections": {
    "publications": {
      "sectionType": "itemList",
      "items": [
        {
          "id": 1,
          "title": "Paper Title",
          "subtitle": "Journal Name",
          "years": "2023",
          "description": ["Brief description of the publication"]
        }
      ]
    },
    "volunteer_work": {
      "sectionType": "text",
      "text": "Description of volunteer activities..."
    }
  }
}"#;

/// Shared tail of every tailoring prompt.
/// Replace: {job_description}, {job_keywords}, {original_resume}, {schema}
const TAILOR_CONTEXT: &str = r#"
Job Description:
{job_description}

Keywords to emphasize:
{job_keywords}

Original Resume:
{original_resume}

Keep every entry "id" exactly as given. Output in this JSON format:
{schema}"#;

/// Replace: {truthfulness_rules}, {output_language} + TAILOR_CONTEXT placeholders.
pub const NUDGE_PROMPT_TEMPLATE: &str = r#"Lightly nudge this resume toward the job description. Output ONLY the JSON object, no other text.

{truthfulness_rules}

IMPORTANT: Generate ALL text content (summary, descriptions, skills) in {output_language}.

Rules:
- Make minimal, conservative edits only where a clear existing match exists
- Do NOT change the candidate's role, industry or seniority level
- Do NOT introduce tools, technologies or certifications that are not already present
- Do NOT add bullet points or sections; keep bullet count and ordering in every section
- Keep proper nouns (names, company names, locations) unchanged
- Preserve the structure of every customSections entry
- If the resume is non-technical, do NOT add technical jargon
- Do NOT use the em dash character anywhere; remove existing ones
"#;

pub const KEYWORDS_PROMPT_TEMPLATE: &str = r#"Enhance this resume with relevant keywords from the job description. Output ONLY the JSON object, no other text.

{truthfulness_rules}

IMPORTANT: Generate ALL text content (summary, descriptions, skills) in {output_language}.

Rules:
- Weave in relevant keywords only where evidence for them already exists
- You may rephrase bullet points to use keyword phrasing; keep the bullet count
- Do NOT introduce skills, tools or certifications that are not in the resume
- Do NOT change role, industry or seniority level
- Preserve the structure of every customSections entry
- Keep non-technical resumes non-technical
- Do NOT use the em dash character anywhere; remove existing ones
"#;

pub const FULL_PROMPT_TEMPLATE: &str = r#"Tailor this resume for the job. Output ONLY the JSON object, no other text.

{truthfulness_rules}

IMPORTANT: Generate ALL text content (summary, descriptions, skills) in {output_language}.

Rules:
- Rephrase content to highlight relevant experience
- DO NOT invent new information; new bullets must elaborate existing work
- Never drop an existing bullet
- Use action verbs and quantifiable achievements already supported by the resume
- Keep proper nouns (names, company names, locations) unchanged
- Translate job titles, descriptions and skills to {output_language}
- Improve customSections content the same way as standard sections, keeping their structure
- Emphasize total relevant experience duration when it matches the requirements
- Do NOT use the em dash character anywhere; remove existing ones
"#;

pub const CUSTOM_PROMPT_TEMPLATE: &str = r#"Tailor this resume aggressively for the job. Output ONLY the JSON object, no other text.

{truthfulness_rules}

IMPORTANT: Generate ALL text content (summary, descriptions, skills) in {output_language}.

Rules:
- SKILLS: keep ALL existing technical skills and APPEND missing high-priority skills from the job description
- METRICS: EVERY bullet point includes at least one quantitative metric (percentage, team size, dollar amount, time saved, users impacted); base numbers on role seniority and industry norms
- Each experience entry has EXACTLY 4 bullet points, each at most 600 characters
- Each project has ONE comprehensive bullet of at least 400 characters, deeply relevant to the job
- Experience titles may be aligned to the job description; company name and duration stay UNCHANGED
- Publications or research titles may be adjusted for relevance; subject matter stays the same
- Mention experience duration explicitly in the summary
- DO NOT add a description to education entries
- Preserve the structure of every customSections entry
- Do NOT use the em dash character anywhere; remove existing ones
"#;

/// Builds the full tailoring template for a mode: the mode prompt followed by
/// the shared job/resume context block.
pub fn tailor_template(mode_prompt: &str) -> String {
    format!("{}{}", mode_prompt.trim_end(), TAILOR_CONTEXT)
}

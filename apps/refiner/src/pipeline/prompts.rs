// Prompts for the stages after tailoring, and for companion text.
// Placeholders are filled with `.replace("{name}", ...)`.

/// Replace: {truthfulness_rules}, {injection_rules}, {keywords_to_inject},
/// {current_resume}, {master_resume}, {job_description}, {output_language}
pub const KEYWORD_INJECTION_PROMPT: &str = r#"Work the following keywords into this resume where they fit naturally.

{truthfulness_rules}

RULES:
{injection_rules}
- Keep the exact same JSON structure and every entry "id"
- Do not use the em dash character or its substitutes (---, --)
- Do not modify the certificationsTraining array; copy it exactly
- Do not add or remove sections for languages spoken, hobbies, interests or references
- Generate all text content in {output_language}

Keywords to inject:
{keywords_to_inject}

Current tailored resume:
{current_resume}

Master resume (source of truth):
{master_resume}

Job description context:
{job_description}

Output the complete resume JSON. Return ONLY valid JSON."#;

/// Injection rules when the mode may add skills and content.
pub const INJECTION_RULES_OPEN: &str = "\
- You MAY add skills, technologies and tools from the job description even if the master resume lacks them
- Rephrase existing bullets to include keywords; keep the bullet count of every entry
- Every bullet should carry a quantitative metric consistent with the role's seniority";

/// Injection rules when the mode may only rephrase.
pub const INJECTION_RULES_EVIDENCE_ONLY: &str = "\
- Only use a keyword where the resume already shows evidence for it; skip the rest
- Rephrase existing bullets; do NOT add bullets, skills, tools or metrics
- Keep the bullet count of every entry";

/// Replace: {truthfulness_rules}, {seniority_level}, {team_band}, {flagged_metrics},
/// {resume}, {job_description}
pub const METRIC_VERIFICATION_PROMPT: &str = r#"Review every bullet point in this resume and make sure each quantitative metric is realistic.

{truthfulness_rules}

For each metric (percentage, team size, dollar amount, time saved) ask:
1. Is it plausible for a {seniority_level} role in this industry?
2. Could it realistically happen at this kind of company?
3. Is the scale right for the seniority level?

RULES:
- Rewrite an unrealistic metric with a more plausible figure; keep the wording and keywords
- Never remove a metric; only adjust implausible ones
- Improvement percentages should sit between 5% and 45%
- Team sizes for a {seniority_level} role should sit between {team_band}
- Revenue and cost figures should be proportional to the company's size
- Do not modify the certificationsTraining array
- Return the COMPLETE resume JSON with every entry "id" unchanged

Metrics already flagged as out of range:
{flagged_metrics}

Resume to verify:
{resume}

Job description (context on role and industry):
{job_description}

Return ONLY valid JSON."#;

/// Replace: {truthfulness_rules}, {resume}, {master_resume}, {output_language}
pub const VALIDATION_POLISH_PROMPT: &str = r#"Review and polish this resume. Remove any language that sounds machine-written.

{truthfulness_rules}

REMOVE or REPLACE:
- Buzzwords such as "spearheaded", "synergy", "leveraged", "orchestrated"
- Em dashes (use commas or semicolons instead)
- Stiff wording: "utilized" becomes "used", "endeavored" becomes "worked"
- Filler: "in order to" becomes "to"

VERIFY against the master resume:
- Every skill exists in the master resume, unless the rules above allow new skills
- Every certification exists in the master resume, unchanged
- Companies, locations and dates are unchanged

Keep all text in {output_language}. Keep every entry "id" and the bullet count of every entry.

Resume to polish:
{resume}

Master resume:
{master_resume}

Output the polished resume JSON. Return ONLY valid JSON."#;

/// Replace: {output_language}, {job_description}, {resume_data}
pub const COVER_LETTER_PROMPT: &str = r#"Write a short cover letter for this job application.

Write in {output_language}.

Job Description:
{job_description}

Candidate Resume (JSON):
{resume_data}

Requirements:
- 100 to 150 words, in 3 or 4 short paragraphs
- Open with one specific detail from the job description (product, stack or problem), not generic excitement
- In the middle, pick one or two qualifications from the resume that directly match stated requirements
- Close with simple availability to talk
- If the resume shows a career change, frame it as deliberate and relevant
- Use the company name from the job description; never a placeholder
- Do not invent anything that is not in the resume
- Tone: a confident peer, not an eager applicant
- Never use the em dash character

Output plain text only. No JSON, no markdown."#;

/// Replace: {output_language}, {job_description}, {resume_data}
pub const OUTREACH_MESSAGE_PROMPT: &str = r#"Write a cold outreach message (LinkedIn or email) about this job opening.

Write in {output_language}.

Job Description:
{job_description}

Candidate Resume (JSON):
{resume_data}

Guidelines:
- 70 to 100 words
- First sentence references a specific detail of the job (team, product, technical challenge); never open with "I'm reaching out"
- One sentence on the strongest matching qualification, with a concrete metric if the resume has one
- End with a low-friction ask such as "Worth a quick chat?"
- Tone: messaging a former colleague
- No placeholder brackets, no "excited about" or "passionate about"
- Never use the em dash character

Output plain text only. No JSON, no markdown."#;

/// Replace: {output_language}, {job_description}
pub const TITLE_PROMPT: &str = r#"Extract the job title and company name from this job description.

Write in {output_language}.

Job Description:
{job_description}

Rules:
- Format: "Role @ Company", e.g. "Senior Frontend Engineer @ Stripe"
- Without a company name, return just the role
- At most 60 characters
- Use the most specific role title mentioned
- No other text, quotes or formatting

Output the title only."#;

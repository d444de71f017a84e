use serde::{Deserialize, Serialize};

/// Seniority level inferred upstream from the job description.
/// Selects the team-size band used by the metric realism check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Seniority {
    Junior,
    #[default]
    Mid,
    Senior,
    Lead,
}

impl Seniority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Seniority::Junior => "junior",
            Seniority::Mid => "mid",
            Seniority::Senior => "senior",
            Seniority::Lead => "lead",
        }
    }

    /// Lenient mapping for extractor output. Titles above senior collapse to
    /// `Lead`, entry-level titles to `Junior`, anything unrecognized to `Mid`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "junior" | "entry" | "entry-level" | "intern" | "graduate" => Seniority::Junior,
            "senior" | "sr" => Seniority::Senior,
            "lead" | "staff" | "principal" | "director" | "manager" | "head" => Seniority::Lead,
            _ => Seniority::Mid,
        }
    }
}

impl From<String> for Seniority {
    fn from(label: String) -> Self {
        Seniority::from_label(&label)
    }
}

impl std::fmt::Display for Seniority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured job requirements, immutable for the whole pipeline run.
///
/// Field names follow the keyword extractor's JSON output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobContext {
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub experience_requirements: Vec<String>,
    #[serde(default)]
    pub education_requirements: Vec<String>,
    #[serde(default)]
    pub key_responsibilities: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub seniority_level: Seniority,
    /// Raw job description text, shown to the collaborator as context.
    #[serde(default)]
    pub job_description: String,
}

impl JobContext {
    /// Keywords to emphasize: explicit keywords first, then required and
    /// preferred skills, deduplicated case-insensitively.
    pub fn emphasis_keywords(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.keywords
            .iter()
            .chain(&self.required_skills)
            .chain(&self.preferred_skills)
            .filter(|k| !k.trim().is_empty())
            .filter(|k| seen.insert(k.trim().to_lowercase()))
            .cloned()
            .collect()
    }
}

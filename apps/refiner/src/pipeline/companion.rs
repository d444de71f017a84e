use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::RefineError;
use crate::guard::invariants::truncate_at_word;
use crate::guard::PhraseSanitizer;
use crate::models::{JobContext, ResumeDocument};
use crate::pipeline::generator::{invoke, Expects, GenerationRequest, Generated, Generator};
use crate::pipeline::prompts::{COVER_LETTER_PROMPT, OUTREACH_MESSAGE_PROMPT, TITLE_PROMPT};
use crate::pipeline::refiner::PipelineSettings;
use crate::policy::prompts::language_name;

pub const MAX_TITLE_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CompanionKind {
    CoverLetter,
    Outreach,
    Title,
}

impl CompanionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanionKind::CoverLetter => "cover_letter",
            CompanionKind::Outreach => "outreach",
            CompanionKind::Title => "title",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanionText {
    pub kind: CompanionKind,
    pub text: String,
    /// Phrases the sanitizer replaced.
    pub sanitized: Vec<String>,
}

/// Free-text artifacts written from a refined resume. Output goes through the
/// same phrase sanitizer as the document.
#[derive(Clone)]
pub struct CompanionWriter {
    generator: Arc<dyn Generator>,
    sanitizer: PhraseSanitizer,
    settings: PipelineSettings,
}

impl CompanionWriter {
    pub fn new(generator: Arc<dyn Generator>, sanitizer: PhraseSanitizer, settings: PipelineSettings) -> Self {
        Self {
            generator,
            sanitizer,
            settings,
        }
    }

    pub async fn write(
        &self,
        kind: CompanionKind,
        resume: &ResumeDocument,
        job: &JobContext,
        output_language: &str,
    ) -> Result<CompanionText, RefineError> {
        let language = language_name(output_language);
        let request = GenerationRequest {
            stage: kind.as_str().to_string(),
            instructions: render(kind, resume, job, language)?,
            document: resume.clone(),
            job: job.clone(),
            output_language: language.to_string(),
            expects: Expects::Text,
        };

        let max_attempts = self.settings.max_retries + 1;
        let mut attempt = 0;
        let raw = loop {
            attempt += 1;
            let result = match invoke(self.generator.as_ref(), &request, self.settings.timeout).await {
                Ok(Generated::Text(text)) if !text.trim().is_empty() => Ok(text),
                Ok(Generated::Text(_)) => Err(RefineError::MalformedOutput("empty text".into())),
                Ok(Generated::Document(_)) => Err(RefineError::MalformedOutput(
                    "expected plain text, got a resume document".into(),
                )),
                Err(e) => Err(e),
            };
            match result {
                Ok(text) => break text,
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!("{} attempt {}/{} failed: {}", kind.as_str(), attempt, max_attempts, e);
                }
                Err(e) => return Err(e),
            }
        };

        let (mut text, sanitized) = self.sanitizer.sanitize_text(raw.trim());
        if kind == CompanionKind::Title {
            text = clean_title(&text);
        }
        info!("Wrote {} ({} chars)", kind.as_str(), text.chars().count());

        Ok(CompanionText { kind, text, sanitized })
    }
}

fn render(
    kind: CompanionKind,
    resume: &ResumeDocument,
    job: &JobContext,
    language: &str,
) -> Result<String, RefineError> {
    let job_description = if job.job_description.trim().is_empty() {
        serde_json::to_string_pretty(job).context("Failed to serialize job context")?
    } else {
        job.job_description.clone()
    };

    let prompt = match kind {
        CompanionKind::Title => TITLE_PROMPT
            .replace("{output_language}", language)
            .replace("{job_description}", &job_description),
        CompanionKind::CoverLetter | CompanionKind::Outreach => {
            let template = if kind == CompanionKind::CoverLetter {
                COVER_LETTER_PROMPT
            } else {
                OUTREACH_MESSAGE_PROMPT
            };
            let resume_data =
                serde_json::to_string_pretty(resume).context("Failed to serialize resume document")?;
            template
                .replace("{output_language}", language)
                .replace("{job_description}", &job_description)
                .replace("{resume_data}", &resume_data)
        }
    };
    Ok(prompt)
}

/// First non-empty line, unquoted, capped at a word boundary.
fn clean_title(text: &str) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default();
    let line = line.trim_matches(|c| matches!(c, '"' | '\'' | '`' | '*')).trim();
    truncate_at_word(line, MAX_TITLE_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::generator::GenerationError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays queued results in order and records each prompt.
    struct Replay {
        results: Mutex<Vec<Result<Generated, GenerationError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Replay {
        fn new(mut results: Vec<Result<Generated, GenerationError>>) -> Arc<Self> {
            results.reverse();
            Arc::new(Self {
                results: Mutex::new(results),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Generator for Replay {
        async fn generate(&self, request: &GenerationRequest) -> Result<Generated, GenerationError> {
            self.prompts.lock().unwrap().push(request.instructions.clone());
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(GenerationError::Failure("script exhausted".into())))
        }
    }

    fn writer(generator: Arc<dyn Generator>) -> CompanionWriter {
        CompanionWriter::new(
            generator,
            PhraseSanitizer::default(),
            PipelineSettings {
                timeout: Duration::from_secs(10),
                max_retries: 2,
            },
        )
    }

    fn job() -> JobContext {
        JobContext {
            job_description: "Senior Platform Engineer at Acme Corp. Rust, Kubernetes.".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cover_letter_is_sanitized() {
        let generator = Replay::new(vec![Ok(Generated::Text(
            "I spearheaded the migration\u{2014}twice.".into(),
        ))]);
        let out = writer(generator.clone())
            .write(CompanionKind::CoverLetter, &ResumeDocument::default(), &job(), "ja")
            .await
            .unwrap();
        assert_eq!(out.text, "I led the migration, twice.");
        assert!(out.sanitized.contains(&"spearheaded".to_string()));

        let prompt = generator.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Write in Japanese."));
        assert!(prompt.contains("Acme Corp"));
    }

    #[tokio::test]
    async fn test_title_is_first_line_unquoted_and_capped() {
        let generator = Replay::new(vec![Ok(Generated::Text(
            "\"Senior Platform Engineer @ Acme Corp\"\nExtra commentary".into(),
        ))]);
        let out = writer(generator)
            .write(CompanionKind::Title, &ResumeDocument::default(), &job(), "en")
            .await
            .unwrap();
        assert_eq!(out.text, "Senior Platform Engineer @ Acme Corp");

        let long = "Principal Distributed Systems Reliability Engineer @ Some Very Long Company Name";
        let title = clean_title(long);
        assert!(title.chars().count() <= MAX_TITLE_CHARS);
        assert!(long.starts_with(title.trim_end_matches('.')));
    }

    #[tokio::test]
    async fn test_retryable_failures_are_retried() {
        let generator = Replay::new(vec![
            Err(GenerationError::Failure("overloaded".into())),
            Ok(Generated::Text("   ".into())),
            Ok(Generated::Text("Worth a quick chat?".into())),
        ]);
        let out = writer(generator.clone())
            .write(CompanionKind::Outreach, &ResumeDocument::default(), &job(), "en")
            .await
            .unwrap();
        assert_eq!(out.text, "Worth a quick chat?");
        assert_eq!(generator.prompts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_retry_budget() {
        let generator = Replay::new(vec![
            Err(GenerationError::Malformed("a".into())),
            Err(GenerationError::Malformed("b".into())),
            Err(GenerationError::Malformed("c".into())),
            Ok(Generated::Text("too late".into())),
        ]);
        let err = writer(generator.clone())
            .write(CompanionKind::Outreach, &ResumeDocument::default(), &job(), "en")
            .await
            .unwrap_err();
        assert!(matches!(err, RefineError::MalformedOutput(ref m) if m == "c"));
        assert_eq!(generator.prompts.lock().unwrap().len(), 3);
    }
}

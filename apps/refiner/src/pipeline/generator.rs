use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::RefineError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, PLAIN_TEXT_SYSTEM};
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::models::{JobContext, ResumeDocument};

// ────────────────────────────────────────────────────────────────────────────
// Request / response
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expects {
    Document,
    Text,
}

/// One call to the generation collaborator.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Stage or companion name, for logs and scripted fakes.
    pub stage: String,
    /// Fully rendered prompt.
    pub instructions: String,
    /// Working document the instructions refer to.
    pub document: ResumeDocument,
    pub job: JobContext,
    pub output_language: String,
    pub expects: Expects,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    Document(ResumeDocument),
    Text(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationError {
    #[error("generation timed out")]
    Timeout,

    #[error("generation failed: {0}")]
    Failure(String),

    #[error("malformed output: {0}")]
    Malformed(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Generator trait
// ────────────────────────────────────────────────────────────────────────────

/// The non-deterministic collaborator behind every stage.
///
/// The pipeline treats its output as untrusted: every document it returns is
/// diffed and repaired by the guard layer before use.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generated, GenerationError>;
}

/// Production generator backed by the Anthropic Messages API.
#[derive(Clone)]
pub struct LlmGenerator {
    llm: LlmClient,
}

impl LlmGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generated, GenerationError> {
        match request.expects {
            Expects::Document => {
                let text = self
                    .llm
                    .call_text(&request.instructions, JSON_ONLY_SYSTEM)
                    .await
                    .map_err(GenerationError::from)?;
                parse_document(&text).map(Generated::Document)
            }
            Expects::Text => self
                .llm
                .call_text(&request.instructions, PLAIN_TEXT_SYSTEM)
                .await
                .map(Generated::Text)
                .map_err(GenerationError::from),
        }
    }
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        if err.is_timeout() {
            return GenerationError::Timeout;
        }
        match err {
            LlmError::Parse(e) => GenerationError::Malformed(e.to_string()),
            LlmError::EmptyContent => GenerationError::Malformed("empty response".to_string()),
            other => GenerationError::Failure(other.to_string()),
        }
    }
}

/// Parses collaborator text (optionally fenced) into a resume document.
pub fn parse_document(text: &str) -> Result<ResumeDocument, GenerationError> {
    serde_json::from_str(strip_json_fences(text))
        .map_err(|e| GenerationError::Malformed(e.to_string()))
}

/// One bounded generation attempt. No retries here; callers own the budget.
pub async fn invoke(
    generator: &dyn Generator,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<Generated, RefineError> {
    debug!(stage = %request.stage, "invoking generator");
    let timed_out = || RefineError::GenerationTimeout {
        seconds: timeout.as_secs(),
    };
    match tokio::time::timeout(timeout, generator.generate(request)).await {
        Err(_) => Err(timed_out()),
        Ok(Err(GenerationError::Timeout)) => Err(timed_out()),
        Ok(Err(GenerationError::Failure(msg))) => Err(RefineError::GenerationFailure(msg)),
        Ok(Err(GenerationError::Malformed(msg))) => Err(RefineError::MalformedOutput(msg)),
        Ok(Ok(generated)) => Ok(generated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Generated, GenerationError>);

    #[async_trait]
    impl Generator for Fixed {
        async fn generate(&self, _: &GenerationRequest) -> Result<Generated, GenerationError> {
            self.0.clone()
        }
    }

    struct Hangs;

    #[async_trait]
    impl Generator for Hangs {
        async fn generate(&self, _: &GenerationRequest) -> Result<Generated, GenerationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Generated::Text("late".into()))
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            stage: "tailor".into(),
            instructions: "do it".into(),
            document: ResumeDocument::default(),
            job: JobContext::default(),
            output_language: "en".into(),
            expects: Expects::Text,
        }
    }

    #[test]
    fn test_parse_document_accepts_fenced_json() {
        let text = "```json\n{\"personalInfo\": {\"name\": \"Jane\"}}\n```";
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.personal_info.name, "Jane");
    }

    #[test]
    fn test_parse_document_rejects_prose() {
        let err = parse_document("Sure! Here is your resume.").unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn test_llm_errors_map_to_generation_errors() {
        let parse = serde_json::from_str::<ResumeDocument>("{").unwrap_err();
        assert!(matches!(
            GenerationError::from(LlmError::Parse(parse)),
            GenerationError::Malformed(_)
        ));
        assert!(matches!(
            GenerationError::from(LlmError::Api {
                status: 500,
                message: "overloaded".into()
            }),
            GenerationError::Failure(_)
        ));
        assert!(matches!(
            GenerationError::from(LlmError::EmptyContent),
            GenerationError::Malformed(_)
        ));
    }

    #[tokio::test]
    async fn test_invoke_maps_errors() {
        let timeout = Duration::from_secs(5);
        let err = invoke(&Fixed(Err(GenerationError::Failure("503".into()))), &request(), timeout)
            .await
            .unwrap_err();
        assert!(matches!(err, RefineError::GenerationFailure(ref m) if m == "503"));

        let err = invoke(&Fixed(Err(GenerationError::Malformed("eof".into()))), &request(), timeout)
            .await
            .unwrap_err();
        assert!(matches!(err, RefineError::MalformedOutput(_)));

        let ok = invoke(&Fixed(Ok(Generated::Text("hi".into()))), &request(), timeout)
            .await
            .unwrap();
        assert_eq!(ok, Generated::Text("hi".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_times_out() {
        let err = invoke(&Hangs, &request(), Duration::from_secs(30))
            .await
            .unwrap_err();
        assert!(matches!(err, RefineError::GenerationTimeout { seconds: 30 }));
    }
}

use serde::{Deserialize, Serialize};

use crate::guard::{MetricFlag, PhraseHit, Violation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Tailor,
    KeywordInjection,
    MetricVerification,
    ValidationPolish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Tailor => "tailor",
            Stage::KeywordInjection => "keyword_injection",
            Stage::MetricVerification => "metric_verification",
            Stage::ValidationPolish => "validation_polish",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    /// Candidate passed every check untouched.
    Accepted,
    /// Candidate was repaired by the guard layer and then used.
    Repaired,
    /// Candidate discarded; the next stage saw the pre-stage document.
    RejectedReverted,
}

/// What happened in one stage. Repairs, warnings and the final error (if the
/// stage was reverted) are all recorded here; nothing is silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
    /// Generation attempts made, including the successful one.
    pub attempts: u32,
    pub violations: Vec<Violation>,
    /// Out-of-band metrics left in place.
    pub warnings: Vec<MetricFlag>,
    /// Phrases the sanitizer replaced in the accepted candidate.
    pub sanitized: Vec<PhraseHit>,
    /// Why the stage was reverted, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageOutcome {
    pub fn reverted(stage: Stage, attempts: u32, violations: Vec<Violation>, error: String) -> Self {
        Self {
            stage,
            status: StageStatus::RejectedReverted,
            attempts,
            violations,
            warnings: Vec::new(),
            sanitized: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_reverted(&self) -> bool {
        self.status == StageStatus::RejectedReverted
    }
}

use thiserror::Error;

/// Library-level error type for a refinement run.
///
/// Only `UnknownMode` aborts a run. Every other variant is recorded on the
/// stage outcome that produced it and the pipeline carries on with the last
/// good document.
#[derive(Debug, Error)]
pub enum RefineError {
    #[error("Unknown refinement mode: '{0}'")]
    UnknownMode(String),

    #[error("Generation timed out after {seconds}s")]
    GenerationTimeout { seconds: u64 },

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Malformed generation output: {0}")]
    MalformedOutput(String),

    #[error("Irrecoverable invariant violation: {0}")]
    IrrecoverableInvariantViolation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RefineError {
    /// Stable machine-readable code, carried into the stage report.
    pub fn code(&self) -> &'static str {
        match self {
            RefineError::UnknownMode(_) => "UNKNOWN_MODE",
            RefineError::GenerationTimeout { .. } => "GENERATION_TIMEOUT",
            RefineError::GenerationFailure(_) => "GENERATION_FAILURE",
            RefineError::MalformedOutput(_) => "MALFORMED_OUTPUT",
            RefineError::IrrecoverableInvariantViolation(_) => "INVARIANT_VIOLATION",
            RefineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures that another generation attempt may clear.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RefineError::GenerationTimeout { .. }
                | RefineError::GenerationFailure(_)
                | RefineError::MalformedOutput(_)
                | RefineError::IrrecoverableInvariantViolation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_mode_is_not_retryable() {
        let err = RefineError::UnknownMode("aggressive".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.code(), "UNKNOWN_MODE");
        assert!(err.to_string().contains("aggressive"));
    }

    #[test]
    fn test_generation_errors_are_retryable() {
        assert!(RefineError::GenerationTimeout { seconds: 30 }.is_retryable());
        assert!(RefineError::GenerationFailure("503".to_string()).is_retryable());
        assert!(RefineError::MalformedOutput("eof".to_string()).is_retryable());
        assert!(
            RefineError::IrrecoverableInvariantViolation("entry 2 vanished".to_string())
                .is_retryable()
        );
    }

    #[test]
    fn test_internal_wraps_anyhow() {
        let err: RefineError = anyhow::anyhow!("serializer exploded").into();
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(!err.is_retryable());
    }
}

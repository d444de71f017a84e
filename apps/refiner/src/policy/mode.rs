use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::RefineError;

/// How far a run may move the resume toward the job description.
///
/// Selects both the tailoring instructions and the mutation envelope the
/// guard layer enforces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefinementMode {
    Nudge,
    #[default]
    Keywords,
    Full,
    Custom,
}

impl RefinementMode {
    pub const ALL: [RefinementMode; 4] = [
        RefinementMode::Nudge,
        RefinementMode::Keywords,
        RefinementMode::Full,
        RefinementMode::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RefinementMode::Nudge => "nudge",
            RefinementMode::Keywords => "keywords",
            RefinementMode::Full => "full",
            RefinementMode::Custom => "custom",
        }
    }

    /// Short label shown in mode pickers.
    pub fn label(&self) -> &'static str {
        match self {
            RefinementMode::Nudge => "Light nudge",
            RefinementMode::Keywords => "Keyword enhance",
            RefinementMode::Full => "Full tailor",
            RefinementMode::Custom => "Custom Prompt",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RefinementMode::Nudge => "Minimal edits to better align existing experience.",
            RefinementMode::Keywords => {
                "Blend in relevant keywords without changing role or scope."
            }
            RefinementMode::Full => "Comprehensive tailoring using the job description.",
            RefinementMode::Custom => {
                "Aggressive tailoring: adds job skills, fabricates metrics, fixes bullet count."
            }
        }
    }
}

impl FromStr for RefinementMode {
    type Err = RefineError;

    /// Case-insensitive. Anything outside the four modes is `UnknownMode`;
    /// there is no fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nudge" => Ok(RefinementMode::Nudge),
            "keywords" => Ok(RefinementMode::Keywords),
            "full" => Ok(RefinementMode::Full),
            "custom" => Ok(RefinementMode::Custom),
            _ => Err(RefineError::UnknownMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for RefinementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_modes() {
        for mode in RefinementMode::ALL {
            assert_eq!(mode.as_str().parse::<RefinementMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Custom".parse::<RefinementMode>().unwrap(), RefinementMode::Custom);
        assert_eq!(" FULL ".parse::<RefinementMode>().unwrap(), RefinementMode::Full);
    }

    #[test]
    fn test_unknown_mode_is_an_error_not_a_default() {
        let err = "aggressive".parse::<RefinementMode>().unwrap_err();
        assert!(matches!(err, RefineError::UnknownMode(ref m) if m == "aggressive"));
        assert!("".parse::<RefinementMode>().is_err());
    }

    #[test]
    fn test_default_mode_is_keywords() {
        assert_eq!(RefinementMode::default(), RefinementMode::Keywords);
    }

    #[test]
    fn test_labels_are_distinct() {
        let labels: std::collections::HashSet<_> =
            RefinementMode::ALL.iter().map(|m| m.label()).collect();
        assert_eq!(labels.len(), 4);
    }
}

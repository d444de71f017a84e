use std::time::Duration;

use anyhow::{Context, Result};

use crate::pipeline::refiner::{PipelineSettings, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use crate::policy::truthfulness::DEFAULT_ELABORATION_THRESHOLD;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    /// Minimum word overlap for a full-mode bullet past the original count.
    pub elaboration_threshold: f32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .context("Required environment variable 'ANTHROPIC_API_KEY' is not set")?;

        Ok(Config {
            anthropic_api_key: api_key,
            llm_timeout_secs: parse_or(&lookup, "LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            llm_max_retries: parse_or(&lookup, "LLM_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            elaboration_threshold: parse_or(
                &lookup,
                "FULL_MODE_ELABORATION_THRESHOLD",
                DEFAULT_ELABORATION_THRESHOLD,
            )?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            timeout: Duration::from_secs(self.llm_timeout_secs),
            max_retries: self.llm_max_retries,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.llm_timeout_secs, 120);
        assert_eq!(config.llm_max_retries, 2);
        assert!((config.elaboration_threshold - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.pipeline_settings(), PipelineSettings::default());
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        assert!(Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "  ")])).is_err());
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = Config::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("LLM_TIMEOUT_SECS", "30"),
            ("LLM_MAX_RETRIES", "0"),
            ("FULL_MODE_ELABORATION_THRESHOLD", "0.5"),
        ]))
        .unwrap();
        assert_eq!(config.pipeline_settings().timeout, Duration::from_secs(30));
        assert_eq!(config.llm_max_retries, 0);
        assert!((config.elaboration_threshold - 0.5).abs() < f32::EPSILON);

        let err = Config::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("LLM_MAX_RETRIES", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LLM_MAX_RETRIES"));
    }
}

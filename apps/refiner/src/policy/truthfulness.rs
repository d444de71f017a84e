//! Truthfulness policy: per-mode instructions plus the mutation envelope.
//!
//! The table is a plain value handed to `TruthfulnessPolicy::new`, so tests and
//! callers can substitute their own. `PolicyTable::default()` is the production
//! table; it is fixed per run and never consulted at call time for overrides.

use std::collections::HashMap;

use serde::Serialize;

use crate::errors::RefineError;
use crate::policy::envelope::{BulletBound, MutationEnvelope};
use crate::policy::mode::RefinementMode;
use crate::policy::prompts::{
    tailor_template, CUSTOM_PROMPT_TEMPLATE, CUSTOM_RULE, FULL_PROMPT_TEMPLATE, FULL_RULE,
    KEYWORDS_PROMPT_TEMPLATE, KEYWORDS_RULE, NUDGE_PROMPT_TEMPLATE, NUDGE_RULE,
    TRUTHFULNESS_RULES_TEMPLATE,
};

/// Bullets required per work entry in custom mode.
pub const CUSTOM_BULLETS_PER_ENTRY: usize = 4;
/// Per-bullet character cap in custom mode.
pub const CUSTOM_MAX_BULLET_CHARS: usize = 600;
/// Default word-overlap threshold separating elaboration from new content in full mode.
pub const DEFAULT_ELABORATION_THRESHOLD: f32 = 0.2;

/// One row of the policy table.
#[derive(Debug, Clone)]
pub struct ModePolicy {
    /// The mode-specific seventh truthfulness rule.
    pub rule: String,
    /// Tailoring prompt with `{truthfulness_rules}` still unfilled.
    pub prompt_template: String,
    pub envelope: MutationEnvelope,
}

#[derive(Debug, Clone)]
pub struct PolicyTable {
    rows: HashMap<RefinementMode, ModePolicy>,
}

impl PolicyTable {
    pub fn new(rows: HashMap<RefinementMode, ModePolicy>) -> Self {
        Self { rows }
    }

    /// Production table with a custom full-mode elaboration threshold.
    pub fn with_elaboration_threshold(threshold: f32) -> Self {
        let mut table = Self::default();
        if let Some(full) = table.rows.get_mut(&RefinementMode::Full) {
            full.envelope.elaboration_threshold = threshold.clamp(0.0, 1.0);
        }
        table
    }

    pub fn get(&self, mode: RefinementMode) -> Option<&ModePolicy> {
        self.rows.get(&mode)
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        let nudge = ModePolicy {
            rule: NUDGE_RULE.to_string(),
            prompt_template: tailor_template(NUDGE_PROMPT_TEMPLATE),
            envelope: MutationEnvelope::locked(),
        };

        let keywords = ModePolicy {
            rule: KEYWORDS_RULE.to_string(),
            prompt_template: tailor_template(KEYWORDS_PROMPT_TEMPLATE),
            envelope: MutationEnvelope::locked(),
        };

        let full = ModePolicy {
            rule: FULL_RULE.to_string(),
            prompt_template: tailor_template(FULL_PROMPT_TEMPLATE),
            envelope: MutationEnvelope {
                allow_new_bullets: true,
                allow_title_rewrite: true,
                allow_metric_revision: true,
                bullets_per_entry: BulletBound::Unbounded,
                fixed_section_set: false,
                elaboration_threshold: DEFAULT_ELABORATION_THRESHOLD,
                ..MutationEnvelope::locked()
            },
        };

        let custom = ModePolicy {
            rule: CUSTOM_RULE.to_string(),
            prompt_template: tailor_template(CUSTOM_PROMPT_TEMPLATE),
            envelope: MutationEnvelope {
                allow_new_bullets: true,
                allow_new_skills: true,
                allow_fabricated_metrics: true,
                allow_title_rewrite: true,
                allow_metric_revision: true,
                bullets_per_entry: BulletBound::Exactly(CUSTOM_BULLETS_PER_ENTRY),
                fixed_section_set: false,
                elaboration_threshold: 0.0,
                max_bullet_chars: Some(CUSTOM_MAX_BULLET_CHARS),
            },
        };

        Self::new(HashMap::from([
            (RefinementMode::Nudge, nudge),
            (RefinementMode::Keywords, keywords),
            (RefinementMode::Full, full),
            (RefinementMode::Custom, custom),
        ]))
    }
}

/// What a stage is told and what it is allowed to do.
#[derive(Debug, Clone, Serialize)]
pub struct Policy {
    pub mode: RefinementMode,
    /// Rendered truthfulness rules block, prepended to every stage prompt.
    pub rules: String,
    /// Tailoring instructions: the mode prompt with the rules filled in and the
    /// job/resume placeholders left for the pipeline.
    pub instructions: String,
    pub envelope: MutationEnvelope,
}

#[derive(Debug, Clone, Default)]
pub struct TruthfulnessPolicy {
    table: PolicyTable,
}

impl TruthfulnessPolicy {
    pub fn new(table: PolicyTable) -> Self {
        Self { table }
    }

    /// Resolves a mode name. Unknown names (or modes missing from the table)
    /// fail with `UnknownMode`.
    pub fn policy_for(&self, mode_name: &str) -> Result<Policy, RefineError> {
        let mode: RefinementMode = mode_name.parse()?;
        self.policy_for_mode(mode)
    }

    pub fn policy_for_mode(&self, mode: RefinementMode) -> Result<Policy, RefineError> {
        let row = self
            .table
            .get(mode)
            .ok_or_else(|| RefineError::UnknownMode(mode.to_string()))?;

        let rules = TRUTHFULNESS_RULES_TEMPLATE.replace("{mode_rule}", &row.rule);
        let instructions = row.prompt_template.replace("{truthfulness_rules}", &rules);

        Ok(Policy {
            mode,
            rules,
            instructions,
            envelope: row.envelope.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(mode: &str) -> Policy {
        TruthfulnessPolicy::default().policy_for(mode).unwrap()
    }

    #[test]
    fn test_nudge_and_keywords_are_locked() {
        for mode in ["nudge", "keywords"] {
            let env = policy(mode).envelope;
            assert!(!env.allow_new_bullets, "{mode}");
            assert!(!env.allow_new_skills, "{mode}");
            assert!(!env.allow_fabricated_metrics, "{mode}");
            assert!(!env.allow_title_rewrite, "{mode}");
            assert_eq!(env.bullets_per_entry, BulletBound::Unchanged, "{mode}");
            assert!(env.fixed_section_set, "{mode}");
        }
    }

    #[test]
    fn test_full_allows_elaboration_only() {
        let env = policy("full").envelope;
        assert!(env.allow_new_bullets);
        assert!(!env.allow_new_skills);
        assert!(!env.allow_fabricated_metrics);
        assert!(env.allow_title_rewrite);
        assert_eq!(env.bullets_per_entry, BulletBound::Unbounded);
        assert!((env.elaboration_threshold - DEFAULT_ELABORATION_THRESHOLD).abs() < f32::EPSILON);
    }

    #[test]
    fn test_custom_allows_everything_with_four_bullets() {
        let env = policy("custom").envelope;
        assert!(env.allow_new_bullets);
        assert!(env.allow_new_skills);
        assert!(env.allow_fabricated_metrics);
        assert!(env.allow_title_rewrite);
        assert_eq!(env.bullets_per_entry, BulletBound::Exactly(4));
        assert_eq!(env.max_bullet_chars, Some(600));
    }

    #[test]
    fn test_unknown_mode_fails() {
        let err = TruthfulnessPolicy::default().policy_for("yolo").unwrap_err();
        assert!(matches!(err, RefineError::UnknownMode(_)));
    }

    #[test]
    fn test_mode_missing_from_table_fails() {
        let mut rows = HashMap::new();
        rows.insert(
            RefinementMode::Nudge,
            PolicyTable::default().get(RefinementMode::Nudge).unwrap().clone(),
        );
        let policy = TruthfulnessPolicy::new(PolicyTable::new(rows));
        assert!(policy.policy_for("nudge").is_ok());
        assert!(matches!(
            policy.policy_for("full"),
            Err(RefineError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_instructions_embed_mode_rule_and_keep_context_placeholders() {
        let p = policy("keywords");
        assert!(p.rules.contains(KEYWORDS_RULE));
        assert!(p.instructions.contains("CRITICAL TRUTHFULNESS RULES"));
        assert!(!p.instructions.contains("{truthfulness_rules}"));
        assert!(p.instructions.contains("{job_description}"));
        assert!(p.instructions.contains("{original_resume}"));
    }

    #[test]
    fn test_elaboration_threshold_is_tunable_and_clamped() {
        let table = PolicyTable::with_elaboration_threshold(0.5);
        let p = TruthfulnessPolicy::new(table).policy_for("full").unwrap();
        assert!((p.envelope.elaboration_threshold - 0.5).abs() < f32::EPSILON);

        let table = PolicyTable::with_elaboration_threshold(7.0);
        let p = TruthfulnessPolicy::new(table).policy_for("full").unwrap();
        assert!((p.envelope.elaboration_threshold - 1.0).abs() < f32::EPSILON);
    }
}

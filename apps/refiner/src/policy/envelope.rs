use serde::{Deserialize, Serialize};

/// Bullet-count rule for work entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "count")]
pub enum BulletBound {
    /// Same count as the previous stage.
    Unchanged,
    /// Any count, but never fewer than the previous stage.
    Unbounded,
    /// Exactly this many.
    Exactly(usize),
}

/// The set of mutations a generation stage may make.
///
/// The guard layer diffs every candidate against its predecessor under this
/// envelope; anything outside it is repaired or rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEnvelope {
    pub allow_new_bullets: bool,
    pub allow_new_skills: bool,
    pub allow_fabricated_metrics: bool,
    pub allow_title_rewrite: bool,
    /// Whether a metric_verification pass may rewrite out-of-band numbers.
    pub allow_metric_revision: bool,
    pub bullets_per_entry: BulletBound,
    /// Custom sections may be neither added nor dropped.
    pub fixed_section_set: bool,
    /// Minimum word overlap (0.0 – 1.0) between a new bullet and the entry's
    /// prior bullets for it to count as elaboration rather than new content.
    pub elaboration_threshold: f32,
    /// Per-bullet character cap on work entries, if any.
    pub max_bullet_chars: Option<usize>,
}

impl MutationEnvelope {
    /// Rephrase-only envelope: nothing may be added.
    pub fn locked() -> Self {
        Self {
            allow_new_bullets: false,
            allow_new_skills: false,
            allow_fabricated_metrics: false,
            allow_title_rewrite: false,
            allow_metric_revision: false,
            bullets_per_entry: BulletBound::Unchanged,
            fixed_section_set: true,
            elaboration_threshold: 1.0,
            max_bullet_chars: None,
        }
    }

}

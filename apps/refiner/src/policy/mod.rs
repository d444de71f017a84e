// Truthfulness policy: which mode may change what, and the instructions each
// generation stage is given.

pub mod envelope;
pub mod mode;
pub mod prompts;
pub mod truthfulness;

pub use envelope::{BulletBound, MutationEnvelope};
pub use mode::RefinementMode;
pub use truthfulness::{Policy, PolicyTable, TruthfulnessPolicy};

//! Deterministic guard layer. Every stage candidate passes through here before
//! it may become the next stage's input.

pub mod invariants;
pub mod metrics;
pub mod phrases;
pub mod sections;

pub use invariants::{CheckKind, GuardResult, GuardStatus, InvariantChecker, Violation};
pub use metrics::{MetricBands, MetricFlag, MetricKind, MetricRealismChecker, MetricReport};
pub use phrases::{PhraseHit, PhraseSanitizer, PhraseTable};
pub use sections::{canonical_name, SectionBlacklist, SectionFilter};

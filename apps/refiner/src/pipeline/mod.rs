//! Staged refinement: tailor, optional keyword injection, optional metric
//! verification and a final polish. Each stage's candidate goes through the
//! guard layer; a rejected stage reverts and the run continues.

pub mod companion;
pub mod generator;
pub mod prompts;
pub mod refiner;
pub mod stages;

pub use companion::{CompanionKind, CompanionText, CompanionWriter};
pub use generator::{GenerationError, GenerationRequest, Generated, Generator, LlmGenerator};
pub use refiner::{PipelineSettings, RefinementPipeline, RefinementReport, RefinementRequest};
pub use stages::{Stage, StageOutcome, StageStatus};

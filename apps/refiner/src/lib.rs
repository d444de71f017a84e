//! Resume refinement with a deterministic guard layer.
//!
//! A [`pipeline::RefinementPipeline`] sends a resume through a fixed sequence of
//! generation stages. Whatever the generator returns, the guard layer restores
//! immutable facts, enforces the mode's mutation envelope and sanitizes
//! phrasing before the candidate is used.

pub mod config;
pub mod errors;
pub mod guard;
pub mod llm_client;
pub mod models;
pub mod pipeline;
pub mod policy;

//! scalpel-common — Shared types and errors used across all Scalpel crates.

pub mod error;
pub mod passage;

// Re-export commonly used types
pub use error::{ApiError, PipelineError, Result, Stage};
pub use passage::{AnswerResult, PassageRecord, RetrievalHit};

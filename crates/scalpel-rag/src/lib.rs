//! scalpel-rag — retrieval-and-grounding pipeline.
//!
//! question → normalise → embed → retrieve (per corpus) → assemble context
//! + aggregate citations → synthesise → (answer, citations)
//!
//! Every stage returns a `Result`; the first failure ends the request and no
//! partial answer is produced.

pub mod citations;
pub mod config;
pub mod context;
pub mod embedding;
pub mod normalizer;
pub mod pipeline;
pub mod retrieval;
pub mod synthesizer;

pub use citations::{aggregate, Citation};
pub use config::{
    CitationFormat, CitationPolicy, GenerationOptions, NormalizationPolicy, PipelineConfig,
    PromptConfig,
};
pub use context::assemble;
pub use embedding::EmbeddingClient;
pub use normalizer::QueryNormalizer;
pub use pipeline::Pipeline;
pub use retrieval::retrieve;
pub use synthesizer::AnswerSynthesizer;

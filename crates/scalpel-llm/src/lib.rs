//! scalpel-llm — LLM backend abstraction layer.
//! Completion and embedding backends, config-driven construction, and the
//! per-call audit record.

pub mod audit;
pub mod backend;
pub mod config;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message};
pub use config::{build_backend, BackendConfig, BackendKind};

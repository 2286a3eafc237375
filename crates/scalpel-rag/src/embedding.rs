//! Embedding Client — one text in, one vector of the store's dimension out.

use std::sync::Arc;

use scalpel_llm::{LlmBackend, LlmError};

pub struct EmbeddingClient {
    backend: Arc<dyn LlmBackend>,
    dim: usize,
}

impl EmbeddingClient {
    /// `dim` is the dimension every corpus index was built with.
    pub fn new(backend: Arc<dyn LlmBackend>, dim: usize) -> Self {
        Self { backend, dim }
    }

    pub fn dim(&self) -> usize { self.dim }
    pub fn model_id(&self) -> &str { self.backend.embedding_model_id() }

    /// Embed `text`. Empty text is sent as-is. A response of the wrong shape
    /// is reported as `LlmError::Malformed`; no retry is attempted.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let mut vectors = self.backend.embed(vec![text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(LlmError::Malformed(format!(
                "expected 1 embedding, got {}", vectors.len()
            )));
        }
        let vector = vectors.remove(0);
        if vector.len() != self.dim {
            return Err(LlmError::Malformed(format!(
                "embedding has dimension {}, index expects {}", vector.len(), self.dim
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(LlmError::Malformed("embedding contains non-finite values".to_string()));
        }
        Ok(vector)
    }
}

//! Backend construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::backend::{
    LlmBackend, LlmError, OllamaBackend, OpenAiBackend, OpenAiCompatibleBackend,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
    #[serde(rename = "ollama")]
    Ollama,
}

#[derive(Debug)]
pub struct BackendConfig {
    pub kind:            BackendKind,
    pub model:           String,
    pub embedding_model: Option<String>,
    pub base_url:        Option<String>,
    pub api_key:         Option<SecretString>,
    pub timeout:         Option<Duration>,
}

const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Build a backend. OpenAI requires an API key; the others accept none.
pub fn build_backend(cfg: BackendConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let backend: Arc<dyn LlmBackend> = match cfg.kind {
        BackendKind::OpenAi => {
            let key = cfg.api_key.ok_or_else(|| {
                LlmError::Unavailable("OpenAI backend configured without an API key".to_string())
            })?;
            let mut b = OpenAiBackend::new(key, cfg.model);
            if let Some(m) = cfg.embedding_model {
                b = b.with_embedding_model(m);
            }
            if let Some(url) = cfg.base_url {
                b = b.with_base_url(url);
            }
            if let Some(t) = cfg.timeout {
                b = b.with_timeout(t)?;
            }
            Arc::new(b)
        }
        BackendKind::OpenAiCompatible => {
            let url = cfg.base_url.ok_or_else(|| {
                LlmError::Unavailable("openai_compatible backend requires base_url".to_string())
            })?;
            let mut b = OpenAiCompatibleBackend::new(url, cfg.model, cfg.api_key);
            if let Some(m) = cfg.embedding_model {
                b = b.with_embedding_model(m);
            }
            if let Some(t) = cfg.timeout {
                b = b.with_timeout(t)?;
            }
            Arc::new(b)
        }
        BackendKind::Ollama => {
            let url = cfg.base_url.unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
            let mut b = OllamaBackend::new(url, cfg.model);
            if let Some(m) = cfg.embedding_model {
                b = b.with_embedding_model(m);
            }
            if let Some(t) = cfg.timeout {
                b = b.with_timeout(t)?;
            }
            Arc::new(b)
        }
    };

    tracing::debug!(
        model = backend.model_id(),
        embedding_model = backend.embedding_model_id(),
        is_local = backend.is_local(),
        "LLM backend built"
    );
    Ok(backend)
}

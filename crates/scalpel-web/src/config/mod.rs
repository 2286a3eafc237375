//! Configuration loading for scalpel.
//! Reads scalpel.toml from the current directory or the path in SCALPEL_CONFIG.

use std::path::{Path, PathBuf};
use std::time::Duration;

use scalpel_corpus::CorpusSpec;
use scalpel_llm::{BackendConfig, BackendKind};
use scalpel_rag::{
    CitationFormat, CitationPolicy, GenerationOptions, NormalizationPolicy, PipelineConfig,
    PromptConfig,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub citations: CitationsConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub corpora: Vec<CorpusSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16    { 8080 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// Completion backend, used for normalisation and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: BackendKind,
    #[serde(default = "default_llm_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// Falls back to SCALPEL_API_KEY, then OPENAI_API_KEY.
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

fn default_provider()  -> BackendKind { BackendKind::OpenAi }
fn default_llm_model() -> String      { "gpt-4-0125-preview".to_string() }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_llm_model(),
            base_url: None,
            api_key: None,
            timeout_secs: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Embedding backend. Unset connection keys are inherited from `[llm]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: Option<BackendKind>,
    #[serde(default = "default_embed_model")]
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

fn default_embed_model() -> String { scalpel_llm::backend::DEFAULT_EMBEDDING_MODEL.to_string() }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { provider: None, model: default_embed_model(), base_url: None, api_key: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize { scalpel_rag::config::DEFAULT_TOP_K }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: default_top_k() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationPolicyKind {
    #[default]
    Ranked,
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationsConfig {
    #[serde(default)]
    pub policy: CitationPolicyKind,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub format: CitationFormat,
}

fn default_top_n() -> usize { scalpel_rag::config::DEFAULT_CITATION_TOP_N }

impl Default for CitationsConfig {
    fn default() -> Self {
        Self { policy: CitationPolicyKind::default(), top_n: default_top_n(), format: CitationFormat::default() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationConfig {
    #[serde(default)]
    pub on_failure: NormalizationPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    #[serde(default = "default_specialty")]
    pub specialty: String,
    #[serde(default = "default_refusal")]
    pub refusal: String,
    pub language: Option<String>,
}

fn default_specialty() -> String { scalpel_rag::config::DEFAULT_SPECIALTY.to_string() }
fn default_refusal()   -> String { scalpel_rag::config::DEFAULT_REFUSAL.to_string() }

impl Default for AnswerConfig {
    fn default() -> Self {
        Self { specialty: default_specialty(), refusal: default_refusal(), language: None }
    }
}


const API_KEY_VARS: [&str; 2] = ["SCALPEL_API_KEY", "OPENAI_API_KEY"];

impl Config {
    /// Load configuration from scalpel.toml.
    /// Checks SCALPEL_CONFIG env var first, then current directory.
    /// Relative corpus paths are resolved against the config file's directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("SCALPEL_CONFIG")
            .unwrap_or_else(|_| "scalpel.toml".to_string());
        let path = Path::new(&path);

        if !path.exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy scalpel.example.toml to scalpel.toml and edit it.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.corpora.is_empty() {
            anyhow::bail!("no [[corpora]] configured");
        }
        if config.retrieval.top_k == 0 {
            anyhow::bail!("retrieval.top_k must be at least 1");
        }
        Ok(config)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        for spec in &mut self.corpora {
            spec.records = resolve(base, &spec.records);
            spec.index = resolve(base, &spec.index);
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Backend settings for completions, with the API key looked up through `env`
    /// when the file has none.
    pub fn completion_backend(&self, env: impl Fn(&str) -> Option<String>) -> BackendConfig {
        BackendConfig {
            kind: self.llm.provider,
            model: self.llm.model.clone(),
            embedding_model: Some(self.embedding.model.clone()),
            base_url: self.llm.base_url.clone(),
            api_key: api_key(self.llm.api_key.as_deref(), &env),
            timeout: self.llm.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Backend settings for embeddings. Connection keys left unset under
    /// `[embedding]` come from `[llm]`.
    pub fn embedding_backend(&self, env: impl Fn(&str) -> Option<String>) -> BackendConfig {
        let inherit = self.embedding.provider.is_none();
        let base_url = match (&self.embedding.base_url, inherit) {
            (Some(url), _) => Some(url.clone()),
            (None, true) => self.llm.base_url.clone(),
            (None, false) => None,
        };
        let key = self.embedding.api_key.as_deref().or(self.llm.api_key.as_deref());
        BackendConfig {
            kind: self.embedding.provider.unwrap_or(self.llm.provider),
            model: self.llm.model.clone(),
            embedding_model: Some(self.embedding.model.clone()),
            base_url,
            api_key: api_key(key, &env),
            timeout: self.llm.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let citation_policy = match self.citations.policy {
            CitationPolicyKind::Ranked => CitationPolicy::Ranked { top_n: self.citations.top_n },
            CitationPolicyKind::All => CitationPolicy::All,
        };
        PipelineConfig {
            top_k: self.retrieval.top_k,
            citation_policy,
            citation_format: self.citations.format,
            normalization: self.normalization.on_failure,
            prompt: PromptConfig {
                specialty: self.answer.specialty.clone(),
                refusal: self.answer.refusal.clone(),
                language: self.answer.language.clone(),
            },
            generation: GenerationOptions {
                model: Some(self.llm.model.clone()),
                temperature: self.llm.temperature,
                max_tokens: self.llm.max_tokens,
            },
        }
    }
}

/// Process environment lookup for [`Config::completion_backend`] and friends.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn api_key(from_file: Option<&str>, env: &impl Fn(&str) -> Option<String>) -> Option<SecretString> {
    from_file
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| API_KEY_VARS.iter().find_map(|v| env(v).filter(|k| !k.is_empty())))
        .map(SecretString::from)
}

fn resolve(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() { p.to_path_buf() } else { base.join(p) }
}

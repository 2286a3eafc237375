//! LLM backend trait and concrete implementations.
//!
//! One trait covers both capabilities the pipeline consumes: chat completion
//! (query normalisation, answer synthesis) and text embedding.
//!
//! Backends:
//!   OpenAiBackend           — OpenAI API (chat completions + embeddings)
//!   OpenAiCompatibleBackend — any OpenAI-compatible endpoint (vLLM, LMStudio,
//!                             TogetherAI, Azure proxies, …)
//!   OllamaBackend           — local Ollama (/v1/chat/completions, /api/embeddings)

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,   // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages, ..Default::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    /// One vector per input text, in input order.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError>;
    fn model_id(&self) -> &str;
    fn embedding_model_id(&self) -> &str;
    fn is_local(&self) -> bool;
}

// ── OpenAI wire helpers ───────────────────────────────────────────────────────

fn chat_body(req: &LlmRequest, fallback_model: &str) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model":    req.model.as_deref().unwrap_or(fallback_model),
        "messages": req.messages,
    });
    if let Some(max_tokens) = req.max_tokens {
        body["max_tokens"] = max_tokens.into();
    }
    if let Some(temperature) = req.temperature {
        body["temperature"] = temperature.into();
    }
    body
}

pub(crate) fn parse_openai_response(
    json: &serde_json::Value,
    fallback_model: &str,
) -> Result<LlmResponse, LlmError> {
    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| LlmError::Malformed("missing choices[0].message.content".to_string()))?;
    Ok(LlmResponse {
        content: content.to_string(),
        model: json["model"].as_str().unwrap_or(fallback_model).to_string(),
        prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    })
}

pub(crate) fn parse_openai_embeddings(
    json: &serde_json::Value,
    expected: usize,
) -> Result<Vec<Vec<f32>>, LlmError> {
    let data = json["data"]
        .as_array()
        .ok_or_else(|| LlmError::Malformed("missing data array".to_string()))?;
    if data.len() != expected {
        return Err(LlmError::Malformed(format!(
            "expected {} embeddings, got {}", expected, data.len()
        )));
    }
    // The API may return items out of order; `index` is authoritative when present.
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (i, item) in data.iter().enumerate() {
        let idx = item["index"].as_u64().map(|v| v as usize).unwrap_or(i);
        let slot = slots.get_mut(idx)
            .ok_or_else(|| LlmError::Malformed(format!("embedding index {} out of range", idx)))?;
        *slot = Some(serde_json::from_value(item["embedding"].clone())?);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| LlmError::Malformed(format!("embedding {} missing", i))))
        .collect()
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    let body: serde_json::Value = serde_json::from_str(&text).map_err(|_| {
        if status >= 400 {
            LlmError::ApiError { status, message: truncate(&text, 200) }
        } else {
            LlmError::Malformed(format!("non-JSON body: {}", truncate(&text, 200)))
        }
    })?;
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["error"].as_str())
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError { status, message: msg });
    }
    Ok(body)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client, LlmError> {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    Ok(builder.build()?)
}

// ── 1. OpenAI ─────────────────────────────────────────────────────────────────

pub struct OpenAiBackend {
    pub model: String,
    pub embedding_model: String,
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Point at a proxy or regional endpoint that speaks the OpenAI API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = http_client(Some(timeout))?;
        Ok(self)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let resp = self.client
            .post(self.url("/v1/chat/completions"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&chat_body(&req, &self.model))
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        parse_openai_response(&json, &self.model)
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let expected = texts.len();
        let body = serde_json::json!({
            "model": &self.embedding_model,
            "input": texts,
        });
        let resp = self.client
            .post(self.url("/v1/embeddings"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        parse_openai_embeddings(&json, expected)
    }

    fn model_id(&self) -> &str { &self.model }
    fn embedding_model_id(&self) -> &str { &self.embedding_model }
    fn is_local(&self) -> bool { false }
}

// ── 2. OpenAI-Compatible ──────────────────────────────────────────────────────

pub struct OpenAiCompatibleBackend {
    pub base_url: String,
    pub model: String,
    pub embedding_model: Option<String>,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            embedding_model: None,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = http_client(Some(timeout))?;
        Ok(self)
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(k) => req.bearer_auth(k.expose_secret()),
            None    => req,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let resp = self.auth(self.client.post(&url))
            .json(&chat_body(&req, &self.model))
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        parse_openai_response(&json, &self.model)
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let expected = texts.len();
        let url = format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({"model": self.embedding_model_id(), "input": texts});
        let resp = self.auth(self.client.post(&url)).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        parse_openai_embeddings(&json, expected)
    }

    fn model_id(&self) -> &str { &self.model }
    fn embedding_model_id(&self) -> &str {
        self.embedding_model.as_deref().unwrap_or(&self.model)
    }
    fn is_local(&self) -> bool { false }
}

// ── 3. Ollama (local) ─────────────────────────────────────────────────────────

pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    pub embedding_model: Option<String>,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            embedding_model: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = http_client(Some(timeout))?;
        Ok(self)
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let resp = self.client.post(&url).json(&chat_body(&req, &self.model)).send().await?;
        let json = check_response_status(resp).await?;
        parse_openai_response(&json, &self.model)
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let url = format!("{}/api/embeddings", self.base_url.trim_end_matches('/'));
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let body = serde_json::json!({"model": self.embedding_model_id(), "prompt": text});
            let resp = self.client.post(&url).json(&body).send().await?;
            let json = check_response_status(resp).await?;
            if !json["embedding"].is_array() {
                return Err(LlmError::Malformed("missing embedding array".to_string()));
            }
            let vec: Vec<f32> = serde_json::from_value(json["embedding"].clone())?;
            out.push(vec);
        }
        Ok(out)
    }

    fn model_id(&self) -> &str { &self.model }
    fn embedding_model_id(&self) -> &str {
        self.embedding_model.as_deref().unwrap_or(&self.model)
    }
    fn is_local(&self) -> bool { true }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

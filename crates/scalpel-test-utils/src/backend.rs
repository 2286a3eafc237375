use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use scalpel_llm::{LlmBackend, LlmError, LlmRequest, LlmResponse};

/// One call observed by a [`ScriptedBackend`].
#[derive(Debug, Clone)]
pub enum ScriptedCall {
    Complete(LlmRequest),
    Embed(Vec<String>),
}

/// An `LlmBackend` that replays scripted replies in order and records every call.
/// An exhausted script answers with `LlmError::Unavailable`.
#[derive(Default)]
pub struct ScriptedBackend {
    completions: Mutex<VecDeque<Result<String, String>>>,
    embeddings:  Mutex<VecDeque<Result<Vec<f32>, String>>>,
    calls:       Mutex<Vec<ScriptedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete_with(self, content: impl Into<String>) -> Self {
        self.completions.lock().unwrap().push_back(Ok(content.into()));
        self
    }

    pub fn fail_complete(self, message: impl Into<String>) -> Self {
        self.completions.lock().unwrap().push_back(Err(message.into()));
        self
    }

    pub fn embed_with(self, vector: Vec<f32>) -> Self {
        self.embeddings.lock().unwrap().push_back(Ok(vector));
        self
    }

    pub fn fail_embed(self, message: impl Into<String>) -> Self {
        self.embeddings.lock().unwrap().push_back(Err(message.into()));
        self
    }

    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn completion_requests(&self) -> Vec<LlmRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ScriptedCall::Complete(req) => Some(req),
                ScriptedCall::Embed(_) => None,
            })
            .collect()
    }

    pub fn embedded_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ScriptedCall::Embed(texts) => Some(texts),
                ScriptedCall::Complete(_) => None,
            })
            .flatten()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

fn scripted_failure(message: String) -> LlmError {
    LlmError::ApiError { status: 500, message }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.calls.lock().unwrap().push(ScriptedCall::Complete(req));
        let next = self.completions.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(LlmResponse {
                content,
                model: "scripted".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            }),
            Some(Err(msg)) => Err(scripted_failure(msg)),
            None => Err(LlmError::Unavailable("completion script exhausted".to_string())),
        }
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let n = texts.len();
        self.calls.lock().unwrap().push(ScriptedCall::Embed(texts));
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            let next = self.embeddings.lock().unwrap().pop_front();
            match next {
                Some(Ok(v)) => out.push(v),
                Some(Err(msg)) => return Err(scripted_failure(msg)),
                None => return Err(LlmError::Unavailable("embedding script exhausted".to_string())),
            }
        }
        Ok(out)
    }

    fn model_id(&self) -> &str { "scripted" }
    fn embedding_model_id(&self) -> &str { "scripted-embed" }
    fn is_local(&self) -> bool { true }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_llm::Message;

    #[tokio::test]
    async fn test_replays_in_order_then_exhausts() {
        let b = ScriptedBackend::new().complete_with("one").fail_complete("down");
        let req = LlmRequest::new(vec![Message::user("q")]);
        assert_eq!(b.complete(req.clone()).await.unwrap().content, "one");
        assert!(matches!(b.complete(req.clone()).await, Err(LlmError::ApiError { status: 500, .. })));
        assert!(matches!(b.complete(req).await, Err(LlmError::Unavailable(_))));
        assert_eq!(b.completion_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_records_embedded_texts() {
        let b = ScriptedBackend::new().embed_with(vec![1.0, 0.0]);
        let out = b.embed(vec!["hernia".to_string()]).await.unwrap();
        assert_eq!(out, vec![vec![1.0, 0.0]]);
        assert_eq!(b.embedded_texts(), vec!["hernia".to_string()]);
    }
}

//! Query Normalizer — rewrites a user question as a terse clinical English
//! query. The output only drives retrieval; it is never shown to the user.

use std::sync::Arc;

use scalpel_llm::{LlmBackend, LlmError, LlmRequest, Message};

use crate::config::GenerationOptions;

const INSTRUCTION: &str = "Translate or rephrase the user's question into concise, formal \
medical English using precise clinical terminology. Reply with the rewritten question only, \
without explanations.";

pub struct QueryNormalizer {
    backend: Arc<dyn LlmBackend>,
    options: GenerationOptions,
}

impl QueryNormalizer {
    pub fn new(backend: Arc<dyn LlmBackend>, options: GenerationOptions) -> Self {
        Self { backend, options }
    }

    pub fn model_id(&self) -> &str {
        self.options.model.as_deref().unwrap_or_else(|| self.backend.model_id())
    }

    pub fn request(&self, question: &str) -> LlmRequest {
        LlmRequest {
            messages: vec![Message::system(INSTRUCTION), Message::user(question)],
            model: self.options.model.clone(),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        }
    }

    pub async fn normalize(&self, question: &str) -> Result<String, LlmError> {
        let resp = self.backend.complete(self.request(question)).await?;
        let text = resp.content.trim();
        if text.is_empty() {
            return Err(LlmError::Malformed("normalizer returned an empty query".to_string()));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalpel_test_utils::ScriptedBackend;

    #[tokio::test]
    async fn test_sends_instruction_then_question() {
        let backend = Arc::new(ScriptedBackend::new().complete_with("  Inguinal hernia repair techniques\n"));
        let n = QueryNormalizer::new(backend.clone(), GenerationOptions::default());
        let out = n.normalize("como operar hérnia inguinal?").await.unwrap();
        assert_eq!(out, "Inguinal hernia repair techniques");

        let reqs = backend.completion_requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].messages.len(), 2);
        assert_eq!(reqs[0].messages[0].role, "system");
        assert!(reqs[0].messages[0].content.contains("medical English"));
        assert_eq!(reqs[0].messages[1].role, "user");
        assert_eq!(reqs[0].messages[1].content, "como operar hérnia inguinal?");
    }

    #[tokio::test]
    async fn test_blank_reply_is_malformed() {
        let backend = Arc::new(ScriptedBackend::new().complete_with("   "));
        let n = QueryNormalizer::new(backend, GenerationOptions::default());
        assert!(matches!(n.normalize("q").await, Err(LlmError::Malformed(_))));
    }

    #[test]
    fn test_generation_options_are_forwarded() {
        let opts = GenerationOptions {
            model: Some("gpt-4-0125-preview".into()),
            temperature: Some(0.0),
            max_tokens: Some(128),
        };
        let n = QueryNormalizer::new(Arc::new(ScriptedBackend::new()), opts);
        let req = n.request("q");
        assert_eq!(req.model.as_deref(), Some("gpt-4-0125-preview"));
        assert_eq!(req.temperature, Some(0.0));
        assert_eq!(req.max_tokens, Some(128));
        assert_eq!(n.model_id(), "gpt-4-0125-preview");
    }
}

//! Answer Synthesizer — the grounding prompt and the final completion call.

use std::sync::Arc;

use scalpel_llm::{LlmBackend, LlmError, LlmRequest, Message};

use crate::config::{GenerationOptions, PromptConfig};

pub struct AnswerSynthesizer {
    backend: Arc<dyn LlmBackend>,
    prompt: PromptConfig,
    options: GenerationOptions,
}

impl AnswerSynthesizer {
    pub fn new(backend: Arc<dyn LlmBackend>, prompt: PromptConfig, options: GenerationOptions) -> Self {
        Self { backend, prompt, options }
    }

    pub fn model_id(&self) -> &str {
        self.options.model.as_deref().unwrap_or_else(|| self.backend.model_id())
    }

    /// The single instruction block sent to the model. `context` goes in
    /// verbatim below the instructions, followed by the user's own question.
    pub fn build_prompt(&self, context: &str, question: &str) -> String {
        let mut p = String::with_capacity(context.len() + question.len() + 1024);
        p.push_str(&format!(
            "You are a highly scientific, evidence-based medical assistant specialised in {}.\n",
            self.prompt.specialty
        ));
        p.push_str("Answer the question below using only the information contained in the context provided.\n");
        p.push_str("Do not use your own knowledge and do not add external data, even if you know the answer.\n");
        p.push_str(
            "If different sources disagree, explain the differences based on the material \
             and cite the source directly beneath each point.\n",
        );
        p.push_str("Format the answer in HTML, with headings, lists and paragraphs for readability.\n");
        if let Some(lang) = &self.prompt.language {
            p.push_str(&format!("Write the answer in {}.\n", lang));
        }
        p.push_str("\nIf the information is not in the context, respond with exactly:\n");
        p.push_str(&self.prompt.refusal);
        p.push_str("\n\n---\n\n");
        p.push_str(&format!("<h3>Context:</h3>\n<pre>{}</pre>\n\n", context));
        p.push_str(&format!("<h3>Question:</h3>\n<p>{}</p>\n", question));
        p
    }

    /// Returns the model's reply trimmed, otherwise untouched.
    pub async fn synthesize(&self, context: &str, question: &str) -> Result<String, LlmError> {
        let req = LlmRequest {
            messages: vec![Message::system(self.build_prompt(context, question))],
            model: self.options.model.clone(),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };
        let resp = self.backend.complete(req).await?;
        Ok(resp.content.trim().to_string())
    }
}

//! The question-answering pipeline: one sequential chain per question.

use std::sync::Arc;
use std::time::Instant;

use scalpel_common::{AnswerResult, PipelineError, Result, Stage};
use scalpel_corpus::CorpusStore;
use scalpel_llm::audit::{embedding_bytes, CallAudit};
use scalpel_llm::{LlmBackend, LlmError};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::citations;
use crate::config::{NormalizationPolicy, PipelineConfig};
use crate::context;
use crate::embedding::EmbeddingClient;
use crate::normalizer::QueryNormalizer;
use crate::retrieval;
use crate::synthesizer::AnswerSynthesizer;

pub struct Pipeline {
    store: Arc<CorpusStore>,
    normalizer: QueryNormalizer,
    embedder: EmbeddingClient,
    synthesizer: AnswerSynthesizer,
    config: PipelineConfig,
}

impl Pipeline {
    /// `completion` serves normalisation and synthesis, `embedding` serves
    /// query vectors. They may be the same backend.
    pub fn new(
        store: Arc<CorpusStore>,
        completion: Arc<dyn LlmBackend>,
        embedding: Arc<dyn LlmBackend>,
        config: PipelineConfig,
    ) -> Self {
        let normalizer = QueryNormalizer::new(completion.clone(), config.generation.clone());
        let embedder = EmbeddingClient::new(embedding, store.dimension());
        let synthesizer = AnswerSynthesizer::new(
            completion,
            config.prompt.clone(),
            config.generation.clone(),
        );
        Self { store, normalizer, embedder, synthesizer, config }
    }

    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Answer `question` from the loaded corpora.
    ///
    /// A missing or blank question fails with `InvalidRequest` before any
    /// external call. Any upstream failure ends the request with no answer.
    pub async fn ask(&self, question: Option<&str>) -> Result<AnswerResult> {
        let question = match question {
            Some(q) if !q.trim().is_empty() => q,
            _ => return Err(PipelineError::InvalidRequest("No question provided.".to_string())),
        };
        self.run(question, Uuid::new_v4()).await
    }

    #[instrument(name = "question", skip_all, fields(request_id = %request_id))]
    async fn run(&self, question: &str, request_id: Uuid) -> Result<AnswerResult> {
        let started = Instant::now();
        debug!(chars = question.chars().count(), "question received");

        // normalise
        let t = Instant::now();
        let normalized = self.normalizer.normalize(question).await;
        audit(request_id, Stage::Normalize, self.normalizer.model_id(), t, &normalized, |s| {
            s.as_bytes().to_vec()
        });
        let query = match (normalized, self.config.normalization) {
            (Ok(q), _) => q,
            (Err(e), NormalizationPolicy::UseOriginal) => {
                warn!(error = %e, "normalisation failed, embedding the original question");
                question.to_string()
            }
            (Err(e), NormalizationPolicy::Abort) => {
                return Err(PipelineError::upstream(Stage::Normalize, e));
            }
        };

        // embed
        let t = Instant::now();
        let embedded = self.embedder.embed(&query).await;
        audit(request_id, Stage::Embed, self.embedder.model_id(), t, &embedded, |v| {
            embedding_bytes(v)
        });
        let vector = embedded.map_err(|e| PipelineError::upstream(Stage::Embed, e))?;

        // retrieve, assemble, cite
        let hits = retrieval::retrieve(&vector, self.store.corpora(), self.config.top_k);
        let context = context::assemble(&hits);
        let citations = citations::aggregate(
            &hits,
            self.config.citation_policy,
            self.config.citation_format,
        );
        debug!(hits = hits.len(), context_chars = context.len(), "context assembled");

        // synthesise, with the user's own wording in the prompt
        let t = Instant::now();
        let answer = self.synthesizer.synthesize(&context, question).await;
        audit(request_id, Stage::Synthesize, self.synthesizer.model_id(), t, &answer, |s| {
            s.as_bytes().to_vec()
        });
        let answer_html = answer.map_err(|e| PipelineError::upstream(Stage::Synthesize, e))?;

        info!(
            hits = hits.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "question answered"
        );
        Ok(AnswerResult { answer_html, citations })
    }
}

fn audit<T>(
    request_id: Uuid,
    stage: Stage,
    model: &str,
    started: Instant,
    outcome: &std::result::Result<T, LlmError>,
    bytes: impl FnOnce(&T) -> Vec<u8>,
) {
    let latency_ms = started.elapsed().as_millis() as u64;
    let record = match outcome {
        Ok(v) => CallAudit::success(request_id, stage, model, &bytes(v), latency_ms),
        Err(_) => CallAudit::failure(request_id, stage, model, latency_ms),
    };
    record.emit();
}

//! Retrieval Orchestrator — per-corpus k-nearest-neighbour fan-out.

use scalpel_common::RetrievalHit;
use scalpel_corpus::Corpus;
use tracing::{debug, warn};

/// Search every corpus for the `k` rows nearest to `embedding`.
///
/// Hits are concatenated in corpus order and, within a corpus, in index rank
/// order. No similarity threshold and no deduplication are applied: every
/// corpus contributes its top `k` however distant they are. A corpus whose
/// search fails contributes nothing and does not affect the others.
pub fn retrieve(embedding: &[f32], corpora: &[Corpus], k: usize) -> Vec<RetrievalHit> {
    let mut hits = Vec::with_capacity(k.saturating_mul(corpora.len()));
    for corpus in corpora {
        match corpus.search(embedding, k) {
            Ok(matches) => {
                debug!(
                    corpus = corpus.name(),
                    hits = matches.len(),
                    nearest = matches.first().map(|(n, _)| n.distance),
                    "corpus searched"
                );
                hits.extend(matches.into_iter().map(|(_, record)| RetrievalHit {
                    corpus_name: corpus.name().to_string(),
                    chapter: record.chapter.clone(),
                    text: record.text.clone(),
                }));
            }
            Err(e) => warn!(corpus = corpus.name(), error = %e, "corpus search failed, skipping"),
        }
    }
    hits
}

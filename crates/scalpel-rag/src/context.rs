//! Context Assembler — the grounding text handed to the synthesiser.

use scalpel_common::RetrievalHit;

/// One block per hit, `[<corpus> – <chapter>]` then the passage text, blocks
/// separated by a blank line, in hit order.
pub fn assemble(hits: &[RetrievalHit]) -> String {
    hits.iter()
        .map(|hit| format!("[{}]\n{}", hit.provenance(), hit.text.trim_end()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hit(corpus: &str, chapter: &str, text: &str) -> RetrievalHit {
        RetrievalHit { corpus_name: corpus.into(), chapter: chapter.into(), text: text.into() }
    }

    #[test]
    fn test_blocks_tagged_and_separated() {
        let ctx = assemble(&[
            hit("Sabiston", "Ch 50 Appendix", "Appendicitis presents with..."),
            hit("Mattox", "Ch 3 Triage", "Primary survey...\n"),
        ]);
        assert_eq!(
            ctx,
            "[Sabiston – Ch 50 Appendix]\nAppendicitis presents with...\n\n\
             [Mattox – Ch 3 Triage]\nPrimary survey..."
        );
    }

    #[test]
    fn test_empty_hits_give_empty_context() {
        assert_eq!(assemble(&[]), "");
    }
}

//! Core record types flowing through the retrieval pipeline.

use serde::{Deserialize, Serialize};

/// Chapter label used when a reference file omits one.
pub const UNKNOWN_CHAPTER: &str = "Unknown chapter";

fn unknown_chapter() -> String { UNKNOWN_CHAPTER.to_string() }

// ---------------------------------------------------------------------------
// Passage record
// ---------------------------------------------------------------------------

/// One passage of a textbook corpus. Its position in the corpus record list
/// is its identity and equals the row of its vector in the corpus index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageRecord {
    #[serde(alias = "capitulo", default = "unknown_chapter")]
    pub chapter: String,
    #[serde(alias = "texto", default)]
    pub text: String,
}

impl PassageRecord {
    pub fn new(chapter: impl Into<String>, text: impl Into<String>) -> Self {
        Self { chapter: chapter.into(), text: text.into() }
    }
}

// ---------------------------------------------------------------------------
// Retrieval hit
// ---------------------------------------------------------------------------

/// One nearest-neighbour match, tagged with the corpus it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalHit {
    pub corpus_name: String,
    pub chapter: String,
    pub text: String,
}

impl RetrievalHit {
    /// `"<corpus> – <chapter>"`, the provenance tag shown in context and citations.
    pub fn provenance(&self) -> String {
        format!("{} – {}", self.corpus_name, self.chapter)
    }
}

// ---------------------------------------------------------------------------
// Answer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerResult {
    #[serde(rename = "answer")]
    pub answer_html: String,
    pub citations: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accepts_legacy_keys() {
        let rec: PassageRecord =
            serde_json::from_str(r#"{"capitulo": "Ch 12 Hernia", "texto": "Inguinal..."}"#).unwrap();
        assert_eq!(rec, PassageRecord::new("Ch 12 Hernia", "Inguinal..."));
    }

    #[test]
    fn test_record_defaults_missing_fields() {
        let rec: PassageRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(rec.chapter, UNKNOWN_CHAPTER);
        assert_eq!(rec.text, "");
    }

    #[test]
    fn test_answer_serializes_with_answer_key() {
        let ans = AnswerResult { answer_html: "<p>ok</p>".into(), citations: "c".into() };
        let v = serde_json::to_value(&ans).unwrap();
        assert_eq!(v["answer"], "<p>ok</p>");
        assert_eq!(v["citations"], "c");
    }
}

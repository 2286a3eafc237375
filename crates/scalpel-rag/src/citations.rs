//! Citation Aggregator — a short, deduplicated reference list.
//!
//! With k = 3 over three corpora up to nine passages back an answer, often
//! from the same few chapters. Ranking by how often a `(corpus, chapter)`
//! pair was hit surfaces the chapters most consistently implicated.

use std::collections::HashMap;

use scalpel_common::RetrievalHit;

use crate::config::{CitationFormat, CitationPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub corpus_name: String,
    pub chapter: String,
    /// Number of hits that referenced this pair.
    pub count: usize,
}

impl Citation {
    pub fn label(&self) -> String {
        format!("{} – {}", self.corpus_name, self.chapter)
    }
}

/// Deduplicate hits into citations, ordered and truncated per `policy`.
pub fn rank(hits: &[RetrievalHit], policy: CitationPolicy) -> Vec<Citation> {
    // first-occurrence order with counts
    let mut citations: Vec<Citation> = Vec::new();
    let mut slot: HashMap<(&str, &str), usize> = HashMap::new();
    for hit in hits {
        let key = (hit.corpus_name.as_str(), hit.chapter.as_str());
        match slot.get(&key) {
            Some(&i) => citations[i].count += 1,
            None => {
                slot.insert(key, citations.len());
                citations.push(Citation {
                    corpus_name: hit.corpus_name.clone(),
                    chapter: hit.chapter.clone(),
                    count: 1,
                });
            }
        }
    }

    match policy {
        CitationPolicy::Ranked { top_n } => {
            // stable: equal counts keep first-occurrence order
            citations.sort_by(|a, b| b.count.cmp(&a.count));
            citations.truncate(top_n);
        }
        CitationPolicy::All => {
            citations.sort_by(|a, b| a.label().cmp(&b.label()));
        }
    }
    citations
}

/// Render citations as a numbered list. No citations render as an empty string.
pub fn format(citations: &[Citation], format: CitationFormat) -> String {
    if citations.is_empty() {
        return String::new();
    }
    match format {
        CitationFormat::Html => {
            let items: Vec<String> = citations
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{}. {}", i + 1, escape_html(&c.label())))
                .collect();
            format!("<b>References:</b><br>{}", items.join("<br>"))
        }
        CitationFormat::Plain => {
            let items: Vec<String> = citations
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{}. {}", i + 1, c.label()))
                .collect();
            format!("References:\n{}", items.join("\n"))
        }
    }
}

/// Rank then format in one step.
pub fn aggregate(hits: &[RetrievalHit], policy: CitationPolicy, fmt: CitationFormat) -> String {
    format(&rank(hits, policy), fmt)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hit(corpus: &str, chapter: &str) -> RetrievalHit {
        RetrievalHit { corpus_name: corpus.into(), chapter: chapter.into(), text: String::new() }
    }

    fn labels(c: &[Citation]) -> Vec<String> {
        c.iter().map(Citation::label).collect()
    }

    #[test]
    fn test_ranked_by_descending_count() {
        let hits = [hit("A", "1"), hit("B", "2"), hit("A", "1"), hit("A", "1"), hit("B", "2")];
        let ranked = rank(&hits, CitationPolicy::Ranked { top_n: 4 });
        assert_eq!(labels(&ranked), vec!["A – 1", "B – 2"]);
        assert_eq!(ranked[0].count, 3);
        assert_eq!(ranked[1].count, 2);
    }

    #[test]
    fn test_count_beats_first_occurrence() {
        let hits = [hit("B", "9"), hit("A", "1"), hit("A", "1")];
        let ranked = rank(&hits, CitationPolicy::Ranked { top_n: 4 });
        assert_eq!(labels(&ranked), vec!["A – 1", "B – 9"]);
    }

    #[test]
    fn test_ties_keep_first_occurrence_order() {
        let hits = [hit("C", "3"), hit("A", "1"), hit("B", "2"), hit("A", "1"), hit("C", "3")];
        let ranked = rank(&hits, CitationPolicy::Ranked { top_n: 4 });
        assert_eq!(labels(&ranked), vec!["C – 3", "A – 1", "B – 2"]);
    }

    #[test]
    fn test_unique_input_is_returned_in_insertion_order() {
        let hits = [hit("Z", "9"), hit("A", "1"), hit("M", "5")];
        let ranked = rank(&hits, CitationPolicy::Ranked { top_n: 10 });
        assert_eq!(labels(&ranked), vec!["Z – 9", "A – 1", "M – 5"]);
        // and aggregating again changes nothing
        let again: Vec<RetrievalHit> = ranked.iter().map(|c| hit(&c.corpus_name, &c.chapter)).collect();
        assert_eq!(rank(&again, CitationPolicy::Ranked { top_n: 10 }), ranked);
    }

    #[test]
    fn test_truncates_to_top_n() {
        let hits: Vec<RetrievalHit> = (0..9).map(|i| hit("S", &format!("Ch {}", i))).collect();
        assert_eq!(rank(&hits, CitationPolicy::Ranked { top_n: 4 }).len(), 4);
    }

    #[test]
    fn test_same_chapter_in_different_corpora_is_distinct() {
        let hits = [hit("A", "Ch 1"), hit("B", "Ch 1")];
        assert_eq!(rank(&hits, CitationPolicy::Ranked { top_n: 4 }).len(), 2);
    }

    #[test]
    fn test_all_policy_lists_every_pair_alphabetically() {
        let hits: Vec<RetrievalHit> = ["Mattox", "Sabiston", "Anatomy", "Sabiston", "Kirk", "Zollinger"]
            .iter()
            .map(|c| hit(c, "Ch 1"))
            .collect();
        let all = rank(&hits, CitationPolicy::All);
        assert_eq!(
            labels(&all),
            vec!["Anatomy – Ch 1", "Kirk – Ch 1", "Mattox – Ch 1", "Sabiston – Ch 1", "Zollinger – Ch 1"]
        );
    }

    #[test]
    fn test_html_format() {
        let out = aggregate(
            &[hit("Sabiston", "Ch <50>"), hit("Mattox", "Ch 3")],
            CitationPolicy::default(),
            CitationFormat::Html,
        );
        assert_eq!(out, "<b>References:</b><br>1. Sabiston – Ch &lt;50&gt;<br>2. Mattox – Ch 3");
    }

    #[test]
    fn test_plain_format() {
        let out = aggregate(&[hit("Sabiston", "Ch 50")], CitationPolicy::All, CitationFormat::Plain);
        assert_eq!(out, "References:\n1. Sabiston – Ch 50");
    }

    #[test]
    fn test_no_hits_no_citations() {
        assert_eq!(aggregate(&[], CitationPolicy::default(), CitationFormat::Html), "");
    }
}

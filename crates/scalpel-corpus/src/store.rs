//! Corpus Store — loads every configured corpus once at startup.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use scalpel_common::PassageRecord;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CorpusError, Result};
use crate::faiss;
use crate::index::{FlatIndex, Neighbor};

/// Where one corpus lives on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSpec {
    pub name: String,
    /// JSON array of passage records.
    pub records: PathBuf,
    /// FAISS flat index aligned row-for-row with `records`.
    pub index: PathBuf,
}

impl CorpusSpec {
    pub fn new(name: impl Into<String>, records: impl Into<PathBuf>, index: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), records: records.into(), index: index.into() }
    }
}

/// Read a passage-record file.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<PassageRecord>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|source| CorpusError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|source| CorpusError::Records { path: path.to_path_buf(), source })
}

// ── Corpus ────────────────────────────────────────────────────────────────────

/// A textbook's passages bound to their index. Row *i* of the index is the
/// embedding of `records[i]`; construction fails if the counts differ.
#[derive(Debug)]
pub struct Corpus {
    name: String,
    records: Vec<PassageRecord>,
    index: FlatIndex,
}

impl Corpus {
    pub fn new(name: impl Into<String>, records: Vec<PassageRecord>, index: FlatIndex) -> Result<Self> {
        let name = name.into();
        if records.len() != index.len() {
            return Err(CorpusError::CountMismatch {
                corpus: name,
                records: records.len(),
                vectors: index.len(),
            });
        }
        Ok(Self { name, records, index })
    }

    pub fn load(spec: &CorpusSpec) -> Result<Self> {
        let records = load_records(&spec.records)?;
        let index = faiss::read_index(&spec.index)?;
        let corpus = Self::new(spec.name.clone(), records, index)?;
        info!(
            corpus = %corpus.name,
            records = corpus.len(),
            dim = corpus.dim(),
            "corpus loaded"
        );
        Ok(corpus)
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn records(&self) -> &[PassageRecord] { &self.records }
    pub fn index(&self) -> &FlatIndex { &self.index }
    pub fn dim(&self) -> usize { self.index.dim() }
    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn record(&self, position: usize) -> Option<&PassageRecord> {
        self.records.get(position)
    }

    /// Nearest records for `query`, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Neighbor, &PassageRecord)>> {
        let neighbors = self.index.search(query, k)?;
        Ok(neighbors
            .into_iter()
            .filter_map(|n| self.records.get(n.position).map(|r| (n, r)))
            .collect())
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Every loaded corpus, in configuration order. Immutable after construction;
/// share it behind an `Arc`.
#[derive(Debug)]
pub struct CorpusStore {
    corpora: Vec<Corpus>,
    dim: usize,
}

impl CorpusStore {
    /// Validate a set of corpora: at least one, unique names, one shared dimension.
    pub fn new(corpora: Vec<Corpus>) -> Result<Self> {
        let first = corpora.first().ok_or(CorpusError::Empty)?;
        let dim = first.dim();

        let mut seen = HashSet::new();
        for corpus in &corpora {
            if !seen.insert(corpus.name()) {
                return Err(CorpusError::DuplicateName(corpus.name().to_string()));
            }
            if corpus.dim() != dim {
                return Err(CorpusError::Dimension { expected: dim, actual: corpus.dim() });
            }
        }
        Ok(Self { corpora, dim })
    }

    /// Load every spec in order. The first failure aborts the whole load.
    pub fn load(specs: &[CorpusSpec]) -> Result<Self> {
        let corpora = specs.iter().map(Corpus::load).collect::<Result<Vec<_>>>()?;
        let store = Self::new(corpora)?;
        info!(
            corpora = store.len(),
            records = store.total_records(),
            dim = store.dim,
            "corpus store ready"
        );
        Ok(store)
    }

    pub fn corpora(&self) -> &[Corpus] { &self.corpora }
    pub fn dimension(&self) -> usize { self.dim }
    pub fn len(&self) -> usize { self.corpora.len() }
    pub fn is_empty(&self) -> bool { self.corpora.is_empty() }

    pub fn total_records(&self) -> usize {
        self.corpora.iter().map(Corpus::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Metric;

    fn index(rows: &[[f32; 2]]) -> FlatIndex {
        let mut idx = FlatIndex::new(2, Metric::L2);
        for r in rows {
            idx.add(r).unwrap();
        }
        idx
    }

    fn records(n: usize) -> Vec<PassageRecord> {
        (0..n).map(|i| PassageRecord::new(format!("Ch {}", i), format!("text {}", i))).collect()
    }

    #[test]
    fn test_corpus_rejects_count_mismatch() {
        let err = Corpus::new("Sabiston", records(3), index(&[[0.0, 0.0], [1.0, 1.0]])).unwrap_err();
        assert!(matches!(err, CorpusError::CountMismatch { records: 3, vectors: 2, .. }));
    }

    #[test]
    fn test_corpus_search_returns_aligned_records() {
        let c = Corpus::new("Mattox", records(3), index(&[[0.0, 0.0], [5.0, 5.0], [1.0, 1.0]])).unwrap();
        let hits = c.search(&[4.0, 4.0], 2).unwrap();
        assert_eq!(hits[0].1.chapter, "Ch 1");
        assert_eq!(hits[1].1.chapter, "Ch 2");
    }

    #[test]
    fn test_store_rejects_empty_and_duplicates() {
        assert!(matches!(CorpusStore::new(vec![]), Err(CorpusError::Empty)));

        let a = Corpus::new("A", records(1), index(&[[0.0, 0.0]])).unwrap();
        let b = Corpus::new("A", records(1), index(&[[1.0, 0.0]])).unwrap();
        assert!(matches!(CorpusStore::new(vec![a, b]), Err(CorpusError::DuplicateName(_))));
    }

    #[test]
    fn test_store_rejects_mixed_dimensions() {
        let a = Corpus::new("A", records(1), index(&[[0.0, 0.0]])).unwrap();
        let mut idx3 = FlatIndex::new(3, Metric::L2);
        idx3.add(&[0.0, 0.0, 0.0]).unwrap();
        let b = Corpus::new("B", records(1), idx3).unwrap();
        assert!(matches!(
            CorpusStore::new(vec![a, b]),
            Err(CorpusError::Dimension { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_load_from_disk_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut specs = Vec::new();
        for name in ["Sabiston", "Skandalakis"] {
            let rec_path = dir.path().join(format!("{}.json", name));
            let idx_path = dir.path().join(format!("{}.faiss", name));
            std::fs::write(&rec_path, serde_json::to_vec(&records(2)).unwrap()).unwrap();
            faiss::write_index(&idx_path, &index(&[[0.0, 1.0], [1.0, 0.0]])).unwrap();
            specs.push(CorpusSpec::new(name, rec_path, idx_path));
        }
        let store = CorpusStore::load(&specs).unwrap();
        let names: Vec<&str> = store.corpora().iter().map(Corpus::name).collect();
        assert_eq!(names, vec!["Sabiston", "Skandalakis"]);
        assert_eq!(store.dimension(), 2);
        assert_eq!(store.total_records(), 4);
    }

    #[test]
    fn test_load_fails_on_missing_records_file() {
        let dir = tempfile::tempdir().unwrap();
        let idx_path = dir.path().join("a.faiss");
        faiss::write_index(&idx_path, &index(&[[0.0, 1.0]])).unwrap();
        let spec = CorpusSpec::new("A", dir.path().join("missing.json"), idx_path);
        assert!(matches!(CorpusStore::load(&[spec]), Err(CorpusError::Io { .. })));
    }

    #[test]
    fn test_load_fails_on_malformed_records() {
        let dir = tempfile::tempdir().unwrap();
        let rec_path = dir.path().join("a.json");
        std::fs::write(&rec_path, b"{\"not\": \"an array\"}").unwrap();
        let idx_path = dir.path().join("a.faiss");
        faiss::write_index(&idx_path, &index(&[[0.0, 1.0]])).unwrap();
        let err = Corpus::load(&CorpusSpec::new("A", rec_path, idx_path)).unwrap_err();
        assert!(matches!(err, CorpusError::Records { .. }));
    }

    #[test]
    fn test_integrity_errors_convert_to_pipeline_error() {
        let err: scalpel_common::PipelineError = CorpusError::Empty.into();
        assert!(matches!(err, scalpel_common::PipelineError::IndexIntegrity(_)));
    }
}

use std::path::Path;

use scalpel_common::PassageRecord;
use scalpel_corpus::{faiss, CorpusSpec, FlatIndex, Metric};
use tempfile::TempDir;

/// Writes corpora (records JSON + FAISS flat index) into a temporary directory.
/// The directory lives as long as the fixture.
pub struct CorpusFixture {
    dir: TempDir,
    specs: Vec<CorpusSpec>,
}

impl CorpusFixture {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("create temp dir"), specs: Vec::new() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a corpus whose row *i* is `rows[i]`: `(chapter, text, vector)`.
    pub fn add_corpus(&mut self, name: &str, rows: &[(&str, &str, Vec<f32>)]) -> CorpusSpec {
        let dim = rows.first().map(|r| r.2.len()).unwrap_or(1);
        let mut index = FlatIndex::new(dim, Metric::L2);
        let mut records = Vec::with_capacity(rows.len());
        for (chapter, text, vector) in rows {
            index.add(vector).expect("fixture vectors share one dimension");
            records.push(PassageRecord::new(*chapter, *text));
        }
        self.write(name, &records, &index)
    }

    /// Write arbitrary records and index, aligned or not.
    pub fn write(&mut self, name: &str, records: &[PassageRecord], index: &FlatIndex) -> CorpusSpec {
        let slug: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let records_path = self.dir.path().join(format!("{}_{}.json", self.specs.len(), slug));
        let index_path = self.dir.path().join(format!("{}_{}.faiss", self.specs.len(), slug));
        std::fs::write(&records_path, serde_json::to_vec_pretty(records).expect("serialize records"))
            .expect("write records");
        faiss::write_index(&index_path, index).expect("write index");

        let spec = CorpusSpec::new(name, records_path, index_path);
        self.specs.push(spec.clone());
        spec
    }

    pub fn specs(&self) -> &[CorpusSpec] {
        &self.specs
    }
}

impl Default for CorpusFixture {
    fn default() -> Self {
        Self::new()
    }
}

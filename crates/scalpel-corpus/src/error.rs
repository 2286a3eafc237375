//! Error types for corpus loading.

use std::path::PathBuf;

use scalpel_common::PipelineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CorpusError>;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid passage records in {path}: {source}")]
    Records {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid index format: {0}")]
    Format(String),

    #[error("corpus '{corpus}': {records} records but {vectors} indexed vectors")]
    CountMismatch { corpus: String, records: usize, vectors: usize },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("duplicate corpus name '{0}'")]
    DuplicateName(String),

    #[error("no corpora configured")]
    Empty,
}

impl From<CorpusError> for PipelineError {
    fn from(e: CorpusError) -> Self {
        PipelineError::IndexIntegrity(e.to_string())
    }
}

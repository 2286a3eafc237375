//! scalpel-corpus — the Corpus Store.
//!
//! Each corpus binds an ordered list of passage records to a vector index
//! whose row *i* is the embedding of record *i*. The binding is checked once
//! at load time and the store is read-only afterwards.
//!
//! # Example
//! ```no_run
//! use scalpel_corpus::{CorpusSpec, CorpusStore};
//!
//! let store = CorpusStore::load(&[CorpusSpec::new(
//!     "Sabiston Textbook of Surgery 21st Ed",
//!     "data/sabiston.json",
//!     "data/sabiston.faiss",
//! )])?;
//! println!("{} corpora, dim {}", store.len(), store.dimension());
//! # Ok::<(), scalpel_corpus::CorpusError>(())
//! ```

pub mod error;
pub mod faiss;
pub mod index;
pub mod store;

pub use error::{CorpusError, Result};
pub use index::{FlatIndex, Metric, Neighbor};
pub use store::{load_records, Corpus, CorpusSpec, CorpusStore};

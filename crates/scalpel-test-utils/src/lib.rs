//! Test doubles and fixtures shared by the Scalpel test suites.

mod backend;
mod fixture;

pub use backend::{ScriptedBackend, ScriptedCall};
pub use fixture::CorpusFixture;

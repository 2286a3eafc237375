//! scalpel-web — HTTP surface for the question-answering pipeline.
//!   - POST /ask (alias /perguntar) — answer a question with citations
//!   - GET  /health                 — loaded corpora and index dimension

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;

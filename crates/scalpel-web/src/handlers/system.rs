//! Liveness and loaded-corpus summary.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct CorpusSummary {
    pub name: String,
    pub records: usize,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub dimension: usize,
    pub corpora: Vec<CorpusSummary>,
}

pub async fn health(State(state): State<SharedState>) -> Json<Health> {
    let store = state.pipeline.store();
    Json(Health {
        status: "ok",
        dimension: store.dimension(),
        corpora: store
            .corpora()
            .iter()
            .map(|c| CorpusSummary { name: c.name().to_string(), records: c.len() })
            .collect(),
    })
}

//! Audit records for upstream LLM calls.
//! One record per call; no prompt or answer text is kept, only a digest.

use chrono::{DateTime, Utc};
use scalpel_common::Stage;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct CallAudit {
    pub id: Uuid,
    pub request_id: Uuid,
    pub stage: Stage,
    pub model: String,
    pub success: bool,
    pub output_hash: Option<String>,
    pub latency_ms: u64,
    pub called_at: DateTime<Utc>,
}

impl CallAudit {
    pub fn success(request_id: Uuid, stage: Stage, model: &str, output: &[u8], latency_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            stage,
            model: model.to_string(),
            success: true,
            output_hash: Some(sha256_hex(output)),
            latency_ms,
            called_at: Utc::now(),
        }
    }

    pub fn failure(request_id: Uuid, stage: Stage, model: &str, latency_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            stage,
            model: model.to_string(),
            success: false,
            output_hash: None,
            latency_ms,
            called_at: Utc::now(),
        }
    }

    pub fn emit(&self) {
        tracing::info!(
            target: "scalpel::audit",
            audit_id = %self.id,
            request_id = %self.request_id,
            stage = self.stage.as_str(),
            model = %self.model,
            success = self.success,
            output_hash = self.output_hash.as_deref().unwrap_or("-"),
            latency_ms = self.latency_ms,
            called_at = %self.called_at.to_rfc3339(),
            "llm call"
        );
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Stable byte view of an embedding for hashing.
pub fn embedding_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_hashes_output() {
        let rid = Uuid::new_v4();
        let a = CallAudit::success(rid, Stage::Synthesize, "gpt-4o", b"<p>answer</p>", 12);
        assert!(a.success);
        assert_eq!(a.request_id, rid);
        assert_eq!(a.output_hash.as_deref().map(str::len), Some(64));
    }

    #[test]
    fn test_failure_has_no_hash() {
        let a = CallAudit::failure(Uuid::new_v4(), Stage::Embed, "ada", 3);
        assert!(!a.success);
        assert!(a.output_hash.is_none());
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_embedding_bytes_little_endian() {
        assert_eq!(embedding_bytes(&[1.0]), 1.0f32.to_le_bytes().to_vec());
    }
}

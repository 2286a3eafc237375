//! Reader and writer for FAISS flat index files (`write_index` output of
//! `IndexFlatL2` / `IndexFlatIP`).
//!
//! Layout, little-endian:
//!
//! ```text
//! fourcc      [u8; 4]   "IxF2" (L2) | "IxFI" (inner product) | "IxFl" (generic flat)
//! d           i32
//! ntotal      i64
//! dummy       i64       1 << 20
//! dummy       i64       1 << 20
//! is_trained  u8
//! metric_type i32       0 = inner product, 1 = L2
//! metric_arg  f32       only when metric_type > 1
//! code_len    u64       number of f32 values that follow
//! codes       [f32; ntotal * d]
//! ```

use std::path::Path;

use crate::error::{CorpusError, Result};
use crate::index::{FlatIndex, Metric};

const FOURCC_FLAT_L2: &[u8; 4] = b"IxF2";
const FOURCC_FLAT_IP: &[u8; 4] = b"IxFI";
const FOURCC_FLAT: &[u8; 4] = b"IxFl";
const HEADER_DUMMY: i64 = 1 << 20;
const METRIC_INNER_PRODUCT: i32 = 0;
const METRIC_L2: i32 = 1;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.bytes.len()).ok_or_else(|| {
            CorpusError::Format(format!("truncated file while reading {} at byte {}", what, self.pos))
        })?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N, what)?);
        Ok(buf)
    }

    fn u8(&mut self, what: &str) -> Result<u8> { Ok(self.array::<1>(what)?[0]) }
    fn i32(&mut self, what: &str) -> Result<i32> { Ok(i32::from_le_bytes(self.array(what)?)) }
    fn i64(&mut self, what: &str) -> Result<i64> { Ok(i64::from_le_bytes(self.array(what)?)) }
    fn u64(&mut self, what: &str) -> Result<u64> { Ok(u64::from_le_bytes(self.array(what)?)) }
    fn f32(&mut self, what: &str) -> Result<f32> { Ok(f32::from_le_bytes(self.array(what)?)) }

    fn remaining(&self) -> usize { self.bytes.len() - self.pos }
}

/// Decode a flat index from its serialized bytes.
pub fn decode_flat(bytes: &[u8]) -> Result<FlatIndex> {
    let mut cur = Cursor { bytes, pos: 0 };

    let fourcc: [u8; 4] = cur.array("fourcc")?;
    let expected_metric = match &fourcc {
        f if f == FOURCC_FLAT_L2 => Some(Metric::L2),
        f if f == FOURCC_FLAT_IP => Some(Metric::InnerProduct),
        f if f == FOURCC_FLAT => None,
        other => {
            return Err(CorpusError::Format(format!(
                "unsupported index type '{}'; only flat indices are supported",
                String::from_utf8_lossy(other)
            )))
        }
    };

    let d = cur.i32("d")?;
    let ntotal = cur.i64("ntotal")?;
    cur.i64("dummy")?;
    cur.i64("dummy")?;
    cur.u8("is_trained")?;
    let metric_type = cur.i32("metric_type")?;
    if metric_type > 1 {
        cur.f32("metric_arg")?;
    }

    if d <= 0 {
        return Err(CorpusError::Format(format!("invalid dimension {}", d)));
    }
    if ntotal < 0 {
        return Err(CorpusError::Format(format!("invalid vector count {}", ntotal)));
    }
    let metric = match metric_type {
        METRIC_L2 => Metric::L2,
        METRIC_INNER_PRODUCT => Metric::InnerProduct,
        other => return Err(CorpusError::Format(format!("unsupported metric type {}", other))),
    };
    if expected_metric.is_some_and(|m| m != metric) {
        return Err(CorpusError::Format(format!(
            "fourcc '{}' disagrees with metric type {}",
            String::from_utf8_lossy(&fourcc), metric_type
        )));
    }

    let dim = d as usize;
    let ntotal = ntotal as usize;
    let code_len = cur.u64("code length")? as usize;
    let expected_len = ntotal.checked_mul(dim)
        .ok_or_else(|| CorpusError::Format("vector count overflows".to_string()))?;
    if code_len != expected_len {
        return Err(CorpusError::Format(format!(
            "code length {} does not match ntotal {} × d {}", code_len, ntotal, dim
        )));
    }

    let byte_len = code_len.checked_mul(4)
        .ok_or_else(|| CorpusError::Format("code length overflows".to_string()))?;
    let raw = cur.take(byte_len, "codes")?;
    if cur.remaining() != 0 {
        return Err(CorpusError::Format(format!("{} trailing bytes", cur.remaining())));
    }

    let data: Vec<f32> = raw
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    FlatIndex::from_vectors(dim, metric, data)
}

/// Serialize a flat index in the layout `decode_flat` reads.
pub fn encode_flat(index: &FlatIndex) -> Vec<u8> {
    let data = index.as_slice();
    let mut buffer = Vec::with_capacity(45 + data.len() * 4);

    let (fourcc, metric_type) = match index.metric() {
        Metric::L2 => (FOURCC_FLAT_L2, METRIC_L2),
        Metric::InnerProduct => (FOURCC_FLAT_IP, METRIC_INNER_PRODUCT),
    };
    buffer.extend_from_slice(fourcc);
    buffer.extend_from_slice(&(index.dim() as i32).to_le_bytes());
    buffer.extend_from_slice(&(index.len() as i64).to_le_bytes());
    buffer.extend_from_slice(&HEADER_DUMMY.to_le_bytes());
    buffer.extend_from_slice(&HEADER_DUMMY.to_le_bytes());
    buffer.push(1); // is_trained
    buffer.extend_from_slice(&metric_type.to_le_bytes());
    buffer.extend_from_slice(&(data.len() as u64).to_le_bytes());
    for v in data {
        buffer.extend_from_slice(&v.to_le_bytes());
    }
    buffer
}

pub fn read_index(path: impl AsRef<Path>) -> Result<FlatIndex> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|source| CorpusError::Io { path: path.to_path_buf(), source })?;
    decode_flat(&bytes).map_err(|e| match e {
        CorpusError::Format(msg) => CorpusError::Format(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

pub fn write_index(path: impl AsRef<Path>, index: &FlatIndex) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, encode_flat(index))
        .map_err(|source| CorpusError::Io { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlatIndex {
        FlatIndex::from_vectors(3, Metric::L2, vec![1.0, 2.0, 3.0, -4.0, 0.5, 0.0]).unwrap()
    }

    #[test]
    fn test_header_layout_matches_faiss() {
        let bytes = encode_flat(&sample());
        assert_eq!(&bytes[0..4], b"IxF2");
        assert_eq!(i32::from_le_bytes(bytes[4..8].try_into().unwrap()), 3);
        assert_eq!(i64::from_le_bytes(bytes[8..16].try_into().unwrap()), 2);
        assert_eq!(i64::from_le_bytes(bytes[16..24].try_into().unwrap()), 1 << 20);
        assert_eq!(bytes[32], 1);
        assert_eq!(i32::from_le_bytes(bytes[33..37].try_into().unwrap()), 1);
        assert_eq!(u64::from_le_bytes(bytes[37..45].try_into().unwrap()), 6);
        assert_eq!(bytes.len(), 45 + 6 * 4);
    }

    #[test]
    fn test_decode_preserves_rows_and_metric() {
        let idx = FlatIndex::from_vectors(2, Metric::InnerProduct, vec![0.25, -1.0]).unwrap();
        let back = decode_flat(&encode_flat(&idx)).unwrap();
        assert_eq!(back.metric(), Metric::InnerProduct);
        assert_eq!(back.vector(0), Some(&[0.25f32, -1.0][..]));
    }

    #[test]
    fn test_metric_arg_is_skipped_for_extended_metrics() {
        // metric_type > 1 carries an extra f32; such metrics are not searchable here
        let mut bytes = encode_flat(&sample());
        bytes[0..4].copy_from_slice(b"IxFl");
        bytes[33..37].copy_from_slice(&2i32.to_le_bytes());
        let tail = bytes.split_off(37);
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend(tail);
        let err = decode_flat(&bytes).unwrap_err();
        assert!(err.to_string().contains("unsupported metric type 2"), "{}", err);
    }

    #[test]
    fn test_rejects_non_flat_index() {
        let mut bytes = encode_flat(&sample());
        bytes[0..4].copy_from_slice(b"IHNf");
        assert!(decode_flat(&bytes).unwrap_err().to_string().contains("IHNf"));
    }

    #[test]
    fn test_rejects_truncated_codes() {
        let bytes = encode_flat(&sample());
        let err = decode_flat(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_rejects_code_length_mismatch() {
        let mut bytes = encode_flat(&sample());
        bytes[8..16].copy_from_slice(&3i64.to_le_bytes());
        assert!(decode_flat(&bytes).unwrap_err().to_string().contains("does not match"));
    }

    #[test]
    fn test_rejects_fourcc_metric_disagreement() {
        let mut bytes = encode_flat(&sample());
        bytes[33..37].copy_from_slice(&0i32.to_le_bytes());
        assert!(decode_flat(&bytes).is_err());
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_index(dir.path().join("nope.faiss")).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}

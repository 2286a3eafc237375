//! Exact (brute-force) vector index.
//!
//! Same semantics as a FAISS `IndexFlat`: every query is compared against
//! every stored row. Row numbers are positions, assigned in insertion order.

use crate::error::{CorpusError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Squared Euclidean distance, smaller is nearer.
    L2,
    /// Dot product, larger is nearer.
    InnerProduct,
}

/// One search result: the row position and its raw metric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    metric: Metric,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize, metric: Metric) -> Self {
        Self { dim, metric, data: Vec::new() }
    }

    /// Build from a row-major buffer of `n × dim` floats.
    pub fn from_vectors(dim: usize, metric: Metric, data: Vec<f32>) -> Result<Self> {
        if dim == 0 {
            return Err(CorpusError::Format("dimension must be positive".to_string()));
        }
        if data.len() % dim != 0 {
            return Err(CorpusError::Format(format!(
                "{} floats is not a multiple of dimension {}", data.len(), dim
            )));
        }
        Ok(Self { dim, metric, data })
    }

    /// Append a vector; returns its position.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dim {
            return Err(CorpusError::Dimension { expected: self.dim, actual: vector.len() });
        }
        self.data.extend_from_slice(vector);
        Ok(self.len() - 1)
    }

    pub fn dim(&self) -> usize { self.dim }
    pub fn metric(&self) -> Metric { self.metric }
    pub fn as_slice(&self) -> &[f32] { &self.data }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    /// Up to `k` nearest rows, nearest first. Ties keep the lower position first.
    /// No score threshold is applied.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim {
            return Err(CorpusError::Dimension { expected: self.dim, actual: query.len() });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<Neighbor> = self.data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(position, row)| Neighbor { position, distance: self.score(query, row) })
            .collect();

        match self.metric {
            Metric::L2 => scored.sort_by(|a, b| {
                a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position))
            }),
            Metric::InnerProduct => scored.sort_by(|a, b| {
                b.distance.total_cmp(&a.distance).then(a.position.cmp(&b.position))
            }),
        }
        scored.truncate(k);
        Ok(scored)
    }

    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            Metric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Metric::InnerProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_index(metric: Metric) -> FlatIndex {
        let mut idx = FlatIndex::new(2, metric);
        for v in [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0], [1.0, 1.0]] {
            idx.add(&v).unwrap();
        }
        idx
    }

    #[test]
    fn test_l2_orders_by_ascending_distance() {
        let idx = grid_index(Metric::L2);
        let hits = idx.search(&[0.8, 0.1], 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 0, 4]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_inner_product_orders_by_descending_score() {
        let idx = grid_index(Metric::InnerProduct);
        let hits = idx.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].position, 3);
        assert_eq!(hits[0].distance, 5.0);
    }

    #[test]
    fn test_ties_prefer_lower_position() {
        let idx = grid_index(Metric::L2);
        // [1,0] and [0,1] are equidistant from the origin
        let hits = idx.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(hits.iter().map(|n| n.position).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_returns_at_most_len_hits() {
        let idx = grid_index(Metric::L2);
        assert_eq!(idx.search(&[0.0, 0.0], 50).unwrap().len(), 5);
        assert!(idx.search(&[0.0, 0.0], 0).unwrap().is_empty());
        assert!(FlatIndex::new(2, Metric::L2).search(&[0.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_query_dimension_checked() {
        let idx = grid_index(Metric::L2);
        assert!(matches!(
            idx.search(&[1.0, 2.0, 3.0], 1),
            Err(CorpusError::Dimension { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_every_stored_vector_is_its_own_nearest_neighbor() {
        let mut idx = FlatIndex::new(8, Metric::L2);
        let rows: Vec<Vec<f32>> = (0..40)
            .map(|i| (0..8).map(|j| ((i * 31 + j * 7) % 17) as f32 + i as f32 * 0.01).collect())
            .collect();
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(idx.add(row).unwrap(), i);
        }
        for (i, row) in rows.iter().enumerate() {
            let hit = idx.search(row, 1).unwrap()[0];
            assert_eq!(hit.position, i);
            assert_eq!(hit.distance, 0.0);
        }
    }

    #[test]
    fn test_from_vectors_rejects_ragged_buffer() {
        assert!(FlatIndex::from_vectors(3, Metric::L2, vec![0.0; 7]).is_err());
        assert_eq!(FlatIndex::from_vectors(3, Metric::L2, vec![0.0; 9]).unwrap().len(), 3);
    }
}

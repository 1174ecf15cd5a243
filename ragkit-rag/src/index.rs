//! Exact nearest-neighbour index using squared L2 distance.
//!
//! [`FlatL2Index`] keeps every vector in one contiguous row-major buffer and
//! answers queries by scanning all of them. It is meant for small corpora
//! (tens to low hundreds of documents); there is no approximate structure.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// A search hit: the identifier of a stored vector and its distance to the query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Neighbor {
    /// Insertion position of the stored vector.
    pub id: usize,
    /// Squared L2 distance to the query.
    pub distance: f32,
}

/// Squared Euclidean distance between two vectors of equal length.
///
/// Callers are responsible for checking lengths; extra elements of the longer
/// slice are ignored.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Cosine of the angle between two vectors, in `[-1, 1]`.
///
/// Returns `0.0` when either vector has zero magnitude. Like [`squared_l2`],
/// extra elements of the longer slice are ignored.
///
/// ```rust
/// use ragkit_rag::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });
    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 { 0.0 } else { (dot / denominator).clamp(-1.0, 1.0) }
}

/// Ascending distance, then ascending id. NaN distances sort last.
fn rank(a: &Neighbor, b: &Neighbor) -> Ordering {
    let by_distance = match (a.distance.is_nan(), b.distance.is_nan()) {
        (false, false) => a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    };
    by_distance.then_with(|| a.id.cmp(&b.id))
}

/// An append-only, in-memory index with exhaustive L2 search.
///
/// The dimensionality is fixed by the first vector and enforced for every
/// later insertion and query.
///
/// # Example
///
/// ```rust
/// use ragkit_rag::FlatL2Index;
///
/// let index = FlatL2Index::build(vec![vec![0.0, 0.0], vec![1.0, 1.0]])?;
/// let hits = index.search(&[0.9, 0.9], 1)?;
/// assert_eq!(hits[0].id, 1);
/// # Ok::<(), ragkit_rag::RagError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimensions: usize,
    vectors: Vec<f32>,
    len: usize,
}

impl FlatL2Index {
    /// Create an empty index for vectors of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, vectors: Vec::new(), len: 0 }
    }

    /// Build an index from embeddings; identifiers follow iteration order.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyCorpus`] if `embeddings` is empty.
    /// - [`RagError::DimensionMismatch`] if any embedding's length differs
    ///   from the first one's.
    pub fn build<I, V>(embeddings: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[f32]>,
    {
        let mut embeddings = embeddings.into_iter();
        let first = embeddings.next().ok_or(RagError::EmptyCorpus)?;
        let mut index = Self::new(first.as_ref().len());
        index.add(first.as_ref())?;
        for embedding in embeddings {
            index.add(embedding.as_ref())?;
        }
        Ok(index)
    }

    /// Append a vector and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the vector's length differs
    /// from the index dimensionality.
    pub fn add(&mut self, embedding: &[f32]) -> Result<usize> {
        self.check_dimensions(embedding)?;
        self.vectors.extend_from_slice(embedding);
        self.len += 1;
        Ok(self.len - 1)
    }

    /// Return the `k` stored vectors closest to `query`.
    ///
    /// Results are ordered by ascending distance with ties broken by the lower
    /// identifier. Asking for more results than stored vectors returns all of
    /// them.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidTopK`] if `k == 0`.
    /// - [`RagError::DimensionMismatch`] if the query length differs from the
    ///   index dimensionality.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Err(RagError::InvalidTopK);
        }
        self.check_dimensions(query)?;

        let mut scored: Vec<Neighbor> = (0..self.len)
            .map(|id| Neighbor { id, distance: squared_l2(self.vector(id), query) })
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_unstable_by(rank);
        Ok(scored)
    }

    /// The stored vector with the given identifier.
    pub fn get(&self, id: usize) -> Option<&[f32]> {
        (id < self.len).then(|| self.vector(id))
    }

    /// Dimensionality shared by every vector in the index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn vector(&self, id: usize) -> &[f32] {
        let start = id * self.dimensions;
        &self.vectors[start..start + self.dimensions]
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_l2_is_not_rooted() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_l2(&[1.5, -2.0], &[1.5, -2.0]), 0.0);
    }

    #[test]
    fn cosine_ignores_magnitude() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn build_rejects_empty_input() {
        let err = FlatL2Index::build(Vec::<Vec<f32>>::new()).unwrap_err();
        assert!(matches!(err, RagError::EmptyCorpus));
    }

    #[test]
    fn build_rejects_ragged_embeddings() {
        let err = FlatL2Index::build(vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn add_is_append_only() {
        let mut index = FlatL2Index::new(2);
        assert!(index.is_empty());
        assert_eq!(index.add(&[0.0, 1.0]).unwrap(), 0);
        assert_eq!(index.add(&[1.0, 0.0]).unwrap(), 1);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(1), Some(&[1.0, 0.0][..]));
        assert_eq!(index.get(2), None);
    }

    #[test]
    fn search_orders_by_distance_then_id() {
        let index =
            FlatL2Index::build(vec![vec![2.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]])
                .unwrap();

        let hits = index.search(&[0.0, 0.0], 4).unwrap();
        let ids: Vec<usize> = hits.iter().map(|n| n.id).collect();
        // ids 1, 2 and 3 are all at distance 1.0
        assert_eq!(ids, vec![1, 2, 3, 0]);
        assert_eq!(hits[3].distance, 4.0);
    }

    #[test]
    fn search_truncates_to_k_keeping_the_closest() {
        let index =
            FlatL2Index::build(vec![vec![5.0], vec![1.0], vec![3.0], vec![0.5], vec![2.0]]).unwrap();
        let hits = index.search(&[0.0], 2).unwrap();
        assert_eq!(hits.iter().map(|n| n.id).collect::<Vec<_>>(), vec![3, 1]);
    }

    #[test]
    fn search_with_large_k_returns_everything() {
        let index = FlatL2Index::build(vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        assert_eq!(index.search(&[0.0], 5).unwrap().len(), 3);
    }

    #[test]
    fn search_rejects_zero_k() {
        let index = FlatL2Index::build(vec![vec![1.0]]).unwrap();
        assert!(matches!(index.search(&[1.0], 0), Err(RagError::InvalidTopK)));
    }

    #[test]
    fn search_rejects_wrong_query_dimensions() {
        let index = FlatL2Index::build(vec![vec![1.0, 2.0, 3.0]]).unwrap();
        let err = index.search(&[1.0, 2.0], 1).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 2 }));
        let err = index.search(&[1.0, 2.0, 3.0, 4.0], 1).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 4 }));
    }

    #[test]
    fn nan_distances_rank_last() {
        let index = FlatL2Index::build(vec![vec![f32::NAN], vec![10.0]]).unwrap();
        let hits = index.search(&[0.0], 2).unwrap();
        assert_eq!(hits[0].id, 1);
        assert!(hits[1].distance.is_nan());
    }
}

//! The index module
//! Exact nearest-neighbor search over a flat, append-only vector store

use crate::error::IndexError;
use crate::vector::{score_from_distance, squared_l2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Caller-supplied document identifier.
///
/// Identifiers are not required to be unique: inserting the same id twice
/// produces two independent slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    Text(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Int(id) => write!(f, "{}", id),
            DocumentId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        DocumentId::Int(id)
    }
}

impl From<i32> for DocumentId {
    fn from(id: i32) -> Self {
        DocumentId::Int(i64::from(id))
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        DocumentId::Text(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId::Text(id.to_string())
    }
}

/// The id and text stored for one slot. Immutable once inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub text: String,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub slot: usize,
    pub id: DocumentId,
    pub text: String,
    /// Squared L2 distance to the query.
    pub distance: f32,
    /// `1 / (1 + distance)`.
    pub score: f32,
}

/// Append-only vector index with brute-force exact search.
///
/// Vectors are stored contiguously as `[v0_d0, v0_d1, ..., v1_d0, ...]`, one
/// record per slot. Slot `i` is the `i`-th successful insert; slots are never
/// removed or reused.
///
/// Text is kept per slot, so re-inserting an id never changes what an older
/// slot reports. `latest_slot` gives last-write-wins lookup by id.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<f32>,
    records: Vec<DocumentRecord>,
    latest: HashMap<DocumentId, usize>,
}

impl VectorIndex {
    /// Creates an empty index accepting vectors of exactly `dimension` values.
    ///
    /// # Examples
    ///
    /// ```
    /// use kvsearch::VectorIndex;
    ///
    /// let index = VectorIndex::new(384);
    /// assert_eq!(index.len(), 0);
    /// assert_eq!(index.dimension(), 384);
    /// ```
    pub fn new(dimension: usize) -> VectorIndex {
        VectorIndex {
            dimension,
            vectors: Vec::new(),
            records: Vec::new(),
            latest: HashMap::new(),
        }
    }

    /// Appends a vector and its document, returning the assigned slot.
    ///
    /// The embedding is checked before anything is written, so a rejected
    /// insert leaves the index unchanged.
    ///
    /// # Errors
    ///
    /// `IndexError::DimensionMismatch` if `embedding.len()` differs from the
    /// index dimension.
    ///
    /// # Examples
    ///
    /// ```
    /// use kvsearch::VectorIndex;
    ///
    /// let mut index = VectorIndex::new(2);
    /// assert_eq!(index.insert(1, "first", &[1.0, 0.0]).unwrap(), 0);
    /// assert_eq!(index.insert(1, "again", &[0.0, 1.0]).unwrap(), 1);
    ///
    /// // Wrong length is rejected
    /// assert!(index.insert(2, "bad", &[1.0, 2.0, 3.0]).is_err());
    /// assert_eq!(index.len(), 2);
    /// ```
    pub fn insert(
        &mut self,
        id: impl Into<DocumentId>,
        text: impl Into<String>,
        embedding: &[f32],
    ) -> Result<usize, IndexError> {
        self.check_dimension(embedding)?;

        let slot = self.records.len();
        let id = id.into();

        self.vectors.extend_from_slice(embedding);
        self.latest.insert(id.clone(), slot);
        self.records.push(DocumentRecord { id, text: text.into() });

        debug_assert_eq!(self.vectors.len(), self.records.len() * self.dimension);
        Ok(slot)
    }

    /// Finds the `top_k` stored vectors closest to `query`.
    ///
    /// Every slot is scanned (O(N·D)). Results are ordered by ascending
    /// squared L2 distance, i.e. descending score; equal distances keep
    /// ascending slot order. If fewer than `top_k` vectors exist all of them
    /// are returned, and an empty index yields an empty result. A NaN
    /// distance ranks as infinite and scores 0.
    ///
    /// # Errors
    ///
    /// * `IndexError::DimensionMismatch` - query length differs from the index dimension
    /// * `IndexError::InvalidTopK` - `top_k` is zero
    ///
    /// # Examples
    ///
    /// ```
    /// use kvsearch::VectorIndex;
    ///
    /// let mut index = VectorIndex::new(3);
    /// index.insert(1, "x axis", &[1.0, 0.0, 0.0]).unwrap();
    /// index.insert(2, "y axis", &[0.0, 1.0, 0.0]).unwrap();
    /// index.insert(3, "diagonal", &[0.7, 0.7, 0.0]).unwrap();
    ///
    /// let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
    /// assert_eq!(results.len(), 2);
    /// assert_eq!(results[0].text, "x axis");
    /// assert_eq!(results[0].score, 1.0);
    /// ```
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, IndexError> {
        self.check_dimension(query)?;
        if top_k == 0 {
            return Err(IndexError::InvalidTopK(top_k));
        }

        // Kept sorted by (distance, slot); never longer than top_k.
        let mut nearest: Vec<(usize, f32)> = Vec::with_capacity(top_k.min(self.len()) + 1);
        for slot in 0..self.len() {
            let dist = ranking_distance(squared_l2(self.slot_vector(slot), query)?);

            if nearest.len() == top_k {
                if let Some(&(_, worst)) = nearest.last() {
                    if dist.total_cmp(&worst).is_ge() {
                        continue;
                    }
                }
            }

            let insert_index = nearest.partition_point(|&(_, d)| d.total_cmp(&dist).is_le());
            nearest.insert(insert_index, (slot, dist));
            nearest.truncate(top_k);
        }

        let result = nearest.into_iter()
            .map(|(slot, distance)| {
                let record = &self.records[slot];
                SearchHit {
                    slot,
                    id: record.id.clone(),
                    text: record.text.clone(),
                    distance,
                    score: score_from_distance(distance),
                }
            })
            .collect();

        Ok(result)
    }

    /// Returns the record stored at `slot`, if that slot exists.
    pub fn get(&self, slot: usize) -> Option<&DocumentRecord> {
        self.records.get(slot)
    }

    /// Returns the vector stored at `slot`, if that slot exists.
    pub fn vector(&self, slot: usize) -> Option<&[f32]> {
        if slot < self.len() {
            Some(self.slot_vector(slot))
        } else {
            None
        }
    }

    /// Returns the most recently inserted slot for `id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kvsearch::VectorIndex;
    ///
    /// let mut index = VectorIndex::new(1);
    /// index.insert("a", "one", &[1.0]).unwrap();
    /// index.insert("a", "two", &[2.0]).unwrap();
    ///
    /// assert_eq!(index.latest_slot(&"a".into()), Some(1));
    /// assert_eq!(index.latest_slot(&"b".into()), None);
    /// ```
    pub fn latest_slot(&self, id: &DocumentId) -> Option<usize> {
        self.latest.get(id).copied()
    }

    /// Iterates over `(slot, record)` in slot order.
    pub fn records(&self) -> impl Iterator<Item = (usize, &DocumentRecord)> {
        self.records.iter().enumerate()
    }

    /// Returns the number of stored vectors, which is also the next slot.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Slices the flat array for `index`. Caller guarantees `index < len()`.
    fn slot_vector(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.vectors[start..start + self.dimension]
    }
}

/// NaN of either sign ranks as +infinity: after every finite distance, score 0.
fn ranking_distance(dist: f32) -> f32 {
    if dist.is_nan() { f32::INFINITY } else { dist }
}

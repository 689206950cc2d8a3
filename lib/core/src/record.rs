use serde::{Deserialize, Serialize};
use crate::vector::Vector;

/// A document with its topic distribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: String,
    pub text: String,
    pub vector: Vector,
}

impl Record {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>, vector: Vector) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            vector,
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.vector.dim()
    }
}

/// Divergence between two records, identified by their external IDs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistanceEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "jsd")]
    pub score: f64,
}

/// Divergence between two corpus rows, identified by their 0-based indices.
/// Shards carry these instead of external IDs; see
/// [`ShardOutput::write_id_map`](crate::ShardOutput::write_id_map).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub row: usize,
    pub col: usize,
    pub score: f64,
}

/// A record paired with its score against some query
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub record: Record,
    pub score: f64,
}

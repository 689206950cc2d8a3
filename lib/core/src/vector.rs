use serde::{Deserialize, Serialize};

/// A topic-weight vector: one non-negative weight per latent topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Vector {
    data: Vec<f64>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f64]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Value of a single coordinate, `None` when out of range
    #[inline]
    pub fn get(&self, dim: usize) -> Option<f64> {
        self.data.get(dim).copied()
    }

    /// Manhattan (L1) distance
    #[inline]
    pub fn manhattan(&self, other: &Vector) -> f64 {
        crate::metric::manhattan(&self.data, &other.data)
    }
}

impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}

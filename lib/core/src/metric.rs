//! Dissimilarity functions over topic-weight vectors
//!
//! Every function takes two slices of equal length and returns a
//! non-negative score where `0.0` means identical. Mismatched lengths are
//! rejected when a [`Corpus`](crate::Corpus) is built, so the functions
//! here only zip over the shorter operand.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Manhattan (L1) distance
#[inline]
pub fn manhattan(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| (a - b).abs()).sum()
}

/// Manhattan distance with a per-dimension weight
#[inline]
pub fn weighted_manhattan(x: &[f64], y: &[f64], weights: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .zip(weights)
        .map(|((a, b), w)| (a - b).abs() * w)
        .sum()
}

/// Jensen-Shannon divergence
///
/// Both operands are compared against their midpoint `m = (x + y) / 2`.
/// A zero weight contributes nothing (`0 * ln 0` is taken as `0`).
/// Entries are assumed to be non-negative.
#[inline]
pub fn js_divergence(x: &[f64], y: &[f64]) -> f64 {
    let mut result = 0.0;
    for (&p, &q) in x.iter().zip(y) {
        let m = 0.5 * (p + q);
        if p != 0.0 {
            result += 0.5 * p * (p.ln() - m.ln());
        }
        if q != 0.0 {
            result += 0.5 * q * (q.ln() - m.ln());
        }
    }
    result
}

/// Distance metric used for neighbor retrieval and pairwise divergence
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Metric {
    #[default]
    Manhattan,
    WeightedManhattan(Arc<[f64]>),
    Jsd,
}

impl Metric {
    /// Resolve a configured metric name.
    ///
    /// Unset names select [`Metric::Manhattan`]; unknown names fall back to it
    /// as well, with a warning.
    pub fn from_config(name: Option<&str>) -> Self {
        match name {
            None => Metric::Manhattan,
            Some(name) => name.parse().unwrap_or_else(|e: Error| {
                warn!("{}, falling back to manhattan", e);
                Metric::Manhattan
            }),
        }
    }

    #[inline]
    pub fn distance(&self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            Metric::Manhattan => manhattan(x, y),
            Metric::WeightedManhattan(weights) => weighted_manhattan(x, y, weights),
            Metric::Jsd => js_divergence(x, y),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Manhattan => "manhattan",
            Metric::WeightedManhattan(_) => "weighted_manhattan",
            Metric::Jsd => "jsd",
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manhattan" => Ok(Metric::Manhattan),
            "jsd" | "js" => Ok(Metric::Jsd),
            _ => Err(Error::MetricConfiguration(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: [f64; 2] = [0.5, 0.5];
    const B: [f64; 2] = [0.3, 0.7];
    const C: [f64; 2] = [0.9, 0.1];

    #[test]
    fn test_self_distance_is_zero() {
        for v in [A, B, C] {
            assert_eq!(manhattan(&v, &v), 0.0);
            assert!(js_divergence(&v, &v).abs() < 1e-12);
        }
    }

    #[test]
    fn test_symmetry() {
        assert_eq!(manhattan(&A, &C), manhattan(&C, &A));
        assert!((js_divergence(&B, &C) - js_divergence(&C, &B)).abs() < 1e-12);
    }

    #[test]
    fn test_manhattan_values() {
        assert!((manhattan(&A, &B) - 0.4).abs() < 1e-12);
        assert!((manhattan(&A, &C) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_manhattan() {
        let d = weighted_manhattan(&A, &B, &[1.0, 0.0]);
        assert!((d - 0.2).abs() < 1e-12);
        assert!((weighted_manhattan(&A, &B, &[1.0, 1.0]) - manhattan(&A, &B)).abs() < 1e-12);
    }

    #[test]
    fn test_js_divergence_handles_zero_weights() {
        let p = [1.0, 0.0];
        let q = [0.0, 1.0];
        // Disjoint supports reach the upper bound ln 2
        assert!((js_divergence(&p, &q) - std::f64::consts::LN_2).abs() < 1e-12);
        assert!(js_divergence(&p, &q).is_finite());
        assert_eq!(js_divergence(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_js_divergence_non_negative() {
        assert!(js_divergence(&A, &B) > 0.0);
        assert!(js_divergence(&A, &C) > js_divergence(&A, &B));
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("manhattan".parse::<Metric>().unwrap(), Metric::Manhattan);
        assert_eq!("JSD".parse::<Metric>().unwrap(), Metric::Jsd);
        assert!(matches!(
            "cosine".parse::<Metric>(),
            Err(Error::MetricConfiguration(_))
        ));
    }

    #[test]
    fn test_metric_from_config_falls_back() {
        assert_eq!(Metric::from_config(None), Metric::Manhattan);
        assert_eq!(Metric::from_config(Some("jsd")), Metric::Jsd);
        assert_eq!(Metric::from_config(Some("euclid")), Metric::Manhattan);
    }

    #[test]
    fn test_metric_dispatch() {
        let weighted = Metric::WeightedManhattan(Arc::from(vec![2.0, 2.0]));
        assert!((weighted.distance(&A, &B) - 0.8).abs() < 1e-12);
        assert!((Metric::Jsd.distance(&A, &B) - js_divergence(&A, &B)).abs() < 1e-12);
    }
}

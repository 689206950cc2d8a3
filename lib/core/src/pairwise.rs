//! Exhaustive pairwise divergence over a corpus
//!
//! Only the upper triangle is visited: row `i` is scored against every row
//! `j > i`. Pairs scoring at or above the threshold are dropped.

use crate::{Corpus, DistanceEdge, Metric, PairScore, Result};
use serde::Serialize;
use std::ops::Range;

/// A contiguous range of source rows assigned to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub worker: usize,
    /// First row, inclusive
    pub start: usize,
    /// Last row, exclusive
    pub end: usize,
}

impl Partition {
    #[inline]
    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Split `[0, n)` into non-overlapping ranges of `ceil(n / workers)` rows.
///
/// The last range takes the remainder. Ranges that would be empty are not
/// returned, so the result may hold fewer than `workers` partitions.
pub fn partition(n: usize, workers: usize) -> Vec<Partition> {
    let workers = workers.max(1);
    let chunk = n.div_ceil(workers);

    (0..workers)
        .map(|worker| {
            let start = (worker * chunk).min(n);
            let end = if worker == workers - 1 {
                n
            } else {
                ((worker + 1) * chunk).min(n)
            };
            Partition { worker, start, end }
        })
        .filter(|p| !p.is_empty())
        .collect()
}

/// Score every pair `(i, j)` with `i` in `rows` and `j > i`, passing pairs
/// below `threshold` to `emit` in row-major order.
///
/// Pairs whose records share an external ID are skipped. Stops at the first
/// error returned by `emit`.
pub fn scan_rows<F>(
    corpus: &Corpus,
    rows: Range<usize>,
    metric: &Metric,
    threshold: f64,
    mut emit: F,
) -> Result<()>
where
    F: FnMut(PairScore) -> Result<()>,
{
    let records = corpus.as_slice();
    let rows = rows.start.min(records.len())..rows.end.min(records.len());

    for row in rows {
        let source = &records[row];
        for (col, target) in records.iter().enumerate().skip(row + 1) {
            if source.id == target.id {
                continue;
            }
            let score = metric.distance(source.vector.as_slice(), target.vector.as_slice());
            if score < threshold {
                emit(PairScore { row, col, score })?;
            }
        }
    }
    Ok(())
}

/// Single-pass divergence listing for the whole corpus, with external IDs
pub fn divergences(corpus: &Corpus, metric: &Metric, threshold: f64) -> Vec<DistanceEdge> {
    let records = corpus.as_slice();
    let mut edges = Vec::new();
    // The closure never fails
    let _ = scan_rows(corpus, 0..corpus.len(), metric, threshold, |pair| {
        edges.push(DistanceEdge {
            source: records[pair.row].id.clone(),
            target: records[pair.col].id.clone(),
            score: pair.score,
        });
        Ok(())
    });
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Record, Vector};
    use std::collections::HashSet;

    fn scenario() -> Corpus {
        Corpus::from_records(vec![
            Record::new("a", "", Vector::new(vec![0.5, 0.5])),
            Record::new("b", "", Vector::new(vec![0.3, 0.7])),
            Record::new("c", "", Vector::new(vec![0.9, 0.1])),
            Record::new("d", "", Vector::new(vec![0.25, 0.75])),
        ])
        .unwrap()
    }

    #[test]
    fn test_partition_even_split() {
        let parts = partition(10, 2);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].rows(), 0..5);
        assert_eq!(parts[1].rows(), 5..10);
    }

    #[test]
    fn test_partition_remainder_and_empty() {
        let parts = partition(10, 3);
        let ranges: Vec<_> = parts.iter().map(Partition::rows).collect();
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);

        // ceil(5 / 4) = 2 leaves the fourth worker nothing
        let parts = partition(5, 4);
        let ranges: Vec<_> = parts.iter().map(Partition::rows).collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..5]);

        assert!(partition(0, 3).is_empty());
        assert_eq!(partition(3, 0), vec![Partition { worker: 0, start: 0, end: 3 }]);
    }

    #[test]
    fn test_partitions_cover_rows_once() {
        for n in 0..40 {
            for workers in 1..9 {
                let parts = partition(n, workers);
                let mut next = 0;
                for p in &parts {
                    assert_eq!(p.start, next);
                    assert!(!p.is_empty());
                    next = p.end;
                }
                assert_eq!(next, n);
            }
        }
    }

    #[test]
    fn test_threshold_scenario() {
        let corpus = scenario();
        let edges = divergences(&corpus, &Metric::Manhattan, 0.41);
        let pairs: Vec<(&str, &str)> = edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        // b-d sits at 0.1 and also qualifies
        assert_eq!(pairs, vec![("a", "b"), ("b", "d")]);
        assert!((edges[0].score - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_unbounded_threshold_lists_every_pair() {
        let corpus = scenario();
        let edges = divergences(&corpus, &Metric::Jsd, f64::INFINITY);
        assert_eq!(edges.len(), 6);
        let unique: HashSet<(String, String)> = edges
            .into_iter()
            .map(|e| (e.source, e.target))
            .collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn test_partitioned_scan_matches_full_scan() {
        let corpus = scenario();
        let mut full = Vec::new();
        scan_rows(&corpus, 0..4, &Metric::Manhattan, f64::INFINITY, |p| {
            full.push((p.row, p.col));
            Ok(())
        })
        .unwrap();

        let mut split = Vec::new();
        for part in partition(corpus.len(), 3) {
            scan_rows(&corpus, part.rows(), &Metric::Manhattan, f64::INFINITY, |p| {
                split.push((p.row, p.col));
                Ok(())
            })
            .unwrap();
        }
        assert_eq!(full, split);
    }

    #[test]
    fn test_duplicate_ids_are_skipped() {
        let corpus = Corpus::from_records(vec![
            Record::new("a", "", Vector::new(vec![0.5, 0.5])),
            Record::new("a", "", Vector::new(vec![0.4, 0.6])),
        ])
        .unwrap();
        assert!(divergences(&corpus, &Metric::Manhattan, f64::INFINITY).is_empty());
    }

    #[test]
    fn test_scan_stops_on_emit_error() {
        let corpus = scenario();
        let mut seen = 0;
        let result = scan_rows(&corpus, 0..4, &Metric::Manhattan, f64::INFINITY, |_| {
            seen += 1;
            Err(crate::Error::StorageWrite("disk full".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(seen, 1);
    }
}

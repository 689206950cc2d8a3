//! Bounded top-k selection over a record stream
//!
//! Both selectors keep a fixed-size buffer filled with the first records
//! seen. Every later record is compared against the buffer's current worst
//! entry, found by a linear scan where the lowest slot wins ties, and takes
//! its slot only when strictly better. The buffer is stably sorted at the
//! end, so equal scores keep the order in which they entered the buffer.
//! For a fixed iteration order the result is fully deterministic.

use crate::{Error, Metric, Record, Result, Scored};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Which end of the ranking a [`BoundedSelector`] keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    /// Lowest keys, reported ascending
    Smallest,
    /// Highest keys, reported descending
    Largest,
}

impl Keep {
    /// Ordering of `a` relative to `b` where `Less` means "better"
    #[inline]
    fn rank(self, a: f64, b: f64) -> Ordering {
        match self {
            Keep::Smallest => a.total_cmp(&b),
            Keep::Largest => b.total_cmp(&a),
        }
    }
}

/// Fixed-capacity buffer that retains the best `capacity` items offered
pub struct BoundedSelector<T> {
    capacity: usize,
    keep: Keep,
    slots: Vec<(T, f64)>,
}

impl<T> BoundedSelector<T> {
    pub fn new(capacity: usize, keep: Keep) -> Self {
        Self {
            capacity,
            keep,
            slots: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot holding the worst key; the first one found on ties
    fn worst_slot(&self) -> Option<usize> {
        let mut worst: Option<(usize, f64)> = None;
        for (idx, (_, key)) in self.slots.iter().enumerate() {
            match worst {
                Some((_, current)) if self.keep.rank(*key, current) != Ordering::Greater => {}
                _ => worst = Some((idx, *key)),
            }
        }
        worst.map(|(idx, _)| idx)
    }

    /// Offer an item. Returns `true` when the item was retained.
    pub fn offer(&mut self, item: T, key: f64) -> bool {
        if self.slots.len() < self.capacity {
            self.slots.push((item, key));
            return true;
        }

        match self.worst_slot() {
            Some(idx) if self.keep.rank(key, self.slots[idx].1) == Ordering::Less => {
                self.slots[idx] = (item, key);
                true
            }
            _ => false,
        }
    }

    /// Consume the buffer, best entry first
    pub fn into_sorted(mut self) -> Vec<(T, f64)> {
        let keep = self.keep;
        self.slots.sort_by(|a, b| keep.rank(a.1, b.1));
        self.slots
    }
}

/// The `count + 1` records closest to `query`, ascending by distance.
///
/// `count` is the number of neighbors wanted besides the query's own record,
/// which comes first with distance `0` when it is part of `records`. Fewer
/// entries are returned only when the stream itself is shorter.
pub fn nearest<'a, I>(query: &[f64], records: I, count: usize, metric: &Metric) -> Vec<Scored>
where
    I: IntoIterator<Item = Cow<'a, Record>>,
{
    closest(query, records, count + 1, metric)
}

/// The `k` records closest to `query`, ascending by distance
pub fn closest<'a, I>(query: &[f64], records: I, k: usize, metric: &Metric) -> Vec<Scored>
where
    I: IntoIterator<Item = Cow<'a, Record>>,
{
    let mut selector = BoundedSelector::new(k, Keep::Smallest);
    for record in records {
        let distance = metric.distance(query, record.vector.as_slice());
        selector.offer(record, distance);
    }

    selector
        .into_sorted()
        .into_iter()
        .map(|(record, score)| Scored {
            record: record.into_owned(),
            score,
        })
        .collect()
}

/// The `count` records with the highest weight on coordinate `dim`,
/// descending by that weight.
pub fn top_by_dimension<'a, I>(records: I, dim: usize, count: usize) -> Result<Vec<Scored>>
where
    I: IntoIterator<Item = Cow<'a, Record>>,
{
    let mut selector = BoundedSelector::new(count, Keep::Largest);
    for record in records {
        let value = record.vector.get(dim).ok_or(Error::TopicOutOfRange {
            topic: dim + 1,
            topics: record.dim(),
        })?;
        selector.offer(record, value);
    }

    Ok(selector
        .into_sorted()
        .into_iter()
        .map(|(record, score)| Scored {
            record: record.into_owned(),
            score,
        })
        .collect())
}

/// Coordinates of `values` holding the `n` highest weights, descending
pub fn dominant_dimensions(values: &[f64], n: usize) -> Vec<(usize, f64)> {
    let mut selector = BoundedSelector::new(n, Keep::Largest);
    for (dim, &value) in values.iter().enumerate() {
        selector.offer(dim, value);
    }
    selector.into_sorted()
}

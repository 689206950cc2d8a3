//! Single-query operations over a [`VectorStore`]

use crate::store::VectorStore;
use crate::topk;
use crate::{Error, Metric, Record, Result, Scored};
use serde::Serialize;

/// Best topics are drawn from this many leading coordinates
const BEST_TOPICS: usize = 3;
/// Scaled weight a best topic must exceed to be reported
const BEST_TOPIC_FLOOR: f64 = 5.0;

/// A query record and its nearest neighbors.
///
/// `neighbors[0]` is always the query itself at distance `0`, followed by
/// the closest other records.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    pub query: Record,
    pub neighbors: Vec<Scored>,
}

/// Look up `urn` and return it with its `count` nearest neighbors
pub fn nearest_neighbors(
    store: &dyn VectorStore,
    urn: &str,
    count: usize,
    metric: &Metric,
) -> Result<Neighborhood> {
    let query = store.get(urn)?;
    let available = store.len()?;
    let requested = count.saturating_add(1);
    if available < requested {
        return Err(Error::InsufficientCorpusSize {
            requested,
            available,
        });
    }

    // Records sharing the query's vector must not displace it from rank 0
    let others = store.records()?.filter(|record| record.id != query.id);
    let mut neighbors = Vec::with_capacity(requested);
    neighbors.push(Scored {
        record: query.clone(),
        score: 0.0,
    });
    neighbors.extend(topk::closest(query.vector.as_slice(), others, count, metric));
    Ok(Neighborhood { query, neighbors })
}

/// The `count` records weighing most on `topic`, which is 1-based
pub fn top_by_topic(store: &dyn VectorStore, topic: usize, count: usize) -> Result<Vec<Scored>> {
    let topics = store.dim();
    if topic == 0 || topic > topics {
        return Err(Error::TopicOutOfRange { topic, topics });
    }
    let available = store.len()?;
    if available < count {
        return Err(Error::InsufficientCorpusSize {
            requested: count,
            available,
        });
    }

    topk::top_by_dimension(store.records()?, topic - 1, count)
}

/// A topic with a weight scaled for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicWeight {
    /// 1-based topic number
    pub topic: usize,
    pub label: String,
    pub value: f64,
}

impl TopicWeight {
    fn new(dim: usize, labels: &[String], value: f64) -> Self {
        Self {
            topic: dim + 1,
            label: labels.get(dim).cloned().unwrap_or_default(),
            value,
        }
    }
}

/// Up to three dominant topics of `record`, scaled by `dim_weight`, that
/// exceed five percent
pub fn best_topics(record: &Record, labels: &[String], dim_weight: f64) -> Vec<TopicWeight> {
    topk::dominant_dimensions(record.vector.as_slice(), BEST_TOPICS)
        .into_iter()
        .map(|(dim, value)| (dim, value * dim_weight))
        .filter(|&(_, scaled)| scaled > BEST_TOPIC_FLOOR)
        .map(|(dim, scaled)| TopicWeight::new(dim, labels, scaled))
        .collect()
}

/// Topics on which `record` and `query` differ by more than `significance`
pub fn significant_differences(
    record: &Record,
    query: &Record,
    labels: &[String],
    significance: f64,
    dim_weight: f64,
) -> Vec<TopicWeight> {
    record
        .vector
        .as_slice()
        .iter()
        .zip(query.vector.as_slice())
        .enumerate()
        .filter_map(|(dim, (a, b))| {
            let diff = (a - b).abs();
            (diff > significance).then(|| TopicWeight::new(dim, labels, diff * dim_weight))
        })
        .collect()
}

/// One neighbor annotated for display
#[derive(Debug, Clone, Serialize)]
pub struct NeighborDetail {
    pub rank: usize,
    pub id: String,
    pub text: String,
    pub distance: f64,
    pub best_topics: Vec<TopicWeight>,
    /// Empty for the query itself
    pub significant: Vec<TopicWeight>,
}

/// Annotate every neighbor with its best topics and its significant
/// differences to the query
pub fn neighbor_details(
    neighborhood: &Neighborhood,
    labels: &[String],
    significance: f64,
    dim_weight: f64,
) -> Vec<NeighborDetail> {
    neighborhood
        .neighbors
        .iter()
        .enumerate()
        .map(|(rank, scored)| {
            let significant = if rank == 0 {
                Vec::new()
            } else {
                significant_differences(
                    &scored.record,
                    &neighborhood.query,
                    labels,
                    significance,
                    dim_weight,
                )
            };
            NeighborDetail {
                rank,
                id: scored.record.id.clone(),
                text: scored.record.text.clone(),
                distance: scored.score,
                best_topics: best_topics(&scored.record, labels, dim_weight),
                significant,
            }
        })
        .collect()
}

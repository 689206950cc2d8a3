//! # Metallo Core
//!
//! Distance and ranking engine for topic-model document vectors.
//!
//! This crate provides:
//!
//! - [`Metric`] - Manhattan, weighted Manhattan and Jensen-Shannon divergence
//! - [`topk`] - bounded nearest-neighbor and top-by-topic selection
//! - [`pairwise`] - exhaustive triangular divergence with threshold filtering
//! - [`export`] - the parallel, sharded full-corpus export
//! - [`Corpus`] - an immutable in-memory [`VectorStore`]
//!
//! ## Example
//!
//! ```rust
//! use metallo_core::{Corpus, Metric, Record, Vector};
//! use metallo_core::retrieval::nearest_neighbors;
//!
//! let corpus = Corpus::from_records(vec![
//!     Record::new("a", "first", Vector::new(vec![0.5, 0.5])),
//!     Record::new("b", "second", Vector::new(vec![0.3, 0.7])),
//!     Record::new("c", "third", Vector::new(vec![0.9, 0.1])),
//! ]).unwrap();
//!
//! let hood = nearest_neighbors(&corpus, "a", 1, &Metric::Manhattan).unwrap();
//! assert_eq!(hood.neighbors[1].record.id, "b");
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod export;
pub mod metric;
pub mod pairwise;
pub mod record;
pub mod retrieval;
pub mod shard;
pub mod store;
pub mod topk;
pub mod vector;

pub use config::MetalloConfig;
pub use corpus::Corpus;
pub use error::{Error, Result};
pub use export::{export, ExportOptions, ExportSummary, WorkerReport};
pub use metric::Metric;
pub use pairwise::{divergences, Partition};
pub use record::{DistanceEdge, PairScore, Record, Scored};
pub use shard::{MemoryOutput, Shard, ShardOutput, ShardWriter};
pub use store::{RecordIter, VectorStore};
pub use vector::Vector;

//! # Metallo
//!
//! A distance engine for documents represented as topic-weight vectors.
//!
//! Metallo answers three kinds of questions over a corpus of passages:
//!
//! - which passages are closest to a given one (Manhattan or
//!   Jensen-Shannon distance, bounded top-k selection)
//! - which passages weigh most on a given topic
//! - which pairs of passages fall below a divergence threshold, either as a
//!   list or as a sharded CSV export produced by a pool of workers
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! metallo --config config.json --load-db
//! curl http://localhost:8000/view/urn:cts:latinLit:phi0690.phi003.perseus-lat2:1.1/5/json
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use metallo::prelude::*;
//!
//! let corpus = Corpus::from_records(vec![
//!     Record::new("a", "alpha", Vector::new(vec![0.5, 0.5])),
//!     Record::new("b", "beta", Vector::new(vec![0.3, 0.7])),
//!     Record::new("c", "gamma", Vector::new(vec![0.9, 0.1])),
//! ]).unwrap();
//!
//! let hood = nearest_neighbors(&corpus, "a", 1, &Metric::Manhattan).unwrap();
//! assert_eq!(hood.neighbors[1].record.id, "b");
//! ```
//!
//! ## Crate Structure
//!
//! - [`metallo-core`](https://docs.rs/metallo-core) - Metrics, top-k selection, pairwise scan, sharded export
//! - [`metallo-storage`](https://docs.rs/metallo-storage) - CSV ingestion, LMDB persistence, shard files
//! - [`metallo-api`](https://docs.rs/metallo-api) - REST API

// Re-export core types
pub use metallo_core::{
    divergences, export, Corpus, DistanceEdge, Error, ExportOptions, ExportSummary,
    MetalloConfig, Metric, Record, Result, Scored, ShardOutput, Vector, VectorStore,
};
pub use metallo_core::retrieval::{nearest_neighbors, top_by_topic, Neighborhood};

// Re-export storage
pub use metallo_storage::{LmdbStore, ShardDirectory, SourceData, StorageManager};

// Re-export API
pub use metallo_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        divergences, export, nearest_neighbors, top_by_topic, Corpus, DistanceEdge, Error,
        ExportOptions, ExportSummary, MetalloConfig, Metric, Neighborhood, Record, Result,
        Scored, ShardDirectory, StorageManager, Vector, VectorStore,
        RestApi,
    };
}

//! Parallel full-corpus export
//!
//! The corpus rows are split into contiguous partitions, one scoped thread
//! per partition. Workers share the corpus read-only and each owns its own
//! [`ShardWriter`], so nothing is locked while scoring. The ID map is written
//! once before any worker starts. Every worker reports its own outcome;
//! a failing worker never stops its siblings.

use crate::pairwise::{self, Partition};
use crate::shard::{ShardOutput, ShardWriter};
use crate::{Corpus, Error, MetalloConfig, Metric, Result};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::thread;
use tracing::{error, info, warn};

/// Parameters of one export run
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub metric: Metric,
    /// Pairs scoring at or above this value are dropped
    pub threshold: f64,
    /// Edges per shard
    pub shard_capacity: NonZeroUsize,
    /// Number of partitions to scan in parallel
    pub workers: usize,
}

impl ExportOptions {
    pub fn from_config(config: &MetalloConfig, corpus_len: usize) -> Self {
        Self {
            metric: config.divergence_metric(),
            threshold: config.div_max,
            shard_capacity: config.shard_capacity(corpus_len),
            workers: config.workers.unwrap_or_else(default_workers),
        }
    }
}

/// One less than the available cores, leaving room for the server, but at
/// least one
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// Outcome of a single worker
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    pub partition: Partition,
    /// Shards sealed and written, in order
    pub shards: Vec<String>,
    pub edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerReport {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole export, one report per partition
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub rows: usize,
    pub workers: Vec<WorkerReport>,
}

impl ExportSummary {
    /// True when every partition finished without error
    pub fn is_complete(&self) -> bool {
        self.workers.iter().all(WorkerReport::is_ok)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &WorkerReport> {
        self.workers.iter().filter(|w| w.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &WorkerReport> {
        self.workers.iter().filter(|w| !w.is_ok())
    }

    pub fn total_edges(&self) -> usize {
        self.workers.iter().map(|w| w.edges).sum()
    }

    pub fn total_shards(&self) -> usize {
        self.workers.iter().map(|w| w.shards.len()).sum()
    }
}

/// Score every pair of the corpus in parallel and write the surviving
/// edges as shards.
///
/// Fails only when the ID map cannot be written; worker failures are
/// reported in the returned summary.
pub fn export(
    corpus: &Corpus,
    output: &dyn ShardOutput,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    output.write_id_map(corpus).map_err(|e| match e {
        Error::StorageWrite(_) => e,
        other => Error::StorageWrite(other.to_string()),
    })?;

    let partitions = pairwise::partition(corpus.len(), options.workers);
    info!(
        "Exporting {} rows with {} workers ({} metric, threshold {})",
        corpus.len(),
        partitions.len(),
        options.metric,
        options.threshold
    );

    let workers = thread::scope(|scope| {
        let handles: Vec<_> = partitions
            .iter()
            .map(|&partition| {
                let handle = thread::Builder::new()
                    .name(format!("export-worker-{}", partition.worker))
                    .spawn_scoped(scope, move || run_worker(corpus, output, options, partition));
                (partition, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(partition, handle)| {
                let joined = match handle {
                    Ok(handle) => handle
                        .join()
                        .map_err(|_| Error::WorkerPanicked(partition.worker)),
                    Err(e) => Err(Error::Io(e)),
                };
                joined.unwrap_or_else(|e| {
                    error!("Worker {} did not finish: {}", partition.worker, e);
                    WorkerReport {
                        partition,
                        shards: Vec::new(),
                        edges: 0,
                        error: Some(e.to_string()),
                    }
                })
            })
            .collect::<Vec<_>>()
    });

    let summary = ExportSummary {
        rows: corpus.len(),
        workers,
    };
    if summary.is_complete() {
        info!(
            "Export finished: {} edges in {} shards",
            summary.total_edges(),
            summary.total_shards()
        );
    } else {
        warn!(
            "Export finished with {} failed partition(s)",
            summary.failed().count()
        );
    }
    Ok(summary)
}

fn run_worker(
    corpus: &Corpus,
    output: &dyn ShardOutput,
    options: &ExportOptions,
    partition: Partition,
) -> WorkerReport {
    info!(
        "Worker {} scanning rows {}..{}",
        partition.worker, partition.start, partition.end
    );

    let mut writer = ShardWriter::new(
        partition.worker,
        output,
        options.shard_capacity,
        corpus.len(),
        partition.start,
    );
    let result = pairwise::scan_rows(
        corpus,
        partition.rows(),
        &options.metric,
        options.threshold,
        |pair| writer.push(pair),
    )
    .and_then(|()| writer.finish(partition.end));

    let error = match result {
        Ok(()) => {
            info!(
                "Worker {} done: {} edges in {} shards",
                partition.worker,
                writer.edges_written(),
                writer.shards().len()
            );
            None
        }
        Err(e) => {
            error!("Worker {} failed: {}", partition.worker, e);
            Some(e.to_string())
        }
    };

    WorkerReport {
        partition,
        shards: writer.shards().to_vec(),
        edges: writer.edges_written(),
        error,
    }
}

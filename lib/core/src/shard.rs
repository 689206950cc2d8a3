//! Size-bounded output segments for the pairwise export
//!
//! Each export worker owns one [`ShardWriter`]. Edges are buffered until the
//! configured capacity is reached, then sealed into a [`Shard`] and handed to
//! a [`ShardOutput`]. The remainder is always sealed when the worker's range
//! is exhausted, even when it is empty.

use crate::{Corpus, PairScore, Result};
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroUsize;
use tracing::debug;

/// A position in the pair matrix, 1-based as written to shard files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    fn of(pair: &PairScore) -> Self {
        Self {
            row: pair.row + 1,
            col: pair.col + 1,
        }
    }

    /// The next cell of the upper triangle of an `n`-row matrix
    fn successor(self, n: usize) -> Self {
        if self.col < n {
            Self {
                row: self.row,
                col: self.col + 1,
            }
        } else {
            Self {
                row: self.row + 1,
                col: self.row + 2,
            }
        }
    }
}

/// Where a shard stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShardEnd {
    /// Sealed on capacity right after this cell
    Cell(Cell),
    /// Sealed at the end of the worker's range, after the last cell of `row`
    RowEnd(usize),
}

/// A sealed, ordered run of edges covering the cells `from..=to`
#[derive(Debug, Clone, PartialEq)]
pub struct Shard {
    pub worker: usize,
    pub from: Cell,
    pub to: ShardEnd,
    pub edges: Vec<PairScore>,
}

impl Shard {
    /// File name encoding the covered range, e.g. `fromRow1Col2ToRow3End.csv`
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fromRow{}Col{}To", self.from.row, self.from.col)?;
        match self.to {
            ShardEnd::Cell(cell) => write!(f, "Row{}Col{}.csv", cell.row, cell.col),
            ShardEnd::RowEnd(row) => write!(f, "Row{}End.csv", row),
        }
    }
}

/// Destination for the export's ID map and shards
pub trait ShardOutput: Send + Sync {
    /// Persist the mapping from 1-based row number to external ID
    fn write_id_map(&self, corpus: &Corpus) -> Result<()>;

    /// Persist one sealed shard
    fn write_shard(&self, shard: &Shard) -> Result<()>;
}

/// Per-worker shard buffer
pub struct ShardWriter<'o> {
    worker: usize,
    output: &'o dyn ShardOutput,
    capacity: NonZeroUsize,
    rows: usize,
    start: Cell,
    edges: Vec<PairScore>,
    sealed: Vec<String>,
    edges_written: usize,
}

impl<'o> ShardWriter<'o> {
    /// Writer for a worker whose range begins at 0-based `first_row` of a
    /// corpus of `rows` records
    pub fn new(
        worker: usize,
        output: &'o dyn ShardOutput,
        capacity: NonZeroUsize,
        rows: usize,
        first_row: usize,
    ) -> Self {
        Self {
            worker,
            output,
            capacity,
            rows,
            start: Cell {
                row: first_row + 1,
                col: first_row + 2,
            },
            edges: Vec::with_capacity(capacity.get().min(64 * 1024)),
            sealed: Vec::new(),
            edges_written: 0,
        }
    }

    /// Append an edge, sealing the shard when it reaches capacity
    pub fn push(&mut self, pair: PairScore) -> Result<()> {
        self.edges.push(pair);
        if self.edges.len() >= self.capacity.get() {
            let last = Cell::of(&pair);
            self.seal(ShardEnd::Cell(last))?;
            self.start = last.successor(self.rows);
        }
        Ok(())
    }

    /// Seal whatever is buffered as the worker's final shard. `end_row` is
    /// the exclusive 0-based end of the worker's range.
    ///
    /// When a capacity seal already consumed the range's last cell, the
    /// empty tail starts one column past the matrix on the range's last
    /// row, e.g. `fromRow1Col3ToRow1End.csv` for a two-row corpus.
    pub fn finish(&mut self, end_row: usize) -> Result<()> {
        if self.start.row > end_row {
            self.start = Cell {
                row: end_row,
                col: self.rows + 1,
            };
        }
        self.seal(ShardEnd::RowEnd(end_row))
    }

    /// Names of the shards sealed so far
    pub fn shards(&self) -> &[String] {
        &self.sealed
    }

    pub fn edges_written(&self) -> usize {
        self.edges_written
    }

    fn seal(&mut self, to: ShardEnd) -> Result<()> {
        let shard = Shard {
            worker: self.worker,
            from: self.start,
            to,
            edges: std::mem::take(&mut self.edges),
        };
        self.output.write_shard(&shard)?;

        let name = shard.name();
        debug!("Worker {} sealed {} ({} edges)", self.worker, name, shard.edges.len());
        self.edges_written += shard.edges.len();
        self.sealed.push(name);
        Ok(())
    }
}

/// Keeps the ID map and shards in memory
#[derive(Default)]
pub struct MemoryOutput {
    id_map: Mutex<Vec<(usize, String)>>,
    shards: Mutex<Vec<Shard>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_map(&self) -> Vec<(usize, String)> {
        self.id_map.lock().clone()
    }

    /// All shards received so far, ordered by worker then by sealing order
    pub fn shards(&self) -> Vec<Shard> {
        let mut shards = self.shards.lock().clone();
        shards.sort_by_key(|s| s.worker);
        shards
    }
}

impl ShardOutput for MemoryOutput {
    fn write_id_map(&self, corpus: &Corpus) -> Result<()> {
        *self.id_map.lock() = corpus
            .iter()
            .enumerate()
            .map(|(idx, record)| (idx + 1, record.id.clone()))
            .collect();
        Ok(())
    }

    fn write_shard(&self, shard: &Shard) -> Result<()> {
        self.shards.lock().push(shard.clone());
        Ok(())
    }
}

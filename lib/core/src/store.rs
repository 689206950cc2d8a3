use crate::{Record, Result};
use std::borrow::Cow;

/// Iterator over the records of a store, in its stable iteration order
pub type RecordIter<'a> = Box<dyn Iterator<Item = Cow<'a, Record>> + 'a>;

/// Read-only access to a corpus of records.
///
/// Iteration order must be stable for the lifetime of the store so that
/// repeated queries and exports see the same row numbering.
pub trait VectorStore: Send + Sync {
    /// Iterate over all records in order
    fn records(&self) -> Result<RecordIter<'_>>;

    /// Look up one record by its external ID
    fn get(&self, id: &str) -> Result<Record>;

    /// Number of records
    fn len(&self) -> Result<usize>;

    /// Dimensionality shared by every record
    fn dim(&self) -> usize;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

use crate::store::{RecordIter, VectorStore};
use crate::{Error, Record, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable, ordered set of records sharing one dimensionality.
///
/// Cloning is cheap; all clones share the same records. This is the handle
/// passed to every retrieval and export operation.
#[derive(Clone, Debug)]
pub struct Corpus {
    inner: Arc<CorpusInner>,
}

#[derive(Debug)]
struct CorpusInner {
    dim: usize,
    records: Vec<Record>,
    positions: HashMap<String, usize>,
}

impl Corpus {
    /// Build a corpus, rejecting any record whose vector is not `dim` long
    pub fn new(dim: usize, records: Vec<Record>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if record.dim() != dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: record.dim(),
                });
            }
            // First occurrence wins for lookups by ID
            positions.entry(record.id.clone()).or_insert(idx);
        }

        Ok(Self {
            inner: Arc::new(CorpusInner {
                dim,
                records,
                positions,
            }),
        })
    }

    /// Build a corpus whose dimensionality is taken from the first record
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let dim = records.first().map(Record::dim).unwrap_or(0);
        Self::new(dim, records)
    }

    /// Materialize any store into memory, keeping its iteration order
    pub fn from_store(store: &dyn VectorStore) -> Result<Self> {
        let records = store.records()?.map(Cow::into_owned).collect();
        Self::new(store.dim(), records)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.records.is_empty()
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.inner.dim
    }

    #[inline]
    pub fn as_slice(&self) -> &[Record] {
        &self.inner.records
    }

    #[inline]
    pub fn row(&self, idx: usize) -> Option<&Record> {
        self.inner.records.get(idx)
    }

    /// Row index of the record with the given external ID
    #[inline]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.inner.positions.get(id).copied()
    }

    pub fn find(&self, id: &str) -> Option<&Record> {
        self.position(id).map(|idx| &self.inner.records[idx])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.inner.records.iter()
    }
}

impl VectorStore for Corpus {
    fn records(&self) -> Result<RecordIter<'_>> {
        Ok(Box::new(self.iter().map(Cow::Borrowed)))
    }

    fn get(&self, id: &str) -> Result<Record> {
        self.find(id)
            .cloned()
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    fn len(&self) -> Result<usize> {
        Ok(Corpus::len(self))
    }

    fn dim(&self) -> usize {
        Corpus::dim(self)
    }
}

// LMDB-backed record store, for corpora that should survive restarts
use crate::csv_source::SourceData;
use anyhow::{Context, Result};
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use metallo_core::{Error, Record, RecordIter, VectorStore};
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

const DB_RECORDS: &str = "records";
const DB_META: &str = "meta";
const META_TOPICS: &str = "topics";

/// Records keyed by external ID, bincode-encoded. Iteration follows key
/// order, which is stable for the lifetime of the environment.
pub struct LmdbStore {
    env: Arc<Env>,
    records_db: Database<Str, Bytes>,
    meta_db: Database<Str, Bytes>,
    topics: Vec<String>,
}

impl LmdbStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::create_dir_all(&path)?;

        let env = Arc::new(unsafe {
            EnvOpenOptions::new()
                .map_size(16 * 1024 * 1024 * 1024) // 16GB
                .max_dbs(4)
                .open(path)?
        });

        let mut wtxn = env.write_txn()?;
        let records_db = env.create_database(&mut wtxn, Some(DB_RECORDS))?;
        let meta_db: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(DB_META))?;
        let topics = match meta_db.get(&wtxn, META_TOPICS)? {
            Some(raw) => bincode::deserialize(raw).context("decoding topic labels")?,
            None => Vec::new(),
        };
        wtxn.commit()?;

        Ok(Self {
            env,
            records_db,
            meta_db,
            topics,
        })
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Replace the whole content with `data`. Records whose ID was already
    /// seen are skipped.
    pub fn rebuild(&mut self, data: &SourceData) -> Result<usize> {
        let mut wtxn = self.env.write_txn()?;
        self.records_db.clear(&mut wtxn)?;

        let mut written = 0;
        for record in &data.records {
            if self.records_db.get(&wtxn, &record.id)?.is_some() {
                warn!("Record {} exists already, skipping", record.id);
                continue;
            }
            let encoded = bincode::serialize(record)?;
            self.records_db.put(&mut wtxn, &record.id, &encoded)?;
            written += 1;
        }

        let topics = bincode::serialize(&data.topics)?;
        self.meta_db.put(&mut wtxn, META_TOPICS, &topics)?;
        wtxn.commit()?;

        self.topics = data.topics.clone();
        info!("Wrote {} records to the database", written);
        Ok(written)
    }

    pub fn get_record(&self, id: &str) -> Result<Option<Record>> {
        let rtxn = self.env.read_txn()?;
        match self.records_db.get(&rtxn, id)? {
            Some(raw) => Ok(Some(bincode::deserialize(raw)?)),
            None => Ok(None),
        }
    }

    pub fn all_records(&self) -> Result<Vec<Record>> {
        let rtxn = self.env.read_txn()?;
        let mut records = Vec::new();
        for entry in self.records_db.iter(&rtxn)? {
            let (id, raw) = entry?;
            let record: Record =
                bincode::deserialize(raw).with_context(|| format!("decoding record {}", id))?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn count(&self) -> Result<usize> {
        let rtxn = self.env.read_txn()?;
        Ok(self.records_db.len(&rtxn)? as usize)
    }
}

fn read_error(e: anyhow::Error) -> Error {
    Error::StorageRead(format!("{:#}", e))
}

impl VectorStore for LmdbStore {
    fn records(&self) -> metallo_core::Result<RecordIter<'_>> {
        let records = self.all_records().map_err(read_error)?;
        Ok(Box::new(records.into_iter().map(Cow::Owned)))
    }

    fn get(&self, id: &str) -> metallo_core::Result<Record> {
        self.get_record(id)
            .map_err(read_error)?
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    fn len(&self) -> metallo_core::Result<usize> {
        self.count().map_err(read_error)
    }

    fn dim(&self) -> usize {
        self.topics.len()
    }
}

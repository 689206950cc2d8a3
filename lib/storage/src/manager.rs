use crate::csv_source::{self, SourceData};
use crate::lmdb_store::LmdbStore;
use crate::shard_dir::ShardDirectory;
use metallo_core::{Corpus, Error, MetalloConfig, Result, VectorStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Owns the configured record store and the topic labels.
///
/// The store is read-only once opened. The pairwise paths need random
/// access, so they work on a [`Corpus`] snapshot which, for an LMDB
/// backing, is materialized on first use and then reused.
pub struct StorageManager {
    store: Arc<dyn VectorStore>,
    topics: Arc<[String]>,
    corpus: Mutex<Option<Corpus>>,
}

impl StorageManager {
    /// Open the backing selected by `config.db`.
    ///
    /// With LMDB, `rebuild` reloads the database from the source file;
    /// otherwise the existing database is reused. The in-memory backing
    /// always reads the source.
    pub async fn open(config: &MetalloConfig, rebuild: bool) -> Result<Self> {
        if config.db {
            let path = config.data_dir.join("lmdb");
            let mut lmdb = LmdbStore::open(&path).map_err(storage_read)?;
            if rebuild {
                info!("(Re-)building the database at {:?}", path);
                let data = csv_source::load(config).await.map_err(storage_read)?;
                lmdb.rebuild(&data)
                    .map_err(|e| Error::StorageWrite(format!("{:#}", e)))?;
            } else {
                info!("Starting without re-building the database");
                if lmdb.count().map_err(storage_read)? == 0 {
                    warn!("Database at {:?} is empty, start with --load-db to fill it", path);
                }
            }
            let topics: Arc<[String]> = Arc::from(lmdb.topics());
            Ok(Self {
                store: Arc::new(lmdb),
                topics,
                corpus: Mutex::new(None),
            })
        } else {
            info!("Starting without a database, keeping records in memory");
            let data = csv_source::load(config).await.map_err(storage_read)?;
            Self::from_source(data)
        }
    }

    /// In-memory manager over already parsed source data
    pub fn from_source(data: SourceData) -> Result<Self> {
        let corpus = Corpus::new(data.dim(), data.records)?;
        Ok(Self::from_corpus(corpus, data.topics))
    }

    pub fn from_corpus(corpus: Corpus, topics: Vec<String>) -> Self {
        Self {
            store: Arc::new(corpus.clone()),
            topics: Arc::from(topics),
            corpus: Mutex::new(Some(corpus)),
        }
    }

    #[inline]
    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    #[inline]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Random-access snapshot of the store, in its iteration order
    pub fn corpus(&self) -> Result<Corpus> {
        let mut cached = self.corpus.lock();
        if let Some(corpus) = cached.as_ref() {
            return Ok(corpus.clone());
        }
        let corpus = Corpus::from_store(self.store.as_ref())?;
        info!("Materialized {} records for pairwise scoring", corpus.len());
        *cached = Some(corpus.clone());
        Ok(corpus)
    }

    /// Shard output rooted at the configured output directory
    pub fn shard_directory(&self, config: &MetalloConfig) -> Result<ShardDirectory> {
        ShardDirectory::new(&config.output_dir)
            .map_err(|e| Error::StorageWrite(format!("{:#}", e)))
    }
}

fn storage_read(e: anyhow::Error) -> Error {
    Error::StorageRead(format!("{:#}", e))
}

pub mod csv_source;
pub mod lmdb_store;
pub mod manager;
pub mod shard_dir;

pub use csv_source::SourceData;
pub use lmdb_store::LmdbStore;
pub use manager::StorageManager;
pub use shard_dir::ShardDirectory;

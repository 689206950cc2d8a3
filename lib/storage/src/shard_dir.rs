// Directory output for the sharded export
use anyhow::{Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use metallo_core::{Corpus, Error, Shard, ShardOutput};
use std::fs::File;
use std::path::{Path, PathBuf};

pub const ID_MAP_FILE: &str = "mapID.csv";
const ID_MAP_HEADER: [&str; 2] = ["MetalloID", "OriginalID"];
const SHARD_HEADER: [&str; 3] = ["Source", "Target", "JSD"];

/// Writes the ID map and every shard as CSV files into one directory.
///
/// Each file is written to a temporary name and renamed into place, so a
/// worker failing midway never leaves a truncated shard behind.
pub struct ShardDirectory {
    dir: PathBuf,
}

impl ShardDirectory {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {:?}", dir))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn write_csv<F>(&self, name: &str, fill: F) -> Result<()>
    where
        F: FnOnce(&mut csv::Writer<&mut File>) -> csv::Result<()>,
    {
        let path = self.dir.join(name);
        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|file| {
                let mut writer = csv::Writer::from_writer(file);
                fill(&mut writer)?;
                writer.flush()?;
                Ok::<(), csv::Error>(())
            })
            .with_context(|| format!("writing {:?}", path))
    }

    pub fn write_id_map_file(&self, corpus: &Corpus) -> Result<()> {
        self.write_csv(ID_MAP_FILE, |writer| {
            writer.write_record(ID_MAP_HEADER)?;
            for (idx, record) in corpus.iter().enumerate() {
                writer.write_record([(idx + 1).to_string().as_str(), record.id.as_str()])?;
            }
            Ok(())
        })
    }

    pub fn write_shard_file(&self, shard: &Shard) -> Result<()> {
        self.write_csv(&shard.name(), |writer| {
            writer.write_record(SHARD_HEADER)?;
            for pair in &shard.edges {
                writer.write_record([
                    (pair.row + 1).to_string(),
                    (pair.col + 1).to_string(),
                    format!("{:.6}", pair.score),
                ])?;
            }
            Ok(())
        })
    }
}

impl ShardOutput for ShardDirectory {
    fn write_id_map(&self, corpus: &Corpus) -> metallo_core::Result<()> {
        self.write_id_map_file(corpus)
            .map_err(|e| Error::StorageWrite(format!("{:#}", e)))
    }

    fn write_shard(&self, shard: &Shard) -> metallo_core::Result<()> {
        self.write_shard_file(shard)
            .map_err(|e| Error::StorageWrite(format!("{:#}", e)))
    }
}

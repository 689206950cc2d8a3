use crate::{Error, Metric, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Server and engine configuration, read from a JSON file.
///
/// Key names follow the historical `config.json` layout, so existing
/// deployments keep working. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetalloConfig {
    pub host: String,
    pub port: u16,
    /// Path or URL of the delimited source file
    pub csv_source: String,
    /// Whether `csv_source` is a local path rather than a URL
    pub local: bool,
    /// Keep records in LMDB instead of memory
    pub db: bool,
    /// Minimum per-topic difference reported in neighbor details
    pub significance: f64,
    /// Factor turning a topic weight into a display percentage
    #[serde(rename = "dimWeight")]
    pub dim_weight: f64,
    /// Metric for neighbor retrieval: "manhattan" (default) or "jsd"
    pub distance: Option<String>,
    /// Metric for pairwise divergence: "jsd" (default) or "manhattan"
    pub divergence: Option<String>,
    /// Pairwise threshold; only pairs scoring below it are kept
    #[serde(rename = "divMax")]
    pub div_max: f64,
    /// Shard capacity as a multiple of the corpus size
    #[serde(rename = "fileLimit")]
    pub file_limit: usize,
    /// Export worker count; defaults to the available cores minus one
    pub workers: Option<usize>,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for MetalloConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            csv_source: "theta.csv".to_string(),
            local: true,
            db: false,
            significance: 0.05,
            dim_weight: 100.0,
            distance: None,
            divergence: None,
            div_max: f64::INFINITY,
            file_limit: 1,
            workers: None,
            data_dir: PathBuf::from("./data"),
            output_dir: PathBuf::from("processed"),
        }
    }
}

impl MetalloConfig {
    /// Read and validate a configuration file. A missing file yields the
    /// defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {:?} not found, using defaults", path);
                Self::default()
            }
            Err(e) => return Err(Error::Io(e)),
        };
        info!("Configuration loaded from {:?}", path);
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.file_limit == 0 {
            return Err(Error::InvalidConfig("fileLimit must be positive".to_string()));
        }
        if self.workers == Some(0) {
            return Err(Error::InvalidConfig("workers must be positive".to_string()));
        }
        if self.div_max.is_nan() {
            return Err(Error::InvalidConfig("divMax must be a number".to_string()));
        }
        Ok(())
    }

    /// Metric for neighbor retrieval
    pub fn metric(&self) -> Metric {
        Metric::from_config(self.distance.as_deref())
    }

    /// Metric for pairwise divergence
    pub fn divergence_metric(&self) -> Metric {
        match self.divergence.as_deref() {
            None => Metric::Jsd,
            Some(name) => name.parse().unwrap_or_else(|e: Error| {
                warn!("{}, falling back to jsd", e);
                Metric::Jsd
            }),
        }
    }

    /// Edges per shard for a corpus of `rows` records
    pub fn shard_capacity(&self, rows: usize) -> NonZeroUsize {
        NonZeroUsize::new(self.file_limit.saturating_mul(rows)).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = MetalloConfig::from_json("{}").unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.metric(), Metric::Manhattan);
        assert_eq!(config.divergence_metric(), Metric::Jsd);
        assert!(config.div_max.is_infinite());
    }

    #[test]
    fn test_historical_keys() {
        let raw = r#"{
            "csv_source": "https://example.org/theta.csv",
            "local": false,
            "db": true,
            "significance": 0.1,
            "dimWeight": 50,
            "distance": "jsd",
            "divMax": 0.2,
            "fileLimit": 3
        }"#;
        let config = MetalloConfig::from_json(raw).unwrap();
        assert!(!config.local);
        assert!(config.db);
        assert_eq!(config.dim_weight, 50.0);
        assert_eq!(config.metric(), Metric::Jsd);
        assert_eq!(config.div_max, 0.2);
        assert_eq!(config.shard_capacity(10).get(), 30);
    }

    #[test]
    fn test_unknown_metric_falls_back() {
        let config = MetalloConfig::from_json(r#"{"distance": "cosine", "divergence": "kl"}"#).unwrap();
        assert_eq!(config.metric(), Metric::Manhattan);
        assert_eq!(config.divergence_metric(), Metric::Jsd);
    }

    #[test]
    fn test_rejects_zero_file_limit() {
        assert!(matches!(
            MetalloConfig::from_json(r#"{"fileLimit": 0}"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            MetalloConfig::from_json(r#"{"workers": 0}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_shard_capacity_of_empty_corpus() {
        let config = MetalloConfig::default();
        assert_eq!(config.shard_capacity(0).get(), 1);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MetalloConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config.file_limit, 1);
    }
}

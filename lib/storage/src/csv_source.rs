// Delimited source ingestion: one document per row, one column per topic
use anyhow::{anyhow, bail, Context, Result};
use metallo_core::{MetalloConfig, Record, Vector};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Columns before the first topic weight: row number, ID, text
const LEADING_COLUMNS: usize = 3;

/// Parsed source: topic labels from the header and one record per row
#[derive(Debug, Clone, Default)]
pub struct SourceData {
    pub topics: Vec<String>,
    pub records: Vec<Record>,
}

impl SourceData {
    #[inline]
    pub fn dim(&self) -> usize {
        self.topics.len()
    }
}

/// Parse a source document.
///
/// The header names the topics from the fourth column on. Every row must
/// carry exactly one numeric weight per topic.
pub fn parse<R: Read>(reader: R) -> Result<SourceData> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let topics: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .skip(LEADING_COLUMNS)
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let line = idx + 2;
        let row = row.with_context(|| format!("reading line {}", line))?;
        if row.len() != topics.len() + LEADING_COLUMNS {
            bail!(
                "line {}: expected {} topic weights, found {}",
                line,
                topics.len(),
                row.len().saturating_sub(LEADING_COLUMNS)
            );
        }

        let weights = row
            .iter()
            .skip(LEADING_COLUMNS)
            .enumerate()
            .map(|(topic, raw)| {
                raw.trim().parse::<f64>().map_err(|e| {
                    anyhow!("line {}: topic {} weight {:?}: {}", line, topic + 1, raw, e)
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        records.push(Record::new(&row[1], &row[2], Vector::new(weights)));
        if records.len() % 10_000 == 0 {
            debug!("Read {} records", records.len());
        }
    }

    info!("Read {} records over {} topics", records.len(), topics.len());
    Ok(SourceData { topics, records })
}

pub fn read_local<P: AsRef<Path>>(path: P) -> Result<SourceData> {
    let path = path.as_ref();
    info!("Reading source file {:?}", path);
    let file = std::fs::File::open(path).with_context(|| format!("opening {:?}", path))?;
    parse(std::io::BufReader::new(file))
}

pub async fn fetch_remote(url: &str) -> Result<SourceData> {
    info!("Fetching source from {}", url);
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("GET {}", url))?;
    if !response.status().is_success() {
        bail!("GET {}: status {}", url, response.status());
    }
    let body = response.bytes().await.context("reading response body")?;
    parse(body.as_ref())
}

/// Load the source named by the configuration
pub async fn load(config: &MetalloConfig) -> Result<SourceData> {
    if config.local {
        read_local(&config.csv_source)
    } else {
        fetch_remote(&config.csv_source).await
    }
}

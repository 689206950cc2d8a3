use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Insufficient corpus size: requested {requested} records, corpus holds {available}")]
    InsufficientCorpusSize { requested: usize, available: usize },

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Topic {topic} out of range: records have {topics} topics")]
    TopicOutOfRange { topic: usize, topics: usize },

    #[error("Storage read error: {0}")]
    StorageRead(String),

    #[error("Storage write error: {0}")]
    StorageWrite(String),

    #[error("Unknown distance metric: {0}")]
    MetricConfiguration(String),

    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

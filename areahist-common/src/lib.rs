pub mod config;
pub use config::{BinningConfig, Config, DisplayConfig, ExportConfig, LoggingConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("undefined result: no samples counted towards the total of {bins} bins")]
    UndefinedResult { bins: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Other(String),
}

impl HistError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        HistError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HistError>;

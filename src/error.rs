use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors returned by the loading, filtering and aggregation functions.
#[derive(Debug, Error)]
pub enum SalesError {
    #[error("sales data file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("reading {}: line {line}: {reason}", path.display())]
    Format {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("total for {key:?} is outside the supported amount range")]
    Overflow { key: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = SalesError> = std::result::Result<T, E>;

//! FILENAME: pivot-config/src/error.rs

use pivot_engine::PivotError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Settings file is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error(transparent)]
    Pivot(#[from] PivotError),

    #[error("Pivot not configured: {0}")]
    UnknownPivot(String),
}

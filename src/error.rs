use thiserror::Error;

/// Conditions that abort an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no vehicle data found in input")]
    NoRecords,
    #[error("batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),
    #[error("store connection already released")]
    Closed,
}

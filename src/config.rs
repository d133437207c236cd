use std::path::PathBuf;

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::report::DEFAULT_PROBLEMATIC_PATH;

/// Number of stored rows returned once the import finishes.
pub const DEFAULT_SAMPLE_SIZE: usize = 50;

/// Where to store imported vehicles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// DuckDB database file, created if missing.
    DuckDb(PathBuf),
    /// Throwaway in-process store; nothing is persisted.
    Memory,
}

/// Everything one import run needs to know.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub input: PathBuf,
    pub store: StoreTarget,
    pub problematic_path: PathBuf,
    pub batch_size: usize,
    pub sample_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("vehicles.csv"),
            store: StoreTarget::DuckDb(PathBuf::from("vehicles.duckdb")),
            problematic_path: PathBuf::from(DEFAULT_PROBLEMATIC_PATH),
            batch_size: DEFAULT_BATCH_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl ImportConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

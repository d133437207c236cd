pub mod batch;
pub mod config;
pub mod error;
pub mod import;
pub mod record;
pub mod report;
pub mod source;
pub mod store;
pub mod validate;

pub use config::ImportConfig;
pub use error::ImportError;
pub use import::{seed, BatchImporter, ImportReport, ImportSummary};
pub use record::{RawRecord, ValidRecord, Vehicle};
pub use store::{DuckDbStore, MemoryStore, VehicleStore};

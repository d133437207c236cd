use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::batch::{batch_count, partition, Batch, DEFAULT_BATCH_SIZE};
use crate::config::{ImportConfig, StoreTarget, DEFAULT_SAMPLE_SIZE};
use crate::error::ImportError;
use crate::record::{RawRecord, ValidRecord, Vehicle};
use crate::report::{ProblematicLog, DEFAULT_PROBLEMATIC_PATH};
use crate::source;
use crate::store::{DuckDbStore, MemoryStore, VehicleStore};
use crate::validate::validate;

/// Counters for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub total_records: usize,
    pub batches: usize,
    pub inserted: u64,
    pub rejected: usize,
    pub failed_batches: usize,
    pub problematic: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// First rows of the destination table after the import.
    pub sample: Vec<Vehicle>,
    pub summary: ImportSummary,
    /// Records whose batch failed to insert.
    pub problematic: ProblematicLog,
    /// Set when `problematic` was written to disk.
    pub problematic_path: Option<PathBuf>,
}

/// What happened to one batch.
enum BatchOutcome {
    Inserted(u64),
    Failed(Vec<ValidRecord>),
    Empty,
}

/// Validates rows batch by batch and pushes them into a [`VehicleStore`].
///
/// The importer owns the store's connection: every `run*` call releases it
/// before returning, whether the run succeeded or not.
pub struct BatchImporter<S: VehicleStore> {
    store: S,
    batch_size: usize,
    sample_size: usize,
    problematic_path: PathBuf,
}

impl<S: VehicleStore> BatchImporter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            problematic_path: PathBuf::from(DEFAULT_PROBLEMATIC_PATH),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_problematic_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.problematic_path = path.into();
        self
    }

    /// Import `records`, then release the store. Consumes the importer: its
    /// store is unusable once released.
    pub async fn run(self, records: &[RawRecord]) -> Result<ImportReport> {
        let outcome = self.import(records).await;
        self.finish(outcome).await
    }

    /// Read the CSV at `path` and import it, then release the store.
    /// A read failure is fatal but still releases the store.
    pub async fn run_csv(self, path: &Path) -> Result<ImportReport> {
        let outcome = match source::load_csv(path).await {
            Ok(records) => self.import(&records).await,
            Err(e) => Err(e),
        };
        self.finish(outcome).await
    }

    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(records = records.len(), batch_size = self.batch_size)
    )]
    async fn import(&self, records: &[RawRecord]) -> Result<ImportReport> {
        info!("seeding vehicles data");
        let started_at = Utc::now();

        if records.is_empty() {
            return Err(ImportError::NoRecords.into());
        }

        let mut problematic = ProblematicLog::new();
        let mut inserted = 0u64;
        let mut rejected = 0usize;
        let mut failed_batches = 0usize;

        for batch in partition(records, self.batch_size)? {
            let (outcome, batch_rejected) = self.process_batch(batch).await?;
            rejected += batch_rejected;
            match outcome {
                BatchOutcome::Inserted(n) => {
                    inserted += n;
                    info!("inserted {} records so far", inserted);
                }
                BatchOutcome::Failed(records) => {
                    failed_batches += 1;
                    problematic.extend_from_batch(records);
                }
                BatchOutcome::Empty => {}
            }
        }
        info!(inserted, rejected, failed_batches, "data seeding process completed");

        let problematic_path = problematic
            .write_csv(&self.problematic_path)
            .context("saving problematic records")?;

        let sample = self
            .store
            .sample(self.sample_size)
            .await
            .context("fetching inserted vehicles")?;

        Ok(ImportReport {
            sample,
            summary: ImportSummary {
                total_records: records.len(),
                batches: batch_count(records.len(), self.batch_size),
                inserted,
                rejected,
                failed_batches,
                problematic: problematic.len(),
                started_at,
                finished_at: Utc::now(),
            },
            problematic,
            problematic_path,
        })
    }

    /// Validate one batch and submit what survives. Insert errors are caught
    /// here, except a released store which aborts the run; the second value
    /// is the number of rows rejected by validation.
    async fn process_batch(&self, batch: Batch<'_>) -> Result<(BatchOutcome, usize)> {
        let mut accepted = Vec::with_capacity(batch.len());
        let mut rejected = 0;
        for (i, raw) in batch.records.iter().enumerate() {
            match validate(raw) {
                Ok(record) => accepted.push(record),
                Err(reason) => {
                    rejected += 1;
                    warn!(row = batch.offset + i, "{}", reason);
                }
            }
        }

        if accepted.is_empty() {
            debug!(batch = batch.index, "no valid records in batch, skipping insert");
            return Ok((BatchOutcome::Empty, rejected));
        }

        match self.store.insert_many(&accepted).await {
            Ok(n) => Ok((BatchOutcome::Inserted(n), rejected)),
            Err(e) if matches!(e.downcast_ref::<ImportError>(), Some(ImportError::Closed)) => {
                Err(e)
            }
            Err(e) => {
                error!(
                    "error inserting batch starting at index {}: {:#}",
                    batch.offset, e
                );
                Ok((BatchOutcome::Failed(accepted), rejected))
            }
        }
    }

    /// Release the store. The run's own error takes precedence over a close
    /// error; a close error after a successful run fails the run.
    async fn finish(&self, outcome: Result<ImportReport>) -> Result<ImportReport> {
        let closed = self.store.close().await;
        match (outcome, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(close_err)) => Err(close_err.context("releasing store connection")),
            (Err(e), closed) => {
                error!("an error occurred during processing: {:#}", e);
                if let Err(close_err) = closed {
                    error!("failed to release store connection: {:#}", close_err);
                }
                Err(e)
            }
        }
    }
}

/// Run a full import as described by `config`.
pub async fn seed(config: &ImportConfig) -> Result<ImportReport> {
    match &config.store {
        StoreTarget::DuckDb(path) => {
            let store = DuckDbStore::open(path)?;
            configure(BatchImporter::new(store), config)
                .run_csv(&config.input)
                .await
        }
        StoreTarget::Memory => {
            configure(BatchImporter::new(MemoryStore::new()), config)
                .run_csv(&config.input)
                .await
        }
    }
}

fn configure<S: VehicleStore>(
    importer: BatchImporter<S>,
    config: &ImportConfig,
) -> BatchImporter<S> {
    importer
        .with_batch_size(config.batch_size)
        .with_sample_size(config.sample_size)
        .with_problematic_path(&config.problematic_path)
}

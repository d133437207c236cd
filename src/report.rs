use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::record::ValidRecord;

/// Default location of the problematic-records CSV.
pub const DEFAULT_PROBLEMATIC_PATH: &str = "problematic_vehicles.csv";

/// Records that passed validation but whose batch failed to insert.
/// Append-only for the duration of one run.
#[derive(Debug, Default, Clone)]
pub struct ProblematicLog {
    records: Vec<ValidRecord>,
}

impl ProblematicLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep every record of a failed batch, in input order.
    pub fn extend_from_batch(&mut self, records: Vec<ValidRecord>) {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ValidRecord] {
        &self.records
    }

    /// Write the log to `path` as `YEAR,MAKE,MODEL` CSV.
    ///
    /// Returns `None` without touching the filesystem when the log is empty.
    /// Otherwise writes a temp file next to `path` and renames it into place.
    pub fn write_csv(&self, path: &Path) -> Result<Option<PathBuf>> {
        if self.records.is_empty() {
            return Ok(None);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {:?}", parent))?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_PROBLEMATIC_PATH.to_string());
        let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

        {
            let mut wtr = csv::Writer::from_path(&tmp_path)
                .with_context(|| format!("creating {:?}", tmp_path))?;
            for record in &self.records {
                wtr.serialize(record)
                    .with_context(|| format!("writing problematic record to {:?}", tmp_path))?;
            }
            wtr.flush().with_context(|| format!("flushing {:?}", tmp_path))?;
        }

        fs::rename(&tmp_path, path)
            .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;

        info!(
            path = %path.display(),
            records = self.records.len(),
            "problematic records saved"
        );
        Ok(Some(path.to_path_buf()))
    }
}

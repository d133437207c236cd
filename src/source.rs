use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::record::RawRecord;

/// Parse vehicle rows from any reader. The first line must be the
/// `year,make,model,type` header; whitespace around header names is ignored,
/// field values are kept verbatim.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<RawRecord>().enumerate() {
        // idx + 2: one for the header line, one for 1-based line numbers
        let record = result.with_context(|| format!("CSV parse error at line {}", idx + 2))?;
        records.push(record);
    }
    Ok(records)
}

/// Load every row of the CSV at `path` into memory.
pub fn read_csv_file(path: &Path) -> Result<Vec<RawRecord>> {
    let file =
        File::open(path).with_context(|| format!("failed to open input CSV {:?}", path))?;
    let records =
        read_records(file).with_context(|| format!("failed to read vehicles from {:?}", path))?;
    debug!(path = %path.display(), rows = records.len(), "read input CSV");
    Ok(records)
}

/// Async wrapper around [`read_csv_file`], run on the blocking pool.
pub async fn load_csv(path: impl Into<PathBuf>) -> Result<Vec<RawRecord>> {
    let path = path.into();
    tokio::task::spawn_blocking(move || read_csv_file(&path))
        .await
        .context("CSV reader task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn reads_header_and_rows() -> Result<()> {
        let csv = "year,make,model,type\n2020,Toyota,Corolla,Car\n0,Ford,Focus,Car\n";
        let records = read_records(Cursor::new(csv))?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].year, "2020");
        assert_eq!(records[0].make, "Toyota");
        assert_eq!(records[0].kind, "Car");
        assert_eq!(records[1].year, "0");
        Ok(())
    }

    #[test]
    fn header_whitespace_is_trimmed_values_are_not() -> Result<()> {
        let csv = "year, make, model, type\n2020, Toyota,Corolla,Car\n";
        let records = read_records(Cursor::new(csv))?;
        assert_eq!(records[0].make, " Toyota");
        Ok(())
    }

    #[test]
    fn empty_fields_survive_parsing() -> Result<()> {
        let csv = "year,make,model,type\n2019,,Civic,Car\n";
        let records = read_records(Cursor::new(csv))?;
        assert_eq!(records[0].make, "");
        assert_eq!(records[0].model, "Civic");
        Ok(())
    }

    #[test]
    fn missing_type_column_defaults() -> Result<()> {
        let csv = "year,make,model\n2019,Honda,Civic\n";
        let records = read_records(Cursor::new(csv))?;
        assert_eq!(records[0].kind, "");
        Ok(())
    }

    #[test]
    fn ragged_row_is_an_error() {
        let csv = "year,make,model,type\n2019,Honda\n";
        let err = read_records(Cursor::new(csv)).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn load_csv_reads_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "year,make,model,type")?;
        writeln!(file, "1997,Jeep,Wrangler,SUV")?;
        let records = load_csv(file.path()).await?;
        assert_eq!(records, vec![RawRecord {
            year: "1997".into(),
            make: "Jeep".into(),
            model: "Wrangler".into(),
            kind: "SUV".into(),
        }]);
        Ok(())
    }

    #[tokio::test]
    async fn load_csv_missing_file_fails() {
        let err = load_csv("/nonexistent/vehicles.csv").await.unwrap_err();
        assert!(format!("{:#}", err).contains("failed to open input CSV"));
    }
}

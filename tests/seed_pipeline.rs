use anyhow::Result;
use std::{fs, sync::Arc};
use tempfile::tempdir;
use vehicle_seed::{
    config::StoreTarget, seed, BatchImporter, DuckDbStore, ImportConfig, ImportError, RawRecord,
};

fn write_input(path: &std::path::Path, rows: &[(&str, &str, &str)]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["year", "make", "model", "type"])?;
    for (year, make, model) in rows {
        wtr.write_record([*year, *make, *model, "Car"])?;
    }
    wtr.flush()?;
    Ok(())
}

#[tokio::test]
async fn seeds_duckdb_from_csv() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("vehicles.csv");
    let db = dir.path().join("vehicles.duckdb");
    let long_model = "Q".repeat(140);
    write_input(
        &input,
        &[
            ("2020", "Toyota", "Corolla"),
            ("0", "Ford", "Focus"),
            ("0000", "Ford", "Fiesta"),
            ("2019", "", "Civic"),
            ("2018", "Honda", ""),
            ("2017", "Mercedes-Benz", long_model.as_str()),
        ],
    )?;

    let config = ImportConfig {
        input,
        store: StoreTarget::DuckDb(db.clone()),
        problematic_path: dir.path().join("problematic_vehicles.csv"),
        ..ImportConfig::default()
    }
    .with_batch_size(2);

    let report = seed(&config).await?;

    assert_eq!(report.summary.total_records, 6);
    assert_eq!(report.summary.batches, 3);
    assert_eq!(report.summary.inserted, 2);
    assert_eq!(report.summary.rejected, 4);
    assert_eq!(report.summary.failed_batches, 0);
    assert!(report.problematic_path.is_none());
    assert!(!config.problematic_path.exists());

    let years: Vec<i32> = report.sample.iter().map(|v| v.year).collect();
    assert_eq!(years, vec![2020, 2017]);
    assert_eq!(report.sample[1].model.chars().count(), 128);

    // same input again: no dedupe, so the count doubles
    let again = seed(&config).await?;
    assert_eq!(again.summary.inserted, 2);
    let store = DuckDbStore::open(&db)?;
    assert_eq!(store.count()?, 4);
    Ok(())
}

#[tokio::test]
async fn empty_csv_fails_without_inserting() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("vehicles.csv");
    write_input(&input, &[])?;
    let db = dir.path().join("vehicles.duckdb");

    let config = ImportConfig {
        input,
        store: StoreTarget::DuckDb(db.clone()),
        problematic_path: dir.path().join("problematic_vehicles.csv"),
        ..ImportConfig::default()
    };
    let err = seed(&config).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ImportError>(),
        Some(ImportError::NoRecords)
    ));

    // the connection was released, so the file can be reopened
    let store = DuckDbStore::open(&db)?;
    assert_eq!(store.count()?, 0);
    Ok(())
}

#[tokio::test]
async fn importer_over_in_memory_duckdb() -> Result<()> {
    let dir = tempdir()?;
    let rows: Vec<RawRecord> = (0..10)
        .map(|i| RawRecord::new(&(2000 + i).to_string(), "Subaru", "Outback"))
        .collect();

    let store = Arc::new(DuckDbStore::open_in_memory()?);
    let importer = BatchImporter::new(Arc::clone(&store))
        .with_batch_size(4)
        .with_sample_size(3)
        .with_problematic_path(dir.path().join("problematic_vehicles.csv"));
    let report = importer.run(&rows).await?;

    assert_eq!(report.summary.batches, 3);
    assert_eq!(report.summary.inserted, 10);
    assert_eq!(report.sample.len(), 3);
    assert!(store.count().is_err());
    assert!(fs::read_dir(dir.path())?.next().is_none());
    Ok(())
}

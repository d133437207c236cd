use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use duckdb::{Connection, ToSql};
use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};
use tracing::{debug, info};

use super::VehicleStore;
use crate::error::ImportError;
use crate::record::{ValidRecord, Vehicle};
use crate::validate::{MAKE_MAX_CHARS, MODEL_MAX_CHARS};

/// DuckDB-backed store. Owns a single connection; `close` hands it back to
/// DuckDB and every later call fails with [`ImportError::Closed`].
pub struct DuckDbStore {
    conn: Mutex<Option<Connection>>,
}

impl DuckDbStore {
    /// Open (or create) the database file at `path` and make sure the
    /// `vehicles` table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open DuckDB database {:?}", path))?;
        info!(path = %path.display(), "opened DuckDB database");
        Self::with_connection(conn)
    }

    /// In-memory database, gone once the store is closed.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory DuckDB")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        setup_vehicles_table(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("DuckDB connection lock poisoned"))
    }

    /// Number of rows currently in `vehicles`.
    pub fn count(&self) -> Result<u64> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(ImportError::Closed)?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM vehicles;", [], |r| r.get(0))?;
        Ok(n as u64)
    }
}

/// Create the `vehicles` table and its id sequence if missing, plus the
/// connection-local staging table batches are appended into.
pub fn setup_vehicles_table(conn: &Connection) -> Result<()> {
    let sql = format!(
        "CREATE SEQUENCE IF NOT EXISTS vehicles_id_seq START 1;
        CREATE TABLE IF NOT EXISTS vehicles(
            id BIGINT PRIMARY KEY DEFAULT nextval('vehicles_id_seq'),
            year INTEGER NOT NULL,
            make VARCHAR NOT NULL CHECK (length(make) <= {make_max}),
            model VARCHAR NOT NULL CHECK (length(model) <= {model_max}),
            created_at TIMESTAMP NOT NULL
        );
        CREATE TEMP TABLE IF NOT EXISTS vehicles_staging(
            year INTEGER,
            make VARCHAR,
            model VARCHAR,
            created_at TIMESTAMP
        );",
        make_max = MAKE_MAX_CHARS,
        model_max = MODEL_MAX_CHARS,
    );
    conn.execute_batch(&sql).context("creating vehicles table")?;
    Ok(())
}

#[async_trait]
impl VehicleStore for DuckDbStore {
    async fn insert_many(&self, records: &[ValidRecord]) -> Result<u64> {
        let mut guard = self.lock()?;
        let conn = guard.as_mut().ok_or(ImportError::Closed)?;

        // Dropping the transaction without commit rolls the whole batch back.
        let tx = conn.transaction().context("starting insert transaction")?;
        tx.execute_batch("DELETE FROM vehicles_staging;")
            .context("clearing staging table")?;

        let created_at = Utc::now().naive_utc();
        {
            let mut appender = tx
                .appender("vehicles_staging")
                .context("creating staging appender")?;
            appender
                .append_rows(records.iter().map(|r| {
                    [
                        &r.year as &dyn ToSql,
                        &r.make as &dyn ToSql,
                        &r.model as &dyn ToSql,
                        &created_at as &dyn ToSql,
                    ]
                }))
                .context("appending batch to staging table")?;
            appender.flush().context("flushing staging appender")?;
        }

        // ids come from the sequence default, in input order
        let written = tx
            .execute(
                "INSERT INTO vehicles (year, make, model, created_at)
                 SELECT year, make, model, created_at FROM vehicles_staging ORDER BY rowid;",
                [],
            )
            .context("moving staged batch into vehicles")? as u64;
        tx.execute_batch("DELETE FROM vehicles_staging;")
            .context("clearing staging table")?;
        tx.commit().context("committing insert transaction")?;
        debug!(rows = written, "batch committed");
        Ok(written)
    }

    async fn sample(&self, limit: usize) -> Result<Vec<Vehicle>> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(ImportError::Closed)?;

        // LIMIT takes a BIGINT
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT id, year, make, model, created_at FROM vehicles ORDER BY id LIMIT {};",
            limit
        );
        let mut stmt = conn.prepare(&sql).context("preparing vehicle sample")?;
        let rows = stmt.query_map([], |row| {
            Ok(Vehicle {
                id: row.get(0)?,
                year: row.get(1)?,
                make: row.get(2)?,
                model: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let vehicles = rows
            .collect::<Result<Vec<_>, _>>()
            .context("reading vehicle rows")?;
        Ok(vehicles)
    }

    async fn close(&self) -> Result<()> {
        let conn = self.lock()?.take().ok_or(ImportError::Closed)?;
        conn.close()
            .map_err(|(_, e)| anyhow!(e).context("closing DuckDB connection"))?;
        debug!("DuckDB connection closed");
        Ok(())
    }
}

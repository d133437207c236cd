use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::record::{ValidRecord, Vehicle};

pub mod duck;
pub mod memory;

pub use duck::DuckDbStore;
pub use memory::MemoryStore;

/// Destination of an import run.
///
/// A store owns exactly one connection. `insert_many` must be all-or-nothing:
/// when it returns an error, none of the records were kept. After `close`,
/// every call fails.
#[async_trait]
pub trait VehicleStore: Send + Sync {
    /// Insert all `records` as new rows in one request; returns rows written.
    async fn insert_many(&self, records: &[ValidRecord]) -> Result<u64>;

    /// Up to `limit` stored rows, oldest first.
    async fn sample(&self, limit: usize) -> Result<Vec<Vehicle>>;

    /// Release the connection.
    async fn close(&self) -> Result<()>;
}

#[async_trait]
impl<T: VehicleStore + ?Sized> VehicleStore for Arc<T> {
    async fn insert_many(&self, records: &[ValidRecord]) -> Result<u64> {
        (**self).insert_many(records).await
    }

    async fn sample(&self, limit: usize) -> Result<Vec<Vehicle>> {
        (**self).sample(limit).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use super::VehicleStore;
use crate::error::ImportError;
use crate::record::{ValidRecord, Vehicle};

#[derive(Default)]
struct State {
    rows: Vec<Vehicle>,
    insert_calls: usize,
    closed: bool,
}

/// In-process store used for dry runs. Specific `insert_many` calls can be
/// made to fail, counted from 0 in call order.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_calls: HashSet<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose insert calls listed in `calls` return an error.
    pub fn failing_on(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            state: Mutex::default(),
            fail_calls: calls.into_iter().collect(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    /// Snapshot of all stored rows.
    pub fn rows(&self) -> Vec<Vehicle> {
        self.lock().map(|s| s.rows.clone()).unwrap_or_default()
    }

    pub fn insert_calls(&self) -> usize {
        self.lock().map(|s| s.insert_calls).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().map(|s| s.closed).unwrap_or(true)
    }
}

#[async_trait]
impl VehicleStore for MemoryStore {
    async fn insert_many(&self, records: &[ValidRecord]) -> Result<u64> {
        let mut state = self.lock()?;
        if state.closed {
            return Err(ImportError::Closed.into());
        }
        let call = state.insert_calls;
        state.insert_calls += 1;
        if self.fail_calls.contains(&call) {
            bail!("insert call {} rejected by store", call);
        }

        let created_at = Utc::now().naive_utc();
        let first_id = state.rows.len() as i64 + 1;
        state
            .rows
            .extend(records.iter().enumerate().map(|(i, r)| Vehicle {
                id: first_id + i as i64,
                year: r.year,
                make: r.make.clone(),
                model: r.model.clone(),
                created_at,
            }));
        Ok(records.len() as u64)
    }

    async fn sample(&self, limit: usize) -> Result<Vec<Vehicle>> {
        let state = self.lock()?;
        if state.closed {
            return Err(ImportError::Closed.into());
        }
        Ok(state.rows.iter().take(limit).cloned().collect())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.lock()?;
        if state.closed {
            return Err(ImportError::Closed.into());
        }
        state.closed = true;
        Ok(())
    }
}

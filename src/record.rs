use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row of the input CSV, exactly as read. All fields stay strings until
/// validation; `type` is carried but never used downstream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    pub year: String,
    pub make: String,
    pub model: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl RawRecord {
    pub fn new(year: &str, make: &str, model: &str) -> Self {
        Self {
            year: year.to_string(),
            make: make.to_string(),
            model: model.to_string(),
            kind: String::new(),
        }
    }
}

/// A record that passed validation and is ready for the store.
///
/// Serializes with the upper-case headers used by the problematic-records CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidRecord {
    #[serde(rename = "YEAR")]
    pub year: i32,
    #[serde(rename = "MAKE")]
    pub make: String,
    #[serde(rename = "MODEL")]
    pub model: String,
}

/// A row as stored in the `vehicles` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub id: i64,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub created_at: NaiveDateTime,
}

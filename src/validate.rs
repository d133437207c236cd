use thiserror::Error;

use crate::record::{RawRecord, ValidRecord};

/// Maximum stored length of `make`, in characters.
pub const MAKE_MAX_CHARS: usize = 50;
/// Maximum stored length of `model`, in characters.
pub const MODEL_MAX_CHARS: usize = 128;

/// Why a row was dropped before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Vehicle year \"{0}\" is not valid. Skipping...")]
    InvalidYear(String),
    #[error("Vehicle make \"\" is not valid. Skipping...")]
    EmptyMake,
    #[error("Vehicle model \"\" is not valid. Skipping...")]
    EmptyModel,
}

/// Check one raw row and normalize it.
///
/// Rules run in order and stop at the first failure:
/// 1. `year` parses as an integer (surrounding whitespace ignored) and is not 0
/// 2. `make` is non-empty
/// 3. `model` is non-empty
///
/// Emptiness is checked on the raw value, truncation happens afterwards.
pub fn validate(raw: &RawRecord) -> Result<ValidRecord, Rejection> {
    let year = parse_year(&raw.year).ok_or_else(|| Rejection::InvalidYear(raw.year.clone()))?;
    if raw.make.is_empty() {
        return Err(Rejection::EmptyMake);
    }
    if raw.model.is_empty() {
        return Err(Rejection::EmptyModel);
    }

    Ok(ValidRecord {
        year,
        make: truncate_chars(&raw.make, MAKE_MAX_CHARS),
        model: truncate_chars(&raw.model, MODEL_MAX_CHARS),
    })
}

/// `None` for anything that is not a non-zero integer ("0", "0000", "abc", "").
fn parse_year(s: &str) -> Option<i32> {
    match s.trim().parse::<i32>() {
        Ok(0) | Err(_) => None,
        Ok(year) => Some(year),
    }
}

/// First `max` characters of `s` (not bytes, so multi-byte text is never split).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

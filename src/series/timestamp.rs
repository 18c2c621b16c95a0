// =============================================================================
// Timestamp normalisation
// =============================================================================
//
// The backtester writes times either as local "YYYY-MM-DD HH:MM:SS" strings
// (in a fixed UTC offset) or as raw epoch integers. Epoch integers are told
// apart by width: 10 digits are seconds, 13 digits are milliseconds.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde::Deserialize;

use crate::error::ChartError;

/// Layout of the datetime strings written by the backtester.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A raw time field as it appears in source JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    Epoch(i64),
    Text(String),
}

/// Resolve `raw` to epoch milliseconds. Strings without an explicit offset are
/// read in `offset`.
pub fn to_millis(raw: &RawTime, offset: FixedOffset) -> Result<i64, ChartError> {
    match raw {
        RawTime::Epoch(value) => epoch_to_millis(*value),
        RawTime::Text(text) => text_to_millis(text, offset),
    }
}

fn epoch_to_millis(value: i64) -> Result<i64, ChartError> {
    match value.unsigned_abs().to_string().len() {
        10 => Ok(value * 1000),
        13 => Ok(value),
        _ => Err(ChartError::InvalidTimestamp(value.to_string())),
    }
}

fn text_to_millis(text: &str, offset: FixedOffset) -> Result<i64, ChartError> {
    let trimmed = text.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT) {
        return offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.timestamp_millis())
            .ok_or_else(|| ChartError::InvalidTimestamp(text.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp_millis());
    }

    // Bare digits in a string field.
    if let Ok(value) = trimmed.parse::<i64>() {
        return epoch_to_millis(value);
    }

    Err(ChartError::InvalidTimestamp(text.to_string()))
}

/// Build the fixed offset for `hours` east of UTC.
pub fn utc_offset(hours: i32) -> Result<FixedOffset, ChartError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ChartError::InvalidTimestamp(format!("UTC offset {hours}h")))
}

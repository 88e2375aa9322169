/// Core data types for the cold-chain monitoring dashboard.
///
/// This module defines the shared domain model imported by all other modules:
/// raw readings as they come out of the sensor logs, the derived views the
/// aggregation engine produces, and the crate-wide error type.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Column contract
// ---------------------------------------------------------------------------

/// Column holding the sensor identifier.
pub const COL_SENSOR_ID: &str = "SensorID";

/// Column holding the raw timestamp string.
pub const COL_TIMESTAMP: &str = "Timestamp";

/// Column holding the temperature in degrees Celsius.
pub const COL_TEMPERATURE: &str = "Temperature";

/// Column holding the event label.
pub const COL_EVENT: &str = "Event";

/// All columns a sensor log must carry. Order in the file is free.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_SENSOR_ID, COL_TIMESTAMP, COL_TEMPERATURE, COL_EVENT];

/// Event label meaning "no anomaly". Every other label is alert-worthy.
pub const NORMAL_EVENT: &str = "Normal";

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single observation from one temperature sensor.
///
/// The timestamp is kept exactly as it appeared in the log; operations that
/// need ordering parse it through `timestamp::parse_timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub sensor_id: String,
    pub timestamp: String, // e.g. "2024-06-01 08:15:00"
    pub temperature: f64,
    pub event: String, // "Normal", "HighTemp", "DoorOpen", ...
}

impl Reading {
    pub fn new(sensor_id: &str, timestamp: &str, temperature: f64, event: &str) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            timestamp: timestamp.to_string(),
            temperature,
            event: event.to_string(),
        }
    }

    /// `true` when the event label marks an anomaly.
    pub fn is_anomaly(&self) -> bool {
        self.event != NORMAL_EVENT
    }
}

/// An ordered batch of readings from one source (one room, one transport feed)
/// or from several sources merged together.
///
/// Rows are neither sorted nor deduplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingTable {
    rows: Vec<Reading>,
}

impl ReadingTable {
    pub fn new(rows: Vec<Reading>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Reading] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.rows.iter()
    }
}

impl From<Vec<Reading>> for ReadingTable {
    fn from(rows: Vec<Reading>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<Reading> for ReadingTable {
    fn from_iter<I: IntoIterator<Item = Reading>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ReadingTable {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// One point of a sensor's raw series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: String,
    pub temperature: f64,
}

/// All readings of one sensor, in the row order of the source table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSeries {
    pub sensor_id: String,
    pub points: Vec<SeriesPoint>,
}

/// Average temperature of a sensor over the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorMean {
    pub sensor_id: String,
    pub mean_temperature: f64,
}

/// Projection of a reading used by the event listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub event: String,
    pub timestamp: String,
    pub temperature: f64,
}

impl From<&Reading> for EventRecord {
    fn from(reading: &Reading) -> Self {
        Self {
            event: reading.event.clone(),
            timestamp: reading.timestamp.clone(),
            temperature: reading.temperature,
        }
    }
}

/// Mean temperature of every reading taken at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePoint {
    pub timestamp: NaiveDateTime,
    pub mean_temperature: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while loading sensor logs or aggregating them.
///
/// None of these are retried: inputs are local static files, so a failure
/// means the data itself is wrong.
#[derive(Debug, Error)]
pub enum ColdChainError {
    /// The identifier is unknown or the backing file does not exist.
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// The file exists but does not follow the sensor log layout.
    #[error("Malformed source {source_id}: {detail}")]
    SourceFormat { source_id: String, detail: String },

    /// An operation that needs rows was handed an empty table.
    #[error("Reading table is empty")]
    EmptyTable,

    /// A timestamp string could not be normalized to an instant.
    #[error("Unparseable timestamp: {raw_value:?}")]
    TimestampParse { raw_value: String },

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A page name that the dashboard does not know.
    #[error("Unknown page: {0}")]
    UnknownPage(String),

    /// A site or room selection with no matching registry entry.
    #[error("Unknown selection: {0}")]
    UnknownSelection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ColdChainError {
    pub fn format(source_id: &str, detail: impl Into<String>) -> Self {
        ColdChainError::SourceFormat {
            source_id: source_id.to_string(),
            detail: detail.into(),
        }
    }

    /// Errors the presenter turns into a "no data" panel instead of failing
    /// the whole page.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            ColdChainError::EmptyTable | ColdChainError::SourceNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ColdChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_event_is_not_an_anomaly() {
        assert!(!Reading::new("S1", "2024-06-01 08:00:00", 4.0, "Normal").is_anomaly());
        assert!(Reading::new("S1", "2024-06-01 08:00:00", 9.0, "HighTemp").is_anomaly());
    }

    #[test]
    fn test_event_label_match_is_case_sensitive() {
        // Only the exact label "Normal" is excluded from alert listings.
        assert!(Reading::new("S1", "2024-06-01 08:00:00", 4.0, "normal").is_anomaly());
    }

    #[test]
    fn test_error_messages_name_the_offending_value() {
        let err = ColdChainError::TimestampParse { raw_value: "yesterday".to_string() };
        assert!(err.to_string().contains("yesterday"));

        let err = ColdChainError::format("room1.csv", "missing column Event");
        assert_eq!(err.to_string(), "Malformed source room1.csv: missing column Event");
    }

    #[test]
    fn test_no_data_classification() {
        assert!(ColdChainError::EmptyTable.is_no_data());
        assert!(ColdChainError::SourceNotFound("room9.csv".into()).is_no_data());
        assert!(!ColdChainError::format("room1.csv", "bad").is_no_data());
    }
}

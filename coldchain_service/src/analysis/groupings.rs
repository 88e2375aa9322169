//! Group-by views over a reading table.
//!
//! Grouping happens on one of two keys: the sensor id (per-sensor views) or
//! the reading instant (per-time views). Callers that want a room-wide or
//! building-wide view concatenate tables with `merge::merge_tables` first.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::model::{
    ColdChainError, ReadingTable, Result, SensorMean, SensorSeries, SeriesPoint, TimePoint,
};
use crate::timestamp::parse_timestamp;

// ---------------------------------------------------------------------------
// Running mean
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Only called on groups built from at least one row.
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

// ---------------------------------------------------------------------------
// Per-sensor views
// ---------------------------------------------------------------------------

/// Splits the table into one series per sensor.
///
/// Sensors appear in order of first occurrence. Within a sensor, points keep
/// the table's row order; nothing is re-sorted by time, so callers wanting a
/// chronological chart must hand in a sorted table.
///
/// Returns `EmptyTable` for a table without rows so the presenter can show
/// its "no data" state instead of an empty chart list.
pub fn per_sensor_series(table: &ReadingTable) -> Result<Vec<SensorSeries>> {
    if table.is_empty() {
        return Err(ColdChainError::EmptyTable);
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut series: Vec<SensorSeries> = Vec::new();

    for reading in table {
        let slot = *index.entry(reading.sensor_id.as_str()).or_insert_with(|| {
            series.push(SensorSeries {
                sensor_id: reading.sensor_id.clone(),
                points: Vec::new(),
            });
            series.len() - 1
        });
        series[slot].points.push(SeriesPoint {
            timestamp: reading.timestamp.clone(),
            temperature: reading.temperature,
        });
    }

    Ok(series)
}

/// Mean temperature per sensor, hottest first.
///
/// Equal means are ordered by sensor id ascending so the ranking is stable
/// across runs. An empty table yields an empty ranking.
pub fn ranked_sensor_means(table: &ReadingTable) -> Vec<SensorMean> {
    let mut groups: HashMap<&str, MeanAccumulator> = HashMap::new();
    for reading in table {
        groups
            .entry(reading.sensor_id.as_str())
            .or_default()
            .push(reading.temperature);
    }

    let mut ranked: Vec<SensorMean> = groups
        .into_iter()
        .map(|(sensor_id, acc)| SensorMean {
            sensor_id: sensor_id.to_string(),
            mean_temperature: acc.mean(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.mean_temperature
            .total_cmp(&a.mean_temperature)
            .then_with(|| a.sensor_id.cmp(&b.sensor_id))
    });
    ranked
}

// ---------------------------------------------------------------------------
// Per-time view
// ---------------------------------------------------------------------------

/// Mean temperature of all readings sharing an instant, oldest first.
///
/// Readings are grouped on the parsed instant, not bucketed: only sensors
/// reporting the exact same moment are averaged together. Two spellings of
/// one instant (`2024-06-01 08:00:00` and `2024-06-01T08:00:00`) fall into
/// the same group, which keeps the output strictly increasing.
///
/// Any unparseable timestamp fails the whole call with `TimestampParse`.
/// An empty table yields an empty series.
pub fn mean_over_time(table: &ReadingTable) -> Result<Vec<TimePoint>> {
    let mut groups: BTreeMap<NaiveDateTime, MeanAccumulator> = BTreeMap::new();
    for reading in table {
        let instant = parse_timestamp(&reading.timestamp)?;
        groups.entry(instant).or_default().push(reading.temperature);
    }

    Ok(groups
        .into_iter()
        .map(|(timestamp, acc)| TimePoint {
            timestamp,
            mean_temperature: acc.mean(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

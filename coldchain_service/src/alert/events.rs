//! Recent event listings shown on the Transport, Warehouse, Supermarket and
//! Alerts pages.
//!
//! Two variants exist. The dashboard pages list *distinct* recent events
//! (`recent_anomalies`), while the Alerts page lists every raw alert row
//! (`recent_alerts`). Both sort newest first and cap the listing.
//!
//! # Ordering
//! When every listed timestamp parses, rows are ordered by instant, so
//! offsets are honoured. Otherwise the raw timestamp strings are compared,
//! which is still a total order and matches how the logs are written.
//!
//! # Limit
//! `limit == 0` means "no limit": the whole filtered listing is returned.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::model::{EventRecord, Reading, ReadingTable};
use crate::timestamp::{newest_first, parse_timestamp};

/// Distinct non-Normal events, most recent first, at most `limit` rows.
///
/// Steps, in order:
/// 1. project each row to `(event, timestamp, temperature)` and drop exact
///    duplicates, keeping the first occurrence
/// 2. drop rows whose event is `Normal`
/// 3. stable sort by timestamp, newest first
/// 4. keep the first `limit` rows
pub fn recent_anomalies(table: &ReadingTable, limit: usize) -> Vec<EventRecord> {
    let mut seen: HashSet<(&str, &str, u64)> = HashSet::new();
    let distinct = table
        .iter()
        .filter(|reading| seen.insert(dedup_key(*reading)))
        .filter(|reading| reading.is_anomaly());

    newest_events(distinct, limit)
}

/// Non-Normal rows, most recent first, at most `limit` rows. Duplicates are
/// kept, so a sensor that repeated an alert shows up once per report.
pub fn recent_alerts(table: &ReadingTable, limit: usize) -> Vec<EventRecord> {
    newest_events(table.iter().filter(|reading| reading.is_anomaly()), limit)
}

fn newest_events<'a, I>(rows: I, limit: usize) -> Vec<EventRecord>
where
    I: Iterator<Item = &'a Reading>,
{
    let mut records: Vec<EventRecord> = rows.map(EventRecord::from).collect();

    let instants: Option<Vec<NaiveDateTime>> = records
        .iter()
        .map(|record| parse_timestamp(&record.timestamp).ok())
        .collect();

    // Both sorts are stable: equal keys keep their relative input order.
    match instants {
        Some(instants) => {
            let mut keyed: Vec<_> = instants.into_iter().zip(records).collect();
            keyed.sort_by(|a, b| newest_first(&a.0, &b.0));
            records = keyed.into_iter().map(|(_, record)| record).collect();
        }
        None => records.sort_by(|a, b| newest_raw_first(&a.timestamp, &b.timestamp)),
    }

    if limit > 0 {
        records.truncate(limit);
    }
    records
}

fn newest_raw_first(a: &str, b: &str) -> Ordering {
    b.cmp(a)
}

/// Exact-match key over the projected fields. `-0.0` and `0.0` compare
/// equal as temperatures, so they share a key.
fn dedup_key(reading: &Reading) -> (&str, &str, u64) {
    let temperature = if reading.temperature == 0.0 {
        0.0_f64
    } else {
        reading.temperature
    };
    (
        reading.event.as_str(),
        reading.timestamp.as_str(),
        temperature.to_bits(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NORMAL_EVENT;

    fn table(rows: &[(&str, &str, f64, &str)]) -> ReadingTable {
        rows.iter()
            .map(|(sensor, ts, temp, event)| Reading::new(sensor, ts, *temp, event))
            .collect()
    }

    fn record(event: &str, ts: &str, temp: f64) -> EventRecord {
        EventRecord {
            event: event.to_string(),
            timestamp: ts.to_string(),
            temperature: temp,
        }
    }

    // --- recent_anomalies ---------------------------------------------------

    #[test]
    fn test_single_anomaly_scenario() {
        let t = table(&[
            ("S1", "2024-06-01 08:00:00", 5.0, "Normal"),
            ("S1", "2024-06-01 08:05:00", 9.0, "HighTemp"),
            ("S2", "2024-06-01 08:00:00", 5.0, "Normal"),
        ]);
        let events = recent_anomalies(&t, 10);
        assert_eq!(events, vec![record("HighTemp", "2024-06-01 08:05:00", 9.0)]);
    }

    #[test]
    fn test_duplicates_across_sensors_collapse() {
        // Two sensors reporting the same event at the same instant and
        // temperature are one listing row.
        let t = table(&[
            ("S1", "2024-06-01 08:05:00", 9.0, "HighTemp"),
            ("S2", "2024-06-01 08:05:00", 9.0, "HighTemp"),
            ("S2", "2024-06-01 08:05:00", 9.5, "HighTemp"),
        ]);
        let events = recent_anomalies(&t, 10);
        assert_eq!(
            events,
            vec![
                record("HighTemp", "2024-06-01 08:05:00", 9.0),
                record("HighTemp", "2024-06-01 08:05:00", 9.5),
            ]
        );
    }

    #[test]
    fn test_newest_first_and_truncated() {
        let t = table(&[
            ("S1", "2024-06-01 08:00:00", 9.0, "HighTemp"),
            ("S1", "2024-06-01 10:00:00", 1.0, "DoorOpen"),
            ("S1", "2024-06-01 09:00:00", 12.0, "HighTemp"),
            ("S1", "2024-06-01 11:00:00", 4.0, "Normal"),
        ]);
        let events = recent_anomalies(&t, 2);
        assert_eq!(
            events,
            vec![
                record("DoorOpen", "2024-06-01 10:00:00", 1.0),
                record("HighTemp", "2024-06-01 09:00:00", 12.0),
            ]
        );
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let t = table(&[
            ("S1", "2024-06-01 08:00:00", 9.0, "HighTemp"),
            ("S2", "2024-06-01 08:00:00", 0.5, "PowerFailure"),
            ("S3", "2024-06-01 08:00:00", 7.0, "DoorOpen"),
        ]);
        let labels: Vec<_> = recent_anomalies(&t, 10)
            .into_iter()
            .map(|e| e.event)
            .collect();
        assert_eq!(labels, ["HighTemp", "PowerFailure", "DoorOpen"]);
    }

    #[test]
    fn test_orders_by_instant_not_by_string() {
        // As strings the -08:00 reading sorts first; as instants it is
        // 15:00 UTC, three hours after the other one.
        let t = table(&[
            ("S1", "2024-06-01T12:00:00Z", 9.0, "HighTemp"),
            ("S2", "2024-06-01T07:00:00-08:00", 8.0, "HighTemp"),
        ]);
        let events = recent_anomalies(&t, 10);
        assert_eq!(events[0].timestamp, "2024-06-01T07:00:00-08:00");
    }

    #[test]
    fn test_zero_limit_means_unlimited() {
        let rows: Vec<Reading> = (0..30)
            .map(|i| Reading::new("S1", &format!("2024-06-01 08:{:02}:00", i), 9.0, "HighTemp"))
            .collect();
        let t = ReadingTable::new(rows);
        assert_eq!(recent_anomalies(&t, 0).len(), 30);
        assert_eq!(recent_anomalies(&t, 20).len(), 20);
    }

    #[test]
    fn test_all_normal_table_lists_nothing() {
        let t = table(&[
            ("S1", "2024-06-01 08:00:00", 4.0, NORMAL_EVENT),
            ("S2", "2024-06-01 08:00:00", 4.0, NORMAL_EVENT),
        ]);
        assert!(recent_anomalies(&t, 10).is_empty());
    }

    #[test]
    fn test_opaque_timestamps_order_by_raw_string() {
        let t = table(&[
            ("S1", "t1", 5.0, "Normal"),
            ("S1", "t2", 9.0, "HighTemp"),
            ("S2", "t1", 5.0, "Normal"),
        ]);
        assert_eq!(recent_anomalies(&t, 10), vec![record("HighTemp", "t2", 9.0)]);
    }

    #[test]
    fn test_one_unparseable_row_switches_whole_listing_to_raw_order() {
        let t = table(&[
            ("S1", "2024-06-01T12:00:00Z", 9.0, "HighTemp"),
            ("S2", "2024-06-01T07:00:00-08:00", 8.0, "HighTemp"),
            ("S3", "??", 7.0, "DoorOpen"),
        ]);
        let stamps: Vec<_> = recent_anomalies(&t, 10)
            .into_iter()
            .map(|e| e.timestamp)
            .collect();
        assert_eq!(stamps, ["??", "2024-06-01T12:00:00Z", "2024-06-01T07:00:00-08:00"]);
    }

    #[test]
    fn test_reapplying_to_own_output_is_stable() {
        let t = table(&[
            ("S1", "2024-06-01 08:00:00", 9.0, "HighTemp"),
            ("S1", "2024-06-01 09:00:00", 12.0, "HighTemp"),
            ("S1", "2024-06-01 09:00:00", 12.0, "HighTemp"),
        ]);
        let first = recent_anomalies(&t, 10);
        let replay: ReadingTable = first
            .iter()
            .map(|e| Reading::new("S1", &e.timestamp, e.temperature, &e.event))
            .collect();
        assert_eq!(recent_anomalies(&replay, 10), first);
    }

    // --- recent_alerts ------------------------------------------------------

    #[test]
    fn test_alerts_keep_duplicate_reports() {
        let t = table(&[
            ("S1", "2024-06-01 08:05:00", 9.0, "HighTemp"),
            ("S2", "2024-06-01 08:05:00", 9.0, "HighTemp"),
            ("S2", "2024-06-01 08:00:00", 4.0, "Normal"),
        ]);
        let alerts = recent_alerts(&t, 10);
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.event != NORMAL_EVENT));
    }

    #[test]
    fn test_alerts_respect_limit() {
        let rows: Vec<Reading> = (0..15)
            .map(|i| Reading::new("T1", &format!("2024-06-01 09:{:02}:00", i), 11.0, "HighTemp"))
            .collect();
        let alerts = recent_alerts(&ReadingTable::new(rows), 10);
        assert_eq!(alerts.len(), 10);
        assert_eq!(alerts[0].timestamp, "2024-06-01 09:14:00");
    }
}

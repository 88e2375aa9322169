/// Sensor log (CSV) reader.
///
/// Each warehouse room, supermarket room and the transport fleet write one
/// log with a header row. The four columns `SensorID`, `Timestamp`,
/// `Temperature` and `Event` are the contract; their position is not, and
/// extra columns (battery, humidity, ...) are ignored.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::model::{
    COL_EVENT, COL_SENSOR_ID, COL_TEMPERATURE, COL_TIMESTAMP, ColdChainError, REQUIRED_COLUMNS,
    Reading, ReadingTable, Result,
};

// ---------------------------------------------------------------------------
// File access
// ---------------------------------------------------------------------------

/// Reads and parses a sensor log from disk.
///
/// A missing file is `SourceNotFound`; any other I/O failure is passed
/// through as `Io`.
pub fn read_sensor_log(path: &Path, source_id: &str) -> Result<ReadingTable> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ColdChainError::SourceNotFound(path.display().to_string()),
        _ => ColdChainError::Io(e),
    })?;
    parse_sensor_log(&text, source_id)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    sensor_id: usize,
    timestamp: usize,
    temperature: usize,
    event: usize,
}

impl ColumnLayout {
    fn from_header(header: &[String], source_id: &str) -> Result<Self> {
        let position = |name: &str| header.iter().position(|h| h == name);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| position(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ColdChainError::format(
                source_id,
                format!("missing column(s): {}", missing.join(", ")),
            ));
        }

        // All four are known to be present at this point.
        let find = |name: &str| position(name).unwrap_or_default();
        Ok(Self {
            sensor_id: find(COL_SENSOR_ID),
            timestamp: find(COL_TIMESTAMP),
            temperature: find(COL_TEMPERATURE),
            event: find(COL_EVENT),
        })
    }

    fn width(&self) -> usize {
        [self.sensor_id, self.timestamp, self.temperature, self.event]
            .into_iter()
            .max()
            .unwrap_or_default()
            + 1
    }
}

/// Parses the text of a sensor log into a reading table.
///
/// Blank lines are skipped. Rows are kept in file order. A header without
/// the required columns, a short row, an empty sensor id or a non-numeric
/// temperature is a `SourceFormat` error naming the 1-based line. A header
/// with no data rows is a valid, empty table.
pub fn parse_sensor_log(text: &str, source_id: &str) -> Result<ReadingTable> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| ColdChainError::format(source_id, "file has no header row"))?;
    let header: Vec<String> = split_csv_line(header_line.trim_start_matches('\u{feff}'))
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    let layout = ColumnLayout::from_header(&header, source_id)?;
    let width = layout.width();

    let mut rows = Vec::new();
    for (index, line) in lines {
        let line_no = index + 1;
        let fields = split_csv_line(line);
        if fields.len() < width {
            return Err(ColdChainError::format(
                source_id,
                format!("line {}: expected at least {} fields, got {}", line_no, width, fields.len()),
            ));
        }

        let sensor_id = fields[layout.sensor_id].trim();
        if sensor_id.is_empty() {
            return Err(ColdChainError::format(
                source_id,
                format!("line {}: empty {}", line_no, COL_SENSOR_ID),
            ));
        }

        let raw_temperature = fields[layout.temperature].trim();
        let temperature = raw_temperature
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| {
                ColdChainError::format(
                    source_id,
                    format!("line {}: invalid {} {:?}", line_no, COL_TEMPERATURE, raw_temperature),
                )
            })?;

        rows.push(Reading {
            sensor_id: sensor_id.to_string(),
            timestamp: fields[layout.timestamp].trim().to_string(),
            temperature,
            event: fields[layout.event].trim().to_string(),
        });
    }

    Ok(ReadingTable::new(rows))
}

/// Splits one CSV line on commas, honouring double-quoted fields and `""`
/// escapes inside them.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Table merging for room-wide, building-wide and fleet-wide views.

use crate::model::{Reading, ReadingTable};

/// Concatenates tables in the order given.
///
/// Row order is preserved within and across tables. No deduplication
/// happens here; overlapping sources keep their duplicate rows and the event
/// listings remove them where it matters.
pub fn merge_tables<'a, I>(tables: I) -> ReadingTable
where
    I: IntoIterator<Item = &'a ReadingTable>,
{
    let rows: Vec<Reading> = tables
        .into_iter()
        .flat_map(|table| table.rows().iter().cloned())
        .collect();
    ReadingTable::new(rows)
}

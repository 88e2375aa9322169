//! Per-session cache of loaded sensor logs.
//!
//! Logs are static for the lifetime of a run, so each one is read at most
//! once and kept. The cache key is the source identifier as the caller gave
//! it: a registry room id (`warehouse/room1`) or a file name relative to the
//! data directory (`room1.csv`). There is no eviction and no invalidation;
//! a session that needs fresh data starts a new cache.
//!
//! Failed loads are not cached, so a missing file is reported again on the
//! next request instead of being remembered as empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::analysis::merge_tables;
use crate::ingest::sensor_log::read_sensor_log;
use crate::logging::log_load_failure;
use crate::model::{ColdChainError, ReadingTable, Result};
use crate::sites::SiteRegistry;

pub struct SourceCache {
    data_dir: PathBuf,
    registry: SiteRegistry,
    tables: HashMap<String, Arc<ReadingTable>>,
}

impl SourceCache {
    pub fn new(data_dir: impl Into<PathBuf>, registry: SiteRegistry) -> Self {
        Self {
            data_dir: data_dir.into(),
            registry,
            tables: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Returns the table behind `identifier`, reading it on first use.
    ///
    /// Registry ids are resolved to their file; anything else is treated as
    /// a file name under the data directory. Identifiers that resolve to no
    /// existing file fail with `SourceNotFound`.
    pub fn load(&mut self, identifier: &str) -> Result<Arc<ReadingTable>> {
        if let Some(table) = self.tables.get(identifier) {
            debug!(target: "source", "cache hit for {}", identifier);
            return Ok(Arc::clone(table));
        }

        let path = self.resolve_path(identifier)?;
        let table = read_sensor_log(&path, identifier)
            .map(Arc::new)
            .inspect_err(|e| log_load_failure(identifier, "load", e))?;

        info!(
            target: "source",
            "loaded {} readings for {} from {}",
            table.len(),
            identifier,
            path.display()
        );
        self.tables.insert(identifier.to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// Loads several sources and concatenates them in the order given.
    ///
    /// Every identifier is attempted even after a failure, so each missing
    /// source is logged and the ones that do load stay cached. The first
    /// error is returned.
    pub fn load_many<S: AsRef<str>>(&mut self, identifiers: &[S]) -> Result<ReadingTable> {
        let mut tables = Vec::with_capacity(identifiers.len());
        let mut first_error = None;
        for id in identifiers {
            match self.load(id.as_ref()) {
                Ok(table) => tables.push(table),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(merge_tables(tables.iter().map(|table| &**table))),
        }
    }

    /// Number of tables currently held.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn is_cached(&self, identifier: &str) -> bool {
        self.tables.contains_key(identifier)
    }

    fn resolve_path(&self, identifier: &str) -> Result<PathBuf> {
        if let Some(room) = self.registry.find_room_by_id(identifier) {
            return Ok(self.data_dir.join(&room.file));
        }

        let candidate = Path::new(identifier);
        // Only plain relative file names; an id like "warehouse/room9" that
        // misses the registry must not be read as a nested path.
        let is_plain_file = candidate.extension().is_some()
            && candidate.components().count() == 1;
        if is_plain_file {
            Ok(self.data_dir.join(candidate))
        } else {
            Err(ColdChainError::SourceNotFound(identifier.to_string()))
        }
    }
}

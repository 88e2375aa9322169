/// Site registry for the cold-chain monitoring network.
///
/// Defines the monitored entities (the warehouse, the transport fleet, the
/// supermarkets), the rooms or feeds inside each one, and the sensor log
/// that backs every room. This is the single source of truth for source
/// identifiers: other modules look rooms up here rather than hardcoding file
/// names.
///
/// The built-in network matches the deployed files. A TOML file with the
/// same shape (`sources.toml`) replaces it when configured.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{ColdChainError, Result};

// ---------------------------------------------------------------------------
// Registry types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    Warehouse,
    Transport,
    Supermarket,
}

/// One room or feed, backed by one sensor log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    /// Stable source identifier, e.g. `warehouse/room1`.
    pub id: String,
    /// Display name, e.g. `Room 1`.
    pub name: String,
    /// Log file name, relative to the data directory.
    pub file: String,
}

/// A monitored entity and its rooms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Site {
    /// Short key used in source identifiers, e.g. `supermarket1`.
    pub key: String,
    /// Display name, e.g. `Supermarket 1`.
    pub name: String,
    pub kind: SiteKind,
    pub rooms: Vec<Room>,
}

impl Site {
    pub fn find_room(&self, room: &str) -> Option<&Room> {
        self.rooms
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(room) || r.id == room || slug(&r.name) == slug(room))
    }

    pub fn room_ids(&self) -> Vec<&str> {
        self.rooms.iter().map(|r| r.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteRegistry {
    sites: Vec<Site>,
}

// ---------------------------------------------------------------------------
// TOML layout
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    site: Vec<SiteEntry>,
}

#[derive(Debug, Deserialize)]
struct SiteEntry {
    key: String,
    name: String,
    kind: SiteKind,
    #[serde(default)]
    room: Vec<RoomEntry>,
}

#[derive(Debug, Deserialize)]
struct RoomEntry {
    name: String,
    file: String,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl SiteRegistry {
    /// Builds a registry from sites, rejecting inconsistent layouts.
    pub fn new(sites: Vec<Site>) -> Result<Self> {
        let registry = Self { sites };
        registry.validate()?;
        Ok(registry)
    }

    /// The deployed network: four warehouse rooms, one transport feed and
    /// two supermarkets with two rooms each.
    pub fn builtin() -> Self {
        let warehouse_rooms = (1..=4)
            .map(|n| (format!("Room {}", n), format!("room{}.csv", n)))
            .collect::<Vec<_>>();

        let mut sites = vec![
            build_site("warehouse", "Warehouse", SiteKind::Warehouse, warehouse_rooms),
            build_site(
                "transport",
                "Transport",
                SiteKind::Transport,
                vec![("All".to_string(), "modified_sensor_data.csv".to_string())],
            ),
        ];
        for s in 1..=2 {
            let rooms = (1..=2)
                .map(|r| (format!("Room {}", r), format!("sm{}room{}.csv", s, r)))
                .collect();
            sites.push(build_site(
                &format!("supermarket{}", s),
                &format!("Supermarket {}", s),
                SiteKind::Supermarket,
                rooms,
            ));
        }
        Self { sites }
    }

    /// Parses a registry from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(text)
            .map_err(|e| ColdChainError::Config(format!("invalid site registry: {}", e)))?;

        let sites = file
            .site
            .into_iter()
            .map(|entry| {
                let rooms = entry.room.into_iter().map(|r| (r.name, r.file)).collect();
                build_site(&entry.key, &entry.name, entry.kind, rooms)
            })
            .collect();
        Self::new(sites)
    }

    /// Loads a registry file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ColdChainError::Config(format!("cannot read site registry {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.sites.is_empty() {
            return Err(ColdChainError::Config("site registry has no sites".into()));
        }
        let mut keys = HashSet::new();
        let mut room_ids = HashSet::new();
        for site in &self.sites {
            if !keys.insert(site.key.as_str()) {
                return Err(ColdChainError::Config(format!("duplicate site key '{}'", site.key)));
            }
            if site.rooms.is_empty() {
                return Err(ColdChainError::Config(format!("site '{}' has no rooms", site.name)));
            }
            for room in &site.rooms {
                if room.file.trim().is_empty() {
                    return Err(ColdChainError::Config(format!("room '{}' has no file", room.id)));
                }
                if !room_ids.insert(room.id.as_str()) {
                    return Err(ColdChainError::Config(format!("duplicate room id '{}'", room.id)));
                }
            }
        }
        Ok(())
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn build_site(key: &str, name: &str, kind: SiteKind, rooms: Vec<(String, String)>) -> Site {
    Site {
        key: key.to_string(),
        name: name.to_string(),
        kind,
        rooms: rooms
            .into_iter()
            .map(|(room_name, file)| Room {
                id: format!("{}/{}", key, slug(&room_name)),
                name: room_name,
                file,
            })
            .collect(),
    }
}

/// Lowercase with whitespace removed: `Room 1` → `room1`.
fn slug(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

impl SiteRegistry {
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Looks a site up by key or display name (case-insensitive).
    pub fn find_site(&self, key_or_name: &str) -> Option<&Site> {
        self.sites.iter().find(|s| {
            s.key.eq_ignore_ascii_case(key_or_name)
                || s.name.eq_ignore_ascii_case(key_or_name)
                || s.key == slug(key_or_name)
        })
    }

    pub fn sites_of_kind(&self, kind: SiteKind) -> Vec<&Site> {
        self.sites.iter().filter(|s| s.kind == kind).collect()
    }

    /// Resolves a source identifier such as `warehouse/room2`.
    pub fn find_room_by_id(&self, id: &str) -> Option<&Room> {
        self.sites
            .iter()
            .flat_map(|s| s.rooms.iter())
            .find(|r| r.id == id)
    }

    pub fn all_source_ids(&self) -> Vec<&str> {
        self.sites.iter().flat_map(|s| s.room_ids()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

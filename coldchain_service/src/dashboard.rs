//! Page assembly for the dashboard.
//!
//! Each page loads its sources through the session's `SourceCache`, runs
//! the aggregation engine over them and returns a serializable view. The
//! view is everything a front end needs to draw its charts, tables and map;
//! no further computation happens downstream.
//!
//! Missing logs and empty tables do not fail a page. They become
//! `Panel::NoData` with the message the user sees. Malformed data and
//! unparseable timestamps do fail it, since they mean the files are wrong.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::alert::{recent_alerts, recent_anomalies};
use crate::analysis::{mean_over_time, per_sensor_series, ranked_sensor_means};
use crate::ingest::kml::{self, LatLon};
use crate::logging::{log_load_failure, log_render_summary};
use crate::model::{ColdChainError, EventRecord, ReadingTable, Result, SensorMean, SensorSeries, TimePoint};
use crate::sites::{Room, Site, SiteKind};
use crate::source::SourceCache;

// ---------------------------------------------------------------------------
// Listing limits
// ---------------------------------------------------------------------------

pub const TRANSPORT_EVENT_LIMIT: usize = 20;
pub const WAREHOUSE_EVENT_LIMIT: usize = 10;
pub const SUPERMARKET_EVENT_LIMIT: usize = 20;
pub const ROOM_ALERT_LIMIT: usize = 10;
pub const TRANSPORT_ALERT_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Pages and selections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Transport,
    Warehouse,
    Supermarket,
    CityView,
    Alerts,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Home,
        Page::Transport,
        Page::Warehouse,
        Page::Supermarket,
        Page::CityView,
        Page::Alerts,
    ];
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Home => write!(f, "Home"),
            Page::Transport => write!(f, "Transport"),
            Page::Warehouse => write!(f, "Warehouse"),
            Page::Supermarket => write!(f, "Supermarket"),
            Page::CityView => write!(f, "City View"),
            Page::Alerts => write!(f, "Alerts"),
        }
    }
}

impl FromStr for Page {
    type Err = ColdChainError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "home" => Ok(Page::Home),
            "transport" => Ok(Page::Transport),
            "warehouse" => Ok(Page::Warehouse),
            "supermarket" => Ok(Page::Supermarket),
            "cityview" | "map" => Ok(Page::CityView),
            "alerts" => Ok(Page::Alerts),
            _ => Err(ColdChainError::UnknownPage(s.to_string())),
        }
    }
}

/// The selector state of a page: which site and room the user picked.
/// Unset fields fall back to the first entry, like a fresh selectbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub site: Option<String>,
    pub room: Option<String>,
}

impl Selection {
    pub fn new(site: Option<&str>, room: Option<&str>) -> Self {
        Self {
            site: site.map(String::from),
            room: room.map(String::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A page section that either has content or shows a "no data" message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready(T),
    NoData(String),
}

impl<T> Panel<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Panel::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(value) => Some(value),
            Panel::NoData(_) => None,
        }
    }
}

/// The four views every data page shows for its selected table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub sensor_series: Vec<SensorSeries>,
    pub sensor_means: Vec<SensorMean>,
    pub recent_events: Vec<EventRecord>,
    pub mean_over_time: Vec<TimePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSection {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    pub title: String,
    pub subtitle: String,
    pub sections: Vec<HomeSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportView {
    pub summary: Panel<TableSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseView {
    pub room: String,
    pub summary: Panel<TableSummary>,
    /// Mean over time across every room of the building.
    pub building_trend: Panel<Vec<TimePoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupermarketView {
    pub supermarket: String,
    pub room: String,
    pub summary: Panel<TableSummary>,
    /// Mean over time across every room of the supermarket.
    pub supermarket_trend: Panel<Vec<TimePoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertsView {
    pub category: String,
    pub room: String,
    pub alerts: Panel<Vec<EventRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityView {
    pub name: Option<String>,
    pub center: LatLon,
    pub zoom: u8,
    /// Polygon ring in `[lat, lon]` order, ready for a map widget.
    pub polygon: Vec<LatLon>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum PageView {
    Home(HomeView),
    Transport(TransportView),
    Warehouse(WarehouseView),
    Supermarket(SupermarketView),
    CityView(CityView),
    Alerts(AlertsView),
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Computes the four standard views of one table.
///
/// An empty table fails with `EmptyTable` (from `per_sensor_series`), which
/// the pages turn into their "no data" message.
pub fn summarize(table: &ReadingTable, event_limit: usize) -> Result<TableSummary> {
    Ok(TableSummary {
        sensor_series: per_sensor_series(table)?,
        sensor_means: ranked_sensor_means(table),
        recent_events: recent_anomalies(table, event_limit),
        mean_over_time: mean_over_time(table)?,
    })
}

/// Turns "no data" errors into a message panel and propagates the rest.
fn into_panel<T>(result: Result<T>, message: impl Into<String>) -> Result<Panel<T>> {
    match result {
        Ok(value) => Ok(Panel::Ready(value)),
        Err(e) if e.is_no_data() => Ok(Panel::NoData(message.into())),
        Err(e) => Err(e),
    }
}

/// Group trend over several rooms; empty input is "no data" as well.
fn group_trend(table: Result<ReadingTable>) -> Result<Vec<TimePoint>> {
    let points = mean_over_time(&table?)?;
    if points.is_empty() {
        return Err(ColdChainError::EmptyTable);
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// One user session: a source cache plus the boundary file location.
pub struct Dashboard {
    cache: SourceCache,
    boundary_path: PathBuf,
    // Distinct sources touched by the current render, for its summary log.
    loaded: BTreeSet<String>,
    failed: BTreeSet<String>,
}

impl Dashboard {
    pub fn new(cache: SourceCache, boundary_path: impl Into<PathBuf>) -> Self {
        Self {
            cache,
            boundary_path: boundary_path.into(),
            loaded: BTreeSet::new(),
            failed: BTreeSet::new(),
        }
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// Builds the view of `page` for the given selector state.
    pub fn render(&mut self, page: Page, selection: &Selection) -> Result<PageView> {
        self.loaded.clear();
        self.failed.clear();

        let view = match page {
            Page::Home => Ok(PageView::Home(home_view())),
            Page::Transport => self.transport_view().map(PageView::Transport),
            Page::Warehouse => self.warehouse_view(selection).map(PageView::Warehouse),
            Page::Supermarket => self.supermarket_view(selection).map(PageView::Supermarket),
            Page::CityView => self.city_view().map(PageView::CityView),
            Page::Alerts => self.alerts_view(selection).map(PageView::Alerts),
        };

        let (loaded, failed) = (self.loaded.len(), self.failed.len());
        if loaded + failed > 0 {
            log_render_summary(&page.to_string(), loaded + failed, loaded, failed);
        }
        view
    }

    // --- source access ------------------------------------------------------

    fn load_rooms(&mut self, rooms: &[Room]) -> Result<ReadingTable> {
        let ids: Vec<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
        let result = self.cache.load_many(&ids);
        for id in ids {
            if self.cache.is_cached(id) {
                self.loaded.insert(id.to_string());
            } else {
                self.failed.insert(id.to_string());
            }
        }
        result
    }

    fn site_for(&self, kind: SiteKind, requested: Option<&str>) -> Result<Site> {
        let registry = self.cache.registry();
        let site = match requested {
            Some(name) => registry
                .find_site(name)
                .filter(|s| s.kind == kind)
                .ok_or_else(|| ColdChainError::UnknownSelection(format!("site '{}'", name)))?,
            None => registry
                .sites_of_kind(kind)
                .into_iter()
                .next()
                .ok_or_else(|| ColdChainError::UnknownSelection(format!("no {:?} site", kind)))?,
        };
        Ok(site.clone())
    }

    fn room_of(site: &Site, requested: Option<&str>) -> Result<Room> {
        let room = match requested {
            Some(name) => site.find_room(name),
            None => site.rooms.first(),
        };
        room.cloned().ok_or_else(|| {
            ColdChainError::UnknownSelection(format!(
                "room '{}' in {}",
                requested.unwrap_or_default(),
                site.name
            ))
        })
    }

    // --- pages --------------------------------------------------------------

    fn transport_view(&mut self) -> Result<TransportView> {
        let site = self.site_for(SiteKind::Transport, None)?;
        let summary = self
            .load_rooms(&site.rooms)
            .and_then(|table| summarize(&table, TRANSPORT_EVENT_LIMIT));
        Ok(TransportView {
            summary: into_panel(summary, "No data available. Please go back and load data.")?,
        })
    }

    fn warehouse_view(&mut self, selection: &Selection) -> Result<WarehouseView> {
        let site = self.site_for(SiteKind::Warehouse, selection.site.as_deref())?;
        let room = Self::room_of(&site, selection.room.as_deref())?;

        let summary = self
            .load_rooms(std::slice::from_ref(&room))
            .and_then(|table| summarize(&table, WAREHOUSE_EVENT_LIMIT));
        let building = group_trend(self.load_rooms(&site.rooms));

        Ok(WarehouseView {
            room: room.name.clone(),
            summary: into_panel(summary, "No data available for the selected room.")?,
            building_trend: into_panel(building, "No data available for the entire building.")?,
        })
    }

    fn supermarket_view(&mut self, selection: &Selection) -> Result<SupermarketView> {
        let site = self.site_for(SiteKind::Supermarket, selection.site.as_deref())?;
        let room = Self::room_of(&site, selection.room.as_deref())?;

        let summary = self
            .load_rooms(std::slice::from_ref(&room))
            .and_then(|table| summarize(&table, SUPERMARKET_EVENT_LIMIT));
        let store = group_trend(self.load_rooms(&site.rooms));

        Ok(SupermarketView {
            supermarket: site.name.clone(),
            room: room.name.clone(),
            summary: into_panel(summary, "No data available for the selected room.")?,
            supermarket_trend: into_panel(
                store,
                format!("No data available for {}.", site.name),
            )?,
        })
    }

    fn alerts_view(&mut self, selection: &Selection) -> Result<AlertsView> {
        let site = self.alerts_category(selection.site.as_deref())?;
        let room = Self::room_of(&site, selection.room.as_deref())?;

        let (limit, message) = match site.kind {
            SiteKind::Transport => (
                TRANSPORT_ALERT_LIMIT,
                "No data available for transportation.".to_string(),
            ),
            SiteKind::Warehouse => (
                ROOM_ALERT_LIMIT,
                format!("No data available for {}.", room.name),
            ),
            SiteKind::Supermarket => (
                ROOM_ALERT_LIMIT,
                format!("No data available for {} in {}.", room.name, site.name),
            ),
        };

        let alerts = self
            .load_rooms(std::slice::from_ref(&room))
            .and_then(|table| {
                if table.is_empty() {
                    Err(ColdChainError::EmptyTable)
                } else {
                    Ok(recent_alerts(&table, limit))
                }
            });

        Ok(AlertsView {
            category: site.name.clone(),
            room: room.name.clone(),
            alerts: into_panel(alerts, message)?,
        })
    }

    /// Alerts categories are any site; "Transportation" names the fleet.
    fn alerts_category(&self, requested: Option<&str>) -> Result<Site> {
        let registry = self.cache.registry();
        let site = match requested {
            Some(name) if name.eq_ignore_ascii_case("transportation") => {
                registry.sites_of_kind(SiteKind::Transport).into_iter().next()
            }
            Some(name) => registry.find_site(name),
            None => registry.sites().first(),
        };
        site.cloned().ok_or_else(|| {
            ColdChainError::UnknownSelection(format!("category '{}'", requested.unwrap_or_default()))
        })
    }

    fn city_view(&mut self) -> Result<CityView> {
        let source = self.boundary_path.display().to_string();
        let boundary = match kml::load_boundary(&self.boundary_path) {
            Ok(boundary) => boundary,
            Err(e) => {
                log_load_failure(&source, "boundary", &e);
                self.failed.insert(source);
                return Err(e);
            }
        };
        self.loaded.insert(source);

        Ok(CityView {
            name: boundary.name.clone(),
            center: boundary.center(),
            zoom: kml::DEFAULT_ZOOM,
            polygon: boundary.lat_lon_ring(),
        })
    }
}

fn home_view() -> HomeView {
    let section = |title: &str, description: &str| HomeSection {
        title: title.to_string(),
        description: description.to_string(),
    };
    HomeView {
        title: "Cold Chain Logistics Dashboard".to_string(),
        subtitle: "Explore the different aspects of the cold chain logistics system.".to_string(),
        sections: vec![
            section("Transport", "Monitor transport data and alerts."),
            section("Warehouse", "Track warehouse temperature and alerts."),
            section("Supermarket", "Check supermarket room conditions."),
            section("City View", "View city maps with geographical constraints."),
            section("Alerts", "View recent alerts across all categories."),
        ],
    }
}

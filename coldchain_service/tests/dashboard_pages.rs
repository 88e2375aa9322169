//! Integration tests for page assembly over a real data directory.
//!
//! Every test writes its own sensor logs into a temporary directory laid
//! out like the deployed one (room1..4.csv, modified_sensor_data.csv,
//! sm{1,2}room{1,2}.csv, map.kml) and renders pages through `Dashboard`.

use std::fs;
use std::path::Path;

use coldchain_service::dashboard::{
    Dashboard, Page, PageView, Panel, ROOM_ALERT_LIMIT, Selection, TRANSPORT_ALERT_LIMIT,
    WAREHOUSE_EVENT_LIMIT,
};
use coldchain_service::model::{ColdChainError, NORMAL_EVENT};
use coldchain_service::sites::SiteRegistry;
use coldchain_service::source::SourceCache;
use tempfile::TempDir;

const HEADER: &str = "SensorID,Timestamp,Temperature,Event";

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn write_log(dir: &Path, file: &str, rows: &[&str]) {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    fs::write(dir.join(file), text).expect("write sensor log");
}

/// A full network with a few readings per room.
fn network() -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path();

    for room in 1..=4 {
        let base = room as f64;
        write_log(
            path,
            &format!("room{}.csv", room),
            &[
                &format!("WH{}-A,2024-06-01 08:00:00,{:.1},Normal", room, base),
                &format!("WH{}-B,2024-06-01 08:00:00,{:.1},Normal", room, base + 2.0),
                &format!("WH{}-A,2024-06-01 08:05:00,{:.1},HighTemp", room, base + 6.0),
            ],
        );
    }

    write_log(
        path,
        "modified_sensor_data.csv",
        &[
            "TRUCK-1,2024-06-01 07:00:00,2.0,Normal",
            "TRUCK-2,2024-06-01 07:00:00,4.0,Normal",
            "TRUCK-1,2024-06-01 07:30:00,11.0,HighTemp",
            "TRUCK-2,2024-06-01 07:30:00,11.0,HighTemp",
            "TRUCK-2,2024-06-01 07:45:00,5.0,DoorOpen",
        ],
    );

    for s in 1..=2 {
        for r in 1..=2 {
            write_log(
                path,
                &format!("sm{}room{}.csv", s, r),
                &[
                    &format!("SM{}R{}-1,2024-06-01 09:00:00,{}.0,Normal", s, r, r),
                    &format!("SM{}R{}-1,2024-06-01 09:10:00,{}.0,PowerFailure", s, r, r + 10),
                ],
            );
        }
    }

    fs::write(
        path.join("map.kml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document><Placemark><name>Delivery area</name>
<Polygon><outerBoundaryIs><LinearRing><coordinates>
10.0,50.0,0 10.2,50.0,0 10.2,50.1,0 10.0,50.1,0 10.0,50.0,0
</coordinates></LinearRing></outerBoundaryIs></Polygon></Placemark></Document></kml>"#,
    )
    .expect("write kml");

    dir
}

fn dashboard(dir: &TempDir) -> Dashboard {
    let cache = SourceCache::new(dir.path(), SiteRegistry::builtin());
    Dashboard::new(cache, dir.path().join("map.kml"))
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[test]
fn test_transport_page_computes_all_views() {
    let dir = network();
    let view = dashboard(&dir)
        .render(Page::Transport, &Selection::default())
        .expect("transport renders");

    let PageView::Transport(transport) = view else {
        panic!("expected transport view");
    };
    let summary = transport.summary.ready().expect("transport has data");

    assert_eq!(summary.sensor_series.len(), 2);
    assert_eq!(summary.sensor_means[0].sensor_id, "TRUCK-2"); // (4+11+5)/3 > (2+11)/2

    // Two trucks with the same HighTemp reading collapse to one listing row.
    let events: Vec<_> = summary.recent_events.iter().map(|e| e.event.as_str()).collect();
    assert_eq!(events, ["DoorOpen", "HighTemp"]);

    let trend: Vec<f64> = summary.mean_over_time.iter().map(|p| p.mean_temperature).collect();
    assert_eq!(trend, [3.0, 11.0, 5.0]);
}

#[test]
fn test_transport_without_log_shows_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let view = dashboard(&dir)
        .render(Page::Transport, &Selection::default())
        .expect("missing log is not a page failure");

    let PageView::Transport(transport) = view else {
        panic!("expected transport view");
    };
    assert_eq!(
        transport.summary,
        Panel::NoData("No data available. Please go back and load data.".to_string())
    );
}

// ---------------------------------------------------------------------------
// Warehouse
// ---------------------------------------------------------------------------

#[test]
fn test_warehouse_room_and_building_trend() {
    let dir = network();
    let view = dashboard(&dir)
        .render(Page::Warehouse, &Selection::new(None, Some("Room 3")))
        .unwrap();

    let PageView::Warehouse(warehouse) = view else {
        panic!("expected warehouse view");
    };
    assert_eq!(warehouse.room, "Room 3");

    let summary = warehouse.summary.ready().unwrap();
    assert!(summary.sensor_series.iter().all(|s| s.sensor_id.starts_with("WH3-")));
    assert!(summary.recent_events.len() <= WAREHOUSE_EVENT_LIMIT);

    // Building trend at 08:00 averages 8 readings: rooms 1..4, sensors A and B.
    let building = warehouse.building_trend.ready().unwrap();
    assert_eq!(building.len(), 2);
    let expected_0800 = (1.0 + 3.0 + 2.0 + 4.0 + 3.0 + 5.0 + 4.0 + 6.0) / 8.0;
    assert!((building[0].mean_temperature - expected_0800).abs() < 1e-9);
}

#[test]
fn test_warehouse_defaults_to_first_room() {
    let dir = network();
    let view = dashboard(&dir).render(Page::Warehouse, &Selection::default()).unwrap();
    let PageView::Warehouse(warehouse) = view else {
        panic!("expected warehouse view");
    };
    assert_eq!(warehouse.room, "Room 1");
}

#[test]
fn test_empty_room_log_is_no_data_but_building_still_renders() {
    let dir = network();
    write_log(dir.path(), "room2.csv", &[]);

    let view = dashboard(&dir)
        .render(Page::Warehouse, &Selection::new(Some("Warehouse"), Some("Room 2")))
        .unwrap();
    let PageView::Warehouse(warehouse) = view else {
        panic!("expected warehouse view");
    };
    assert_eq!(
        warehouse.summary,
        Panel::NoData("No data available for the selected room.".to_string())
    );
    assert!(warehouse.building_trend.is_ready());
}

#[test]
fn test_malformed_room_log_fails_the_page() {
    let dir = network();
    fs::write(dir.path().join("room1.csv"), "SensorID,Timestamp\nA,2024-06-01\n").unwrap();

    let result = dashboard(&dir).render(Page::Warehouse, &Selection::default());
    assert!(matches!(result, Err(ColdChainError::SourceFormat { .. })));
}

#[test]
fn test_unknown_room_selection_is_an_error() {
    let dir = network();
    let result = dashboard(&dir).render(Page::Warehouse, &Selection::new(None, Some("Room 7")));
    assert!(matches!(result, Err(ColdChainError::UnknownSelection(_))));
}

// ---------------------------------------------------------------------------
// Supermarket
// ---------------------------------------------------------------------------

#[test]
fn test_supermarket_room_and_store_trend() {
    let dir = network();
    let view = dashboard(&dir)
        .render(Page::Supermarket, &Selection::new(Some("Supermarket 2"), Some("Room 2")))
        .unwrap();

    let PageView::Supermarket(market) = view else {
        panic!("expected supermarket view");
    };
    assert_eq!(market.supermarket, "Supermarket 2");
    assert_eq!(market.room, "Room 2");

    let summary = market.summary.ready().unwrap();
    assert_eq!(summary.sensor_series[0].sensor_id, "SM2R2-1");
    assert_eq!(summary.recent_events[0].event, "PowerFailure");

    // Store trend at 09:00 averages room 1 (1.0) and room 2 (2.0).
    let store = market.supermarket_trend.ready().unwrap();
    assert_eq!(store[0].mean_temperature, 1.5);
    assert_eq!(store[1].mean_temperature, 11.5);
}

#[test]
fn test_supermarket_with_a_missing_room_has_no_store_trend() {
    let dir = network();
    fs::remove_file(dir.path().join("sm1room2.csv")).unwrap();

    let view = dashboard(&dir)
        .render(Page::Supermarket, &Selection::new(Some("Supermarket 1"), Some("Room 1")))
        .unwrap();
    let PageView::Supermarket(market) = view else {
        panic!("expected supermarket view");
    };
    assert!(market.summary.is_ready());
    assert_eq!(
        market.supermarket_trend,
        Panel::NoData("No data available for Supermarket 1.".to_string())
    );
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[test]
fn test_alerts_for_transportation_keep_duplicates() {
    let dir = network();
    let view = dashboard(&dir)
        .render(Page::Alerts, &Selection::new(Some("Transportation"), Some("All")))
        .unwrap();

    let PageView::Alerts(alerts) = view else {
        panic!("expected alerts view");
    };
    let rows = alerts.alerts.ready().unwrap();
    assert!(rows.len() <= TRANSPORT_ALERT_LIMIT);
    // Both trucks' HighTemp reports are listed.
    assert_eq!(rows.iter().filter(|r| r.event == "HighTemp").count(), 2);
    assert!(rows.iter().all(|r| r.event != NORMAL_EVENT));
}

#[test]
fn test_alerts_for_warehouse_room_are_capped() {
    let dir = network();
    let rows: Vec<String> = (0..25)
        .map(|i| format!("WH1-A,2024-06-02 10:{:02}:00,9.5,HighTemp", i))
        .collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    write_log(dir.path(), "room1.csv", &refs);

    let view = dashboard(&dir)
        .render(Page::Alerts, &Selection::new(Some("Warehouse"), Some("Room 1")))
        .unwrap();
    let PageView::Alerts(alerts) = view else {
        panic!("expected alerts view");
    };
    let rows = alerts.alerts.ready().unwrap();
    assert_eq!(rows.len(), ROOM_ALERT_LIMIT);
    assert_eq!(rows[0].timestamp, "2024-06-02 10:24:00");
}

#[test]
fn test_alerts_for_missing_supermarket_room() {
    let dir = network();
    fs::remove_file(dir.path().join("sm2room1.csv")).unwrap();

    let view = dashboard(&dir)
        .render(Page::Alerts, &Selection::new(Some("Supermarket 2"), Some("Room 1")))
        .unwrap();
    let PageView::Alerts(alerts) = view else {
        panic!("expected alerts view");
    };
    assert_eq!(
        alerts.alerts,
        Panel::NoData("No data available for Room 1 in Supermarket 2.".to_string())
    );
}

// ---------------------------------------------------------------------------
// City View and Home
// ---------------------------------------------------------------------------

#[test]
fn test_city_view_centers_on_polygon() {
    let dir = network();
    let view = dashboard(&dir).render(Page::CityView, &Selection::default()).unwrap();
    let PageView::CityView(city) = view else {
        panic!("expected city view");
    };
    assert_eq!(city.name.as_deref(), Some("Delivery area"));
    assert_eq!(city.zoom, 12);
    assert!((city.center.lat - 50.05).abs() < 1e-9);
    assert!((city.center.lon - 10.1).abs() < 1e-9);
    assert_eq!(city.polygon.len(), 5);
    assert_eq!(city.polygon[1].lon, 10.2);
}

#[test]
fn test_city_view_without_map_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = dashboard(&dir).render(Page::CityView, &Selection::default());
    assert!(matches!(result, Err(ColdChainError::SourceNotFound(_))));
}

#[test]
fn test_home_needs_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let view = dashboard(&dir).render(Page::Home, &Selection::default()).unwrap();
    assert!(matches!(view, PageView::Home(_)));
}

// ---------------------------------------------------------------------------
// Session cache
// ---------------------------------------------------------------------------

#[test]
fn test_pages_share_one_load_per_source() {
    let dir = network();
    let mut dash = dashboard(&dir);

    dash.render(Page::Warehouse, &Selection::new(None, Some("Room 1"))).unwrap();
    assert_eq!(dash.cache().len(), 4);

    // The alerts page reuses room1 from the cache even after the file is gone.
    fs::remove_file(dir.path().join("room1.csv")).unwrap();
    let view = dash
        .render(Page::Alerts, &Selection::new(Some("Warehouse"), Some("Room 1")))
        .unwrap();
    let PageView::Alerts(alerts) = view else {
        panic!("expected alerts view");
    };
    assert!(alerts.alerts.is_ready());
}

#[test]
fn test_views_serialize_to_json() {
    let dir = network();
    let view = dashboard(&dir).render(Page::Transport, &Selection::default()).unwrap();
    let json = serde_json::to_value(&view).expect("views are serializable");

    assert_eq!(json["page"], "transport");
    assert_eq!(json["summary"]["status"], "ready");
    assert_eq!(json["summary"]["data"]["recent_events"][0]["event"], "DoorOpen");
    assert_eq!(json["summary"]["data"]["mean_over_time"][0]["timestamp"], "2024-06-01T07:00:00");
}

//! City View boundary polygon (KML).
//!
//! The delivery area is drawn as a single polygon in a KML document. Only
//! the exterior ring of the first Placemark's polygon is used. KML stores
//! coordinates as `lon,lat[,alt]` tuples separated by whitespace; map
//! widgets want `[lat, lon]`, so both orders are exposed.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;

use crate::model::{ColdChainError, Result};

/// Zoom level the City View map opens at.
pub const DEFAULT_ZOOM: u8 = 12;

/// A WGS84 position in map-widget order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// Axis-aligned bounding box of a polygon, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

/// The delivery-area polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boundary {
    pub name: Option<String>,
    /// Exterior ring as `(lon, lat)` pairs, in file order.
    pub exterior: Vec<(f64, f64)>,
}

impl Boundary {
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds {
            min_lon: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        for &(lon, lat) in &self.exterior {
            bounds.min_lon = bounds.min_lon.min(lon);
            bounds.min_lat = bounds.min_lat.min(lat);
            bounds.max_lon = bounds.max_lon.max(lon);
            bounds.max_lat = bounds.max_lat.max(lat);
        }
        bounds
    }

    /// Midpoint of the bounding box, where the map is centred.
    pub fn center(&self) -> LatLon {
        let b = self.bounds();
        LatLon {
            lat: (b.min_lat + b.max_lat) / 2.0,
            lon: (b.min_lon + b.max_lon) / 2.0,
        }
    }

    /// Exterior ring with each point swapped to `[lat, lon]`.
    pub fn lat_lon_ring(&self) -> Vec<LatLon> {
        self.exterior
            .iter()
            .map(|&(lon, lat)| LatLon { lat, lon })
            .collect()
    }
}

/// Reads the boundary polygon from a KML file.
pub fn load_boundary(path: &Path) -> Result<Boundary> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ColdChainError::SourceNotFound(path.display().to_string()),
        _ => ColdChainError::Io(e),
    })?;
    parse_boundary(&text, &path.display().to_string())
}

/// Extracts the first Placemark polygon from KML text.
///
/// A polygon needs at least three distinct corners; anything less, or a
/// document without a Placemark/coordinates element, is a `SourceFormat`
/// error.
pub fn parse_boundary(kml: &str, source_id: &str) -> Result<Boundary> {
    let placemark = element_body(kml, "Placemark")
        .ok_or_else(|| ColdChainError::format(source_id, "no Placemark element"))?;

    let name = element_body(placemark, "name")
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    // Prefer the outer ring when the polygon declares one.
    let ring_scope = element_body(placemark, "outerBoundaryIs").unwrap_or(placemark);
    let coordinates = element_body(ring_scope, "coordinates")
        .ok_or_else(|| ColdChainError::format(source_id, "no coordinates in Placemark"))?;

    let exterior = coordinates
        .split_whitespace()
        .map(|tuple| parse_tuple(tuple, source_id))
        .collect::<Result<Vec<_>>>()?;

    let mut corners = exterior.clone();
    corners.dedup();
    if corners.first() == corners.last() && corners.len() > 1 {
        corners.pop();
    }
    if corners.len() < 3 {
        return Err(ColdChainError::format(
            source_id,
            format!("polygon needs at least 3 corners, got {}", corners.len()),
        ));
    }

    Ok(Boundary { name, exterior })
}

/// Parses one `lon,lat[,alt]` tuple.
fn parse_tuple(tuple: &str, source_id: &str) -> Result<(f64, f64)> {
    let mut parts = tuple.split(',').map(|p| p.trim().parse::<f64>());
    match (parts.next(), parts.next()) {
        (Some(Ok(lon)), Some(Ok(lat))) => Ok((lon, lat)),
        _ => Err(ColdChainError::format(
            source_id,
            format!("invalid coordinate tuple {:?}", tuple),
        )),
    }
}

/// Text between the first `<tag ...>` and its matching `</tag>`.
///
/// Tags may carry attributes or a namespace prefix (`<kml:coordinates>`).
fn element_body<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(rel) = xml[search_from..].find('<') {
        let open_start = search_from + rel;
        let open_end = open_start + xml[open_start..].find('>')?;
        let inner = &xml[open_start + 1..open_end];
        search_from = open_end + 1;

        if inner.starts_with('/') || inner.starts_with('?') || inner.starts_with('!') {
            continue;
        }
        let qualified = inner.split_whitespace().next().unwrap_or_default();
        let local = qualified.rsplit(':').next().unwrap_or_default();
        if local != tag {
            continue;
        }

        let close = format!("</{}>", qualified);
        let body_start = open_end + 1;
        let body_len = xml[body_start..].find(&close)?;
        return Some(&xml[body_start..body_start + body_len]);
    }
    None
}

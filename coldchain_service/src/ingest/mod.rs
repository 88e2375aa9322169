//! Readers for the static files behind the dashboard.
//!
//! Submodules:
//! - `sensor_log`: temperature sensor CSV logs (one file per room or feed).
//! - `kml`: the City View boundary polygon.
//!
//! Both read whole files in one pass. Nothing here caches; see
//! `source::SourceCache` for per-session memoization.

pub mod kml;
pub mod sensor_log;

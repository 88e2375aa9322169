//! Cold-chain temperature monitoring dashboard.
//!
//! Reads the temperature sensor logs of a cold-chain network (warehouse
//! rooms, the transport fleet, supermarket rooms) and computes the views the
//! dashboard pages render: per-sensor series, ranked sensor means, recent
//! non-Normal events and mean temperature over time.
//!
//! Modules, leaf first:
//! - `model`: readings, derived views, the crate error type
//! - `timestamp`: timestamp normalization and ordering
//! - `analysis`: grouping views and table merging
//! - `alert`: recent event and alert listings
//! - `ingest`: sensor log and boundary file readers
//! - `sites`: registry of sites, rooms and their log files
//! - `source`: per-session cache of loaded logs
//! - `dashboard`: page assembly
//! - `config`, `logging`: runtime settings and log output

pub mod alert;
pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod sites;
pub mod source;
pub mod timestamp;

pub use analysis::{mean_over_time, merge_tables, per_sensor_series, ranked_sensor_means};
pub use alert::{recent_alerts, recent_anomalies};
pub use model::{ColdChainError, Reading, ReadingTable, Result};

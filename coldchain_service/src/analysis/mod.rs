//! Aggregation engine for the cold-chain dashboard.
//!
//! Every page of the dashboard renders the same derived views of a reading
//! table. The functions here compute them as pure transforms: inputs are
//! borrowed, never mutated, and each call produces fresh output.
//!
//! Submodules:
//! - `groupings`: per-sensor series, ranked sensor means, mean over time.
//! - `merge`: combines the tables of several rooms or feeds.
//!
//! Anomaly listings live in `alert::events`.

pub mod groupings;
pub mod merge;

pub use groupings::{mean_over_time, per_sensor_series, ranked_sensor_means};
pub use merge::merge_tables;

//! Anomaly ("non-Normal event") listings.
//!
//! Every row whose event label is not exactly `Normal` is alert-worthy.
//! Delivery of notifications is out of scope; this module only decides which
//! events a page lists and in what order.

pub mod events;

pub use events::{recent_alerts, recent_anomalies};

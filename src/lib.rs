//! cephfs-xattr-influx - CephFS extended attribute collector.
//!
//! Provides:
//! - `config` — command line, environment and config file settings
//! - `paths` — the JSON list of paths to poll
//! - `collector` — cluster session traits, backends and the collection loop
//! - `influx` — metric points, line protocol and the InfluxDB write API
//! - `run` — the single-pass pipeline tying them together

pub mod collector;
pub mod config;
pub mod influx;
pub mod paths;
mod run;

pub use run::{RunError, run};

//! Single-pass pipeline: paths → connect → mount → collect → flush.

use thiserror::Error;
use tracing::{debug, info};

use crate::collector::{CollectSummary, Cluster, Collector, Connector, SessionError};
use crate::config::{InfluxSettings, Settings};
use crate::influx::{PointWriter, WriteError};
use crate::paths::{PathsError, load_paths};

/// Fatal error of a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Paths(#[from] PathsError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Runs one collection pass.
///
/// The paths file is loaded before anything touches the cluster. Resources are
/// acquired in the order connection, mount, writer and released in reverse
/// when they go out of scope, on success and on every early return.
pub fn run<C, W, F>(
    settings: &Settings,
    connector: &C,
    open_writer: F,
) -> Result<CollectSummary, RunError>
where
    C: Connector,
    W: PointWriter,
    F: FnOnce(&InfluxSettings) -> Result<W, WriteError>,
{
    let paths = load_paths(settings.paths_file())?;
    info!(
        paths = paths.len(),
        file = %settings.paths_file().display(),
        "paths loaded"
    );

    let cluster = connector.connect(&settings.ceph)?;
    let mount = cluster.mount()?;

    let mut writer = open_writer(&settings.influx)?;
    let summary = Collector::new(&mount).collect_all(&paths, &mut writer);

    writer.flush()?;
    debug!(points = summary.points, "points flushed");
    drop(writer);

    Ok(summary)
}

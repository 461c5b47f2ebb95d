//! cephfs-xattr-influx - CephFS xattr collector.
//!
//! Reads the paths JSON file, retrieves the xattrs of every listed path from
//! CephFS and stores them in InfluxDB. Runs once and exits; schedule it with
//! cron or a systemd timer.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::process::ExitCode;

use tracing::{Level, debug, error, info};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cephfs")]
use cephfs_xattr_influx::collector::RadosConnector;
#[cfg(not(feature = "cephfs"))]
use cephfs_xattr_influx::collector::UnavailableConnector;
use cephfs_xattr_influx::collector::CollectSummary;
use cephfs_xattr_influx::config::{ConfigError, InfluxSettings, Settings};
use cephfs_xattr_influx::influx::{WriteApi, WriteError};

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("cephfs_xattr_influx={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Describes a finished run for logging.
fn describe_summary(summary: &CollectSummary) -> String {
    let mut parts = vec![
        format!("{} paths", summary.paths),
        format!("{} points written", summary.points),
    ];
    if summary.skipped_paths > 0 {
        parts.push(format!("{} paths skipped", summary.skipped_paths));
    }
    if summary.omitted_attributes > 0 {
        parts.push(format!("{} xattrs omitted", summary.omitted_attributes));
    }
    parts.join(", ")
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => {
            init_logging(0, false);
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(settings.verbose, settings.quiet);
    info!("cephfs-xattr-influx {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: influx={}, org={:?}, bucket={:?}, ceph.client={}, paths={}",
        settings.influx.addr,
        settings.influx.org,
        settings.influx.bucket,
        settings.ceph.client.as_deref().unwrap_or("(default)"),
        settings.paths_file().display()
    );

    #[cfg(feature = "cephfs")]
    let connector = RadosConnector::new();
    #[cfg(not(feature = "cephfs"))]
    let connector = UnavailableConnector;

    let open_writer = |influx: &InfluxSettings| -> Result<WriteApi, WriteError> {
        let writer = WriteApi::new(influx)?;
        debug!("Writing points to {}", writer.url());
        Ok(writer)
    };

    match cephfs_xattr_influx::run(&settings, &connector, open_writer) {
        Ok(summary) => {
            info!("Run complete: {}", describe_summary(&summary));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::describe_summary;
    use cephfs_xattr_influx::collector::CollectSummary;

    #[test]
    fn describe_summary_lists_counters() {
        let desc = describe_summary(&CollectSummary {
            paths: 3,
            points: 2,
            skipped_paths: 1,
            omitted_attributes: 4,
        });
        assert_eq!(
            desc,
            "3 paths, 2 points written, 1 paths skipped, 4 xattrs omitted"
        );
    }

    #[test]
    fn describe_summary_hides_zero_failures() {
        let desc = describe_summary(&CollectSummary {
            paths: 1,
            points: 1,
            ..CollectSummary::default()
        });
        assert_eq!(desc, "1 paths, 1 points written");
    }
}

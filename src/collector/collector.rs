//! Xattr collection loop.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, trace, warn};

use super::SessionError;
use super::convert::parse_value;
use super::traits::XattrSource;
use crate::influx::{MEASUREMENT, MetricPoint, PointWriter};
use crate::paths::PathEntry;

/// Counters of one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectSummary {
    /// Paths in the input list.
    pub paths: usize,
    /// Points handed to the writer.
    pub points: usize,
    /// Paths skipped because their xattrs could not be listed.
    pub skipped_paths: usize,
    /// Attributes left out because they could not be read or converted.
    pub omitted_attributes: usize,
}

/// Fields collected for one path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathFields {
    pub fields: BTreeMap<String, f64>,
    pub omitted: usize,
}

/// Reads xattrs from a mounted filesystem and turns them into points.
pub struct Collector<S> {
    source: S,
}

impl<S: XattrSource> Collector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Reads and converts every xattr of `path`.
    ///
    /// Fails only when the attribute list cannot be retrieved. Attributes whose
    /// value cannot be read or is not numeric are logged and left out.
    pub fn collect_fields(&self, path: &str) -> Result<PathFields, SessionError> {
        let names = self.source.list_xattrs(path)?;
        let mut result = PathFields::default();

        for name in names {
            let raw = match self.source.get_xattr(path, &name) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path, xattr = %name, error = %e, "unable to read xattr");
                    result.omitted += 1;
                    continue;
                }
            };

            match parse_value(&raw) {
                Ok(value) => {
                    trace!(path, xattr = %name, value, "xattr");
                    result.fields.insert(name, value);
                }
                Err(e) => {
                    warn!(path, xattr = %name, error = %e, "unable to convert xattr");
                    result.omitted += 1;
                }
            }
        }

        Ok(result)
    }

    /// Builds the point for one path entry, timestamped now.
    pub fn collect_point(&self, entry: &PathEntry) -> Result<(MetricPoint, usize), SessionError> {
        let PathFields { fields, omitted } = self.collect_fields(&entry.path)?;
        let point = MetricPoint::new(MEASUREMENT, entry.tags(), fields, Utc::now());
        Ok((point, omitted))
    }

    /// Collects every path in order and hands one point per path to `writer`.
    ///
    /// A path whose xattrs cannot be listed is logged and skipped.
    pub fn collect_all<W: PointWriter>(
        &self,
        paths: &[PathEntry],
        writer: &mut W,
    ) -> CollectSummary {
        let mut summary = CollectSummary {
            paths: paths.len(),
            ..CollectSummary::default()
        };

        for entry in paths {
            match self.collect_point(entry) {
                Ok((point, omitted)) => {
                    debug!(
                        path = %entry.path,
                        fields = point.fields().len(),
                        omitted,
                        "collected"
                    );
                    summary.points += 1;
                    summary.omitted_attributes += omitted;
                    writer.write_point(point);
                }
                Err(e) => {
                    warn!(path = %entry.path, error = %e, "skipping path");
                    summary.skipped_paths += 1;
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockCluster;

    fn entry(org: &str, user: &str, path: &str) -> PathEntry {
        PathEntry {
            organisation: org.into(),
            user: user.into(),
            path: path.into(),
        }
    }

    #[test]
    fn numeric_value_becomes_field() {
        let mut cluster = MockCluster::new();
        cluster.add_xattr("/a", "ceph.quota.max_bytes", "42.5");

        let fields = Collector::new(&cluster).collect_fields("/a").unwrap();
        assert_eq!(fields.fields["ceph.quota.max_bytes"], 42.5);
        assert_eq!(fields.omitted, 0);
    }

    #[test]
    fn non_numeric_value_is_omitted() {
        let mut cluster = MockCluster::new();
        cluster.add_xattr("/a", "user.comment", "abc");
        cluster.add_xattr("/a", "ceph.dir.files", "4");

        let fields = Collector::new(&cluster).collect_fields("/a").unwrap();
        assert!(!fields.fields.contains_key("user.comment"));
        assert_eq!(fields.fields["ceph.dir.files"], 4.0);
        assert_eq!(fields.omitted, 1);
    }

    #[test]
    fn unreadable_value_is_omitted() {
        let mut cluster = MockCluster::new();
        cluster.add_xattr("/a", "ceph.dir.rbytes", "100");
        cluster.fail_read("/a", "ceph.quota.max_files");

        let fields = Collector::new(&cluster).collect_fields("/a").unwrap();
        assert_eq!(fields.fields.len(), 1);
        assert_eq!(fields.fields["ceph.dir.rbytes"], 100.0);
        assert_eq!(fields.omitted, 1);
    }

    #[test]
    fn list_failure_is_error() {
        let cluster = MockCluster::new();
        assert!(matches!(
            Collector::new(&cluster).collect_fields("/missing"),
            Err(SessionError::ListXattr { .. })
        ));
    }

    #[test]
    fn point_carries_measurement_and_tags() {
        let mut cluster = MockCluster::new();
        cluster.add_xattr("/org1/user2", "ceph.dir.rbytes", "2048");

        let (point, omitted) = Collector::new(&cluster)
            .collect_point(&entry("org1", "user2", "/org1/user2"))
            .unwrap();

        assert_eq!(omitted, 0);
        assert_eq!(point.measurement(), "cephfs_xattr");
        assert_eq!(point.tags()["org"], "org1");
        assert_eq!(point.tags()["user"], "user2");
        assert_eq!(point.tags()["path"], "/org1/user2");
        assert_eq!(point.fields()["ceph.dir.rbytes"], 2048.0);
    }

    #[test]
    fn failing_path_does_not_stop_the_rest() {
        let mut cluster = MockCluster::new();
        cluster.add_xattr("/first", "ceph.dir.files", "1");
        cluster.add_xattr("/last", "ceph.dir.files", "3");

        let paths = vec![
            entry("o", "u", "/first"),
            entry("o", "u", "/missing"),
            entry("o", "u", "/last"),
        ];
        let mut points: Vec<MetricPoint> = Vec::new();
        let summary = Collector::new(&cluster).collect_all(&paths, &mut points);

        assert_eq!(
            summary,
            CollectSummary {
                paths: 3,
                points: 2,
                skipped_paths: 1,
                omitted_attributes: 0,
            }
        );
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].tags()["path"], "/first");
        assert_eq!(points[1].tags()["path"], "/last");
    }

    #[test]
    fn typical_root_skips_layout() {
        let cluster = MockCluster::typical_root();
        let mut points: Vec<MetricPoint> = Vec::new();
        let summary =
            Collector::new(&cluster).collect_all(&[entry("root", "root", "/")], &mut points);

        assert_eq!(summary.points, 1);
        assert_eq!(summary.omitted_attributes, 1);
        let fields = points[0].fields();
        assert!(!fields.contains_key("ceph.dir.layout"));
        assert_eq!(fields["ceph.dir.rbytes"], 1_073_741_824.0);
        assert_eq!(fields["ceph.dir.rctime"], 1_600_000_000.09);
    }

    #[test]
    fn path_without_xattrs_still_yields_point() {
        let mut cluster = MockCluster::new();
        cluster.add_path("/empty");

        let mut points: Vec<MetricPoint> = Vec::new();
        let summary =
            Collector::new(&cluster).collect_all(&[entry("o", "u", "/empty")], &mut points);

        assert_eq!(summary.points, 1);
        assert!(points[0].fields().is_empty());
    }
}

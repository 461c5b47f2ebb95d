//! CephFS xattr collector.
//!
//! This module provides the cluster session abstraction and the loop that
//! turns xattrs of the configured paths into metric points.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Collector                       │
//! │   for each PathEntry: list → get → parse → point     │
//! └──────────────────────────┬───────────────────────────┘
//!                            │
//!                    ┌───────▼───────┐
//!                    │  XattrSource  │ (trait)
//!                    └───────┬───────┘
//!                            │
//!            ┌───────────────┼────────────────┐
//!            │               │                │
//!     ┌──────▼──────┐ ┌──────▼──────┐ ┌───────▼───────┐
//!     │  CephMount  │ │ MockCluster │ │  Unavailable  │
//!     │ (cephfs)    │ │ (Testing)   │ │  (no feature) │
//!     └─────────────┘ └─────────────┘ └───────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use cephfs_xattr_influx::collector::{Collector, MockCluster};
//! use cephfs_xattr_influx::influx::MetricPoint;
//! use cephfs_xattr_influx::paths::PathEntry;
//!
//! let cluster = MockCluster::typical_root();
//! let paths = vec![PathEntry {
//!     organisation: "root".into(),
//!     user: "root".into(),
//!     path: "/".into(),
//! }];
//!
//! let mut points: Vec<MetricPoint> = Vec::new();
//! let summary = Collector::new(&cluster).collect_all(&paths, &mut points);
//! assert_eq!(summary.points, 1);
//! ```

#[cfg(feature = "cephfs")]
pub mod cephfs;
#[allow(clippy::module_inception)]
mod collector;
mod convert;
mod error;
pub mod mock;
pub mod traits;

#[cfg(feature = "cephfs")]
pub use cephfs::{CephMount, RadosCluster, RadosConnector};
pub use collector::{CollectSummary, Collector, PathFields};
pub use convert::parse_value;
pub use error::{ConvertError, SessionError};
pub use mock::{MockCluster, MockConnection, MockMount};
pub use traits::{Cluster, Connector, UnavailableConnector, XattrSource};

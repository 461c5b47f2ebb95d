//! Mock cluster implementation for testing.
//!
//! This module provides `MockCluster`, an in-memory stand-in for a Ceph
//! cluster, so the collector and pipeline can be tested without librados.

mod cluster;

pub use cluster::{MockCluster, MockConnection, MockMount, TeardownLog};

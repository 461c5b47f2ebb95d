//! In-memory mock cluster for testing the collector without a Ceph cluster.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::rc::Rc;

use crate::collector::SessionError;
use crate::collector::traits::{Cluster, Connector, XattrSource};
use crate::config::CephSettings;

/// In-memory cluster for testing.
///
/// Acts as connector and as xattr source. `connect` hands out a
/// [`MockConnection`] whose mounts are [`MockMount`]s; both append to a
/// teardown log shared by every clone when dropped. Paths that were never
/// added report `ENOENT` when listed, like a real mount would.
#[derive(Debug, Clone, Default)]
pub struct MockCluster {
    /// Map from path to its xattrs, listed in name order.
    xattrs: HashMap<String, BTreeMap<String, Vec<u8>>>,
    /// (path, name) pairs whose value read fails.
    failing_reads: HashSet<(String, String)>,
    fail_connect: bool,
    fail_mount: bool,
    connects: Rc<Cell<usize>>,
    mounts: Rc<Cell<usize>>,
    teardown: TeardownLog,
}

/// Release events in the order they happened.
pub type TeardownLog = Rc<RefCell<Vec<&'static str>>>;

/// Connected mock cluster. Logs `"disconnect"` when dropped.
#[derive(Debug)]
pub struct MockConnection {
    cluster: MockCluster,
}

/// Mock mount borrowed from a [`MockConnection`]. Logs `"unmount"` when dropped.
#[derive(Debug)]
pub struct MockMount<'a> {
    cluster: &'a MockCluster,
}

impl MockCluster {
    /// Creates an empty mock cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path without any xattrs.
    pub fn add_path(&mut self, path: impl Into<String>) {
        self.xattrs.entry(path.into()).or_default();
    }

    /// Adds an xattr to a path, creating the path if needed.
    pub fn add_xattr(
        &mut self,
        path: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) {
        self.xattrs
            .entry(path.into())
            .or_default()
            .insert(name.into(), value.into());
    }

    /// Makes reading `name` on `path` fail while it is still listed.
    pub fn fail_read(&mut self, path: impl Into<String>, name: impl Into<String>) {
        let (path, name) = (path.into(), name.into());
        self.xattrs
            .entry(path.clone())
            .or_default()
            .entry(name.clone())
            .or_default();
        self.failing_reads.insert((path, name));
    }

    /// Makes `connect` fail.
    pub fn fail_connect(&mut self) {
        self.fail_connect = true;
    }

    /// Makes `mount` fail.
    pub fn fail_mount(&mut self) {
        self.fail_mount = true;
    }

    /// Number of `connect` calls made so far.
    pub fn connect_count(&self) -> usize {
        self.connects.get()
    }

    /// Number of `mount` calls made so far.
    pub fn mount_count(&self) -> usize {
        self.mounts.get()
    }

    /// Handle to the teardown log, for recording other resources alongside
    /// the connection and mount.
    pub fn teardown_log(&self) -> TeardownLog {
        Rc::clone(&self.teardown)
    }

    /// Release events recorded so far.
    pub fn teardown(&self) -> Vec<&'static str> {
        self.teardown.borrow().clone()
    }

    /// A cluster with the xattrs a CephFS root typically carries.
    pub fn typical_root() -> Self {
        let mut cluster = Self::new();
        cluster.add_xattr("/", "ceph.dir.entries", "3");
        cluster.add_xattr("/", "ceph.dir.files", "1");
        cluster.add_xattr("/", "ceph.dir.subdirs", "2");
        cluster.add_xattr("/", "ceph.dir.rbytes", "1073741824");
        cluster.add_xattr("/", "ceph.dir.rctime", "1600000000.090000000");
        cluster.add_xattr("/", "ceph.quota.max_bytes", "1000000");
        cluster.add_xattr(
            "/",
            "ceph.dir.layout",
            "stripe_unit=4194304 stripe_count=1 object_size=4194304 pool=cephfs_data",
        );
        cluster
    }
}

impl XattrSource for MockCluster {
    fn list_xattrs(&self, path: &str) -> Result<Vec<String>, SessionError> {
        match self.xattrs.get(path) {
            Some(attrs) => Ok(attrs.keys().cloned().collect()),
            None => Err(SessionError::ListXattr {
                path: path.to_string(),
                source: io::Error::from(io::ErrorKind::NotFound),
            }),
        }
    }

    fn get_xattr(&self, path: &str, name: &str) -> Result<Vec<u8>, SessionError> {
        let not_found = || SessionError::GetXattr {
            path: path.to_string(),
            name: name.to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };

        if self
            .failing_reads
            .contains(&(path.to_string(), name.to_string()))
        {
            return Err(not_found());
        }

        self.xattrs
            .get(path)
            .and_then(|attrs| attrs.get(name))
            .cloned()
            .ok_or_else(not_found)
    }
}

impl XattrSource for MockMount<'_> {
    fn list_xattrs(&self, path: &str) -> Result<Vec<String>, SessionError> {
        self.cluster.list_xattrs(path)
    }

    fn get_xattr(&self, path: &str, name: &str) -> Result<Vec<u8>, SessionError> {
        self.cluster.get_xattr(path, name)
    }
}

impl Drop for MockMount<'_> {
    fn drop(&mut self) {
        self.cluster.teardown.borrow_mut().push("unmount");
    }
}

impl Cluster for MockConnection {
    type Mount<'a> = MockMount<'a>;

    fn mount(&self) -> Result<Self::Mount<'_>, SessionError> {
        let cluster = &self.cluster;
        cluster.mounts.set(cluster.mounts.get() + 1);
        if cluster.fail_mount {
            return Err(SessionError::Mount(io::Error::from(
                io::ErrorKind::PermissionDenied,
            )));
        }
        Ok(MockMount { cluster })
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.cluster.teardown.borrow_mut().push("disconnect");
    }
}

impl Connector for MockCluster {
    type Cluster = MockConnection;

    fn connect(&self, _settings: &CephSettings) -> Result<Self::Cluster, SessionError> {
        self.connects.set(self.connects.get() + 1);
        if self.fail_connect {
            return Err(SessionError::Connect(io::Error::from(
                io::ErrorKind::ConnectionRefused,
            )));
        }
        Ok(MockConnection {
            cluster: self.clone(),
        })
    }
}

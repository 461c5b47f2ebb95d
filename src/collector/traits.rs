//! Abstractions over the Ceph cluster to enable testing and mocking.
//!
//! A run goes through three handles, each released when dropped:
//! `Connector::connect` yields a connected cluster, `Cluster::mount` yields a
//! mounted filesystem view, and the mount is the `XattrSource` the collector
//! reads from. The mount borrows the cluster, so it is always released first.

use super::SessionError;
use crate::config::CephSettings;

/// Read access to extended attributes of filesystem paths.
pub trait XattrSource {
    /// Lists the attribute names of `path`.
    fn list_xattrs(&self, path: &str) -> Result<Vec<String>, SessionError>;

    /// Reads the raw value of attribute `name` on `path`.
    fn get_xattr(&self, path: &str, name: &str) -> Result<Vec<u8>, SessionError>;
}

impl<T: XattrSource + ?Sized> XattrSource for &T {
    fn list_xattrs(&self, path: &str) -> Result<Vec<String>, SessionError> {
        (**self).list_xattrs(path)
    }

    fn get_xattr(&self, path: &str, name: &str) -> Result<Vec<u8>, SessionError> {
        (**self).get_xattr(path, name)
    }
}

/// A connected cluster that can mount the filesystem.
pub trait Cluster {
    type Mount<'a>: XattrSource
    where
        Self: 'a;

    /// Mounts the root of the filesystem.
    fn mount(&self) -> Result<Self::Mount<'_>, SessionError>;
}

/// Opens authenticated cluster connections.
pub trait Connector {
    type Cluster: Cluster;

    fn connect(&self, settings: &CephSettings) -> Result<Self::Cluster, SessionError>;
}

/// Connector used when the binary is built without a native Ceph backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableConnector;

/// Never constructed; exists to give `UnavailableConnector` a cluster type.
#[derive(Debug)]
pub enum NoCluster {}

impl Cluster for NoCluster {
    type Mount<'a> = NoMount;

    fn mount(&self) -> Result<Self::Mount<'_>, SessionError> {
        match *self {}
    }
}

/// Never constructed.
#[derive(Debug)]
pub enum NoMount {}

impl XattrSource for NoMount {
    fn list_xattrs(&self, _path: &str) -> Result<Vec<String>, SessionError> {
        match *self {}
    }

    fn get_xattr(&self, _path: &str, _name: &str) -> Result<Vec<u8>, SessionError> {
        match *self {}
    }
}

impl Connector for UnavailableConnector {
    type Cluster = NoCluster;

    fn connect(&self, _settings: &CephSettings) -> Result<Self::Cluster, SessionError> {
        Err(SessionError::Unsupported)
    }
}

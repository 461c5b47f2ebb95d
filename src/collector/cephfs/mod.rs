//! Native Ceph backend built on librados and libcephfs.
//!
//! Enabled with the `cephfs` feature. Each handle releases itself on drop:
//! `CephMount` unmounts and releases the mount info, `RadosCluster` shuts the
//! cluster connection down. A mount borrows its cluster, so teardown always
//! happens in reverse order of acquisition.

mod ffi;

use std::ffi::CString;
use std::io;
use std::marker::PhantomData;
use std::ptr;

use tracing::{debug, warn};

use super::SessionError;
use super::traits::{Cluster, Connector, XattrSource};
use crate::config::CephSettings;

const ERANGE: i32 = 34;

/// Connects to a Ceph cluster through librados.
#[derive(Debug, Default, Clone, Copy)]
pub struct RadosConnector;

impl RadosConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for RadosConnector {
    type Cluster = RadosCluster;

    fn connect(&self, settings: &CephSettings) -> Result<Self::Cluster, SessionError> {
        let id = settings.client.as_deref().map(to_cstring).transpose()?;
        let id_ptr = id.as_ref().map_or(ptr::null(), |id| id.as_ptr());

        let mut handle: ffi::RadosT = ptr::null_mut();
        // SAFETY: `handle` is a valid out pointer and `id_ptr` is either null
        // or a NUL-terminated string that outlives the call.
        check(unsafe { ffi::rados_create(&mut handle, id_ptr) }).map_err(SessionError::Create)?;
        let cluster = RadosCluster { handle };

        if settings.monitors.is_empty() {
            // SAFETY: a null path makes librados search the default locations.
            check(unsafe { ffi::rados_conf_read_file(cluster.handle, ptr::null()) }).map_err(
                |source| SessionError::Config {
                    option: "default config file".to_string(),
                    source,
                },
            )?;
        } else {
            cluster.conf_set("mon_host", &settings.monitors.join(","))?;
        }

        if let Some(key) = &settings.key {
            cluster.conf_set("key", key)?;
        }

        // SAFETY: `cluster.handle` was created above and is still alive.
        check(unsafe { ffi::rados_connect(cluster.handle) }).map_err(SessionError::Connect)?;

        debug!(
            client = settings.client.as_deref().unwrap_or("(default)"),
            monitors = settings.monitors.len(),
            "rados connection established"
        );
        Ok(cluster)
    }
}

/// A librados cluster handle. Shut down on drop.
#[derive(Debug)]
pub struct RadosCluster {
    handle: ffi::RadosT,
}

impl RadosCluster {
    fn conf_set(&self, option: &str, value: &str) -> Result<(), SessionError> {
        let c_option = to_cstring(option)?;
        let c_value = to_cstring(value)?;
        // SAFETY: both strings are NUL-terminated and outlive the call.
        check(unsafe { ffi::rados_conf_set(self.handle, c_option.as_ptr(), c_value.as_ptr()) })
            .map_err(|source| SessionError::Config {
                option: option.to_string(),
                source,
            })?;
        Ok(())
    }
}

impl Cluster for RadosCluster {
    type Mount<'a> = CephMount<'a>;

    fn mount(&self) -> Result<Self::Mount<'_>, SessionError> {
        let mut cmount: *mut ffi::CephMountInfo = ptr::null_mut();
        // SAFETY: `cmount` is a valid out pointer, `self.handle` is connected.
        check(unsafe { ffi::ceph_create_from_rados(&mut cmount, self.handle) })
            .map_err(SessionError::MountInfo)?;

        let mut mount = CephMount {
            cmount,
            mounted: false,
            _cluster: PhantomData,
        };

        // SAFETY: `cmount` was created above, the root path is NUL-terminated.
        check(unsafe { ffi::ceph_mount(mount.cmount, c"/".as_ptr()) })
            .map_err(SessionError::Mount)?;
        mount.mounted = true;

        debug!("cephfs mounted");
        Ok(mount)
    }
}

impl Drop for RadosCluster {
    fn drop(&mut self) {
        // SAFETY: the handle came from `rados_create` and is shut down once.
        unsafe { ffi::rados_shutdown(self.handle) };
        debug!("rados connection shut down");
    }
}

/// A libcephfs mount of the filesystem root. Unmounted and released on drop.
#[derive(Debug)]
pub struct CephMount<'a> {
    cmount: *mut ffi::CephMountInfo,
    mounted: bool,
    _cluster: PhantomData<&'a RadosCluster>,
}

impl XattrSource for CephMount<'_> {
    fn list_xattrs(&self, path: &str) -> Result<Vec<String>, SessionError> {
        let c_path = to_cstring(path)?;
        let list_err = |source| SessionError::ListXattr {
            path: path.to_string(),
            source,
        };

        let buf = read_sized(|buf, size| {
            // SAFETY: `buf` is null with size 0, or points to `size` writable bytes.
            unsafe { ffi::ceph_listxattr(self.cmount, c_path.as_ptr(), buf.cast(), size) }
        })
        .map_err(list_err)?;

        Ok(split_names(&buf))
    }

    fn get_xattr(&self, path: &str, name: &str) -> Result<Vec<u8>, SessionError> {
        let c_path = to_cstring(path)?;
        let c_name = to_cstring(name)?;

        read_sized(|buf, size| {
            // SAFETY: `buf` is null with size 0, or points to `size` writable bytes.
            unsafe {
                ffi::ceph_getxattr(
                    self.cmount,
                    c_path.as_ptr(),
                    c_name.as_ptr(),
                    buf.cast(),
                    size,
                )
            }
        })
        .map_err(|source| SessionError::GetXattr {
            path: path.to_string(),
            name: name.to_string(),
            source,
        })
    }
}

impl Drop for CephMount<'_> {
    fn drop(&mut self) {
        // SAFETY: `cmount` came from `ceph_create_from_rados` and is released once.
        unsafe {
            if self.mounted {
                if let Err(e) = check(ffi::ceph_unmount(self.cmount)) {
                    warn!(error = %e, "cephfs unmount failed");
                }
            }
            if let Err(e) = check(ffi::ceph_release(self.cmount)) {
                warn!(error = %e, "cephfs mount release failed");
            }
        }
        debug!("cephfs unmounted");
    }
}

/// Runs a libcephfs "query size, then fill buffer" call pair.
///
/// The first call passes a null buffer to learn the size. If the value grew
/// between the two calls the library answers `ERANGE` and the pair is repeated.
fn read_sized<F>(mut call: F) -> io::Result<Vec<u8>>
where
    F: FnMut(*mut u8, usize) -> i32,
{
    loop {
        let size = check(call(ptr::null_mut(), 0))?;
        if size == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; size];
        match check(call(buf.as_mut_ptr(), buf.len())) {
            Ok(len) => {
                buf.truncate(len);
                return Ok(buf);
            }
            Err(e) if e.raw_os_error() == Some(ERANGE) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Splits a NUL-separated xattr name list.
fn split_names(buf: &[u8]) -> Vec<String> {
    buf.split(|&b| b == 0)
        .filter(|name| !name.is_empty())
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect()
}

/// Maps a librados/libcephfs return code to a length or an OS error.
fn check(ret: i32) -> io::Result<usize> {
    if ret < 0 {
        Err(io::Error::from_raw_os_error(-ret))
    } else {
        Ok(ret as usize)
    }
}

fn to_cstring(value: &str) -> Result<CString, SessionError> {
    CString::new(value).map_err(|_| SessionError::InvalidArgument(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_names_handles_trailing_nul() {
        let names = split_names(b"ceph.dir.rbytes\0ceph.quota.max_bytes\0");
        assert_eq!(names, vec!["ceph.dir.rbytes", "ceph.quota.max_bytes"]);
        assert!(split_names(b"").is_empty());
    }

    #[test]
    fn check_maps_negative_errno() {
        assert_eq!(check(12).unwrap(), 12);
        assert_eq!(check(-2).unwrap_err().raw_os_error(), Some(2));
    }

    #[test]
    fn read_sized_retries_on_erange() {
        let mut calls = 0;
        let buf = read_sized(|buf, size| {
            calls += 1;
            match (calls, size) {
                (1, 0) => 2,
                (2, 2) => -ERANGE,
                (3, 0) => 3,
                (4, 3) => {
                    // SAFETY: the caller provides `size` writable bytes.
                    unsafe { ptr::copy_nonoverlapping(b"abc".as_ptr(), buf, 3) };
                    3
                }
                _ => panic!("unexpected call {calls} with size {size}"),
            }
        })
        .unwrap();
        assert_eq!(buf, b"abc");
    }

    #[test]
    fn nul_in_argument_is_rejected() {
        assert!(matches!(
            to_cstring("a\0b"),
            Err(SessionError::InvalidArgument(_))
        ));
    }
}

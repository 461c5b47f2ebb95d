//! Raw bindings to the parts of librados and libcephfs used by the collector.
//!
//! All functions return `0` or a non-negative length on success and a negated
//! errno on failure.

use std::ffi::{c_char, c_int, c_void};

/// Opaque `rados_t` handle.
pub type RadosT = *mut c_void;

/// Opaque `struct ceph_mount_info`.
#[repr(C)]
pub struct CephMountInfo {
    _private: [u8; 0],
}

#[link(name = "rados")]
unsafe extern "C" {
    pub fn rados_create(cluster: *mut RadosT, id: *const c_char) -> c_int;
    pub fn rados_conf_set(cluster: RadosT, option: *const c_char, value: *const c_char) -> c_int;
    pub fn rados_conf_read_file(cluster: RadosT, path: *const c_char) -> c_int;
    pub fn rados_connect(cluster: RadosT) -> c_int;
    pub fn rados_shutdown(cluster: RadosT);
}

#[link(name = "cephfs")]
unsafe extern "C" {
    pub fn ceph_create_from_rados(cmount: *mut *mut CephMountInfo, cluster: RadosT) -> c_int;
    pub fn ceph_mount(cmount: *mut CephMountInfo, root: *const c_char) -> c_int;
    pub fn ceph_unmount(cmount: *mut CephMountInfo) -> c_int;
    pub fn ceph_release(cmount: *mut CephMountInfo) -> c_int;
    pub fn ceph_listxattr(
        cmount: *mut CephMountInfo,
        path: *const c_char,
        list: *mut c_char,
        size: usize,
    ) -> c_int;
    pub fn ceph_getxattr(
        cmount: *mut CephMountInfo,
        path: *const c_char,
        name: *const c_char,
        value: *mut c_void,
        size: usize,
    ) -> c_int;
}

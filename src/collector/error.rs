use std::io;

use thiserror::Error;

/// Error raised by a cluster session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unable to create cluster connection: {0}")]
    Create(io::Error),

    #[error("unable to read/set connection configuration '{option}': {source}")]
    Config { option: String, source: io::Error },

    #[error("unable to connect: {0}")]
    Connect(io::Error),

    #[error("unable to create cephfs mount info: {0}")]
    MountInfo(io::Error),

    #[error("unable to mount: {0}")]
    Mount(io::Error),

    #[error("unable to get list of xattr for {path:?}: {source}")]
    ListXattr { path: String, source: io::Error },

    #[error("unable to get xattr {name:?} of {path:?}: {source}")]
    GetXattr {
        path: String,
        name: String,
        source: io::Error,
    },

    /// A path, name or option contained an interior NUL byte.
    #[error("invalid argument {0:?}: contains NUL byte")]
    InvalidArgument(String),

    #[error("built without cephfs support (rebuild with --features cephfs)")]
    Unsupported,
}

/// Error converting a raw attribute value into a numeric field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("value is not valid UTF-8")]
    NotUtf8,

    #[error("value {0:?} is not a number")]
    NotNumeric(String),

    #[error("value {0:?} is not finite")]
    NotFinite(String),
}

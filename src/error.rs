//! Error types for lawakfs

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the overlay
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying storage failure, carries the OS error code
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry is absent or hidden by the access gate
    #[error("Not found: {0}")]
    NotFound(String),

    /// A required path (source root, mount point) does not exist
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Transform buffer could not be allocated
    #[error("Out of memory")]
    OutOfMemory,

    /// Write attempted on the read-only overlay
    #[error("Read-only filesystem")]
    ReadOnly,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// errno reported to the FUSE caller
    pub fn errno(&self) -> i32 {
        match self {
            Error::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
            Error::NotFound(_) | Error::PathNotFound(_) => libc::ENOENT,
            Error::PermissionDenied(_) => libc::EACCES,
            Error::OutOfMemory => libc::ENOMEM,
            Error::ReadOnly => libc::EROFS,
            Error::Config(_) | Error::InvalidConfig(_) | Error::Internal(_) => libc::EIO,
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(Error::NotFound("/diary".into()).errno(), libc::ENOENT);
        assert_eq!(Error::PermissionDenied("/x".into()).errno(), libc::EACCES);
        assert_eq!(Error::OutOfMemory.errno(), libc::ENOMEM);
        assert_eq!(Error::ReadOnly.errno(), libc::EROFS);
        assert_eq!(Error::Internal("boom".into()).errno(), libc::EIO);
    }

    #[test]
    fn test_io_errno_passes_through() {
        let err = Error::from(io::Error::from_raw_os_error(libc::ENOTDIR));
        assert_eq!(err.errno(), libc::ENOTDIR);

        // Synthetic errors without an OS code fall back to EIO
        let err = Error::from(io::Error::new(io::ErrorKind::Other, "synthetic"));
        assert_eq!(err.errno(), libc::EIO);
    }
}

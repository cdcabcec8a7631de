//! Unpack Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Tool output, I/O errors and archive
//! crate errors are attached underneath as child frames.

use burrow_classify::FileKind;
use derive_more::{Display, Error};
use std::path::PathBuf;

/// An unpack error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for unpack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
///
/// ### Unpack Failures
/// - [`ErrorKind::Archive`] and [`ErrorKind::Mount`] are raised for a specific
///   source file. At the top level they abort a run; for nested files the
///   engine logs them and moves on.
///
/// ### Caller Errors
/// - [`ErrorKind::Unhandled`] means the caller asked for a kind that has no
///   strategy. Check [`is_handled`](crate::is_handled) first.
///
/// ### Cleanup Errors
/// - [`ErrorKind::Unmount`] and [`ErrorKind::Incomplete`] mean directories
///   were left under the temporary directory and need removing by hand.
///
/// ### Environment Errors
/// - [`ErrorKind::ToolNotFound`], [`ErrorKind::ToolFailed`] and [`ErrorKind::Io`].
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The archive is corrupt or uses an unsupported payload.
    #[display("unable to unpack archive: {}", _0.display())]
    Archive(#[error(not(source))] PathBuf),
    /// The image (or the partition listing of a disk image) could not be mounted.
    #[display("unable to mount image: {}", _0.display())]
    Mount(#[error(not(source))] PathBuf),
    /// No unpack strategy exists for this kind of file.
    #[display("unhandled file kind: {_0}")]
    Unhandled(#[error(not(source))] FileKind),
    /// A mount point could not be unmounted, so it was left in place.
    #[display("unable to unmount: {}", _0.display())]
    Unmount(#[error(not(source))] PathBuf),
    /// Cleanup finished, but this many directories could not be removed.
    #[display("{_0} unpack directories were left behind")]
    Incomplete(#[error(not(source))] usize),
    /// An external tool is not installed (or not in `PATH`).
    #[display("{_0} not detected on your system")]
    ToolNotFound(#[error(not(source))] &'static str),
    /// An external tool exited unsuccessfully.
    #[display("{tool} failed: {stderr}")]
    ToolFailed { tool: &'static str, stderr: String },
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Whether the error is one of the two "this file couldn't be unpacked"
    /// failures, as opposed to a problem with the caller or the environment.
    pub fn is_unpack_failure(&self) -> bool {
        matches!(self, ErrorKind::Archive(_) | ErrorKind::Mount(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Archive(PathBuf::from("/in/a.tar")).to_string(), "unable to unpack archive: /in/a.tar");
        assert_eq!(ErrorKind::Mount(PathBuf::from("/in/a.iso")).to_string(), "unable to mount image: /in/a.iso");
        assert_eq!(ErrorKind::Unhandled(FileKind::Unknown).to_string(), "unhandled file kind: unknown");
        assert_eq!(ErrorKind::Unmount(PathBuf::from("/tmp/burrow_iso_a.iso_x")).to_string(), "unable to unmount: /tmp/burrow_iso_a.iso_x");
        assert_eq!(ErrorKind::Incomplete(2).to_string(), "2 unpack directories were left behind");
        assert_eq!(ErrorKind::ToolNotFound("guestmount").to_string(), "guestmount not detected on your system");
        let failed = ErrorKind::ToolFailed { tool: "mount", stderr: "permission denied".to_string() };
        assert_eq!(failed.to_string(), "mount failed: permission denied");
    }

    #[test]
    fn error_kind_classes() {
        assert!(ErrorKind::Archive(PathBuf::new()).is_unpack_failure());
        assert!(ErrorKind::Mount(PathBuf::new()).is_unpack_failure());
        assert!(!ErrorKind::Unhandled(FileKind::Unknown).is_unpack_failure());
        assert!(!ErrorKind::Io.is_unpack_failure());
    }
}

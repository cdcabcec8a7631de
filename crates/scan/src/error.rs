//! Scan Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A scan error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// A scanner reporting something is *not* an error: that's a
/// [`Verdict::Flagged`](crate::Verdict::Flagged). These are for when no
/// verdict could be reached at all.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The scanner program is not installed (or not in `PATH`).
    #[display("{_0} not detected on your system")]
    ScannerNotFound(#[error(not(source))] String),
    /// The scanner could not be started.
    #[display("I/O error")]
    Io,
}

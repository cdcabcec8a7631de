//! Classification Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Only the sniffers raise these. The [`Classifier`](crate::Classifier) itself
//! never fails: anything it can't make sense of degrades to
//! [`FileKind::Unknown`](crate::FileKind::Unknown).

use derive_more::{Display, Error};

/// A classification error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for classification operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The external sniffing tool is not installed (or not in `PATH`).
    #[display("{_0} not detected on your system")]
    SnifferNotFound(#[error(not(source))] String),
    /// The external sniffing tool exited with a non-zero exit code.
    #[display("sniffer exited with code: {_0}")]
    SnifferFailed(#[error(not(source))] i32),
    /// Reading the file (or its metadata) failed.
    #[display("I/O error")]
    Io,
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::ResultExt;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::SnifferNotFound("file".to_string()).to_string(), "file not detected on your system");
        assert_eq!(ErrorKind::SnifferFailed(2).to_string(), "sniffer exited with code: 2");
        assert_eq!(ErrorKind::Io.to_string(), "I/O error");
    }

    #[test]
    fn error_from_result() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"));
        let err: Result<()> = result.or_raise(|| ErrorKind::Io);
        let exn = err.unwrap_err();
        assert_eq!(*exn, ErrorKind::Io);
    }
}

//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Figment's own error (which names the
//! offending key and source) is attached underneath [`ErrorKind::Load`].

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration source could not be parsed, or a value has the wrong type.
    #[display("unable to load configuration")]
    Load,
    /// A configuration file given explicitly does not exist.
    #[display("configuration file not found: {}", _0.display())]
    Missing(#[error(not(source))] PathBuf),
    /// Configuration loaded, but a value is unusable.
    #[display("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

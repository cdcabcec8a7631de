//! Binary Error Types
//!
//! Errors from the library crates are attached underneath these as child
//! frames, so the full chain is shown when an error is reported.

use burrow_classify::FileKind;
use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("unable to set up content sniffing")]
    Sniffer,
    /// An input given on the command line can't be unpacked at all.
    #[display("cannot unpack {} ({_1})", _0.display())]
    Input(#[error(not(source))] PathBuf, #[error(not(source))] FileKind),
    #[display("unable to unpack {}", _0.display())]
    Unpack(#[error(not(source))] PathBuf),
    #[display("unable to start scanning")]
    Scan,
    #[display("unable to clean up unpacked files")]
    Cleanup,
}

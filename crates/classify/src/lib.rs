//! File classification by content sniffing.
//!
//! Given a path, the [`Classifier`] works out *what* it is (a [`FileKind`]),
//! how it was described by the [`Sniffer`], and how big it is, all without
//! unpacking anything. The result is a [`FileMetadata`] record which the
//! unpacking engine uses to pick a strategy and to name its output
//! directories.
//!
//! Classification never fails: missing paths, directories and unrecognised
//! content each produce a well-defined record instead of an error.

mod classify;
pub mod error;
mod kind;
mod metadata;
mod sniff;

pub use crate::classify::Classifier;
pub use crate::kind::FileKind;
pub use crate::metadata::FileMetadata;
pub use crate::sniff::{FileCommandSniffer, MagicSniffer, Sniffer};

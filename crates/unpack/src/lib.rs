//! Recursive unpacking of archives and disk images.
//!
//! Every unpack gets its own directory under a base (temporary) directory,
//! named so that the kind of file and where it came from can be recovered
//! from the name alone (see [`naming`]). That makes it possible to clean up
//! after a crashed run without any other bookkeeping.
//!
//! # Supported Kinds
//! - **Archives** (tar, gzipped tar, zip) are extracted with the `tar`,
//!   `flate2` and `zip` crates, then made world-readable.
//! - **ISO images** are loop-mounted read-only.
//! - **Virtual disks** (VMDK, QCOW2) have each partition mounted read-only
//!   on its own subdirectory through libguestfs.
//! - **Directories** are used in place.
//!
//! Mounting goes through the [`Mounter`] trait; [`SystemMounter`] shells out
//! to the system tools. Enable the `mock` feature for an in-memory
//! `MockMounter`.
//!
//! # Lifecycle
//! [`Registry::unpack`] either returns a committed [`UnpackContext`] or
//! removes whatever it created. Committed contexts are never cleaned up
//! implicitly: call [`cleanup_all`] (or [`cleanup_context`]) when done.

mod archive;
mod cleanup;
mod context;
mod engine;
pub mod error;
mod handler;
mod mount;
pub mod naming;

pub use crate::archive::ArchiveFormat;
pub use crate::cleanup::{cleanup_all, cleanup_associated, cleanup_context};
pub use crate::context::{ContextId, PendingContext, UnpackContext};
pub use crate::engine::{Engine, Unpacked};
pub use crate::handler::{Registry, Strategy, is_handled};
#[cfg(any(test, feature = "mock"))]
pub use crate::mount::MockMounter;
pub use crate::mount::{Mounter, SystemMounter, partition_dir_name};

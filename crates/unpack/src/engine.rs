//! Recursive unpacking.
//!
//! The [`Engine`] unpacks an operator-supplied file, then keeps walking
//! whatever it unpacked, unpacking every nested archive or image it finds
//! that is big enough to be worth it. Work is kept on an explicit stack, so
//! nesting depth is bounded by disk space rather than the call stack.
//!
//! Only the top-level unpack can fail the whole run. A nested file that won't
//! unpack is logged and its subtree is abandoned; everything else carries on.

use crate::context::{ContextId, UnpackContext};
use crate::error::Result;
use crate::handler::{Registry, is_handled};
use crate::naming::is_destination;
use burrow_classify::{Classifier, FileMetadata};
use std::path::{Path, PathBuf};
use tracing::instrument;
use walkdir::WalkDir;

/// Everything a recursive unpack produced.
#[derive(Debug, Default)]
pub struct Unpacked {
    /// One context per successful unpack, the top-level file first. A
    /// context's [`ContextId`] is its index in this list.
    pub contexts: Vec<UnpackContext>,
    /// Files at or above the size threshold that were skipped because they
    /// can't be unpacked.
    pub ignored: Vec<PathBuf>,
}

impl Unpacked {
    pub fn get(&self, id: ContextId) -> Option<&UnpackContext> {
        self.contexts.get(id.0)
    }

    /// Directories holding unpacked content, in unpack order.
    pub fn destinations(&self) -> impl Iterator<Item = &Path> {
        self.contexts.iter().map(|ctx| ctx.destination.as_path())
    }
}

pub struct Engine<'a> {
    classifier: &'a Classifier,
    registry: &'a Registry<'a>,
}

impl<'a> Engine<'a> {
    pub fn new(classifier: &'a Classifier, registry: &'a Registry<'a>) -> Self {
        Self { classifier, registry }
    }

    /// Unpack `root` under `base`, then recursively unpack every handled file
    /// of at least `min_file_size` bytes found in the output.
    ///
    /// Errors unpacking `root` are returned as-is, before any walking happens.
    #[instrument(skip_all, fields(root = %root.path.display(), min_file_size = min_file_size))]
    pub fn unpack_recursive(&self, root: &FileMetadata, min_file_size: u64, base: &Path) -> Result<Unpacked> {
        let first = self.registry.unpack(root.clone(), base, None)?;
        let mut unpacked = Unpacked { contexts: vec![first], ignored: Vec::new() };
        let mut pending = vec![ContextId(0)];

        while let Some(id) = pending.pop() {
            let walking = &unpacked.contexts[id.0];
            tracing::debug!(context = %walking.display_name(), "Looking for nested archives");
            let destination = walking.destination.clone();
            // A directory input may hold the temp dir or old unpack directories.
            let walker = WalkDir::new(&destination).sort_by_file_name().into_iter().filter_entry(|entry| {
                let skip = entry.depth() > 0
                    && entry.file_type().is_dir()
                    && (entry.path() == base || is_destination(entry.path()));
                if skip {
                    tracing::debug!(path = %entry.path().display(), "Skipping unpack directory");
                }
                !skip
            });
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!(error = %e, "Unable to read part of the unpacked tree; skipping");
                        continue;
                    },
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let meta = self.classifier.classify(entry.path());
                tracing::trace!(path = %meta.path.display(), kind = %meta.kind, size = meta.size, "Classified");
                if !is_handled(meta.kind) || meta.size < min_file_size {
                    if meta.size >= min_file_size {
                        tracing::warn!(path = %meta.path.display(), "Ignoring unhandled large file");
                        unpacked.ignored.push(meta.path);
                    }
                    continue;
                }
                tracing::debug!(path = %meta.path.display(), kind = %meta.kind, size = meta.size, "Found nested archive");
                let meta = meta.nested_under(root);
                let path = meta.path.clone();
                match self.registry.unpack(meta, base, Some(id)) {
                    Ok(ctx) => {
                        pending.push(ContextId(unpacked.contexts.len()));
                        unpacked.contexts.push(ctx);
                    },
                    Err(e) if e.is_unpack_failure() => {
                        tracing::warn!(path = %path.display(), error = ?e, "Unable to unpack nested file; continuing anyway");
                    },
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = ?e, "Unexpected error unpacking nested file; continuing anyway");
                    },
                }
            }
        }
        tracing::debug!(contexts = unpacked.contexts.len(), ignored = unpacked.ignored.len(), "Recursive unpack complete");
        Ok(unpacked)
    }
}

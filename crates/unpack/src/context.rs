use crate::error::{ErrorKind, Result};
use crate::naming::make_destination;
use burrow_classify::{FileKind, FileMetadata};
use exn::ResultExt;
use std::path::{Path, PathBuf};

/// Identifies an [`UnpackContext`] by its position in the list returned from
/// [`unpack_recursive`](crate::Engine::unpack_recursive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub usize);

enum Destination {
    /// Created for this unpack; removed again if the unpack fails.
    Created(PathBuf),
    /// Somebody else's directory (the source itself, for directories).
    Existing(PathBuf),
}

/// An unpack that has been set up but hasn't succeeded yet.
///
/// Holds its destination directory until either [`commit`](Self::commit)
/// hands it over to the caller, or [`discard`](Self::discard) removes it.
/// Dropping a pending context does neither: the directory is left behind.
#[must_use = "a pending context must be committed or discarded"]
pub struct PendingContext {
    meta: FileMetadata,
    destination: Destination,
    parent: Option<ContextId>,
}

impl PendingContext {
    /// Set up the destination for `meta`. Directories are wrapped as they are;
    /// everything else gets a freshly created directory under `base`.
    pub fn new(meta: FileMetadata, base: &Path, parent: Option<ContextId>) -> Result<Self> {
        let destination = match meta.kind {
            FileKind::Directory => Destination::Existing(meta.path.clone()),
            _ => Destination::Created(make_destination(&meta, base)?),
        };
        Ok(Self { meta, destination, parent })
    }

    pub fn meta(&self) -> &FileMetadata {
        &self.meta
    }

    pub fn destination(&self) -> &Path {
        match &self.destination {
            Destination::Created(path) | Destination::Existing(path) => path,
        }
    }

    /// The unpack succeeded: ownership of the destination passes to the caller.
    pub fn commit(self) -> UnpackContext {
        let owned = matches!(self.destination, Destination::Created(_));
        let destination = match self.destination {
            Destination::Created(path) | Destination::Existing(path) => path,
        };
        UnpackContext {
            meta: self.meta,
            destination,
            parent: self.parent,
            owned,
        }
    }

    /// The unpack failed: remove the destination if this context created it.
    pub fn discard(self) -> Result<()> {
        if let Destination::Created(path) = &self.destination {
            tracing::debug!(path = %path.display(), "Removing destination of failed unpack");
            std::fs::remove_dir_all(path).or_raise(|| ErrorKind::Io)?;
        }
        Ok(())
    }
}

/// A successful unpack: where `meta` was unpacked to and what led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackContext {
    pub meta: FileMetadata,
    /// Directory holding the unpacked (or mounted) contents
    pub destination: PathBuf,
    /// Context whose destination this file was found in. Informational only.
    pub parent: Option<ContextId>,
    owned: bool,
}

impl UnpackContext {
    /// Whether the destination was created by burrow (and so must eventually
    /// be cleaned up by the caller), rather than being a directory the
    /// operator pointed at.
    #[inline]
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Human-friendly name for logging: `file` or `root > file`.
    pub fn display_name(&self) -> String {
        match self.meta.root_file_name() {
            Some(root) => format!("{root} > {}", self.meta.file_name()),
            None => self.meta.file_name(),
        }
    }
}

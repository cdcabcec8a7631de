//! Unpack strategies, selected by file kind.

use crate::archive::ArchiveFormat;
use crate::context::{ContextId, PendingContext, UnpackContext};
use crate::error::{ErrorKind, Result};
use crate::mount::{Mounter, partition_dir_name};
use burrow_classify::{FileKind, FileMetadata};
use exn::ResultExt;
use std::path::Path;
use tracing::instrument;

/// How a kind of file gets turned into a directory tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Extract into the destination directory.
    Extract(ArchiveFormat),
    /// Loop-mount the image on the destination directory.
    MountIso,
    /// Mount every partition of the disk image under the destination directory.
    MountPartitions,
    /// Already a directory; nothing to do.
    PassThrough,
}

impl Strategy {
    /// The strategy for `kind`, or `None` if the kind can't be unpacked.
    #[must_use]
    pub fn for_kind(kind: FileKind) -> Option<Self> {
        match kind {
            FileKind::Tar => Some(Strategy::Extract(ArchiveFormat::Tar)),
            FileKind::TarGz => Some(Strategy::Extract(ArchiveFormat::TarGz)),
            FileKind::Zip => Some(Strategy::Extract(ArchiveFormat::Zip)),
            FileKind::Iso => Some(Strategy::MountIso),
            FileKind::VmdkImage | FileKind::Qcow2Image => Some(Strategy::MountPartitions),
            FileKind::Directory => Some(Strategy::PassThrough),
            FileKind::Unknown => None,
        }
    }
}

/// Whether files of this kind can be unpacked.
#[inline]
#[must_use]
pub fn is_handled(kind: FileKind) -> bool {
    Strategy::for_kind(kind).is_some()
}

/// Dispatches unpack requests to the [`Strategy`] for each file kind.
pub struct Registry<'m> {
    mounter: &'m dyn Mounter,
}

impl<'m> Registry<'m> {
    pub fn new(mounter: &'m dyn Mounter) -> Self {
        Self { mounter }
    }

    /// Unpack `meta` into a new directory under `base`.
    ///
    /// On failure the destination directory is removed again, and the error
    /// is [`ErrorKind::Archive`] or [`ErrorKind::Mount`]. Kinds without a
    /// strategy fail with [`ErrorKind::Unhandled`] before anything is created.
    #[instrument(skip_all, fields(path = %meta.path.display(), kind = %meta.kind))]
    pub fn unpack(&self, meta: FileMetadata, base: &Path, parent: Option<ContextId>) -> Result<UnpackContext> {
        let Some(strategy) = Strategy::for_kind(meta.kind) else {
            exn::bail!(ErrorKind::Unhandled(meta.kind));
        };
        let pending = PendingContext::new(meta, base, parent)?;
        tracing::debug!(destination = %pending.destination().display(), ?strategy, "Unpacking");
        match self.run(strategy, &pending) {
            Ok(()) => Ok(pending.commit()),
            Err(e) => {
                if let Err(cleanup) = pending.discard() {
                    tracing::warn!(error = ?cleanup, "Unable to remove destination of failed unpack");
                }
                Err(e)
            },
        }
    }

    fn run(&self, strategy: Strategy, pending: &PendingContext) -> Result<()> {
        let source = &pending.meta().path;
        let destination = pending.destination();
        match strategy {
            Strategy::Extract(format) => format.extract(source, destination),
            Strategy::MountIso => {
                self.mounter.mount_iso(source, destination).or_raise(|| ErrorKind::Mount(source.clone()))
            },
            Strategy::MountPartitions => self.mount_partitions(source, destination),
            Strategy::PassThrough => Ok(()),
        }
    }

    /// Mount each partition on its own subdirectory. Failing to list the
    /// partitions fails the unpack; failing to mount one of them doesn't.
    fn mount_partitions(&self, image: &Path, destination: &Path) -> Result<()> {
        let partitions = self.mounter.partitions(image).or_raise(|| ErrorKind::Mount(image.to_path_buf()))?;
        tracing::debug!(?partitions, "Found partitions");
        let mut mounted = 0usize;
        for partition in &partitions {
            let target = destination.join(partition_dir_name(partition));
            let result = std::fs::create_dir(&target)
                .or_raise(|| ErrorKind::Io)
                .and_then(|()| self.mounter.mount_partition(image, partition, &target));
            match result {
                Ok(()) => {
                    tracing::debug!(partition = %partition, target = %target.display(), "Mounted partition");
                    mounted += 1;
                },
                Err(e) => {
                    tracing::warn!(
                        partition = %partition,
                        image = %image.display(),
                        error = ?e,
                        "Unable to mount partition; continuing with the rest"
                    );
                    let _ = std::fs::remove_dir(&target);
                },
            }
        }
        tracing::debug!(mounted, total = partitions.len(), "Finished mounting partitions");
        Ok(())
    }
}

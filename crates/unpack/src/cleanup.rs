//! Removing unpack destinations.
//!
//! Mounted images are unmounted before their directory is removed. If an
//! unmount fails the directory is left alone: removing it recursively would
//! reach into the mounted filesystem.

use crate::context::UnpackContext;
use crate::error::{ErrorKind, Result};
use crate::mount::Mounter;
use crate::naming::{decode_kind, find_associated};
use burrow_classify::FileKind;
use exn::ResultExt;
use std::path::Path;
use tracing::instrument;

/// Unmount and remove the destination of `ctx`.
///
/// Contexts that don't own their destination (directories given as input)
/// are left untouched.
pub fn cleanup_context(ctx: &UnpackContext, mounter: &dyn Mounter) -> Result<()> {
    if !ctx.is_owned() {
        tracing::trace!(path = %ctx.destination.display(), "Not removing directory burrow didn't create");
        return Ok(());
    }
    cleanup_destination(&ctx.destination, ctx.meta.kind, mounter)
}

/// Clean up every context, most recently unpacked first so that nested
/// destinations go before the ones they were found in.
///
/// Carries on past failures; if any occurred, fails with
/// [`ErrorKind::Incomplete`] once everything else has been removed.
pub fn cleanup_all(contexts: &[UnpackContext], mounter: &dyn Mounter) -> Result<()> {
    let mut failed = 0usize;
    for ctx in contexts.iter().rev() {
        if let Err(e) = cleanup_context(ctx, mounter) {
            tracing::warn!(context = %ctx.display_name(), error = ?e, "Unable to clean up");
            failed += 1;
        }
    }
    if failed > 0 {
        exn::bail!(ErrorKind::Incomplete(failed));
    }
    Ok(())
}

/// Clean up every destination under `base` left behind by unpacking the file
/// at `source` (see [`find_associated`]), working out from each directory's
/// name what was mounted on it. Returns how many directories were removed.
#[instrument(skip_all, fields(source = %source.display(), base = %base.display()))]
pub fn cleanup_associated(source: &Path, base: &Path, mounter: &dyn Mounter) -> Result<usize> {
    let destinations = find_associated(source, base)?;
    tracing::debug!(count = destinations.len(), "Found associated directories");
    let mut failed = 0usize;
    for destination in &destinations {
        if let Err(e) = cleanup_destination(destination, decode_kind(destination), mounter) {
            tracing::warn!(path = %destination.display(), error = ?e, "Unable to clean up");
            failed += 1;
        }
    }
    if failed > 0 {
        exn::bail!(ErrorKind::Incomplete(failed));
    }
    Ok(destinations.len())
}

fn cleanup_destination(destination: &Path, kind: FileKind, mounter: &dyn Mounter) -> Result<()> {
    match kind {
        FileKind::Iso => unmount(destination, mounter)?,
        kind if kind.is_disk_image() => {
            for entry in std::fs::read_dir(destination).or_raise(|| ErrorKind::Io)? {
                let entry = entry.or_raise(|| ErrorKind::Io)?;
                if entry.file_type().is_ok_and(|t| t.is_dir()) {
                    unmount(&entry.path(), mounter)?;
                }
            }
        },
        _ => {},
    }
    tracing::debug!(path = %destination.display(), %kind, "Removing unpack destination");
    std::fs::remove_dir_all(destination).or_raise(|| ErrorKind::Io)
}

fn unmount(target: &Path, mounter: &dyn Mounter) -> Result<()> {
    mounter.unmount(target).or_raise(|| ErrorKind::Unmount(target.to_path_buf()))?;
    tracing::debug!(path = %target.display(), "Unmounted");
    Ok(())
}

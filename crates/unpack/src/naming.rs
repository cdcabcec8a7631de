//! Temporary directory naming.
//!
//! Every directory burrow unpacks into is named after what was unpacked into
//! it, so the directory name alone tells you the file kind and where the file
//! came from:
//!
//! ```text
//! burrow_<tag>_<file>_<random>                  operator-supplied file
//! burrow_<tag>-p_<root file>_p-<file>_<random>  file found while unpacking <root file>
//! ```
//!
//! The random suffix comes from [`tempfile`] and never contains `_`.

use crate::error::{ErrorKind, Result};
use burrow_classify::{FileKind, FileMetadata};
use exn::ResultExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const PREFIX: &str = "burrow";
const NESTED_MARKER: &str = "-p_";
const CHILD_MARKER: &str = "_p-";
/// `rwxr-xr-x`: the scanner may run as a different (unprivileged) user.
const DESTINATION_MODE: u32 = 0o755;
/// Longest file name (in bytes) encoded into a directory name. Two of these
/// plus the markers, tag and suffix stay under `NAME_MAX` (255).
const MAX_ENCODED_LEN: usize = 96;

/// `file`, cut down to at most [`MAX_ENCODED_LEN`] bytes.
fn encoded(file: &str) -> &str {
    if file.len() <= MAX_ENCODED_LEN {
        return file;
    }
    let mut end = MAX_ENCODED_LEN;
    while !file.is_char_boundary(end) {
        end -= 1;
    }
    &file[..end]
}

/// Directory name prefix (everything but the random suffix) for `meta`.
fn name_prefix(meta: &FileMetadata) -> String {
    let file = meta.file_name();
    match meta.root_file_name() {
        None => format!("{PREFIX}_{}_{}_", meta.kind.tag(), encoded(&file)),
        Some(root) => format!(
            "{PREFIX}_{}{NESTED_MARKER}{}{CHILD_MARKER}{}_",
            meta.kind.tag(),
            encoded(&root),
            encoded(&file)
        ),
    }
}

/// Create a fresh, uniquely named directory under `base` to unpack `meta` into.
///
/// The directory is world-readable and is **not** cleaned up automatically;
/// see [`PendingContext`](crate::PendingContext) for who removes it and when.
pub fn make_destination(meta: &FileMetadata, base: &Path) -> Result<PathBuf> {
    let dir = tempfile::Builder::new().prefix(&name_prefix(meta)).tempdir_in(base).or_raise(|| ErrorKind::Io)?;
    let path = dir.keep();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(DESTINATION_MODE)).or_raise(|| ErrorKind::Io)?;
    tracing::trace!(path = %path.display(), kind = %meta.kind, "Created destination directory");
    Ok(path)
}

/// Split a directory name into its kind tag, whether it's nested, and the
/// remainder (file name(s) plus random suffix).
fn split_name(name: &str) -> Option<(FileKind, bool, &str)> {
    let rest = name.strip_prefix(PREFIX)?.strip_prefix('_')?;
    FileKind::ALL.into_iter().find_map(|kind| {
        let after_tag = rest.strip_prefix(kind.tag())?;
        if let Some(rest) = after_tag.strip_prefix(NESTED_MARKER) {
            return Some((kind, true, rest));
        }
        after_tag.strip_prefix('_').map(|rest| (kind, false, rest))
    })
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// Recover the kind a destination directory was created for.
///
/// Only the final path component is inspected; anything that wasn't named by
/// [`make_destination`] decodes as [`FileKind::Unknown`].
#[must_use]
pub fn decode_kind(path: impl AsRef<Path>) -> FileKind {
    dir_name(path.as_ref()).and_then(split_name).map(|(kind, _, _)| kind).unwrap_or(FileKind::Unknown)
}

/// Whether `path` looks like a directory created by [`make_destination`].
#[must_use]
pub fn is_destination(path: impl AsRef<Path>) -> bool {
    dir_name(path.as_ref()).and_then(split_name).is_some_and(|(_, _, rest)| rest.rsplit_once('_').is_some())
}

/// Whether the directory `name` encodes `file`, either as the unpacked file or
/// as the top-level file of a nested unpack.
fn encodes(name: &str, file: &str) -> bool {
    let Some((_, nested, rest)) = split_name(name) else {
        return false;
    };
    let Some((body, suffix)) = rest.rsplit_once('_') else {
        return false;
    };
    if suffix.is_empty() {
        return false;
    }
    match nested {
        false => body == file,
        true => {
            body.strip_prefix(file).is_some_and(|r| r.starts_with(CHILD_MARKER))
                || body.strip_suffix(file).is_some_and(|r| r.ends_with(CHILD_MARKER))
        },
    }
}

/// Find every existing destination directory under `base` associated with the
/// file at `source` (by base name): directories it was unpacked into, and
/// directories of files discovered while unpacking it.
pub fn find_associated(source: impl AsRef<Path>, base: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let Some(file) = dir_name(source.as_ref()).map(encoded) else {
        return Ok(Vec::new());
    };
    let mut found = Vec::new();
    for entry in std::fs::read_dir(base.as_ref()).or_raise(|| ErrorKind::Io)? {
        let entry = entry.or_raise(|| ErrorKind::Io)?;
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        if is_dir && entry.file_name().to_str().is_some_and(|name| encodes(name, file)) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

use crate::FileKind;
use std::path::{Path, PathBuf};

pub(crate) const DESCRIPTION_MISSING: &str = "File does not exist";
pub(crate) const DESCRIPTION_DIRECTORY: &str = "Directory";
pub(crate) const DESCRIPTION_UNKNOWN: &str = "Unknown file type";

/// What the [`Classifier`](crate::Classifier) learned about a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Filesystem path that was classified
    pub path: PathBuf,
    /// Content description from the sniffer, or a fixed placeholder for
    /// directories, missing paths and unrecognised content
    pub description: String,
    /// Size in bytes; zero for anything that isn't a recognised regular file
    pub size: u64,
    pub kind: FileKind,
    /// Path of the operator-supplied file this one was (eventually) unpacked
    /// from. `None` for the operator-supplied file itself.
    ///
    /// A plain copy: it names the top-level file for reporting and directory
    /// naming, nothing more.
    pub root: Option<PathBuf>,
}

impl FileMetadata {
    pub fn new(path: impl Into<PathBuf>, description: impl Into<String>, size: u64, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
            size,
            kind,
            root: None,
        }
    }

    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DESCRIPTION_MISSING, 0, FileKind::Unknown)
    }

    pub(crate) fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DESCRIPTION_DIRECTORY, 0, FileKind::Directory)
    }

    pub(crate) fn unknown(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DESCRIPTION_UNKNOWN, 0, FileKind::Unknown)
    }

    /// Mark this file as discovered while unpacking `root`.
    ///
    /// If `root` was itself discovered during unpacking, its own root is
    /// carried over so that provenance always points at the top-level file.
    #[must_use]
    pub fn nested_under(mut self, root: &FileMetadata) -> Self {
        self.root = Some(root.root.clone().unwrap_or_else(|| root.path.clone()));
        self
    }

    /// Whether the file was discovered during recursive unpacking.
    #[inline]
    pub fn is_nested(&self) -> bool {
        self.root.is_some()
    }

    /// Final path component, lossily converted. Empty for paths like `/`.
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }

    /// Final path component of the top-level file, if this file is nested.
    pub fn root_file_name(&self) -> Option<String> {
        self.root.as_deref().map(file_name_of)
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let meta = FileMetadata::new("/tmp/some_test_path", "POSIX tar archive", 10, FileKind::Tar);
        assert_eq!(meta.file_name(), "some_test_path");
        assert_eq!(FileMetadata::directory("/").file_name(), "");
    }

    #[test]
    fn test_nested_under_points_at_top_level() {
        let top = FileMetadata::new("/in/top.tar", "POSIX tar archive", 4096, FileKind::Tar);
        let middle = FileMetadata::new("/tmp/a/middle.zip", "Zip archive data", 2048, FileKind::Zip).nested_under(&top);
        let bottom = FileMetadata::new("/tmp/b/bottom.iso", "ISO 9660", 1024, FileKind::Iso).nested_under(&middle);

        assert!(!top.is_nested());
        assert_eq!(middle.root.as_deref(), Some(Path::new("/in/top.tar")));
        assert_eq!(bottom.root.as_deref(), Some(Path::new("/in/top.tar")));
        assert_eq!(bottom.root_file_name().as_deref(), Some("top.tar"));
        assert_eq!(top.root_file_name(), None);
    }
}

use crate::metadata::{DESCRIPTION_UNKNOWN, FileMetadata};
use crate::{FileKind, Sniffer};
use std::path::Path;
use tracing::instrument;

/// Classifies filesystem paths without unpacking them.
pub struct Classifier {
    sniffer: Box<dyn Sniffer>,
}

impl Classifier {
    pub fn new(sniffer: impl Sniffer + 'static) -> Self {
        Self { sniffer: Box::new(sniffer) }
    }

    /// Work out what's at `path`.
    ///
    /// Directories and paths that aren't regular files are never handed to
    /// the sniffer. Content the sniffer doesn't recognise (or can't read) is
    /// reported as [`FileKind::Unknown`] with a size of zero, whatever its
    /// real size on disk.
    #[instrument(level = "trace", skip_all, fields(path = %path.display()))]
    pub fn classify(&self, path: &Path) -> FileMetadata {
        // Follows symlinks; a dangling symlink doesn't exist.
        let Ok(metadata) = std::fs::metadata(path) else {
            return FileMetadata::missing(path);
        };
        if metadata.is_dir() {
            return FileMetadata::directory(path);
        }
        // Sockets, FIFOs, devices and symlinks (to files) are left alone.
        if !std::fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_file()) {
            return FileMetadata::unknown(path);
        }
        let sniffed = self.sniffer.describe(path).and_then(|d| Ok((d, self.sniffer.size(path)?)));
        let (description, size) = match sniffed {
            Ok(sniffed) => sniffed,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = ?e, "Unable to sniff file content; treating as unknown");
                return FileMetadata::unknown(path);
            },
        };
        match FileKind::from_description(&description) {
            FileKind::Unknown => {
                tracing::trace!(path = %path.display(), description = %description, "Unrecognised file content");
                FileMetadata::new(path, DESCRIPTION_UNKNOWN, 0, FileKind::Unknown)
            },
            kind => FileMetadata::new(path, description, size, kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MagicSniffer;
    use crate::error::Result;
    use crate::metadata::{DESCRIPTION_DIRECTORY, DESCRIPTION_MISSING};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        describe: Cell<usize>,
        size: Cell<usize>,
    }

    /// Answers with a fixed description and size, counting how often it's asked.
    struct CountingSniffer {
        description: &'static str,
        size: u64,
        calls: Rc<Calls>,
    }

    impl Sniffer for CountingSniffer {
        fn describe(&self, _path: &Path) -> Result<String> {
            self.calls.describe.set(self.calls.describe.get() + 1);
            Ok(self.description.to_string())
        }

        fn size(&self, _path: &Path) -> Result<u64> {
            self.calls.size.set(self.calls.size.get() + 1);
            Ok(self.size)
        }
    }

    fn counting(description: &'static str, size: u64) -> (Classifier, Rc<Calls>) {
        let calls = Rc::new(Calls::default());
        let sniffer = CountingSniffer { description, size, calls: calls.clone() };
        (Classifier::new(sniffer), calls)
    }

    #[test]
    fn test_classify_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.qcow2");
        std::fs::write(&path, b"irrelevant").unwrap();
        let (classifier, calls) = counting("QEMU QCOW2 Image (v3),", 1234);

        let meta = classifier.classify(&path);
        assert_eq!(meta.path, path);
        assert_eq!(meta.description, "QEMU QCOW2 Image (v3),");
        assert_eq!(meta.size, 1234);
        assert_eq!(meta.kind, FileKind::Qcow2Image);
        assert_eq!(meta.root, None);
        assert_eq!(calls.describe.get(), 1);
        assert_eq!(calls.size.get(), 1);
    }

    #[test]
    fn test_classify_unrecognised_file_is_zero_sized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();
        let (classifier, _) = counting("Strange File Type", 4096);

        let meta = classifier.classify(&path);
        assert_eq!(meta.kind, FileKind::Unknown);
        assert_eq!(meta.description, "Unknown file type");
        assert_eq!(meta.size, 0);
    }

    #[test]
    fn test_classify_directory_never_sniffs() {
        let dir = tempfile::tempdir().unwrap();
        let (classifier, calls) = counting("POSIX tar archive", 99);

        let meta = classifier.classify(dir.path());
        assert_eq!(meta.kind, FileKind::Directory);
        assert_eq!(meta.description, DESCRIPTION_DIRECTORY);
        assert_eq!(meta.size, 0);
        assert_eq!(calls.describe.get(), 0);
        assert_eq!(calls.size.get(), 0);
    }

    #[test]
    fn test_classify_missing_path_never_sniffs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.tar");
        let (classifier, calls) = counting("POSIX tar archive", 99);

        let meta = classifier.classify(&path);
        assert_eq!(meta.path, path);
        assert_eq!(meta.kind, FileKind::Unknown);
        assert_eq!(meta.description, DESCRIPTION_MISSING);
        assert_eq!(meta.size, 0);
        assert_eq!(calls.describe.get(), 0);
        assert_eq!(calls.size.get(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_symlink_to_file_never_sniffs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("real.tar");
        std::fs::write(&target, b"irrelevant").unwrap();
        let link = dir.path().join("link.tar");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let (classifier, calls) = counting("POSIX tar archive", 10);

        let meta = classifier.classify(&link);
        assert_eq!(meta.kind, FileKind::Unknown);
        assert_eq!(meta.description, "Unknown file type");
        assert_eq!(calls.describe.get(), 0);

        std::fs::remove_file(&target).unwrap();
        assert_eq!(classifier.classify(&link).description, DESCRIPTION_MISSING);
    }

    #[test]
    fn test_classify_with_magic_sniffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.vmdk");
        let mut bytes = b"KDMV".to_vec();
        bytes.resize(2048, 0);
        std::fs::write(&path, &bytes).unwrap();

        let meta = Classifier::new(MagicSniffer::new()).classify(&path);
        assert_eq!(meta.kind, FileKind::VmdkImage);
        assert_eq!(meta.description, "VMware4 disk image");
        assert_eq!(meta.size, 2048);
    }
}

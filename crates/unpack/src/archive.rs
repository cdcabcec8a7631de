//! Archive extraction.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::instrument;
use walkdir::WalkDir;

const WORLD_READABLE: u32 = 0o444;
const WORLD_LISTABLE: u32 = 0o555;

/// Archive formats that are extracted into a plain directory tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Extract the full contents of `source` into `destination`.
    ///
    /// Entries that would land outside `destination` are skipped (tar) or
    /// rejected (zip). Once extracted, everything is made world-readable.
    #[instrument(skip_all, fields(format = ?self, source = %source.display()))]
    pub fn extract(&self, source: &Path, destination: &Path) -> Result<()> {
        let archive_error = || ErrorKind::Archive(source.to_path_buf());
        let file = File::open(source).or_raise(archive_error)?;
        let reader = BufReader::new(file);
        match self {
            ArchiveFormat::Tar => unpack_tar(reader, destination).or_raise(archive_error)?,
            ArchiveFormat::TarGz => unpack_tar(GzDecoder::new(reader), destination).or_raise(archive_error)?,
            ArchiveFormat::Zip => {
                let mut archive = zip::ZipArchive::new(reader).or_raise(archive_error)?;
                tracing::debug!(entries = archive.len(), "Extracting zip archive");
                archive.extract(destination).or_raise(archive_error)?;
            },
        }
        make_world_readable(destination).or_raise(archive_error)
    }
}

fn unpack_tar<R: Read>(reader: R, destination: &Path) -> std::io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(false);
    archive.set_overwrite(true);
    archive.unpack(destination)
}

/// `chmod -R a+rX`: files become readable by everyone, directories readable
/// and listable by everyone. Symlinks are not followed.
pub(crate) fn make_world_readable(root: &Path) -> Result<()> {
    for entry in WalkDir::new(root) {
        let entry = entry.or_raise(|| ErrorKind::Io)?;
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            continue;
        }
        let extra = if file_type.is_dir() { WORLD_LISTABLE } else { WORLD_READABLE };
        let metadata = entry.metadata().or_raise(|| ErrorKind::Io)?;
        let mode = metadata.permissions().mode();
        if mode & extra != extra {
            std::fs::set_permissions(entry.path(), std::fs::Permissions::from_mode(mode | extra))
                .or_raise(|| ErrorKind::Io)?;
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::{Compression, write::GzEncoder};
    use std::io::Write;
    use std::path::PathBuf;
    use zip::write::SimpleFileOptions;

    /// Build a tarball from `(name, contents)` pairs.
    pub(crate) fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in entries {
            let mut header = tar::Header::new_ustar();
            header.set_size(data.len() as u64);
            header.set_mode(0o600);
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    pub(crate) fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    pub(crate) fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// Gzip header followed by a deflate block with the reserved block type.
    pub(crate) const CORRUPT_GZIP: &[u8] = &[0x1F, 0x8B, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0x03, 0x07, 0xFF, 0xFF];

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_extract_tar() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let source = write(dir.path(), "a.tar", &tar_bytes(&[("one.txt", b"1"), ("sub/two.txt", b"22")]));

        ArchiveFormat::Tar.extract(&source, out.path()).unwrap();
        assert_eq!(std::fs::read(out.path().join("one.txt")).unwrap(), b"1");
        assert_eq!(std::fs::read(out.path().join("sub/two.txt")).unwrap(), b"22");
        let mode = std::fs::metadata(out.path().join("one.txt")).unwrap().permissions().mode();
        assert_eq!(mode & 0o444, 0o444);
        let mode = std::fs::metadata(out.path().join("sub")).unwrap().permissions().mode();
        assert_eq!(mode & 0o555, 0o555);
    }

    #[test]
    fn test_extract_tar_gz() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let source = write(dir.path(), "a.tgz", &gzip_bytes(&tar_bytes(&[("inside.bin", b"payload")])));

        ArchiveFormat::TarGz.extract(&source, out.path()).unwrap();
        assert_eq!(std::fs::read(out.path().join("inside.bin")).unwrap(), b"payload");
    }

    #[test]
    fn test_extract_zip() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let source = write(dir.path(), "a.zip", &zip_bytes(&[("docs/readme.md", b"# hi")]));

        ArchiveFormat::Zip.extract(&source, out.path()).unwrap();
        assert_eq!(std::fs::read(out.path().join("docs/readme.md")).unwrap(), b"# hi");
    }

    #[test]
    fn test_extract_corrupt_archives() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let gz = write(dir.path(), "bad.tgz", CORRUPT_GZIP);
        let zip = write(dir.path(), "bad.zip", b"PK\x03\x04 definitely not a zip");
        let mut tar = tar_bytes(&[("one.txt", b"1")]);
        // Scribble over the header so the checksum no longer matches.
        tar[0] = b'X';
        let tar = write(dir.path(), "bad.tar", &tar);

        for (format, source) in [(ArchiveFormat::TarGz, gz), (ArchiveFormat::Zip, zip), (ArchiveFormat::Tar, tar)] {
            let err = format.extract(&source, out.path()).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Archive(path) if *path == source), "{format:?}");
        }
    }

    #[test]
    fn test_extract_missing_source() {
        let out = tempfile::tempdir().unwrap();
        let source = out.path().join("missing.tar");
        let err = ArchiveFormat::Tar.extract(&source, out.path()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Archive(_)));
    }
}

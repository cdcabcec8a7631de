//! Content sniffers.
//!
//! A [`Sniffer`] turns file bytes into a human-readable description in the
//! style of libmagic's `file(1)`. The [`Classifier`](crate::Classifier) only
//! ever looks at the description text, so any sniffer producing compatible
//! wording can be swapped in.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

const TAR_MAGIC_OFFSET: usize = 257;
const TAR_USTAR_MAGIC: &[u8] = b"ustar\0";
const TAR_GNU_MAGIC: &[u8] = b"ustar  \0";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
// Primary volume descriptor lives in sector 16 (2048-byte sectors), after the
// one-byte descriptor type.
const ISO_MAGIC_OFFSET: usize = 0x8001;
const ISO_MAGIC: &[u8] = b"CD001";
const VMDK_MAGIC: &[u8] = b"KDMV";
const QCOW_MAGIC: &[u8] = b"QFI\xfb";
const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];
/// Enough of the head of a file to reach the deepest magic number.
const HEAD_LEN: u64 = (ISO_MAGIC_OFFSET + ISO_MAGIC.len()) as u64;

/// Produces content descriptions and sizes for files.
pub trait Sniffer {
    /// Describe the content of the file at `path`.
    fn describe(&self, path: &Path) -> Result<String>;
    /// Size of the file at `path`, in bytes.
    fn size(&self, path: &Path) -> Result<u64>;
}

fn metadata_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path).or_raise(|| ErrorKind::Io)?.len())
}

/// Built-in sniffer that recognises the magic numbers of the formats burrow
/// cares about (plus a few it doesn't, so they get a sensible description).
#[derive(Debug, Default, Clone, Copy)]
pub struct MagicSniffer;

impl MagicSniffer {
    pub fn new() -> Self {
        Self
    }

    /// Describe a buffer holding the first bytes of a file.
    #[must_use]
    pub fn describe_bytes(head: &[u8]) -> String {
        if head.is_empty() {
            return "empty".to_string();
        }
        if let Some(magic) = head.get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_GNU_MAGIC.len())
            && magic == TAR_GNU_MAGIC
        {
            return "POSIX tar archive (GNU)".to_string();
        }
        if let Some(magic) = head.get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_USTAR_MAGIC.len())
            && magic == TAR_USTAR_MAGIC
        {
            return "POSIX tar archive".to_string();
        }
        if head.starts_with(ZIP_MAGIC) {
            return "Zip archive data".to_string();
        }
        if head.starts_with(ZIP_EMPTY_MAGIC) {
            return "Zip archive data (empty)".to_string();
        }
        if head.starts_with(VMDK_MAGIC) {
            return "VMware4 disk image".to_string();
        }
        if head.starts_with(QCOW_MAGIC) {
            // Big-endian version number follows the magic.
            return match head.get(4..8).map(|v| u32::from_be_bytes([v[0], v[1], v[2], v[3]])) {
                Some(version @ (2 | 3)) => format!("QEMU QCOW2 Image (v{version})"),
                Some(version) => format!("QEMU QCOW Image (v{version})"),
                None => "QEMU QCOW Image".to_string(),
            };
        }
        if head.starts_with(GZIP_MAGIC) {
            return "gzip compressed data".to_string();
        }
        if head.starts_with(BZIP2_MAGIC) {
            return "bzip2 compressed data".to_string();
        }
        if head.starts_with(XZ_MAGIC) {
            return "XZ compressed data".to_string();
        }
        if let Some(magic) = head.get(ISO_MAGIC_OFFSET..ISO_MAGIC_OFFSET + ISO_MAGIC.len())
            && magic == ISO_MAGIC
        {
            return "ISO 9660 CD-ROM filesystem data".to_string();
        }
        "data".to_string()
    }
}

impl Sniffer for MagicSniffer {
    fn describe(&self, path: &Path) -> Result<String> {
        let file = File::open(path).or_raise(|| ErrorKind::Io)?;
        let mut head = Vec::with_capacity(HEAD_LEN as usize);
        file.take(HEAD_LEN).read_to_end(&mut head).or_raise(|| ErrorKind::Io)?;
        Ok(Self::describe_bytes(&head))
    }

    fn size(&self, path: &Path) -> Result<u64> {
        metadata_size(path)
    }
}

/// Sniffer backed by the system's `file(1)` command (libmagic).
#[derive(Debug, Clone)]
pub struct FileCommandSniffer {
    program: PathBuf,
}

impl FileCommandSniffer {
    pub fn discover() -> Result<Self> {
        match which::which("file") {
            Ok(program) => {
                tracing::debug!(program = %program.display(), "Discovered file(1) for content sniffing");
                Ok(Self { program })
            },
            Err(_) => exn::bail!(ErrorKind::SnifferNotFound("file".to_string())),
        }
    }
}

impl Sniffer for FileCommandSniffer {
    fn describe(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.program).arg("-b").arg("--").arg(path).output().or_raise(|| ErrorKind::Io)?;
        if !output.status.success() {
            exn::bail!(ErrorKind::SnifferFailed(output.status.code().unwrap_or(-1)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    fn size(&self, path: &Path) -> Result<u64> {
        metadata_size(path)
    }
}

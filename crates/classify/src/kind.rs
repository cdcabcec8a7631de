use std::fmt::{Display, Formatter, Result as FmtResult};

/// Description substrings mapped to the kind they identify.
///
/// Checked top to bottom with case-sensitive containment; the first match
/// wins. The order matters: a gzip'd tarball sniffed by libmagic mentions
/// "gzip" but never "tar archive", while a plain tarball never mentions
/// "gzip".
const DESCRIPTION_RULES: [(&str, FileKind); 7] = [
    ("tar archive", FileKind::Tar),
    ("Zip archive", FileKind::Zip),
    ("ISO 9660", FileKind::Iso),
    ("VMware", FileKind::VmdkImage),
    ("disk image", FileKind::VmdkImage),
    ("gzip", FileKind::TarGz),
    ("QCOW2", FileKind::Qcow2Image),
];

/// The kinds of file burrow knows about.
///
/// Every variant has a short, stable [tag](Self::tag) that gets baked into
/// temporary directory names, so changing a tag orphans any directories that
/// were created with the old one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// POSIX/GNU tarball
    Tar,
    /// Gzip-compressed tarball
    TarGz,
    /// Zip archive
    Zip,
    /// ISO 9660 filesystem image
    Iso,
    /// VMware virtual disk
    VmdkImage,
    /// QEMU copy-on-write (v2/v3) virtual disk
    Qcow2Image,
    /// A plain directory
    Directory,
    /// Anything else, including paths that don't exist
    Unknown,
}

impl FileKind {
    /// Every kind, in declaration order.
    pub const ALL: [FileKind; 8] = [
        FileKind::Tar,
        FileKind::TarGz,
        FileKind::Zip,
        FileKind::Iso,
        FileKind::VmdkImage,
        FileKind::Qcow2Image,
        FileKind::Directory,
        FileKind::Unknown,
    ];

    /// Short tag used when encoding the kind into directory names.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            FileKind::Tar => "tar",
            FileKind::TarGz => "targz",
            FileKind::Zip => "zip",
            FileKind::Iso => "iso",
            FileKind::VmdkImage => "vmdk",
            FileKind::Qcow2Image => "qcow2",
            FileKind::Directory => "dir",
            FileKind::Unknown => "unknown",
        }
    }

    /// Map a content description (as produced by a [`Sniffer`](crate::Sniffer))
    /// onto a kind. Descriptions that match no rule are [`Unknown`](Self::Unknown).
    #[must_use]
    pub fn from_description(description: &str) -> Self {
        DESCRIPTION_RULES
            .iter()
            .find(|(needle, _)| description.contains(needle))
            .map(|(_, kind)| *kind)
            .unwrap_or(FileKind::Unknown)
    }

    /// Whether the kind is a partitioned virtual disk.
    #[inline]
    #[must_use]
    pub fn is_disk_image(&self) -> bool {
        matches!(self, FileKind::VmdkImage | FileKind::Qcow2Image)
    }
}

impl Display for FileKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.tag())
    }
}

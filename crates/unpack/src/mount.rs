//! Mount tooling for filesystem images.
//!
//! ISO images are loop-mounted with `mount(8)`; virtual disks go through
//! libguestfs (`virt-filesystems` to list partitions, `guestmount` to mount
//! them). All mounts are read-only.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Mounts and unmounts filesystem images.
pub trait Mounter {
    /// Mount an ISO 9660 image read-only at `target`.
    fn mount_iso(&self, image: &Path, target: &Path) -> Result<()>;
    /// List the mountable partitions inside a virtual disk image.
    fn partitions(&self, image: &Path) -> Result<Vec<String>>;
    /// Mount one partition of a virtual disk image read-only at `target`.
    fn mount_partition(&self, image: &Path, partition: &str, target: &Path) -> Result<()>;
    /// Unmount whatever is mounted at `target`.
    fn unmount(&self, target: &Path) -> Result<()>;
}

/// Name of the subdirectory a partition gets mounted on: `/dev/sda1` -> `dev_sda1`.
#[must_use]
pub fn partition_dir_name(partition: &str) -> String {
    let name: String =
        partition.trim_matches('/').chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' }).collect();
    if name.is_empty() { "partition".to_string() } else { name }
}

/// [`Mounter`] backed by the system's mount tooling.
///
/// Tools are looked up in `PATH` on every call, so a missing tool only
/// matters if an image that needs it actually turns up.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMounter;

impl SystemMounter {
    pub fn new() -> Self {
        Self
    }

    fn locate(tool: &'static str) -> Result<PathBuf> {
        match which::which(tool) {
            Ok(path) => Ok(path),
            Err(_) => exn::bail!(ErrorKind::ToolNotFound(tool)),
        }
    }

    /// Run `tool` to completion, returning its standard output.
    fn run(tool: &'static str, args: &[&OsStr]) -> Result<String> {
        let program = Self::locate(tool)?;
        tracing::debug!(tool, ?args, "Running mount tool");
        let output = Command::new(&program).args(args).output().or_raise(|| ErrorKind::Io)?;
        if !output.status.success() {
            exn::bail!(ErrorKind::ToolFailed {
                tool,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Mounter for SystemMounter {
    fn mount_iso(&self, image: &Path, target: &Path) -> Result<()> {
        Self::run("mount", &[OsStr::new("-o"), OsStr::new("loop,ro"), image.as_os_str(), target.as_os_str()])?;
        Ok(())
    }

    fn partitions(&self, image: &Path) -> Result<Vec<String>> {
        let stdout = Self::run("virt-filesystems", &[OsStr::new("-a"), image.as_os_str()])?;
        Ok(stdout.lines().map(str::trim).filter(|line| !line.is_empty()).map(String::from).collect())
    }

    fn mount_partition(&self, image: &Path, partition: &str, target: &Path) -> Result<()> {
        let args = [
            OsStr::new("-a"),
            image.as_os_str(),
            OsStr::new("-m"),
            OsStr::new(partition),
            OsStr::new("--ro"),
            target.as_os_str(),
        ];
        Self::run("guestmount", &args)?;
        Ok(())
    }

    fn unmount(&self, target: &Path) -> Result<()> {
        // FUSE mounts from guestmount want guestunmount; fall back to umount
        // for loop mounts (or when libguestfs isn't installed).
        if Self::run("guestunmount", &[target.as_os_str()]).is_ok() {
            return Ok(());
        }
        Self::run("umount", &[target.as_os_str()])?;
        Ok(())
    }
}

#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockMounter;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use super::Mounter;
    use crate::error::{ErrorKind, Result};
    use exn::ResultExt;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    /// In-memory [`Mounter`] for tests.
    ///
    /// "Mounting" drops a marker file into the target directory so that the
    /// unpack engine has something to walk. Failures are configured up front.
    #[derive(Default)]
    pub struct MockMounter {
        partitions: Option<Vec<String>>,
        failing: HashSet<String>,
        fail_iso: bool,
        fail_unmount: bool,
        mounted: RefCell<Vec<PathBuf>>,
        unmounted: RefCell<Vec<PathBuf>>,
    }

    impl MockMounter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Disk images report these partitions. Without this, listing fails.
        pub fn with_partitions(mut self, partitions: impl IntoIterator<Item = impl Into<String>>) -> Self {
            self.partitions = Some(partitions.into_iter().map(Into::into).collect());
            self
        }

        /// Mounting this partition fails.
        pub fn with_failing_partition(mut self, partition: impl Into<String>) -> Self {
            self.failing.insert(partition.into());
            self
        }

        /// Mounting any ISO fails.
        pub fn with_failing_iso(mut self) -> Self {
            self.fail_iso = true;
            self
        }

        /// Unmounting anything fails.
        pub fn with_failing_unmount(mut self) -> Self {
            self.fail_unmount = true;
            self
        }

        /// Every target successfully mounted, in order.
        pub fn mounted(&self) -> Vec<PathBuf> {
            self.mounted.borrow().clone()
        }

        /// Every target successfully unmounted, in order.
        pub fn unmounted(&self) -> Vec<PathBuf> {
            self.unmounted.borrow().clone()
        }

        fn mount(&self, target: &Path, marker: &str) -> Result<()> {
            std::fs::write(target.join(marker), marker).or_raise(|| ErrorKind::Io)?;
            self.mounted.borrow_mut().push(target.to_path_buf());
            Ok(())
        }
    }

    impl Mounter for MockMounter {
        fn mount_iso(&self, _image: &Path, target: &Path) -> Result<()> {
            if self.fail_iso {
                exn::bail!(ErrorKind::ToolFailed { tool: "mount", stderr: "wrong fs type".to_string() });
            }
            self.mount(target, "iso-contents")
        }

        fn partitions(&self, _image: &Path) -> Result<Vec<String>> {
            match &self.partitions {
                Some(partitions) => Ok(partitions.clone()),
                None => exn::bail!(ErrorKind::ToolFailed {
                    tool: "virt-filesystems",
                    stderr: "no operating system found".to_string(),
                }),
            }
        }

        fn mount_partition(&self, _image: &Path, partition: &str, target: &Path) -> Result<()> {
            if self.failing.contains(partition) {
                exn::bail!(ErrorKind::ToolFailed { tool: "guestmount", stderr: "mount failed".to_string() });
            }
            self.mount(target, "partition-contents")
        }

        fn unmount(&self, target: &Path) -> Result<()> {
            if self.fail_unmount {
                exn::bail!(ErrorKind::ToolFailed { tool: "umount", stderr: "target is busy".to_string() });
            }
            // Mimic the mounted filesystem disappearing.
            for marker in ["iso-contents", "partition-contents"] {
                let _ = std::fs::remove_file(target.join(marker));
            }
            self.unmounted.borrow_mut().push(target.to_path_buf());
            Ok(())
        }
    }
}

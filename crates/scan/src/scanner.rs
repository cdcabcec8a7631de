use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::instrument;

/// Outcome of scanning one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    /// Something was found; carries the scanner's report.
    Flagged(String),
}

impl Verdict {
    #[inline]
    pub fn is_clean(&self) -> bool {
        matches!(self, Verdict::Clean)
    }
}

/// Scans a file or directory tree.
pub trait Scanner {
    fn scan(&self, path: &Path) -> Result<Verdict>;
}

/// [`Scanner`] that runs a `clamdscan`-compatible command line.
///
/// The program is run as `<program> <args>... <path>`. Exit status zero means
/// clean; anything else means flagged, with standard output as the report.
#[derive(Debug, Clone)]
pub struct Clamdscan {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Clamdscan {
    /// Resolve `program` in `PATH` (or as a path), failing with
    /// [`ErrorKind::ScannerNotFound`] if it isn't there.
    pub fn discover(program: impl AsRef<str>, args: impl IntoIterator<Item = impl Into<OsString>>) -> Result<Self> {
        let name = program.as_ref();
        let program = match which::which(name) {
            Ok(path) => path,
            Err(_) => exn::bail!(ErrorKind::ScannerNotFound(name.to_string())),
        };
        tracing::debug!(program = %program.display(), "Discovered scanner");
        Ok(Self { program, args: args.into_iter().map(Into::into).collect() })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Scanner for Clamdscan {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn scan(&self, path: &Path) -> Result<Verdict> {
        let output = Command::new(&self.program).args(&self.args).arg(path).output().or_raise(|| ErrorKind::Io)?;
        if output.status.success() {
            return Ok(Verdict::Clean);
        }
        tracing::debug!(status = ?output.status.code(), "Scanner reported a problem");
        Ok(Verdict::Flagged(String::from_utf8_lossy(&output.stdout).trim_end().to_string()))
    }
}

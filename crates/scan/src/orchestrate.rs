use crate::scanner::{Scanner, Verdict};
use std::path::{Path, PathBuf};
use tracing::instrument;

const BANNER_WIDTH: usize = 80;

/// A path the scanner flagged, or couldn't scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub path: PathBuf,
    /// Scanner report, or the error that stopped the scan.
    pub report: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Number of paths handed to the scanner.
    pub scanned: usize,
    pub findings: Vec<Finding>,
}

impl ScanReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Scan each path in order.
///
/// A path that can't be scanned counts as a finding: an unscanned tree is
/// not a clean one. With `fail_fast`, stops at the first finding.
#[instrument(skip_all, fields(fail_fast = fail_fast))]
pub fn scan_all<P: AsRef<Path>>(scanner: &dyn Scanner, paths: &[P], fail_fast: bool) -> ScanReport {
    let mut report = ScanReport::default();
    for path in paths {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Scanning");
        report.scanned += 1;
        let finding = match scanner.scan(path) {
            Ok(Verdict::Clean) => continue,
            Ok(Verdict::Flagged(output)) => output,
            Err(e) => {
                tracing::debug!(error = ?e, "Scanner failed");
                format!("unable to scan: {}", &*e)
            },
        };
        tracing::error!("{}", "!".repeat(BANNER_WIDTH));
        tracing::error!(path = %path.display(), "Scanner found a problem");
        tracing::error!("{finding}");
        tracing::error!("{}", "!".repeat(BANNER_WIDTH));
        report.findings.push(Finding { path: path.to_path_buf(), report: finding });
        if fail_fast {
            tracing::warn!(remaining = paths.len() - report.scanned, "Stopping at first finding");
            break;
        }
    }
    if report.is_clean() {
        tracing::info!("{}", "=".repeat(BANNER_WIDTH));
        tracing::info!(scanned = report.scanned, "Nothing found, all clear!");
        tracing::info!("{}", "=".repeat(BANNER_WIDTH));
    }
    report
}

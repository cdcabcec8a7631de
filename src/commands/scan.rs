use super::{EXIT_FINDINGS, apply, classifier, classify_input};
use crate::cli::ScanArgs;
use crate::error::{ErrorKind, Result};
use burrow_classify::{Classifier, FileMetadata};
use burrow_config::Config;
use burrow_scan::{Clamdscan, ScanReport, Scanner, scan_all};
use burrow_unpack::{Engine, Mounter, Registry, SystemMounter, UnpackContext, cleanup_all};
use exn::ResultExt;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

const BANNER_WIDTH: usize = 80;

pub(super) fn execute(args: ScanArgs, mut config: Config) -> Result<ExitCode> {
    apply(&mut config, &args.options)?;
    config.fail_fast |= args.fail_fast;
    config.keep |= args.keep;

    // No point unpacking anything if there's nothing to scan it with.
    let scanner = Clamdscan::discover(&config.scanner.program, &config.scanner.args).or_raise(|| ErrorKind::Scan)?;
    let classifier = classifier(config.sniffer)?;
    let mounter = SystemMounter::new();

    let report = run(&args.paths, &config, &classifier, &mounter, &scanner, &mut std::io::stdout().lock())?;
    Ok(if report.is_clean() { ExitCode::SUCCESS } else { ExitCode::from(EXIT_FINDINGS) })
}

/// Unpack every input, scan everything unpacked, print the outcome and clean
/// up (unless configured to keep the unpacked trees).
fn run(
    paths: &[PathBuf],
    config: &Config,
    classifier: &Classifier,
    mounter: &dyn Mounter,
    scanner: &dyn Scanner,
    out: &mut dyn Write,
) -> Result<ScanReport> {
    let inputs = paths.iter().map(|path| classify_input(classifier, path)).collect::<Result<Vec<FileMetadata>>>()?;

    let registry = Registry::new(mounter);
    let engine = Engine::new(classifier, &registry);
    let mut contexts: Vec<UnpackContext> = Vec::new();
    for input in &inputs {
        match engine.unpack_recursive(input, config.min_file_size, &config.tmp_dir) {
            Ok(unpacked) => contexts.extend(unpacked.contexts),
            Err(e) => {
                clean_up(&contexts, mounter, config.keep);
                return Err(e.raise(ErrorKind::Unpack(input.path.clone())));
            },
        }
    }

    let destinations: Vec<_> = contexts.iter().map(|ctx| ctx.destination.as_path()).collect();
    let report = scan_all(scanner, &destinations, config.fail_fast);
    let printed = print_report(&report, out);
    clean_up(&contexts, mounter, config.keep);
    printed.or_raise(|| ErrorKind::Scan)?;
    Ok(report)
}

fn clean_up(contexts: &[UnpackContext], mounter: &dyn Mounter, keep: bool) {
    if keep {
        for ctx in contexts.iter().filter(|ctx| ctx.is_owned()) {
            tracing::info!(path = %ctx.destination.display(), "Keeping unpacked directory");
        }
        return;
    }
    if let Err(e) = cleanup_all(contexts, mounter) {
        tracing::error!(error = ?e, "Unpacked directories were left behind; remove them with `burrow cleanup`");
    }
}

fn print_report(report: &ScanReport, out: &mut dyn Write) -> std::io::Result<()> {
    let banner = "!".repeat(BANNER_WIDTH);
    for finding in &report.findings {
        writeln!(out, "{banner}")?;
        writeln!(out, "Found in {}:", finding.path.display())?;
        writeln!(out, "{}", finding.report)?;
        writeln!(out, "{banner}")?;
    }
    match report.findings.len() {
        0 => writeln!(out, "Scanned {} director(ies): all clear", report.scanned),
        found => writeln!(out, "Scanned {} director(ies): {found} finding(s)", report.scanned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_classify::MagicSniffer;
    use burrow_scan::Verdict;
    use burrow_unpack::MockMounter;
    use std::cell::RefCell;
    use std::path::Path;

    /// Flags any directory containing a file called `eicar.com`.
    #[derive(Default)]
    struct MarkerScanner {
        scanned: RefCell<Vec<PathBuf>>,
    }

    impl Scanner for MarkerScanner {
        fn scan(&self, path: &Path) -> burrow_scan::error::Result<Verdict> {
            self.scanned.borrow_mut().push(path.to_path_buf());
            Ok(match path.join("eicar.com").exists() {
                true => Verdict::Flagged(format!("{}/eicar.com: Eicar-Signature FOUND", path.display())),
                false => Verdict::Clean,
            })
        }
    }

    fn config(tmp_dir: &Path) -> Config {
        Config { tmp_dir: tmp_dir.to_path_buf(), min_file_size: 0, ..Config::default() }
    }

    fn tree(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), b"contents").unwrap();
        }
        dir
    }

    #[test]
    fn test_clean_inputs() {
        let tmp = tempfile::tempdir().unwrap();
        let (a, b) = (tree(&["readme.md"]), tree(&["notes.txt"]));
        let scanner = MarkerScanner::default();
        let mut out = Vec::new();

        let paths = [a.path().to_path_buf(), b.path().to_path_buf()];
        let classifier = Classifier::new(MagicSniffer::new());
        let report = run(&paths, &config(tmp.path()), &classifier, &MockMounter::new(), &scanner, &mut out).unwrap();
        assert!(report.is_clean());
        assert_eq!(*scanner.scanned.borrow(), paths.to_vec());
        assert_eq!(String::from_utf8(out).unwrap(), "Scanned 2 director(ies): all clear\n");
        // Input directories are scanned in place, never removed.
        assert!(a.path().join("readme.md").is_file());
    }

    #[test]
    fn test_findings_are_printed() {
        let tmp = tempfile::tempdir().unwrap();
        let (a, b) = (tree(&["eicar.com"]), tree(&["fine.txt"]));
        let scanner = MarkerScanner::default();
        let mut out = Vec::new();
        let mut config = config(tmp.path());
        config.fail_fast = true;

        let paths = [a.path().to_path_buf(), b.path().to_path_buf()];
        let classifier = Classifier::new(MagicSniffer::new());
        let report = run(&paths, &config, &classifier, &MockMounter::new(), &scanner, &mut out).unwrap();
        assert_eq!(report.findings.len(), 1);
        assert_eq!(scanner.scanned.borrow().len(), 1);
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "!".repeat(80));
        assert_eq!(lines[1], format!("Found in {}:", a.path().display()));
        assert!(lines[2].ends_with("Eicar-Signature FOUND"));
        assert_eq!(lines[3], "!".repeat(80));
        assert_eq!(lines[4], "Scanned 1 director(ies): 1 finding(s)");
    }

    #[test]
    fn test_unhandled_input_stops_before_unpacking() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tree(&["fine.txt"]);
        let bad = good.path().join("fine.txt");
        let scanner = MarkerScanner::default();

        let paths = [good.path().to_path_buf(), bad];
        let classifier = Classifier::new(MagicSniffer::new());
        let err = run(&paths, &config(tmp.path()), &classifier, &MockMounter::new(), &scanner, &mut Vec::new()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Input(..)));
        assert!(scanner.scanned.borrow().is_empty());
    }

    #[test]
    fn test_unpack_failure_cleans_up_earlier_inputs() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tempfile::tempdir().unwrap();
        let disk = input.path().join("vm.vmdk");
        std::fs::write(&disk, b"KDMV\x01\x00\x00\x00").unwrap();
        let iso = input.path().join("cd.iso");
        let mut bytes = vec![0u8; 0x8001];
        bytes.extend_from_slice(b"CD001");
        std::fs::write(&iso, bytes).unwrap();
        let scanner = MarkerScanner::default();
        // The ISO mounts; the disk image has no partition listing and fails.
        let mounter = MockMounter::new();

        let paths = [iso, disk.clone()];
        let classifier = Classifier::new(MagicSniffer::new());
        let err = run(&paths, &config(tmp.path()), &classifier, &mounter, &scanner, &mut Vec::new()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unpack(p) if *p == disk));
        assert_eq!(mounter.unmounted(), mounter.mounted());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
        assert!(scanner.scanned.borrow().is_empty());
    }

    #[test]
    fn test_keep_leaves_unpacked_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tempfile::tempdir().unwrap();
        let iso = input.path().join("cd.iso");
        let mut bytes = vec![0u8; 0x8001];
        bytes.extend_from_slice(b"CD001");
        std::fs::write(&iso, bytes).unwrap();
        let scanner = MarkerScanner::default();
        let mounter = MockMounter::new();
        let mut config = config(tmp.path());
        config.keep = true;

        let classifier = Classifier::new(MagicSniffer::new());
        let report = run(&[iso], &config, &classifier, &mounter, &scanner, &mut Vec::new()).unwrap();
        assert!(report.is_clean());
        assert!(mounter.unmounted().is_empty());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }
}

use crate::cli::CleanupArgs;
use crate::error::{ErrorKind, Result};
use burrow_config::Config;
use burrow_unpack::{Mounter, SystemMounter, cleanup_associated};
use exn::ResultExt;
use std::path::Path;
use std::process::ExitCode;

pub(super) fn execute(args: CleanupArgs, config: Config) -> Result<ExitCode> {
    let tmp_dir = args.tmp_dir.unwrap_or(config.tmp_dir);
    let removed = run(&args.path, &tmp_dir, &SystemMounter::new())?;
    tracing::info!(removed, tmp_dir = %tmp_dir.display(), "Cleanup complete");
    Ok(ExitCode::SUCCESS)
}

fn run(path: &Path, tmp_dir: &Path, mounter: &dyn Mounter) -> Result<usize> {
    // Matched by file name only; the file itself may be long gone.
    cleanup_associated(path, tmp_dir, mounter).or_raise(|| ErrorKind::Cleanup)
}

use crate::cli::{Command, UnpackOptions};
use crate::error::{ErrorKind, Result};
use burrow_classify::{Classifier, FileCommandSniffer, FileMetadata, MagicSniffer};
use burrow_config::{Config, SnifferChoice};
use burrow_unpack::is_handled;
use exn::ResultExt;
use std::path::Path;
use std::process::ExitCode;

mod cleanup;
mod scan;
mod unpack;

/// Exit code for a scan that found something.
pub const EXIT_FINDINGS: u8 = 1;
/// Exit code for anything that stopped a command from completing.
pub const EXIT_ERROR: u8 = 2;

pub fn dispatch(command: Command, config: Config) -> Result<ExitCode> {
    match command {
        Command::Scan(args) => scan::execute(args, config),
        Command::Unpack(args) => unpack::execute(args, config),
        Command::Cleanup(args) => cleanup::execute(args, config),
    }
}

/// Layer command-line flags over the loaded configuration.
fn apply(config: &mut Config, options: &UnpackOptions) -> Result<()> {
    if let Some(min_size) = options.min_size {
        config.min_file_size = min_size;
    }
    if let Some(tmp_dir) = &options.tmp_dir {
        config.tmp_dir = tmp_dir.clone();
    }
    config.validate().or_raise(|| ErrorKind::Config)
}

fn classifier(choice: SnifferChoice) -> Result<Classifier> {
    Ok(match choice {
        SnifferChoice::Magic => Classifier::new(MagicSniffer::new()),
        SnifferChoice::File => Classifier::new(FileCommandSniffer::discover().or_raise(|| ErrorKind::Sniffer)?),
    })
}

/// Classify an operator-supplied input, refusing anything that can't be unpacked.
fn classify_input(classifier: &Classifier, path: &Path) -> Result<FileMetadata> {
    let meta = classifier.classify(path);
    tracing::info!(path = %path.display(), kind = %meta.kind, description = %meta.description, size = meta.size, "Classified input");
    if !is_handled(meta.kind) {
        exn::bail!(ErrorKind::Input(meta.path, meta.kind));
    }
    Ok(meta)
}

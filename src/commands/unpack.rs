use super::{apply, classifier, classify_input};
use crate::cli::UnpackArgs;
use crate::error::{ErrorKind, Result};
use burrow_classify::Classifier;
use burrow_config::Config;
use burrow_unpack::{Engine, Mounter, Registry, SystemMounter, Unpacked};
use exn::ResultExt;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

pub(super) fn execute(args: UnpackArgs, mut config: Config) -> Result<ExitCode> {
    apply(&mut config, &args.options)?;
    let classifier = classifier(config.sniffer)?;
    let unpacked = run(&args.path, !args.no_recursive, &config, &classifier, &SystemMounter::new())?;
    let mut out = std::io::stdout().lock();
    for destination in unpacked.destinations() {
        writeln!(out, "{}", destination.display()).or_raise(|| ErrorKind::Unpack(args.path.clone()))?;
    }
    tracing::info!("Unpacked directories are left in place; remove them with `burrow cleanup`");
    Ok(ExitCode::SUCCESS)
}

fn run(path: &Path, recursive: bool, config: &Config, classifier: &Classifier, mounter: &dyn Mounter) -> Result<Unpacked> {
    let meta = classify_input(classifier, path)?;
    let registry = Registry::new(mounter);
    let unpacked = if recursive {
        Engine::new(classifier, &registry).unpack_recursive(&meta, config.min_file_size, &config.tmp_dir)
    } else {
        registry.unpack(meta, &config.tmp_dir, None).map(|ctx| Unpacked { contexts: vec![ctx], ignored: Vec::new() })
    };
    unpacked.or_raise(|| ErrorKind::Unpack(path.to_path_buf()))
}

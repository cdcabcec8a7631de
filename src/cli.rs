use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "burrow", version)]
#[command(about = "Recursively unpack archives and disk images, then scan what's inside", long_about = None)]
#[command(after_help = "Examples:\n  \
  burrow scan backup.tar.gz             unpack everything inside and scan it\n  \
  burrow unpack --no-recursive vm.qcow2 mount a disk image's partitions\n  \
  burrow cleanup backup.tar.gz          remove leftovers from an interrupted run")]
pub struct Cli {
    /// Configuration file, layered over the defaults and the user configuration
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Unpack each file recursively and scan everything unpacked
    Scan(ScanArgs),
    /// Unpack a file and print where its contents ended up
    Unpack(UnpackArgs),
    /// Remove unpacked directories associated with a file
    Cleanup(CleanupArgs),
}

/// Options shared by every command that unpacks.
#[derive(Args, Debug, Default, Clone)]
pub struct UnpackOptions {
    /// Nested files smaller than this many bytes are not unpacked
    #[arg(long, value_name = "BYTES")]
    pub min_size: Option<u64>,

    /// Where to create unpacked directories
    #[arg(long, value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Stop at the first finding
    #[arg(long)]
    pub fail_fast: bool,

    /// Leave unpacked directories in place afterwards
    #[arg(long)]
    pub keep: bool,

    #[command(flatten)]
    pub options: UnpackOptions,
}

#[derive(Args, Debug)]
pub struct UnpackArgs {
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Only unpack the file itself, not what's inside it
    #[arg(long)]
    pub no_recursive: bool,

    #[command(flatten)]
    pub options: UnpackOptions,
}

#[derive(Args, Debug)]
pub struct CleanupArgs {
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Where unpacked directories were created
    #[arg(long, value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,
}

impl Cli {
    /// Log filter used when `RUST_LOG` isn't set.
    pub fn default_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

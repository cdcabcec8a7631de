//! burrow: recursively unpack archives and disk images, then scan the
//! contents with ClamAV.
//!
//! Exit codes: `0` success (and, for `scan`, nothing found), `1` the scanner
//! found something, `2` the command could not complete.

mod cli;
mod commands;
mod error;

use crate::cli::Cli;
use crate::error::ErrorKind;
use burrow_config::Config;
use clap::Parser;
use exn::ResultExt;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.default_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let result = Config::load(cli.config.as_deref())
        .or_raise(|| ErrorKind::Config)
        .and_then(|config| commands::dispatch(cli.command, config));
    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:?}");
            ExitCode::from(commands::EXIT_ERROR)
        },
    }
}

//! Layered configuration for burrow.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults ([`Config::default`]).
//! 2. `config.toml` in the platform configuration directory.
//! 3. A file given explicitly (the `--config` flag).
//! 4. Environment variables prefixed with `BURROW_`. Nested keys are separated
//!    by a double underscore, e.g. `BURROW_SCANNER__PROGRAM=clamscan`.
//!
//! Command-line flags are applied on top by the binary.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "BURROW_";
const CONFIG_FILE_NAME: &str = "config.toml";

/// One mebibyte; files smaller than this aren't worth unpacking by default.
pub const DEFAULT_MIN_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where unpack destinations are created.
    pub tmp_dir: PathBuf,
    /// Nested files smaller than this (in bytes) are not unpacked.
    pub min_file_size: u64,
    /// Stop scanning at the first finding.
    pub fail_fast: bool,
    /// Leave unpacked trees in place after scanning.
    pub keep: bool,
    pub sniffer: SnifferChoice,
    pub scanner: ScannerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmp_dir: std::env::temp_dir(),
            min_file_size: DEFAULT_MIN_FILE_SIZE,
            fail_fast: false,
            keep: false,
            sniffer: SnifferChoice::default(),
            scanner: ScannerConfig::default(),
        }
    }
}

/// How file contents are identified.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnifferChoice {
    /// Built-in magic byte detection.
    #[default]
    Magic,
    /// The system's `file(1)` command.
    File,
}

/// The external scanner command line: `<program> <args>... <path>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            program: "clamdscan".to_string(),
            args: vec!["-m".to_string(), "--stdout".to_string()],
        }
    }
}

impl Config {
    /// Load from every source, including `explicit` if given.
    ///
    /// Not validated: command-line flags still go on top, so call
    /// [`validate`](Self::validate) once they have been applied.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit
            && !path.is_file()
        {
            exn::bail!(ErrorKind::Missing(path.to_path_buf()));
        }
        let config: Self = Self::figment(explicit).extract().or_raise(|| ErrorKind::Load)?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Every configuration source, merged but not yet extracted.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        Self::layered(Self::user_config_path().as_deref(), explicit)
    }

    /// `config.toml` in the platform configuration directory, if there is one.
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "burrow").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn layered(user: Option<&Path>, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        for path in [user, explicit].into_iter().flatten() {
            tracing::trace!(path = %path.display(), "Adding configuration file");
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.tmp_dir.is_dir() {
            exn::bail!(ErrorKind::Invalid {
                field: "tmp_dir",
                reason: format!("{} is not an existing directory", self.tmp_dir.display()),
            });
        }
        if self.scanner.program.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid {
                field: "scanner.program",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

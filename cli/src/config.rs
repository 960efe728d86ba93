//! Settings file: optional YAML defaults merged under the command line.
//!
//! ```yaml
//! workers: 8
//! only_errors: true
//! not_drawable: false
//! report: parrun-report.json
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use parrun_tui::Options;

use crate::args::Flags;

/// Environment variable naming a settings file.
pub const CONFIG_ENV: &str = "PARRUN_CONFIG";

/// Settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "parrun.yaml";

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid settings in {path}: workers must be at least 1")]
    ZeroWorkers { path: PathBuf },
}

/// Contents of a settings file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub workers: Option<usize>,
    pub verbose: bool,
    pub only_errors: bool,
    pub compact: bool,
    pub tty: bool,
    pub not_drawable: bool,
    pub no_header: bool,
    pub report: Option<PathBuf>,
}

/// Everything a run needs, after merging settings and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub workers: usize,
    pub options: Options,
    pub input: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

/// Pick the settings file: explicit path, then `$PARRUN_CONFIG`, then
/// `./parrun.yaml` if it exists.
pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    let local = Path::new(DEFAULT_CONFIG_FILE);
    if local.exists() {
        Some(local.to_path_buf())
    } else {
        None
    }
}

/// Load and validate a settings file.
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = parse(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if settings.workers == Some(0) {
        return Err(ConfigError::ZeroWorkers {
            path: path.to_path_buf(),
        });
    }
    tracing::debug!(path = %path.display(), "loaded settings");
    Ok(settings)
}

/// Parse settings from YAML text. An empty document yields the defaults.
pub fn parse(content: &str) -> Result<Settings, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content)
}

impl Settings {
    /// Combine with command-line flags; flags win.
    pub fn merge(&self, flags: &Flags) -> RunConfig {
        let verbose = flags.verbose || self.verbose;
        let only_errors = flags.only_errors || self.only_errors;
        let options = Options {
            only_errors,
            no_verbose: !verbose && !only_errors,
            compact: flags.compact || self.compact,
            force_tty: flags.tty || self.tty,
            not_drawable: flags.not_drawable || self.not_drawable,
            no_header: flags.no_header || self.no_header,
            ..Options::default()
        };
        RunConfig {
            workers: flags.workers.or(self.workers).unwrap_or(DEFAULT_WORKERS),
            options,
            input: flags.input.clone(),
            report: flags.report.clone().or_else(|| self.report.clone()),
        }
    }
}

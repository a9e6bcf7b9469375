//! Build environment detection, independent of the configuration itself.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Process variable read by [`ProcessEnvironment`].
pub const ENV_VERSION_VAR: &str = "APP_ENV_VERSION";

/// Which build of the client is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvVersion {
    Develop,
    Trial,
    Release,
}

impl EnvVersion {
    /// `develop`, `trial` or `release` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "develop" => Some(EnvVersion::Develop),
            "trial" => Some(EnvVersion::Trial),
            "release" => Some(EnvVersion::Release),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvVersion::Develop => "develop",
            EnvVersion::Trial => "trial",
            EnvVersion::Release => "release",
        }
    }
}

impl fmt::Display for EnvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tells the resolver which default table applies.
pub trait EnvironmentDetector: Send + Sync {
    fn env_version(&self) -> EnvVersion;

    /// Only the `develop` build counts as development.
    fn is_dev(&self) -> bool {
        self.env_version() == EnvVersion::Develop
    }
}

/// Detector with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticEnvironment(pub EnvVersion);

impl EnvironmentDetector for StaticEnvironment {
    fn env_version(&self) -> EnvVersion {
        self.0
    }
}

/// Detector reading a process variable; unset or unknown values mean `release`.
#[derive(Debug, Clone)]
pub struct ProcessEnvironment {
    var: String,
}

impl ProcessEnvironment {
    pub fn new() -> Self {
        Self::from_var(ENV_VERSION_VAR)
    }

    pub fn from_var(var: impl Into<String>) -> Self {
        ProcessEnvironment { var: var.into() }
    }
}

impl Default for ProcessEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentDetector for ProcessEnvironment {
    fn env_version(&self) -> EnvVersion {
        std::env::var(&self.var)
            .ok()
            .and_then(|v| EnvVersion::parse(&v))
            .unwrap_or(EnvVersion::Release)
    }
}

/// Load the nearest `.env` (working directory or a parent) into the process environment,
/// so [`ProcessEnvironment`] and `RUST_LOG` can be set from it. Variables already set are
/// kept. Returns the file that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!("✓ Loaded process environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!("Could not load .env into the process environment: {}", e);
            None
        }
    }
}

/// [`load_dotenv`] for an explicit file.
///
/// # Errors
/// Returns `Error::ConfigError` if the file is missing or malformed.
pub fn load_dotenv_file(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    dotenvy::from_path(path).map_err(|e| {
        Error::ConfigError(format!("cannot load {}: {}", path.display(), e))
    })?;
    debug!("✓ Loaded process environment from {}", path.display());
    Ok(())
}

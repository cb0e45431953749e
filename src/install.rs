//! Browser engine setup
//!
//! Locating the Chrome/Chromium binary is an explicit step the host runs
//! once at startup. A [`crate::Renderer`] can only be built from the
//! resulting [`EngineInstallation`], so a missing browser is reported before
//! the first render rather than in the middle of one.

use crate::{Error, RenderConfig, Result};
use std::path::{Path, PathBuf};

/// Executable names probed on `PATH`, in order.
pub const EXECUTABLE_NAMES: [&str; 5] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// How the executable was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallSource {
    /// `RenderConfig::chrome_path`
    Configured,
    /// The `CHROME` environment variable
    Environment,
    /// A well-known name on `PATH`
    SearchPath,
    /// headless_chrome's platform defaults
    PlatformDefault,
}

/// A located browser binary. Cheap to clone and share between renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInstallation {
    executable: PathBuf,
    source: InstallSource,
}

impl EngineInstallation {
    /// Locate the browser. Repeated calls with the same configuration and
    /// environment return the same installation and have no side effects.
    pub fn ensure(config: &RenderConfig) -> Result<Self> {
        let env_path = std::env::var_os("CHROME").map(PathBuf::from);
        let installation = Self::locate(config.chrome_path.as_deref(), env_path.as_deref())?;
        log::info!(
            "Using browser engine {} ({:?})",
            installation.executable.display(),
            installation.source
        );
        Ok(installation)
    }

    fn locate(configured: Option<&Path>, from_env: Option<&Path>) -> Result<Self> {
        if let Some(path) = configured {
            // An explicit path never falls back to discovery.
            return Self::verified(path, InstallSource::Configured);
        }

        if let Some(path) = from_env {
            match Self::verified(path, InstallSource::Environment) {
                Ok(found) => return Ok(found),
                Err(e) => log::warn!("Ignoring CHROME: {}", e),
            }
        }

        for name in EXECUTABLE_NAMES {
            if let Ok(path) = which::which(name) {
                return Ok(Self {
                    executable: path,
                    source: InstallSource::SearchPath,
                });
            }
        }
        log::debug!("No Chrome executable found on PATH");

        Self::platform_default()
    }

    fn verified(path: &Path, source: InstallSource) -> Result<Self> {
        if path.is_file() {
            Ok(Self {
                executable: path.to_path_buf(),
                source,
            })
        } else {
            Err(Error::EngineNotInstalled(format!("{} does not exist", path.display())))
        }
    }

    #[cfg(feature = "cdp")]
    fn platform_default() -> Result<Self> {
        headless_chrome::browser::default_executable()
            .map(|executable| Self {
                executable,
                source: InstallSource::PlatformDefault,
            })
            .map_err(Error::EngineNotInstalled)
    }

    #[cfg(not(feature = "cdp"))]
    fn platform_default() -> Result<Self> {
        Err(Error::EngineNotInstalled(
            "chrome/chromium not detected on your system".into(),
        ))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn source(&self) -> InstallSource {
        self.source
    }
}

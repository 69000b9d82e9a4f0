//! Repository location and layout
//!
//! The library always takes an explicit [`Config`]. Resolving one from the
//! environment is a convenience for the binary.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default repository directory, relative to the working directory
pub const DEFAULT_REPO_DIR: &str = ".versions";

/// Environment variable overriding the repository location
pub const REPO_ENV: &str = "VERSIONS_REPO";

/// Where a repository lives on disk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
}

/// Contents of the user settings file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Repository used when neither flag nor environment names one
    pub repository: Option<PathBuf>,
}

impl Config {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Config { root: root.into() }
    }

    /// Directory holding one file per blob
    pub fn blobs_dir(&self) -> PathBuf {
        self.root.join("blobs")
    }

    /// The version log file
    pub fn log_path(&self) -> PathBuf {
        self.root.join("versions.db")
    }

    /// The advisory lock file
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("lock")
    }

    /// Resolve the repository for the current process
    ///
    /// Order: explicit path, `VERSIONS_REPO`, the user settings file
    /// (~/.config/versions/config.json), then `.versions`.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        Self::resolve_with(
            explicit,
            std::env::var_os(REPO_ENV),
            settings_path().as_deref(),
        )
    }

    /// Resolution with every input supplied by the caller
    pub fn resolve_with(
        explicit: Option<PathBuf>,
        env: Option<OsString>,
        settings: Option<&Path>,
    ) -> Result<Self> {
        if let Some(root) = explicit {
            return Ok(Config::new(root));
        }
        if let Some(root) = env.filter(|v| !v.is_empty()) {
            return Ok(Config::new(root));
        }
        if let Some(path) = settings {
            if let Some(root) = Settings::load(path)?.repository {
                return Ok(Config::new(root));
            }
        }
        Ok(Config::default())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_REPO_DIR)
    }
}

impl Settings {
    /// Load settings, treating a missing file as empty
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

/// Default settings file location (~/.config/versions/config.json)
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("versions").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout() {
        let config = Config::new("/repo");
        assert_eq!(config.blobs_dir(), Path::new("/repo/blobs"));
        assert_eq!(config.log_path(), Path::new("/repo/versions.db"));
        assert_eq!(config.lock_path(), Path::new("/repo/lock"));
    }

    #[test]
    fn test_explicit_wins() {
        let config = Config::resolve_with(
            Some("/flag".into()),
            Some(OsString::from("/env")),
            None,
        )
        .unwrap();
        assert_eq!(config.root, Path::new("/flag"));
    }

    #[test]
    fn test_env_before_settings() {
        let dir = tempdir().unwrap();
        let settings = dir.path().join("config.json");
        std::fs::write(&settings, r#"{"repository": "/from-settings"}"#).unwrap();

        let config =
            Config::resolve_with(None, Some(OsString::from("/env")), Some(settings.as_path())).unwrap();
        assert_eq!(config.root, Path::new("/env"));

        let config = Config::resolve_with(None, None, Some(settings.as_path())).unwrap();
        assert_eq!(config.root, Path::new("/from-settings"));
    }

    #[test]
    fn test_fallback_to_default() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("config.json");

        let config =
            Config::resolve_with(None, Some(OsString::new()), Some(missing.as_path())).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.root, Path::new(DEFAULT_REPO_DIR));
    }

    #[test]
    fn test_malformed_settings() {
        let dir = tempdir().unwrap();
        let settings = dir.path().join("config.json");
        std::fs::write(&settings, "not json").unwrap();

        let err = Config::resolve_with(None, None, Some(settings.as_path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

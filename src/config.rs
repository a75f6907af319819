//! Linter configuration discovery and adapter settings.
//!
//! Two different files live here:
//! - the linter's own configuration file (opaque to us, only located), and
//! - the optional `lintbridge.yaml` settings file that tunes this adapter.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default name of the linter configuration file.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "swiftlint.yml";

/// Default linter executable, looked up on `PATH`.
pub const DEFAULT_TOOL: &str = "swiftlint";

/// Default extension of source files collected for a target.
pub const DEFAULT_SOURCE_EXTENSION: &str = "swift";

/// Settings file names searched in the project directory.
const DEFAULT_SETTINGS_NAMES: &[&str] = &["lintbridge.yaml", ".lintbridge.yaml"];

/// Errors from loading adapter settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("reading settings {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing settings {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid exclusion pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Find the first existing `<dir>/<file_name>` in priority order.
///
/// Returns `None` when no candidate exists; callers run the linter without
/// an explicit configuration in that case.
pub fn resolve<P: AsRef<Path>>(candidates: &[P], file_name: &str) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|dir| dir.as_ref().join(file_name))
        .find(|path| path.is_file())
}

/// How target files are handed to the linter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileList {
    /// Paths as positional arguments.
    #[default]
    Positional,
    /// `--use-script-input-files` plus `SCRIPT_INPUT_FILE_*` variables.
    Environment,
}

/// Adapter settings, read from `lintbridge.yaml`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Linter executable (default: `swiftlint` on `PATH`)
    #[serde(default)]
    pub tool: Option<PathBuf>,
    /// Name of the linter configuration file probed per directory
    #[serde(default)]
    pub config_file_name: Option<String>,
    /// Extension of source files to lint, without the dot
    #[serde(default)]
    pub source_extension: Option<String>,
    /// File passing strategy for the lint and fix commands
    #[serde(default)]
    pub file_list: Option<FileList>,
    /// Glob patterns for paths skipped during source discovery
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Scratch directory handed to the linter as its cache
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Settings {
    /// Parse settings from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings from the project directory, or defaults if none exist.
    pub fn discover(project_dir: &Path) -> Result<Self, SettingsError> {
        match find_settings_file(project_dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading settings");
                Self::parse_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn tool(&self) -> PathBuf {
        self.tool
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL))
    }

    pub fn config_file_name(&self) -> &str {
        self.config_file_name
            .as_deref()
            .unwrap_or(DEFAULT_CONFIG_FILE_NAME)
    }

    pub fn source_extension(&self) -> &str {
        self.source_extension
            .as_deref()
            .unwrap_or(DEFAULT_SOURCE_EXTENSION)
            .trim_start_matches('.')
    }

    pub fn file_list(&self) -> FileList {
        self.file_list.unwrap_or_default()
    }

    /// Compile `excluded_paths` into a single matcher.
    pub fn exclusions(&self) -> Result<globset::GlobSet, SettingsError> {
        let mut builder = globset::GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = globset::Glob::new(pattern).map_err(|source| SettingsError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| SettingsError::Pattern {
            pattern: self.excluded_paths.join(", "),
            source,
        })
    }

    /// Cache directory: the configured one, else the platform cache dir.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone().or_else(|| {
            directories::ProjectDirs::from("", "", "lintbridge")
                .map(|dirs| dirs.cache_dir().to_path_buf())
        })
    }
}

fn find_settings_file(project_dir: &Path) -> Option<PathBuf> {
    DEFAULT_SETTINGS_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file())
}

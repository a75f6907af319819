//! Target enumeration for the two supported project layouts.
//!
//! The runner only sees the [`ProjectHost`] and [`TargetDescriptor`] traits:
//! - `PackageHost`: a package with a manifest and `Sources/`/`Tests/` targets
//! - `WorkspaceHost`: an IDE-style project where each top-level directory is a target

mod package;
mod sources;
mod workspace;

pub use package::{PackageHost, MANIFEST_FILE_NAME};
pub use sources::SourceFilter;
pub use workspace::WorkspaceHost;

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Source discovery failed for one target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("discovering sources in {}: {message}", .directory.display())]
pub struct DiscoveryError {
    pub directory: PathBuf,
    pub message: String,
}

/// A named unit of source code linted in one invocation.
pub trait TargetDescriptor {
    fn name(&self) -> &str;
    fn directory(&self) -> &Path;
    fn source_files(&self) -> Result<&[PathBuf], &DiscoveryError>;
}

/// Target enumerated by one of the hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub directory: PathBuf,
    pub sources: Result<Vec<PathBuf>, DiscoveryError>,
}

impl Target {
    /// Collect the sources of `directory`. A failure is kept on the target
    /// so the other targets are still enumerated.
    pub fn discover(directory: PathBuf, filter: &SourceFilter) -> Self {
        let sources = filter.collect(&directory).map_err(|e| DiscoveryError {
            directory: directory.clone(),
            message: format!("{:#}", e),
        });
        Self {
            name: directory_name(&directory),
            directory,
            sources,
        }
    }
}

impl TargetDescriptor for Target {
    fn name(&self) -> &str {
        &self.name
    }

    fn directory(&self) -> &Path {
        &self.directory
    }

    fn source_files(&self) -> Result<&[PathBuf], &DiscoveryError> {
        self.sources.as_deref()
    }
}

/// The project the linter runs over.
pub trait ProjectHost {
    fn display_name(&self) -> &str;

    fn directory(&self) -> &Path;

    /// Top-level manifest linted as its own pseudo-target, if the layout has one.
    fn manifest(&self) -> Option<PathBuf>;

    /// Targets in enumeration order. Re-read from disk on every call.
    fn targets(&self) -> anyhow::Result<Vec<Target>>;

    /// Directories probed for a linter configuration, most specific first.
    fn config_candidates(&self, target: &dyn TargetDescriptor) -> Vec<PathBuf> {
        vec![
            target.directory().to_path_buf(),
            self.directory().to_path_buf(),
        ]
    }
}

/// Name of the last path component, for display.
fn directory_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Non-hidden sub-directories of `dir`, sorted by name.
fn child_directories(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

//! Source file discovery inside a target directory.

use globset::GlobSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{Settings, SettingsError};

/// Which files under a target count as its sources.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    root: PathBuf,
    extension: String,
    exclusions: GlobSet,
}

impl SourceFilter {
    /// Match files with `extension`, never excluding anything.
    pub fn new<P: AsRef<Path>>(root: P, extension: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
            exclusions: GlobSet::empty(),
        }
    }

    /// Build from adapter settings; exclusions are matched against paths
    /// relative to `root`.
    pub fn from_settings<P: AsRef<Path>>(root: P, settings: &Settings) -> Result<Self, SettingsError> {
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            extension: settings.source_extension().to_string(),
            exclusions: settings.exclusions()?,
        })
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.exclusions.is_match(relative)
    }

    /// Recursively collect matching files under `dir`, sorted by path.
    /// Hidden directories are skipped.
    pub fn collect(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
                !(e.file_type().is_dir() && hidden) && !self.is_excluded(e.path())
            })
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext == self.extension {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }
}

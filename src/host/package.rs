//! Package layout: `Package.swift` at the root, targets under `Sources/` and `Tests/`.

use std::path::{Path, PathBuf};

use super::{child_directories, directory_name, ProjectHost, SourceFilter, Target};

/// Manifest file linted as the package pseudo-target.
pub const MANIFEST_FILE_NAME: &str = "Package.swift";

/// Directories whose children are targets, in enumeration order.
const TARGET_ROOTS: &[&str] = &["Sources", "Tests"];

pub struct PackageHost {
    name: String,
    directory: PathBuf,
    filter: SourceFilter,
}

impl PackageHost {
    pub fn new<P: AsRef<Path>>(directory: P, filter: SourceFilter) -> Self {
        let directory = directory.as_ref().to_path_buf();
        Self {
            name: directory_name(&directory),
            directory,
            filter,
        }
    }
}

impl ProjectHost for PackageHost {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn directory(&self) -> &Path {
        &self.directory
    }

    fn manifest(&self) -> Option<PathBuf> {
        let path = self.directory.join(MANIFEST_FILE_NAME);
        path.is_file().then_some(path)
    }

    fn targets(&self) -> anyhow::Result<Vec<Target>> {
        let mut targets = Vec::new();
        for root in TARGET_ROOTS {
            let root = self.directory.join(root);
            if !root.is_dir() {
                continue;
            }
            for dir in child_directories(&root)? {
                targets.push(Target::discover(dir, &self.filter));
            }
        }
        Ok(targets)
    }
}

//! IDE project layout: every top-level directory is a target, configuration
//! lives only at the project root.

use std::path::{Path, PathBuf};

use super::{
    child_directories, directory_name, ProjectHost, SourceFilter, Target, TargetDescriptor,
};

pub struct WorkspaceHost {
    name: String,
    directory: PathBuf,
    filter: SourceFilter,
}

impl WorkspaceHost {
    pub fn new<P: AsRef<Path>>(directory: P, filter: SourceFilter) -> Self {
        let directory = directory.as_ref().to_path_buf();
        Self {
            name: directory_name(&directory),
            directory,
            filter,
        }
    }
}

impl ProjectHost for WorkspaceHost {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn directory(&self) -> &Path {
        &self.directory
    }

    fn manifest(&self) -> Option<PathBuf> {
        None
    }

    fn targets(&self) -> anyhow::Result<Vec<Target>> {
        Ok(child_directories(&self.directory)?
            .into_iter()
            .map(|dir| Target::discover(dir, &self.filter))
            .collect())
    }

    fn config_candidates(&self, _target: &dyn TargetDescriptor) -> Vec<PathBuf> {
        vec![self.directory.clone()]
    }
}

//! Argument vector and environment assembly for one linter invocation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::FileList;

pub const CONFIG_FLAG: &str = "--config";
pub const CACHE_PATH_FLAG: &str = "--cache-path";
pub const FIX_FLAG: &str = "--fix";
pub const SCRIPT_INPUT_FILES_FLAG: &str = "--use-script-input-files";

pub const FILE_COUNT_VAR: &str = "SCRIPT_INPUT_FILE_COUNT";
pub const FILE_VAR_PREFIX: &str = "SCRIPT_INPUT_FILE_";
pub const TARGET_NAME_VAR: &str = "TARGET_NAME";

/// Command used when the caller forwards no arguments of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultCommand {
    Lint,
    Fix,
}

impl DefaultCommand {
    /// The default argument vector, with the cache pointed at `cache_path`.
    pub fn arguments(&self, cache_path: &Path) -> Vec<String> {
        let verb = match self {
            DefaultCommand::Lint => "lint",
            DefaultCommand::Fix => FIX_FLAG,
        };
        vec![
            verb.to_string(),
            CACHE_PATH_FLAG.to_string(),
            cache_path.display().to_string(),
        ]
    }
}

/// Builds the final argument vector and environment for a target.
///
/// Pure: the same inputs always yield the same output, and flags the caller
/// already supplied are never repeated.
#[derive(Debug, Clone)]
pub struct ArgumentBuilder {
    base: Vec<String>,
    file_list: FileList,
}

/// Arguments and environment produced by [`ArgumentBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArguments {
    pub arguments: Vec<String>,
    pub environment: BTreeMap<String, String>,
}

impl ArgumentBuilder {
    /// Start from the user's raw arguments, substituting `default` with the
    /// given cache path when there are none.
    pub fn new(raw: &[String], default: DefaultCommand, cache_path: &Path) -> Self {
        let base = if raw.is_empty() {
            default.arguments(cache_path)
        } else {
            raw.to_vec()
        };
        Self {
            base,
            file_list: FileList::Positional,
        }
    }

    /// Select how target files are passed.
    pub fn file_list(mut self, file_list: FileList) -> Self {
        self.file_list = file_list;
        self
    }

    /// The effective strategy. Raw arguments that already ask for
    /// `--use-script-input-files` force the environment strategy.
    pub fn strategy(&self) -> FileList {
        if self.base.iter().any(|a| a == SCRIPT_INPUT_FILES_FLAG) {
            FileList::Environment
        } else {
            self.file_list
        }
    }

    pub fn base(&self) -> &[String] {
        &self.base
    }

    pub fn build(&self, configuration: Option<&Path>, targets: &[PathBuf]) -> BuiltArguments {
        let mut arguments = self.base.clone();
        let mut environment = BTreeMap::new();

        if let Some(config) = configuration {
            if !arguments.iter().any(|a| a == CONFIG_FLAG) {
                arguments.push(CONFIG_FLAG.to_string());
                arguments.push(config.display().to_string());
            }
        }

        match self.strategy() {
            FileList::Positional => {
                arguments.extend(targets.iter().map(|p| p.display().to_string()));
            }
            FileList::Environment => {
                if !arguments.iter().any(|a| a == SCRIPT_INPUT_FILES_FLAG) {
                    arguments.push(SCRIPT_INPUT_FILES_FLAG.to_string());
                }
                environment.extend(file_list_environment(targets));
            }
        }

        BuiltArguments {
            arguments,
            environment,
        }
    }
}

/// `SCRIPT_INPUT_FILE_COUNT` plus one `SCRIPT_INPUT_FILE_<i>` per file.
pub fn file_list_environment(files: &[PathBuf]) -> BTreeMap<String, String> {
    let mut environment = BTreeMap::new();
    environment.insert(FILE_COUNT_VAR.to_string(), files.len().to_string());
    for (index, file) in files.iter().enumerate() {
        environment.insert(
            format!("{}{}", FILE_VAR_PREFIX, index),
            file.display().to_string(),
        );
    }
    environment
}

/// A fully resolved request to run the linter once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub environment: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(executable: impl Into<PathBuf>, built: BuiltArguments) -> Self {
        Self {
            executable: executable.into(),
            arguments: built.arguments,
            environment: built.environment,
        }
    }

    /// Tag the invocation with the target it runs for.
    pub fn for_target(mut self, name: &str) -> Self {
        self.environment
            .insert(TARGET_NAME_VAR.to_string(), name.to_string());
        self
    }

    /// Human-readable command line, for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.executable.display().to_string();
        for arg in &self.arguments {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

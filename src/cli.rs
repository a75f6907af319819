//! Command-line interface for lintbridge.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::{FileList, Settings};
use crate::host::{PackageHost, ProjectHost, SourceFilter, WorkspaceHost, MANIFEST_FILE_NAME};
use crate::process::SystemExecutor;
use crate::report::{DiagnosticSink, JsonSink, PrettySink};
use crate::runner::{Mode, RunOptions, RunSummary, Runner};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Run a prebuilt linter over package targets and report its findings.
///
/// Locates each target's linter configuration, assembles the argument list,
/// runs the linter once per target and turns its output into diagnostics.
#[derive(Parser)]
#[command(name = "lintbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint targets and report diagnostics
    Lint(RunArgs),
    /// Let the linter correct violations in place
    Fix(RunArgs),
    /// Run as a build step, passing files through the environment
    Build(RunArgs),
}

impl Commands {
    pub fn mode(&self) -> Mode {
        match self {
            Commands::Lint(_) => Mode::Lint,
            Commands::Fix(_) => Mode::Fix,
            Commands::Build(_) => Mode::Build,
        }
    }

    pub fn args(&self) -> &RunArgs {
        match self {
            Commands::Lint(args) | Commands::Fix(args) | Commands::Build(args) => args,
        }
    }
}

/// Project layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HostKind {
    /// Package manifest with Sources/ and Tests/ targets
    Package,
    /// Every top-level directory is a target
    Workspace,
}

/// Arguments shared by all commands.
#[derive(Args)]
pub struct RunArgs {
    /// Project directory
    #[arg(short = 'C', long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Project layout (default: package if a manifest exists, else workspace)
    #[arg(long, value_enum)]
    pub host: Option<HostKind>,

    /// Only run these targets (repeatable; default: all)
    #[arg(short, long = "target", value_name = "NAME")]
    pub targets: Vec<String>,

    /// Linter executable (default: from settings, else `swiftlint`)
    #[arg(long)]
    pub tool: Option<PathBuf>,

    /// Path to settings YAML file (default: auto-discover)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Cache directory handed to the linter
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Name of the linter configuration file probed per directory
    #[arg(long)]
    pub config_name: Option<String>,

    /// Pass files through SCRIPT_INPUT_FILE_* variables instead of arguments
    #[arg(long)]
    pub use_env_file_list: bool,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Arguments forwarded verbatim to the linter
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "TOOL_ARGS")]
    pub tool_args: Vec<String>,
}

/// Choose the layout when `--host` is not given.
fn detect_host(project_dir: &Path) -> HostKind {
    if project_dir.join(MANIFEST_FILE_NAME).is_file() {
        HostKind::Package
    } else {
        HostKind::Workspace
    }
}

/// Cache directory: flag, settings, platform cache dir, then the temp dir.
fn cache_dir(args: &RunArgs, settings: &Settings) -> PathBuf {
    args.cache_dir
        .clone()
        .or_else(|| settings.cache_dir())
        .unwrap_or_else(|| std::env::temp_dir().join("lintbridge"))
}

/// Run one of the commands.
pub fn run(mode: Mode, args: &RunArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    // Resolve project directory
    let project_dir = match args.project_dir.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!(
                "Error: cannot access project directory {:?}: {}",
                args.project_dir, e
            );
            return Ok(EXIT_ERROR);
        }
    };

    // Load settings
    let settings = match &args.settings {
        Some(path) => Settings::parse_file(path),
        None => Settings::discover(&project_dir),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let filter = match SourceFilter::from_settings(&project_dir, &settings) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let host: Box<dyn ProjectHost> = match args.host.unwrap_or_else(|| detect_host(&project_dir)) {
        HostKind::Package => Box::new(PackageHost::new(&project_dir, filter)),
        HostKind::Workspace => Box::new(WorkspaceHost::new(&project_dir, filter)),
    };

    let cache_path = cache_dir(args, &settings);
    std::fs::create_dir_all(&cache_path)
        .with_context(|| format!("creating cache directory {}", cache_path.display()))?;

    let file_list = if args.use_env_file_list {
        FileList::Environment
    } else {
        settings.file_list()
    };

    let options = RunOptions {
        mode,
        tool: args.tool.clone().unwrap_or_else(|| settings.tool()),
        cache_path,
        config_file_name: args
            .config_name
            .clone()
            .unwrap_or_else(|| settings.config_file_name().to_string()),
        file_list,
        arguments: args.tool_args.clone(),
        targets: args.targets.clone(),
    };
    tracing::debug!(?options, "resolved options");

    let mut sink: Box<dyn DiagnosticSink> = match args.format.as_str() {
        "json" => Box::new(JsonSink::stdout()),
        _ => Box::new(PrettySink::stdout()),
    };

    let executor = SystemExecutor;
    let summary = match Runner::new(&executor, options).run(host.as_ref(), sink.as_mut()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    Ok(exit_code(&summary))
}

/// Launch failures mean a broken setup; reported errors mean a failed lint.
pub fn exit_code(summary: &RunSummary) -> i32 {
    if !summary.failures.is_empty() {
        EXIT_ERROR
    } else if summary.failed() {
        EXIT_FAILED
    } else {
        EXIT_SUCCESS
    }
}

//! Runs the linter over the selected targets of a project.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::args::{ArgumentBuilder, DefaultCommand, Invocation};
use crate::config::{self, FileList};
use crate::diagnostics::{self, Diagnostic, Severity};
use crate::host::{ProjectHost, TargetDescriptor};
use crate::process::{InvokeError, OutputMode, ToolExecutor};
use crate::report::DiagnosticSink;

/// Which variant of the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Capture and parse the linter output into diagnostics.
    Lint,
    /// Let the linter rewrite files; output goes straight to the terminal.
    Fix,
    /// Build-system step: file list through the environment, output streamed.
    Build,
}

impl Mode {
    fn default_command(&self) -> DefaultCommand {
        match self {
            Mode::Lint | Mode::Build => DefaultCommand::Lint,
            Mode::Fix => DefaultCommand::Fix,
        }
    }

    fn output_mode(&self) -> OutputMode {
        match self {
            Mode::Lint => OutputMode::Capture,
            Mode::Fix | Mode::Build => OutputMode::Stream,
        }
    }
}

/// Everything a run needs apart from the project and the sink.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: Mode,
    pub tool: PathBuf,
    pub cache_path: PathBuf,
    pub config_file_name: String,
    pub file_list: FileList,
    /// Arguments forwarded verbatim to the linter.
    pub arguments: Vec<String>,
    /// Target names to run; empty means all.
    pub targets: Vec<String>,
}

/// A target that could not be linted: discovery or launch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub target: String,
    pub message: String,
}

/// Counts collected over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub invocations: usize,
    pub errors: usize,
    pub warnings: usize,
    pub remarks: usize,
    /// Targets skipped because they have no source files
    pub skipped: Vec<String>,
    pub failures: Vec<TargetFailure>,
}

impl RunSummary {
    fn record(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Remark => self.remarks += 1,
        }
    }

    /// True if the linter reported errors or could not run.
    pub fn failed(&self) -> bool {
        self.errors > 0 || !self.failures.is_empty()
    }
}

/// Orchestrates resolve config, build arguments, invoke, report for each
/// target, one after another.
pub struct Runner<'a, E: ToolExecutor> {
    executor: &'a E,
    options: RunOptions,
    builder: ArgumentBuilder,
}

impl<'a, E: ToolExecutor> Runner<'a, E> {
    pub fn new(executor: &'a E, options: RunOptions) -> Self {
        let file_list = match options.mode {
            Mode::Build => FileList::Environment,
            Mode::Lint | Mode::Fix => options.file_list,
        };
        let builder = ArgumentBuilder::new(
            &options.arguments,
            options.mode.default_command(),
            &options.cache_path,
        )
        .file_list(file_list);

        Self {
            executor,
            options,
            builder,
        }
    }

    /// Run the manifest pseudo-target, then every selected target.
    ///
    /// A target whose sources cannot be discovered or whose linter cannot
    /// be launched is recorded in the summary and the remaining targets
    /// still run. Unknown target names are logged and ignored. Only a
    /// failing sink is returned as an error.
    pub fn run(
        &self,
        host: &dyn ProjectHost,
        sink: &mut dyn DiagnosticSink,
    ) -> anyhow::Result<RunSummary> {
        let mut summary = RunSummary::default();

        tracing::info!(
            project = host.display_name(),
            mode = ?self.options.mode,
            "starting run"
        );

        let manifest = host.manifest();
        if self.options.mode != Mode::Build {
            if let Some(manifest) = &manifest {
                let label = host.display_name().to_string();
                let config = self.resolve_config(&[host.directory()]);
                let built = self
                    .builder
                    .build(config.as_deref(), std::slice::from_ref(manifest));
                let invocation = Invocation::new(&self.options.tool, built);
                self.invoke(&label, &invocation, sink, &mut summary);
            }
        }

        let targets = match host.targets() {
            Ok(targets) => targets,
            Err(e) => {
                tracing::error!(project = host.display_name(), "enumerating targets: {:#}", e);
                summary.failures.push(TargetFailure {
                    target: host.display_name().to_string(),
                    message: format!("enumerating targets: {:#}", e),
                });
                Vec::new()
            }
        };
        let selected = self.select(targets.iter().map(|t| t.name()));

        for target in &targets {
            if !selected.contains(target.name()) {
                continue;
            }
            self.run_target(host, target, manifest.as_deref(), sink, &mut summary);
        }

        sink.finish(&summary)?;
        Ok(summary)
    }

    fn select<'t>(&self, known: impl Iterator<Item = &'t str>) -> HashSet<String> {
        let known: HashSet<String> = known.map(str::to_string).collect();
        if self.options.targets.is_empty() {
            return known;
        }
        self.options
            .targets
            .iter()
            .filter(|name| {
                let found = known.contains(name.as_str());
                if !found {
                    tracing::warn!(target_name = %name, "unknown target, ignoring");
                }
                found
            })
            .cloned()
            .collect()
    }

    fn resolve_config<P: AsRef<Path>>(&self, candidates: &[P]) -> Option<PathBuf> {
        let config = config::resolve(candidates, &self.options.config_file_name);
        match &config {
            Some(path) => tracing::debug!(config = %path.display(), "using configuration"),
            None => tracing::debug!(
                file_name = %self.options.config_file_name,
                "no configuration found, using linter defaults"
            ),
        }
        config
    }

    fn run_target(
        &self,
        host: &dyn ProjectHost,
        target: &dyn TargetDescriptor,
        manifest: Option<&Path>,
        sink: &mut dyn DiagnosticSink,
        summary: &mut RunSummary,
    ) {
        let sources = match target.source_files() {
            Ok(sources) => sources,
            Err(e) => {
                tracing::error!(target_name = target.name(), "{}", e);
                summary.failures.push(TargetFailure {
                    target: target.name().to_string(),
                    message: e.to_string(),
                });
                return;
            }
        };
        if sources.is_empty() {
            tracing::debug!(target_name = target.name(), "no source files, skipping");
            summary.skipped.push(target.name().to_string());
            return;
        }

        let config = self.resolve_config(&host.config_candidates(target));
        let paths = match self.builder.strategy() {
            FileList::Positional => vec![target.directory().to_path_buf()],
            FileList::Environment => {
                let mut files = Vec::with_capacity(sources.len() + 1);
                if self.options.mode == Mode::Build {
                    files.extend(manifest.map(Path::to_path_buf));
                }
                files.extend(sources.iter().cloned());
                files
            }
        };

        let built = self.builder.build(config.as_deref(), &paths);
        let invocation = Invocation::new(&self.options.tool, built).for_target(target.name());
        self.invoke(target.name(), &invocation, sink, summary);
    }

    fn invoke(
        &self,
        label: &str,
        invocation: &Invocation,
        sink: &mut dyn DiagnosticSink,
        summary: &mut RunSummary,
    ) {
        if let Err(e) = self.execute(invocation, sink, summary) {
            tracing::error!(target_name = label, "{}", e);
            summary.failures.push(TargetFailure {
                target: label.to_string(),
                message: e.to_string(),
            });
        }
    }

    fn execute(
        &self,
        invocation: &Invocation,
        sink: &mut dyn DiagnosticSink,
        summary: &mut RunSummary,
    ) -> Result<(), InvokeError> {
        let output = self
            .executor
            .execute(invocation, self.options.mode.output_mode())?;
        summary.invocations += 1;

        for diagnostic in diagnostics::parse(&output.output) {
            summary.record(&diagnostic);
            sink.emit(diagnostic);
        }

        tracing::debug!(termination = %output.termination, "linter finished");
        if !output.termination.success() {
            let diagnostic = Diagnostic::error(format!(
                "{} invocation failed: {}",
                self.tool_name(),
                output.termination
            ));
            summary.record(&diagnostic);
            sink.emit(diagnostic);
        }
        Ok(())
    }

    fn tool_name(&self) -> String {
        self.options
            .tool
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.options.tool.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{PackageHost, SourceFilter, WorkspaceHost};
    use crate::process::{Termination, ToolOutput};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Records invocations and replays scripted results.
    #[derive(Default)]
    struct FakeExecutor {
        calls: RefCell<Vec<Invocation>>,
        results: RefCell<VecDeque<Result<ToolOutput, InvokeError>>>,
    }

    impl FakeExecutor {
        fn push_output(&self, code: i32, output: &str) {
            self.results.borrow_mut().push_back(Ok(ToolOutput {
                termination: Termination::Exit(code),
                output: output.to_string(),
            }));
        }

        fn push_launch_failure(&self) {
            self.results.borrow_mut().push_back(Err(InvokeError::Launch {
                executable: PathBuf::from("swiftlint"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }));
        }
    }

    impl ToolExecutor for FakeExecutor {
        fn execute(
            &self,
            invocation: &Invocation,
            _mode: OutputMode,
        ) -> Result<ToolOutput, InvokeError> {
            self.calls.borrow_mut().push(invocation.clone());
            self.results.borrow_mut().pop_front().unwrap_or(Ok(ToolOutput {
                termination: Termination::Exit(0),
                output: String::new(),
            }))
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn options(mode: Mode) -> RunOptions {
        RunOptions {
            mode,
            tool: PathBuf::from("/usr/bin/swiftlint"),
            cache_path: PathBuf::from("/tmp/cache"),
            config_file_name: "swiftlint.yml".to_string(),
            file_list: FileList::Positional,
            arguments: vec![],
            targets: vec![],
        }
    }

    fn package(temp: &TempDir) -> PackageHost {
        let root = temp.path();
        touch(&root.join("Package.swift"));
        touch(&root.join("Sources/Bar/B.swift"));
        touch(&root.join("Sources/Foo/A.swift"));
        std::fs::create_dir_all(root.join("Sources/Empty")).unwrap();
        PackageHost::new(root, SourceFilter::new(root, "swift"))
    }

    #[test]
    fn test_manifest_runs_first_then_targets() {
        let temp = TempDir::new().unwrap();
        let host = package(&temp);
        let executor = FakeExecutor::default();
        let mut sink: Vec<Diagnostic> = Vec::new();

        let summary = Runner::new(&executor, options(Mode::Lint))
            .run(&host, &mut sink)
            .unwrap();

        let calls = executor.calls.borrow();
        assert_eq!(calls.len(), 3);
        let manifest = temp.path().join("Package.swift").display().to_string();
        assert_eq!(calls[0].arguments.last(), Some(&manifest));
        assert!(!calls[0].environment.contains_key("TARGET_NAME"));
        assert_eq!(calls[1].environment.get("TARGET_NAME").map(String::as_str), Some("Bar"));
        assert_eq!(calls[2].environment.get("TARGET_NAME").map(String::as_str), Some("Foo"));
        assert_eq!(summary.skipped, vec!["Empty".to_string()]);
        assert_eq!(summary.invocations, 3);
    }

    #[test]
    fn test_target_filter() {
        let temp = TempDir::new().unwrap();
        let host = package(&temp);
        let executor = FakeExecutor::default();
        let mut sink: Vec<Diagnostic> = Vec::new();

        let mut opts = options(Mode::Lint);
        opts.targets = vec!["Foo".to_string()];
        Runner::new(&executor, opts).run(&host, &mut sink).unwrap();

        let calls = executor.calls.borrow();
        // Manifest always runs, then only Foo.
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].environment.get("TARGET_NAME").map(String::as_str), Some("Foo"));
    }

    #[test]
    fn test_unknown_target_is_ignored() {
        let temp = TempDir::new().unwrap();
        let host = package(&temp);
        let executor = FakeExecutor::default();
        let mut sink: Vec<Diagnostic> = Vec::new();

        let mut opts = options(Mode::Lint);
        opts.targets = vec!["Foo".to_string(), "Typo".to_string()];
        let summary = Runner::new(&executor, opts).run(&host, &mut sink).unwrap();

        let calls = executor.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].environment.get("TARGET_NAME").map(String::as_str), Some("Foo"));
        assert!(summary.failures.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_target_does_not_stop_run() {
        let temp = TempDir::new().unwrap();
        let host = package(&temp);
        let foo = temp.path().join("Sources/Foo");
        std::os::unix::fs::symlink(foo.join("Gone.swift"), foo.join("Link.swift")).unwrap();

        // Filtered out: the broken target is never reported.
        let executor = FakeExecutor::default();
        let mut sink: Vec<Diagnostic> = Vec::new();
        let mut opts = options(Mode::Lint);
        opts.targets = vec!["Bar".to_string()];
        let summary = Runner::new(&executor, opts).run(&host, &mut sink).unwrap();
        {
            let calls = executor.calls.borrow();
            assert_eq!(calls.len(), 2);
            assert_eq!(calls[1].environment.get("TARGET_NAME").map(String::as_str), Some("Bar"));
        }
        assert!(summary.failures.is_empty());

        // Selected: recorded as a failure, the rest still runs.
        let executor = FakeExecutor::default();
        let mut sink: Vec<Diagnostic> = Vec::new();
        let summary = Runner::new(&executor, options(Mode::Lint))
            .run(&host, &mut sink)
            .unwrap();
        assert_eq!(executor.calls.borrow().len(), 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].target, "Foo");
        assert_eq!(summary.skipped, vec!["Empty".to_string()]);
        assert!(summary.failed());
    }

    #[test]
    fn test_target_config_falls_back_to_project() {
        let temp = TempDir::new().unwrap();
        let host = package(&temp);
        touch(&temp.path().join("swiftlint.yml"));
        touch(&temp.path().join("Sources/Foo/swiftlint.yml"));
        let executor = FakeExecutor::default();
        let mut sink: Vec<Diagnostic> = Vec::new();

        Runner::new(&executor, options(Mode::Lint))
            .run(&host, &mut sink)
            .unwrap();

        let calls = executor.calls.borrow();
        let config_of = |inv: &Invocation| {
            let at = inv.arguments.iter().position(|a| a == "--config").unwrap();
            PathBuf::from(&inv.arguments[at + 1])
        };
        assert_eq!(config_of(&calls[0]), temp.path().join("swiftlint.yml"));
        assert_eq!(config_of(&calls[1]), temp.path().join("swiftlint.yml"));
        assert_eq!(config_of(&calls[2]), temp.path().join("Sources/Foo/swiftlint.yml"));
    }

    #[test]
    fn test_launch_failure_does_not_stop_run() {
        let temp = TempDir::new().unwrap();
        let host = package(&temp);
        let executor = FakeExecutor::default();
        executor.push_output(0, "");
        executor.push_launch_failure();
        executor.push_output(0, "A.swift:1:1: warning: w\n");
        let mut sink: Vec<Diagnostic> = Vec::new();

        let summary = Runner::new(&executor, options(Mode::Lint))
            .run(&host, &mut sink)
            .unwrap();

        assert_eq!(executor.calls.borrow().len(), 3);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].target, "Bar");
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.invocations, 2);
        assert!(summary.failed());
    }

    #[test]
    fn test_nonzero_exit_reports_error() {
        let temp = TempDir::new().unwrap();
        let host = package(&temp);
        let executor = FakeExecutor::default();
        executor.push_output(2, "Linting...\n");
        let mut sink: Vec<Diagnostic> = Vec::new();

        let summary = Runner::new(&executor, options(Mode::Lint))
            .run(&host, &mut sink)
            .unwrap();

        assert_eq!(sink[0], Diagnostic::remark("Linting..."));
        assert_eq!(sink[1], Diagnostic::error("swiftlint invocation failed: exit:2"));
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.invocations, 3);
    }

    #[test]
    fn test_build_mode_uses_environment_file_list() {
        let temp = TempDir::new().unwrap();
        let host = package(&temp);
        let executor = FakeExecutor::default();
        let mut sink: Vec<Diagnostic> = Vec::new();

        Runner::new(&executor, options(Mode::Build))
            .run(&host, &mut sink)
            .unwrap();

        let calls = executor.calls.borrow();
        // No separate manifest run; the manifest rides along with each target.
        assert_eq!(calls.len(), 2);
        let foo = &calls[1];
        assert_eq!(
            foo.arguments,
            vec!["lint", "--cache-path", "/tmp/cache", "--use-script-input-files"]
        );
        let env = |key: &str| foo.environment.get(key).cloned();
        assert_eq!(env("SCRIPT_INPUT_FILE_COUNT"), Some("2".to_string()));
        assert_eq!(
            env("SCRIPT_INPUT_FILE_0"),
            Some(temp.path().join("Package.swift").display().to_string())
        );
        assert_eq!(
            env("SCRIPT_INPUT_FILE_1"),
            Some(temp.path().join("Sources/Foo/A.swift").display().to_string())
        );
    }

    #[test]
    fn test_fix_mode_defaults() {
        let temp = TempDir::new().unwrap();
        let host = package(&temp);
        let executor = FakeExecutor::default();
        let mut sink: Vec<Diagnostic> = Vec::new();

        Runner::new(&executor, options(Mode::Fix))
            .run(&host, &mut sink)
            .unwrap();

        let calls = executor.calls.borrow();
        assert_eq!(&calls[0].arguments[..3], &["--fix", "--cache-path", "/tmp/cache"]);
    }

    #[test]
    fn test_workspace_has_no_manifest_run() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("App/Main.swift"));
        touch(&root.join("swiftlint.yml"));
        let host = WorkspaceHost::new(root, SourceFilter::new(root, "swift"));
        let executor = FakeExecutor::default();
        let mut sink: Vec<Diagnostic> = Vec::new();

        Runner::new(&executor, options(Mode::Lint))
            .run(&host, &mut sink)
            .unwrap();

        let calls = executor.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].arguments,
            vec![
                "lint".to_string(),
                "--cache-path".to_string(),
                "/tmp/cache".to_string(),
                "--config".to_string(),
                root.join("swiftlint.yml").display().to_string(),
                root.join("App").display().to_string(),
            ]
        );
    }
}

//! End-to-end run against a stand-in linter script.
//!
//! Everything runs in a single test: writing an executable while other
//! threads of the same binary fork can fail with ETXTBSY.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use lintbridge::cli::{exit_code, EXIT_ERROR, EXIT_SUCCESS};
use lintbridge::config::FileList;
use lintbridge::diagnostics::{Diagnostic, Severity};
use lintbridge::host::{PackageHost, SourceFilter};
use lintbridge::process::SystemExecutor;
use lintbridge::runner::{Mode, RunOptions, Runner};
use tempfile::TempDir;

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "").unwrap();
}

/// A linter that records its arguments and prints one finding and one summary line.
fn write_tool(dir: &Path, log: &Path, finding: &Path) -> PathBuf {
    let script = dir.join("fake-swiftlint");
    let body = format!(
        r#"#!/bin/sh
printf '%s\n' "$@" > "{log}"
echo "TARGET_NAME=$TARGET_NAME" >> "{log}"
echo "{file}:4:2: warning: Trailing Whitespace Violation: Lines should not have trailing whitespace. (trailing_whitespace)"
echo "Done linting! Found 1 violation, 0 serious in 3 files."
"#,
        log = log.display(),
        file = finding.display(),
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn options(tool: PathBuf, cache: &Path) -> RunOptions {
    RunOptions {
        mode: Mode::Lint,
        tool,
        cache_path: cache.to_path_buf(),
        config_file_name: "lintconfig".to_string(),
        file_list: FileList::Positional,
        arguments: vec![],
        targets: vec![],
    }
}

#[test]
fn test_lint_target_end_to_end() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("Project");
    let foo = root.join("Sources/Foo");
    for name in ["Parser.swift", "Lexer.swift", "Token.swift"] {
        touch(&foo.join(name));
    }
    touch(&foo.join("lintconfig"));

    let cache = temp.path().join("cache");
    std::fs::create_dir_all(&cache).unwrap();
    let log = temp.path().join("invocation.log");
    let tool = write_tool(temp.path(), &log, &foo.join("Parser.swift"));

    let host = PackageHost::new(&root, SourceFilter::new(&root, "swift"));
    let executor = SystemExecutor;
    let mut sink: Vec<Diagnostic> = Vec::new();

    let summary = Runner::new(&executor, options(tool, &cache))
        .run(&host, &mut sink)
        .expect("run should succeed");

    // No manifest in the project, so only the target runs.
    assert_eq!(summary.invocations, 1);
    assert!(summary.failures.is_empty());
    assert_eq!(exit_code(&summary), EXIT_SUCCESS);

    let recorded = std::fs::read_to_string(&log).expect("tool should have run");
    let recorded: Vec<&str> = recorded.lines().collect();
    let cache_arg = cache.display().to_string();
    let config_arg = foo.join("lintconfig").display().to_string();
    let target_arg = foo.display().to_string();
    assert_eq!(
        recorded,
        vec![
            "lint",
            "--cache-path",
            cache_arg.as_str(),
            "--config",
            config_arg.as_str(),
            target_arg.as_str(),
            "TARGET_NAME=Foo",
        ]
    );

    assert_eq!(sink.len(), 2);
    assert_eq!(sink[0].severity, Severity::Warning);
    assert_eq!(
        sink[0].file.as_deref(),
        Some(foo.join("Parser.swift").display().to_string().as_str())
    );
    assert_eq!(sink[0].line, Some(4));
    assert_eq!(
        sink[0].message,
        " Trailing Whitespace Violation: Lines should not have trailing whitespace. (trailing_whitespace)"
    );
    assert_eq!(
        sink[1],
        Diagnostic::remark("Done linting! Found 1 violation, 0 serious in 3 files.")
    );

    // A missing executable is a hard error for the target, not a panic.
    let mut sink: Vec<Diagnostic> = Vec::new();
    let summary = Runner::new(
        &executor,
        options(temp.path().join("missing-swiftlint"), &cache),
    )
    .run(&host, &mut sink)
    .expect("run should still complete");
    assert_eq!(summary.invocations, 0);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].target, "Foo");
    assert!(sink.is_empty());
    assert_eq!(exit_code(&summary), EXIT_ERROR);
}

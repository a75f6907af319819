//! lintbridge - run a prebuilt linter over package targets.
//!
//! lintbridge does no analysis of its own. For every target of a project it
//! finds the linter configuration, assembles an argument list, runs the
//! external linter and turns the linter's text output into diagnostics.
//!
//! # Architecture
//!
//! Data flows strictly forward through these modules:
//!
//! - `host`: Target enumeration (package and workspace layouts)
//! - `config`: Configuration file lookup and adapter settings
//! - `args`: Argument vector and environment assembly
//! - `process`: Child process execution
//! - `diagnostics`: Parsing linter output into diagnostics
//! - `report`: Diagnostic sinks (pretty, JSON)
//! - `runner`: The per-target pipeline tying the above together

pub mod args;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod host;
pub mod process;
pub mod report;
pub mod runner;

pub use args::{ArgumentBuilder, DefaultCommand, Invocation};
pub use config::{FileList, Settings};
pub use diagnostics::{parse, parse_line, Diagnostic, Severity};
pub use host::{DiscoveryError, PackageHost, ProjectHost, SourceFilter, Target, TargetDescriptor, WorkspaceHost};
pub use process::{InvokeError, OutputMode, SystemExecutor, Termination, ToolExecutor, ToolOutput};
pub use report::{DiagnosticSink, JsonSink, PrettySink};
pub use runner::{Mode, RunOptions, RunSummary, Runner};

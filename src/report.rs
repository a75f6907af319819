//! Diagnostic sinks.
//!
//! Supports two output formats:
//! - Pretty: colored terminal lines in the `file:line:col: severity: message` shape
//! - JSON: one document with every diagnostic and the run summary

use colored::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::diagnostics::{Diagnostic, Severity};
use crate::runner::RunSummary;

/// Receiver for diagnostics, in emission order.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);

    /// Called once after the last target.
    fn finish(&mut self, _summary: &RunSummary) -> anyhow::Result<()> {
        Ok(())
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Writes each diagnostic as soon as it arrives.
pub struct PrettySink<W: Write> {
    out: W,
}

impl PrettySink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> PrettySink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_diagnostic(&mut self, d: &Diagnostic) -> std::io::Result<()> {
        let Some(file) = &d.file else {
            return writeln!(self.out, "{}", d.message.dimmed());
        };

        write!(self.out, "{}", file.blue())?;
        if let Some(line) = d.line {
            write!(self.out, "{}", format!(":{}", line).dimmed())?;
            if let Some(column) = d.column {
                write!(self.out, "{}", format!(":{}", column).dimmed())?;
            }
        }
        writeln!(
            self.out,
            ": {}: {}",
            severity_tag(d.severity),
            d.message.trim_start()
        )
    }
}

fn severity_tag(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow(),
        Severity::Remark => "remark".dimmed(),
    }
}

impl<W: Write> DiagnosticSink for PrettySink<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        // A closed stdout is not worth aborting the remaining targets for.
        if let Err(e) = self.write_diagnostic(&diagnostic) {
            tracing::warn!("writing diagnostic: {}", e);
        }
    }

    fn finish(&mut self, summary: &RunSummary) -> anyhow::Result<()> {
        writeln!(self.out)?;
        if summary.errors > 0 || !summary.failures.is_empty() {
            write!(self.out, "  {}", "✗ FAIL".red())?;
        } else {
            write!(self.out, "  {}", "✓ PASS".green())?;
        }

        let plural = |n: usize| if n == 1 { "" } else { "s" };
        writeln!(
            self.out,
            "  {} invocation{}, {} error{}, {} warning{}{}",
            summary.invocations,
            plural(summary.invocations),
            summary.errors,
            plural(summary.errors),
            summary.warnings,
            plural(summary.warnings),
            if summary.skipped.is_empty() {
                String::new()
            } else {
                format!("  ({} skipped)", summary.skipped.len())
                    .dimmed()
                    .to_string()
            },
        )?;

        for failure in &summary.failures {
            writeln!(
                self.out,
                "    {} {}: {}",
                "ERROR".red(),
                failure.target,
                failure.message
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: JsonSummary,
}

/// Summary counts in the JSON report.
#[derive(Serialize, Deserialize)]
pub struct JsonSummary {
    pub invocations: usize,
    pub errors: usize,
    pub warnings: usize,
    pub remarks: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<JsonFailure>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonFailure {
    pub target: String,
    pub message: String,
}

/// Buffers diagnostics and prints a single JSON document on `finish`.
pub struct JsonSink<W: Write> {
    out: W,
    diagnostics: Vec<Diagnostic>,
}

impl JsonSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            diagnostics: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticSink for JsonSink<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn finish(&mut self, summary: &RunSummary) -> anyhow::Result<()> {
        let report = JsonReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            diagnostics: std::mem::take(&mut self.diagnostics),
            summary: JsonSummary {
                invocations: summary.invocations,
                errors: summary.errors,
                warnings: summary.warnings,
                remarks: summary.remarks,
                skipped: summary.skipped.clone(),
                failures: summary
                    .failures
                    .iter()
                    .map(|f| JsonFailure {
                        target: f.target.clone(),
                        message: f.message.clone(),
                    })
                    .collect(),
            },
        };

        let json = serde_json::to_string_pretty(&report)?;
        writeln!(self.out, "{}", json)?;
        self.out.flush()?;
        Ok(())
    }
}

//! Diagnostic records and the parser for the linter's text output.
//!
//! The linter prints one finding per line in the informal shape
//! `<file>:<line>:<col>: <severity>: <message>`. Anything that does not fit
//! that shape is kept as an unpositioned remark instead of being dropped.

use serde::{Deserialize, Serialize};

/// Maximum number of `:`-delimited fields in a positioned line.
const FIELD_COUNT: usize = 5;

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Remark,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Remark => "remark",
        }
    }

    /// Map a severity label from the linter output. Only `warning` and
    /// `error` are recognized; everything else is unstructured.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single diagnostic produced from one output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Diagnostic {
    /// An unpositioned remark carrying free-form text.
    pub fn remark(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Remark,
            message: message.into(),
            file: None,
            line: None,
            column: None,
        }
    }

    /// An unpositioned error, used for failures of the tool itself.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            file: None,
            line: None,
            column: None,
        }
    }

    pub fn is_positioned(&self) -> bool {
        self.file.is_some()
    }
}

/// Parse a single output line.
///
/// Never fails: a line that is not a recognized warning or error becomes a
/// remark holding the whole line. A non-numeric line or column field leaves
/// that position absent but still yields the positioned diagnostic.
pub fn parse_line(line: &str) -> Diagnostic {
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, ':').collect();
    if fields.len() != FIELD_COUNT {
        return Diagnostic::remark(line);
    }

    match Severity::from_label(fields[3].trim()) {
        Some(severity) => Diagnostic {
            severity,
            message: fields[4].to_string(),
            file: Some(fields[0].to_string()),
            line: fields[1].parse().ok(),
            column: fields[2].parse().ok(),
        },
        None => Diagnostic::remark(line),
    }
}

/// Parse the linter's combined output, one diagnostic per non-empty line,
/// in order of appearance.
pub fn parse(output: &str) -> impl Iterator<Item = Diagnostic> + '_ {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(parse_line)
}

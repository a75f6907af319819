//! Running the linter as a child process.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

use crate::args::Invocation;

/// Errors that prevent the linter from running at all.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("cannot launch {}: {source}", .executable.display())]
    Launch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reading linter output: {0}")]
    Io(#[from] std::io::Error),
}

/// What happens to the child's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// stdout and stderr merged into one captured stream
    Capture,
    /// Inherited from this process; nothing is captured
    Stream,
}

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exit(i32),
    Signal(Option<i32>),
}

impl Termination {
    pub fn success(&self) -> bool {
        matches!(self, Termination::Exit(0))
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Exit(code) => write!(f, "exit:{}", code),
            Termination::Signal(Some(signal)) => write!(f, "signal:{}", signal),
            Termination::Signal(None) => write!(f, "signal:unknown"),
        }
    }
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Termination::Exit(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            Termination::Signal(status.signal())
        }
        #[cfg(not(unix))]
        {
            Termination::Signal(None)
        }
    }
}

/// Result of a finished invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub termination: Termination,
    /// Combined output text; empty in [`OutputMode::Stream`].
    pub output: String,
}

/// Runs invocations to completion.
pub trait ToolExecutor {
    /// Block until the tool exits. Only a failure to start or read the
    /// process is an error; a non-zero exit is reported in the output.
    fn execute(&self, invocation: &Invocation, mode: OutputMode)
        -> Result<ToolOutput, InvokeError>;
}

/// Executor backed by `std::process`.
///
/// No timeout is applied: a hung linter blocks the run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl ToolExecutor for SystemExecutor {
    fn execute(
        &self,
        invocation: &Invocation,
        mode: OutputMode,
    ) -> Result<ToolOutput, InvokeError> {
        let launch_error = |source| InvokeError::Launch {
            executable: invocation.executable.clone(),
            source,
        };

        let mut command = Command::new(&invocation.executable);
        command
            .args(&invocation.arguments)
            .envs(&invocation.environment);

        tracing::debug!(command = %invocation.command_line(), ?mode, "spawning linter");

        match mode {
            OutputMode::Stream => {
                let status = command.status().map_err(launch_error)?;
                Ok(ToolOutput {
                    termination: status.into(),
                    output: String::new(),
                })
            }
            OutputMode::Capture => {
                let (mut reader, writer) = std::io::pipe()?;
                command
                    .stdin(Stdio::null())
                    .stdout(writer.try_clone()?)
                    .stderr(writer);

                let mut child = command.spawn().map_err(launch_error)?;
                // The command still owns the write ends; drop them so the
                // read below sees EOF once the child exits.
                drop(command);

                let (bytes, status) = drain_then_wait(&mut reader, || child.wait())?;

                Ok(ToolOutput {
                    termination: status.into(),
                    output: String::from_utf8_lossy(&bytes).into_owned(),
                })
            }
        }
    }
}

/// Read `reader` to EOF, then reap the child even if the read failed.
fn drain_then_wait<R: Read>(
    reader: &mut R,
    wait: impl FnOnce() -> std::io::Result<ExitStatus>,
) -> Result<(Vec<u8>, ExitStatus), InvokeError> {
    let mut bytes = Vec::new();
    let read = reader.read_to_end(&mut bytes);
    let status = wait()?;
    read?;
    Ok((bytes, status))
}

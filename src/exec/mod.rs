//! Process execution choke point
//!
//! Every external tool invocation (lipo, the version-reporting executable)
//! goes through the [`ToolRunner`] trait so tests can substitute a scripted
//! runner. The real implementation is [`SystemRunner`], a thin wrapper over
//! `std::process::Command` that captures exit status, stdout, and stderr.

mod script;

pub use script::{ScriptedRunner, Script};

use std::fmt;
use std::path::Path;
use std::process::Command;

/// Structured result of a tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit code (`1` if the process was terminated by a signal)
    pub code: i32,
    /// Captured stdout, lossily decoded
    pub stdout: String,
    /// Captured stderr, lossily decoded
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// stderr if non-empty, otherwise stdout; for diagnostics
    pub fn message(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// A tool invocation, rendered for diagnostics as a shell-like command line.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Errors spawning or waiting on an external tool.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Failed to spawn '{invocation}': {source}")]
    Spawn {
        invocation: Invocation,
        #[source]
        source: std::io::Error,
    },
}

/// Abstraction over external tool execution.
///
/// Implementations run the tool synchronously and return its structured
/// output; a nonzero exit status is not an error at this layer (callers gate
/// on [`ToolOutput::success`]).
pub trait ToolRunner {
    /// Run `program` with `args`, optionally from working directory `cwd`.
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<ToolOutput, ExecError>;
}

/// Runs tools via `std::process::Command`, blocking until exit.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>) -> Result<ToolOutput, ExecError> {
        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| ExecError::Spawn {
            invocation: Invocation {
                program: program.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
            source,
        })?;

        Ok(ToolOutput {
            code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

//! Blocking invocation of external programs.
//!
//! Every call into docker or an init-system tool goes through [`ProcessRunner`]
//! so the rest of the crate can be exercised against a scripted runner.

mod system;

#[cfg(test)]
pub mod mock;

pub use system::SystemRunner;

use std::io;
use std::time::Duration;

/// Captured result of a finished external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// The command was killed after exceeding its time bound.
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status_code: 0,
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn failed(status_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status_code,
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.status_code == 0 && !self.timed_out
    }
}

/// How a command should be run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Kill the command if it has not exited after this long.
    pub timeout: Option<Duration>,
    /// Interleave stderr into stdout, preserving write order.
    pub merge_output: bool,
}

impl RunOptions {
    pub fn bounded(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            merge_output: false,
        }
    }

    pub fn merged() -> Self {
        Self {
            timeout: None,
            merge_output: true,
        }
    }
}

pub trait ProcessRunner {
    /// Run `program` with `args` to completion and capture its output.
    ///
    /// An `Err` means the program could not be spawned at all (for example
    /// the binary is missing); a non-zero exit is reported in the output.
    fn run(&self, program: &str, args: &[String], options: RunOptions)
        -> io::Result<CommandOutput>;

    /// Run `program` attached to the caller's terminal and return its exit code.
    fn run_attached(&self, program: &str, args: &[String]) -> io::Result<i32>;

    /// Whether `program` can be found on PATH.
    fn is_available(&self, program: &str) -> bool;
}

/// Render a command line for log and error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(program.to_string());
    for arg in args {
        if arg.is_empty() || arg.chars().any(char::is_whitespace) {
            parts.push(format!("\"{}\"", arg.replace('"', "\\\"")));
        } else {
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

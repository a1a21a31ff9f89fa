//! Scripted runner for unit tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::io;

use super::{CommandOutput, ProcessRunner, RunOptions};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub options: RunOptions,
}

impl RecordedCall {
    pub fn line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Responds to commands by matching the command line against registered
/// prefixes. Later registrations win; unmatched commands succeed silently.
#[derive(Default)]
pub struct MockRunner {
    rules: RefCell<Vec<(String, CommandOutput)>>,
    calls: RefCell<Vec<RecordedCall>>,
    missing: RefCell<HashSet<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, prefix: &str, output: CommandOutput) -> &Self {
        self.rules.borrow_mut().push((prefix.to_string(), output));
        self
    }

    /// Make `program` unavailable: `is_available` is false and spawning fails.
    pub fn without(&self, program: &str) -> &Self {
        self.missing.borrow_mut().insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(RecordedCall::line).collect()
    }
}

impl ProcessRunner for MockRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        options: RunOptions,
    ) -> io::Result<CommandOutput> {
        let call = RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            options,
        };
        let line = call.line();
        self.calls.borrow_mut().push(call);

        if self.missing.borrow().contains(program) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not found"));
        }

        let rules = self.rules.borrow();
        let output = rules
            .iter()
            .rev()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::ok(""));
        Ok(output)
    }

    fn run_attached(&self, program: &str, args: &[String]) -> io::Result<i32> {
        self.run(program, args, RunOptions::default())
            .map(|output| output.status_code)
    }

    fn is_available(&self, program: &str) -> bool {
        !self.missing.borrow().contains(program)
    }
}

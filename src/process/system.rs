use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use super::{display_command, CommandOutput, ProcessRunner, RunOptions};

/// Maximum captured output per stream (10MB)
const MAX_OUTPUT_SIZE: u64 = 10 * 1024 * 1024;

/// Runs real programs on the host.
///
/// Output is captured into anonymous temp files rather than pipes, so a
/// chatty child can never block on a full pipe while we wait on it and no
/// reader threads are needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        options: RunOptions,
    ) -> io::Result<CommandOutput> {
        debug!(command = %display_command(program, args), "running");

        let mut stdout_file = tempfile::tempfile()?;
        let mut stderr_file = if options.merge_output {
            stdout_file.try_clone()?
        } else {
            tempfile::tempfile()?
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file.try_clone()?))
            .stderr(Stdio::from(stderr_file.try_clone()?))
            .spawn()?;

        let (status_code, timed_out) = wait_bounded(&mut child, options, program)?;

        let stdout = read_captured(&mut stdout_file)?;
        let stderr = if options.merge_output {
            String::new()
        } else {
            read_captured(&mut stderr_file)?
        };

        debug!(program, status_code, timed_out, "finished");

        Ok(CommandOutput {
            status_code,
            stdout,
            stderr,
            timed_out,
        })
    }

    fn run_attached(&self, program: &str, args: &[String]) -> io::Result<i32> {
        debug!(command = %display_command(program, args), "running attached");
        let status = Command::new(program).args(args).status()?;
        Ok(status.code().unwrap_or(if status.success() { 0 } else { 1 }))
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Wait for the child, killing it once the optional time bound is exceeded.
fn wait_bounded(child: &mut Child, options: RunOptions, program: &str) -> io::Result<(i32, bool)> {
    let Some(timeout) = options.timeout else {
        let status = child.wait()?;
        return Ok((status.code().unwrap_or(1), false));
    };

    match child.wait_timeout(timeout)? {
        Some(status) => Ok((status.code().unwrap_or(1), false)),
        None => {
            warn!(
                program,
                timeout_secs = timeout.as_secs(),
                "command exceeded its time bound, killing it"
            );
            let _ = child.kill();
            let _ = child.wait();
            Ok((1, true))
        }
    }
}

fn read_captured(file: &mut File) -> io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.take(MAX_OUTPUT_SIZE).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

//! Launching commands inside a session's environment.

use super::EnvironmentSession;
use super::command::CommandLine;
use crate::error::{LaunchError, Result};
use crate::resolver::{Environ, ResolvedContext};
use std::io::{BufRead, BufReader, PipeReader, Write};
use std::process::{Child, ExitStatus};
use tracing::{debug, warn};

/// Result of [`EnvironmentSession::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// The command as it was executed.
    pub command: Vec<String>,
    /// Exit code of the process (negative signal number if it was killed by one).
    pub return_code: i32,
    /// Combined stdout and stderr, in arrival order.
    pub captured_output: String,
}

impl RunOutput {
    pub fn is_success(&self) -> bool {
        self.return_code == 0
    }
}

/// A process started by [`EnvironmentSession::popen`].
///
/// Stdout and stderr of the child are both connected to `output`.
#[derive(Debug)]
pub struct LaunchedProcess {
    pub command: Vec<String>,
    pub child: Child,
    pub output: PipeReader,
}

impl<C: ResolvedContext> EnvironmentSession<C> {
    /// Environment the child process starts from: a copy of the caller's.
    pub fn parent_environ(&self) -> Environ {
        std::env::vars_os().collect()
    }

    /// Start `command` inside the environment without waiting for it.
    pub fn popen(&self, command: impl Into<CommandLine>) -> Result<LaunchedProcess> {
        let argv = command.into().into_argv()?;
        let mut process = self.context().command(&argv, &self.parent_environ())?;

        let (reader, writer) = std::io::pipe()
            .map_err(|e| LaunchError::Command(format!("failed to create output pipe: {}", e)))?;
        let writer_err = writer
            .try_clone()
            .map_err(|e| LaunchError::Command(format!("failed to create output pipe: {}", e)))?;
        process.stdout(writer).stderr(writer_err);

        debug!(profile = %self.profile(), ?argv, "launching command");
        let child = process.spawn().map_err(|e| {
            LaunchError::Command(format!(
                "failed to execute '{}': {}\nFix: ensure the command is installed and in PATH.",
                argv[0], e
            ))
        })?;
        // The command holds our copies of the write end; the reader only sees
        // EOF once they are gone.
        drop(process);

        Ok(LaunchedProcess {
            command: argv,
            child,
            output: reader,
        })
    }

    /// Run `command` inside the environment and wait for it to finish.
    ///
    /// Combined output is written line by line to `output_stream` as it
    /// arrives (when given) and captured in full. Invalid UTF-8 is replaced
    /// with U+FFFD. A failing `output_stream` stops streaming but not capture.
    pub fn run(
        &self,
        command: impl Into<CommandLine>,
        mut output_stream: Option<&mut dyn Write>,
    ) -> Result<RunOutput> {
        let LaunchedProcess {
            command,
            mut child,
            output,
        } = self.popen(command)?;

        let mut reader = BufReader::new(output);
        let mut captured_output = String::new();
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| LaunchError::Command(format!("failed to read command output: {}", e)))?;
            if read == 0 {
                break;
            }

            let text = String::from_utf8_lossy(&line);
            if let Some(stream) = output_stream.as_deref_mut()
                && let Err(e) = stream
                    .write_all(text.as_bytes())
                    .and_then(|()| stream.flush())
            {
                warn!(error = %e, "output stream failed, continuing capture only");
                output_stream = None;
            }
            captured_output.push_str(&text);
        }

        let status = child
            .wait()
            .map_err(|e| LaunchError::Command(format!("failed to wait for command: {}", e)))?;
        let return_code = return_code(status);
        debug!(?command, return_code, "command finished");

        Ok(RunOutput {
            command,
            return_code,
            captured_output,
        })
    }
}

#[cfg(unix)]
fn return_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| -signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn return_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

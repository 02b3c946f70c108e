// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running candidate and generator processes under a deadline.
//!
//! Every child is started through an external wrapper program (`timeout` by default), invoked as
//! `<wrapper> <seconds> <program> <args...>`. The wrapper must exit with code 124 when it kills
//! the child for exceeding its deadline.

use crate::{errors::ChildError, helpers::display_command};
use bstr::ByteSlice;
use bytes::Bytes;
use std::{
    io,
    process::{Output, Stdio},
    time::Duration,
};
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::debug;

/// The exit code the deadline wrapper uses when it terminates a child.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// What a child process reads on standard input.
#[derive(Debug)]
pub enum ChildInput {
    /// An in-memory buffer, written to a pipe.
    Bytes(Bytes),

    /// An open file, handed to the child directly. The child reads from the file's current
    /// position.
    File(std::fs::File),
}

/// Runs external programs under the deadline wrapper.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    timeout_program: String,
}

impl ProcessRunner {
    /// Creates a new process runner that wraps every child with `timeout_program`.
    pub fn new(timeout_program: impl Into<String>) -> Self {
        Self {
            timeout_program: timeout_program.into(),
        }
    }

    /// The deadline wrapper program.
    pub fn timeout_program(&self) -> &str {
        &self.timeout_program
    }

    /// Runs `command` with `input` on standard input and returns everything it printed on
    /// standard output.
    pub async fn run(
        &self,
        command: &[String],
        timeout: Duration,
        input: ChildInput,
    ) -> Result<Bytes, ChildError> {
        let display = display_command(command);
        let mut cmd = self.make_command(command, timeout);
        cmd.stdout(Stdio::piped());

        let output = match input {
            ChildInput::Bytes(bytes) => {
                cmd.stdin(Stdio::piped());
                let mut child = cmd.spawn().map_err(|err| ChildError::Spawn {
                    command: display.clone(),
                    err,
                })?;

                let stdin = child.stdin.take();
                let write_stdin = async move {
                    let Some(mut stdin) = stdin else {
                        return Ok(());
                    };
                    // Closing stdin (by dropping it) signals end of input.
                    match stdin.write_all(&bytes).await {
                        // The child may exit without reading all of its input.
                        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                        other => other,
                    }
                };

                let (write_res, output) = tokio::join!(write_stdin, child.wait_with_output());
                let output = output.map_err(|err| ChildError::Io {
                    command: display.clone(),
                    err,
                })?;
                write_res.map_err(|err| ChildError::Io {
                    command: display.clone(),
                    err,
                })?;
                output
            }
            ChildInput::File(file) => {
                cmd.stdin(Stdio::from(file));
                let child = cmd.spawn().map_err(|err| ChildError::Spawn {
                    command: display.clone(),
                    err,
                })?;
                child
                    .wait_with_output()
                    .await
                    .map_err(|err| ChildError::Io {
                        command: display.clone(),
                        err,
                    })?
            }
        };

        classify(display, timeout, output).map(|output| Bytes::from(output.stdout))
    }

    /// Runs `command` with no input, sending its standard output to `output`.
    pub async fn run_to_file(
        &self,
        command: &[String],
        timeout: Duration,
        output: std::fs::File,
    ) -> Result<(), ChildError> {
        let display = display_command(command);
        let mut cmd = self.make_command(command, timeout);
        cmd.stdin(Stdio::null()).stdout(Stdio::from(output));

        let child = cmd.spawn().map_err(|err| ChildError::Spawn {
            command: display.clone(),
            err,
        })?;
        let output = child
            .wait_with_output()
            .await
            .map_err(|err| ChildError::Io {
                command: display.clone(),
                err,
            })?;

        classify(display, timeout, output).map(|_| ())
    }

    fn make_command(&self, command: &[String], timeout: Duration) -> Command {
        let mut cmd = Command::new(&self.timeout_program);
        cmd.arg(format_timeout(timeout))
            .args(command)
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!(
            "running `{} {} {}`",
            self.timeout_program,
            format_timeout(timeout),
            display_command(command),
        );
        cmd
    }
}

/// Formats a timeout as decimal seconds with millisecond precision.
///
/// Timeouts are rounded up to the next millisecond and never formatted as 0, since the wrapper
/// reads a zero deadline as no deadline.
fn format_timeout(timeout: Duration) -> String {
    let millis = timeout.as_nanos().div_ceil(1_000_000).max(1);
    format!("{}.{:03}", millis / 1000, millis % 1000)
}

fn classify(command: String, timeout: Duration, output: Output) -> Result<Output, ChildError> {
    if output.status.success() {
        return Ok(output);
    }
    if output.status.code() == Some(TIMEOUT_EXIT_CODE) {
        return Err(ChildError::TimedOut { command, timeout });
    }
    Err(ChildError::Failed {
        command,
        status: output.status,
        stderr_tail: stderr_tail(&output.stderr),
    })
}

/// Returns the last non-empty line of `stderr`.
fn stderr_tail(stderr: &[u8]) -> Option<String> {
    stderr
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .last()
        .map(|line| line.to_str_lossy().into_owned())
}

// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by pantest.

use camino::Utf8PathBuf;
use config::ConfigError;
use itertools::Itertools;
use std::{fmt, process::ExitStatus, time::Duration};
use thiserror::Error;
use tokio::task::JoinError;

/// Displays an error together with its chain of sources, separated by `: `.
///
/// Used where an error has to be flattened into a single line, such as the diagnostic messages
/// attached to test events.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: std::error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: std::error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        let mut next = self.error.source();
        while let Some(source) = next {
            write!(f, ": {source}")?;
            next = source.source();
        }
        Ok(())
    }
}

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse pantest config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// The config file does not exist.
    #[error("config file does not exist (hint: create one with `pantest init`)")]
    NotFound,

    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),

    /// `max-workers` was set to zero.
    #[error("`max-workers` must be at least 1")]
    ZeroMaxWorkers,

    /// A candidate was configured without a command.
    #[error("{}", describe_empty_command(.name.as_deref(), .index))]
    EmptyCandidateCommand {
        /// The name of the candidate, if one was specified.
        name: Option<String>,

        /// The position of the candidate in the config file, starting at 0.
        index: usize,
    },

    /// A candidate's timeout was below one millisecond, or not a number.
    #[error("the timeout of {name} must be at least 0.001 seconds (found {timeout})")]
    InvalidCandidateTimeout {
        /// The name of the candidate.
        name: String,

        /// The timeout that was found.
        timeout: f64,
    },

    /// The generator was configured with an empty command.
    #[error("the command of [generator] cannot be empty")]
    EmptyGeneratorCommand,

    /// The generator's timeout was below one millisecond, or not a number.
    #[error("the timeout of [generator] must be at least 0.001 seconds (found {timeout})")]
    InvalidGeneratorTimeout {
        /// The timeout that was found.
        timeout: f64,
    },
}

fn describe_empty_command(name: Option<&str>, index: &usize) -> String {
    match name {
        Some(name) => format!("the command of {name} cannot be empty"),
        None => format!("the command of candidate #{} cannot be empty", index + 1),
    }
}

/// An error that occurred while creating a new config file with `pantest init`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InitConfigError {
    /// The path already exists.
    #[error("file {path} already exists")]
    AlreadyExists {
        /// The path that was requested.
        path: Utf8PathBuf,
    },

    /// Writing the template failed.
    #[error("failed to write the config file to {path}")]
    Write {
        /// The path that was requested.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },
}

/// An error that occurred while reading the test corpus.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CorpusReadError {
    /// The input directory could not be listed.
    #[error("failed to open input dir `{input_dir}`")]
    ReadInputDir {
        /// The input directory.
        input_dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },
}

/// An error that occurred while looking up a candidate by name.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum CandidateLookupError {
    /// No candidate has this name.
    #[error(
        "candidate `{name}` not found (known candidates: {})",
        .known.iter().join(", ")
    )]
    NotFound {
        /// The name that was looked up.
        name: String,

        /// All known candidate names.
        known: Vec<String>,
    },

    /// More than one candidate has this name.
    #[error("multiple candidates ({matches}) found for `{name}`")]
    Ambiguous {
        /// The name that was looked up.
        name: String,

        /// The number of candidates with this name.
        matches: usize,
    },
}

/// A candidate was created with an empty command.
#[derive(Clone, Debug, Error)]
#[error("a candidate needs a command with at least a program name")]
pub struct EmptyCommandError;

/// Differential testing was requested, but no generator is configured.
#[derive(Clone, Debug, Error)]
#[error("`pantest same` requires a [generator] section with a command in `{config_file}`")]
pub struct MissingGeneratorError {
    config_file: Utf8PathBuf,
}

impl MissingGeneratorError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
        }
    }
}

/// The scratch directory for generated inputs could not be created.
#[derive(Debug, Error)]
#[error("failed to create directory for generated inputs at `{dir}`")]
pub struct ScratchDirCreateError {
    dir: Utf8PathBuf,
    #[source]
    err: std::io::Error,
}

impl ScratchDirCreateError {
    pub(crate) fn new(dir: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self {
            dir: dir.into(),
            err,
        }
    }
}

/// An error that occurred while building a test runner.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TestRunnerBuildError {
    /// An error occurred while creating the Tokio runtime.
    #[error("error creating Tokio runtime")]
    TokioRuntimeCreate(#[source] std::io::Error),
}

/// Errors that occurred while managing test runner Tokio tasks.
#[derive(Debug, Error)]
pub struct TestRunnerExecuteErrors<E> {
    /// An error that occurred while reporting results to the reporter callback.
    pub report_error: Option<E>,

    /// Join errors (typically panics) that occurred while running the test runner.
    pub join_errors: Vec<JoinError>,
}

impl<E: std::error::Error> fmt::Display for TestRunnerExecuteErrors<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(report_error) = &self.report_error {
            write!(f, "error reporting results: {report_error}")?;
        }

        if !self.join_errors.is_empty() {
            if self.report_error.is_some() {
                write!(f, "; ")?;
            }

            write!(f, "errors joining tasks: ")?;

            for (i, join_error) in self.join_errors.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }

                write!(f, "{join_error}")?;
            }
        }

        Ok(())
    }
}

/// An error that occurs while writing an event.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing the event to the provided output.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),
}

/// An error that occurred while running a child process.
///
/// These errors never abort a run: the engine turns them into a status plus a diagnostic message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChildError {
    /// The process could not be started.
    #[error("failed to start `{command}`")]
    Spawn {
        /// The command line, as it would be typed into a shell.
        command: String,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The deadline wrapper terminated the process.
    #[error("`{command}` did not finish within {}s", .timeout.as_secs_f64())]
    TimedOut {
        /// The command line, as it would be typed into a shell.
        command: String,

        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The process exited unsuccessfully.
    #[error("`{command}` failed with {status}{}", format_stderr_tail(.stderr_tail.as_deref()))]
    Failed {
        /// The command line, as it would be typed into a shell.
        command: String,

        /// The exit status of the process.
        status: ExitStatus,

        /// The last non-empty line the process wrote to stderr, if any.
        stderr_tail: Option<String>,
    },

    /// Communicating with the process failed.
    #[error("error communicating with `{command}`")]
    Io {
        /// The command line, as it would be typed into a shell.
        command: String,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },
}

impl ChildError {
    /// Returns true if the deadline wrapper terminated the process.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

fn format_stderr_tail(tail: Option<&str>) -> String {
    match tail {
        Some(tail) => format!(" (stderr: {tail})"),
        None => String::new(),
    }
}

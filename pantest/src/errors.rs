// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use owo_colors::OwoColorize;
use pantest_metadata::PantestExitCode;
use pantest_runner::errors::*;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that stops pantest from completing a run.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to initialize config file")]
    InitConfigFailed {
        #[from]
        err: InitConfigError,
    },
    #[error("failed to read tests")]
    CorpusReadError {
        #[from]
        err: CorpusReadError,
    },
    #[error("candidate lookup error")]
    CandidateLookupError {
        #[from]
        err: CandidateLookupError,
    },
    #[error("generator not configured")]
    MissingGenerator {
        #[from]
        err: MissingGeneratorError,
    },
    #[error("failed to create scratch directory")]
    ScratchDirCreateError {
        #[from]
        err: ScratchDirCreateError,
    },
    #[error("failed to build test runner")]
    TestRunnerBuildError {
        #[from]
        err: TestRunnerBuildError,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
    #[error("error writing event")]
    WriteEventError {
        #[source]
        err: WriteEventError,
    },
    #[error("run panicked")]
    RunPanicked { messages: Vec<String> },
}

impl ExpectedError {
    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Converts the errors of a finished run. Panics take precedence over reporter errors.
    pub(crate) fn from_execute_errors(errors: TestRunnerExecuteErrors<WriteEventError>) -> Self {
        if !errors.join_errors.is_empty() {
            return Self::RunPanicked {
                messages: errors
                    .join_errors
                    .iter()
                    .map(|error| error.to_string())
                    .collect(),
            };
        }
        match errors.report_error {
            Some(err) => Self::WriteEventError { err },
            None => Self::RunPanicked {
                messages: Vec::new(),
            },
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::CorpusReadError { .. }
            | Self::CandidateLookupError { .. }
            | Self::MissingGenerator { .. }
            | Self::ScratchDirCreateError { .. }
            | Self::TestRunnerBuildError { .. } => PantestExitCode::SETUP_ERROR,
            Self::InitConfigFailed { .. } => PantestExitCode::INIT_CONFIG_FAILED,
            Self::WriteOutputError { .. } | Self::WriteEventError { .. } => {
                PantestExitCode::WRITE_OUTPUT_ERROR
            }
            Self::RunPanicked { .. } => PantestExitCode::RUN_PANICKED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse pantest config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::InitConfigFailed { err } => {
                error!("failed to initialize config file");
                Some(err as &dyn Error)
            }
            Self::CorpusReadError { err } => {
                error!("failed to read tests");
                Some(err as &dyn Error)
            }
            Self::CandidateLookupError { err } => {
                error!("{err}");
                err.source()
            }
            Self::MissingGenerator { err } => {
                error!("{err}");
                err.source()
            }
            Self::ScratchDirCreateError { err } => {
                error!("{err}");
                err.source()
            }
            Self::TestRunnerBuildError { err } => {
                error!("failed to build test runner");
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!("error writing output");
                Some(err as &dyn Error)
            }
            Self::WriteEventError { err } => {
                error!("error writing run progress");
                Some(err as &dyn Error)
            }
            Self::RunPanicked { messages } => {
                error!("pantest panicked while running tests");
                for message in messages {
                    error!(target: NO_HEADING_TARGET, "  {message}");
                }
                None
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

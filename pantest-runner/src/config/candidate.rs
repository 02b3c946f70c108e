// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{ConfigParseErrorKind, EmptyCommandError, ScratchDirCreateError};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

/// A named executable under test.
///
/// Candidates are immutable once loaded. The command is guaranteed to be non-empty and the timeout
/// to be positive.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    name: String,
    command: Vec<String>,
    timeout: Duration,
}

impl Candidate {
    /// The default per-test timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

    /// Creates a new candidate.
    ///
    /// If `name` is `None`, the candidate is named after the first token of its command. Fails if
    /// `command` is empty.
    pub fn new(
        name: Option<String>,
        command: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, EmptyCommandError> {
        let Some(program) = command.first() else {
            return Err(EmptyCommandError);
        };
        let name = name.unwrap_or_else(|| program.clone());
        Ok(Self {
            name,
            command,
            timeout,
        })
    }

    /// The name of this candidate, used in the summary and for lookups.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The command line: the program followed by its arguments.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// The wall-clock deadline for a single run.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// The input generator used by differential testing.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    command: Vec<String>,
    scratch_dir: Utf8PathBuf,
    timeout: Duration,
}

impl GeneratorConfig {
    /// The default deadline for a single generator run.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new generator configuration.
    pub fn new(command: Vec<String>, scratch_dir: Utf8PathBuf, timeout: Duration) -> Self {
        Self {
            command,
            scratch_dir,
            timeout,
        }
    }

    /// The command line of the generator. Every run prints one input on standard output.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// The directory generated inputs are written to, one file per round.
    pub fn scratch_dir(&self) -> &Utf8Path {
        &self.scratch_dir
    }

    /// Returns the path of the input generated for `round`.
    pub fn input_path(&self, round: usize) -> Utf8PathBuf {
        self.scratch_dir.join(round.to_string())
    }

    /// The wall-clock deadline for a single generator run.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates the scratch directory and its parents if they don't exist.
    pub fn create_scratch_dir(&self) -> Result<(), ScratchDirCreateError> {
        std::fs::create_dir_all(&self.scratch_dir)
            .map_err(|err| ScratchDirCreateError::new(&self.scratch_dir, err))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct CandidateDeserialize {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    command: Vec<String>,
    #[serde(default = "default_candidate_timeout")]
    timeout: f64,
    #[serde(default)]
    ignore: bool,
}

fn default_candidate_timeout() -> f64 {
    Candidate::DEFAULT_TIMEOUT.as_secs_f64()
}

impl CandidateDeserialize {
    pub(super) fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub(super) fn into_candidate(self, index: usize) -> Result<Candidate, ConfigParseErrorKind> {
        // An empty name is treated the same as a missing one.
        let name = self.name.filter(|name| !name.is_empty());
        if self.command.is_empty() {
            return Err(ConfigParseErrorKind::EmptyCandidateCommand { name, index });
        }

        let name = name.unwrap_or_else(|| self.command[0].clone());
        let Some(timeout) = parse_timeout(self.timeout) else {
            return Err(ConfigParseErrorKind::InvalidCandidateTimeout {
                name,
                timeout: self.timeout,
            });
        };

        Ok(Candidate {
            name,
            command: self.command,
            timeout,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct GeneratorDeserialize {
    #[serde(default)]
    command: Vec<String>,
    #[serde(default = "default_scratch_dir")]
    scratch_dir: Utf8PathBuf,
    #[serde(default = "default_generator_timeout")]
    timeout: f64,
}

fn default_scratch_dir() -> Utf8PathBuf {
    "generated".into()
}

fn default_generator_timeout() -> f64 {
    GeneratorConfig::DEFAULT_TIMEOUT.as_secs_f64()
}

impl GeneratorDeserialize {
    pub(super) fn into_generator(
        self,
        base_dir: &Utf8Path,
    ) -> Result<GeneratorConfig, ConfigParseErrorKind> {
        if self.command.is_empty() {
            return Err(ConfigParseErrorKind::EmptyGeneratorCommand);
        }
        let timeout = parse_timeout(self.timeout).ok_or(
            ConfigParseErrorKind::InvalidGeneratorTimeout {
                timeout: self.timeout,
            },
        )?;

        Ok(GeneratorConfig::new(
            self.command,
            base_dir.join(self.scratch_dir),
            timeout,
        ))
    }
}

/// The smallest deadline the wrapper can be given. Anything shorter would be formatted as 0,
/// which `timeout` treats as no deadline at all.
const MIN_TIMEOUT_SECS: f64 = 0.001;

fn parse_timeout(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs >= MIN_TIMEOUT_SECS {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

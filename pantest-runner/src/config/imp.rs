// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    Candidate, GeneratorConfig,
    candidate::{CandidateDeserialize, GeneratorDeserialize},
};
use crate::errors::{
    CandidateLookupError, ConfigParseError, ConfigParseErrorKind, MissingGeneratorError,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Overall configuration for pantest.
///
/// This is the root data structure for pantest configuration. Most runs will read it with
/// [`PantestConfig::from_file`].
#[derive(Clone, Debug)]
pub struct PantestConfig {
    config_file: Utf8PathBuf,
    max_workers: usize,
    input_dir: Utf8PathBuf,
    ref_dir: Utf8PathBuf,
    timeout_program: String,
    generator: Option<GeneratorConfig>,
    candidates: Vec<Candidate>,
}

impl PantestConfig {
    /// The default location of the config file, relative to the current directory.
    pub const CONFIG_PATH: &'static str = "pantest.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the pantest config from the given file.
    ///
    /// Candidates marked `ignore = true` are dropped, unnamed candidates are named after the first
    /// token of their command, and relative directories are resolved against the directory
    /// containing `config_file`.
    pub fn from_file(config_file: &Utf8Path) -> Result<Self, ConfigParseError> {
        if !config_file.is_file() {
            return Err(ConfigParseError::new(
                config_file,
                ConfigParseErrorKind::NotFound,
            ));
        }

        let builder = Self::make_default_config()
            .add_source(File::new(config_file.as_str(), FileFormat::Toml));
        let (deserialized, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))?;

        if !unknown.is_empty() {
            warn_unknown_keys(config_file, &unknown);
        }

        deserialized
            .into_config(config_file)
            .map_err(|kind| ConfigParseError::new(config_file, kind))
    }

    /// Returns the path this config was read from.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the configured maximum number of simultaneously running children.
    ///
    /// The effective budget is computed by
    /// [`decide_max_workers`](crate::config::decide_max_workers).
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Overrides the configured maximum number of workers, e.g. from the command line.
    pub fn set_max_workers(&mut self, max_workers: usize) -> &mut Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// The directory containing `*.in` files.
    pub fn input_dir(&self) -> &Utf8Path {
        &self.input_dir
    }

    /// The directory containing `*.ref` files.
    pub fn ref_dir(&self) -> &Utf8Path {
        &self.ref_dir
    }

    /// The deadline-enforcing wrapper program.
    pub fn timeout_program(&self) -> &str {
        &self.timeout_program
    }

    /// The candidates to run, in config order. Ignored candidates are not included.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Returns the generator used by differential testing.
    pub fn generator(&self) -> Result<&GeneratorConfig, MissingGeneratorError> {
        self.generator
            .as_ref()
            .ok_or_else(|| MissingGeneratorError::new(&self.config_file))
    }

    /// Looks up a candidate by exact name.
    ///
    /// Fails if no candidate or more than one candidate has this name.
    pub fn find_candidate(&self, name: &str) -> Result<&Candidate, CandidateLookupError> {
        let mut matches = self.candidates.iter().filter(|c| c.name() == name);
        match (matches.next(), matches.count()) {
            (Some(candidate), 0) => Ok(candidate),
            (Some(_), others) => Err(CandidateLookupError::Ambiguous {
                name: name.to_owned(),
                matches: others + 1,
            }),
            (None, _) => Err(CandidateLookupError::NotFound {
                name: name.to_owned(),
                known: self.candidates.iter().map(|c| c.name().to_owned()).collect(),
            }),
        }
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(PantestConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: PantestConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // serde_path_to_error already tracks the key, so drop it from the config error.
                let path = error.path().clone();
                let config_error = error.into_inner();
                let error = match config_error {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

fn warn_unknown_keys(config_file: &Utf8Path, unknown: &BTreeSet<String>) {
    let mut unknown_str = String::new();
    if unknown.len() == 1 {
        // Print this on the same line.
        unknown_str.push_str("key: ");
        unknown_str.push_str(unknown.iter().next().expect("length is 1"));
    } else {
        unknown_str.push_str("keys:\n");
        for ignored_key in unknown {
            unknown_str.push('\n');
            unknown_str.push_str("  - ");
            unknown_str.push_str(ignored_key);
        }
    }

    warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PantestConfigDeserialize {
    max_workers: usize,
    input_dir: Utf8PathBuf,
    ref_dir: Utf8PathBuf,
    timeout_program: String,
    #[serde(default)]
    generator: Option<GeneratorDeserialize>,
    #[serde(default)]
    candidates: Vec<CandidateDeserialize>,
}

impl PantestConfigDeserialize {
    fn into_config(self, config_file: &Utf8Path) -> Result<PantestConfig, ConfigParseErrorKind> {
        if self.max_workers == 0 {
            return Err(ConfigParseErrorKind::ZeroMaxWorkers);
        }

        let base_dir = config_file.parent().unwrap_or(Utf8Path::new(""));

        let generator = self
            .generator
            .map(|generator| generator.into_generator(base_dir))
            .transpose()?;

        let mut candidates = Vec::with_capacity(self.candidates.len());
        for (index, candidate) in self.candidates.into_iter().enumerate() {
            if candidate.is_ignored() {
                debug!("skipping ignored candidate #{}", index + 1);
                continue;
            }
            candidates.push(candidate.into_candidate(index)?);
        }

        Ok(PantestConfig {
            config_file: config_file.to_owned(),
            max_workers: self.max_workers,
            input_dir: base_dir.join(self.input_dir),
            ref_dir: base_dir.join(self.ref_dir),
            timeout_program: self.timeout_program,
            generator,
            candidates,
        })
    }
}

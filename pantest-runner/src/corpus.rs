// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of test fixtures.
//!
//! A fixture is a `<name>.in` file in the input directory paired with a `<name>.ref` file in the
//! reference directory. Fixtures are ordered by the first number embedded in their name.

use crate::errors::CorpusReadError;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::{cmp::Ordering, io, sync::LazyLock};
use tracing::{debug, warn};

static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("number regex is valid"));

/// One test fixture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    name: String,
    locators: Option<FixtureLocators>,
}

/// Where the input and the reference output of a fixture live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixtureLocators {
    /// Path to the `*.in` file.
    pub input_path: Utf8PathBuf,

    /// Path to the `*.ref` file.
    pub ref_path: Utf8PathBuf,
}

impl TestCase {
    /// Creates a test case backed by files on disk.
    pub fn new(
        name: impl Into<String>,
        input_path: impl Into<Utf8PathBuf>,
        ref_path: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            locators: Some(FixtureLocators {
                input_path: input_path.into(),
                ref_path: ref_path.into(),
            }),
        }
    }

    /// Creates a placeholder for a generated round. Placeholders have no files.
    pub fn placeholder(round: usize) -> Self {
        Self {
            name: round.to_string(),
            locators: None,
        }
    }

    /// The name of the fixture: the input file name without its extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The input and reference paths, or `None` for a placeholder.
    pub fn locators(&self) -> Option<&FixtureLocators> {
        self.locators.as_ref()
    }

    /// The first number embedded in the name, or -1 if there is none.
    pub fn number(&self) -> i64 {
        extract_number(&self.name)
    }

    /// Compares two test cases by embedded number, then by name.
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        self.number()
            .cmp(&other.number())
            .then_with(|| self.name.cmp(&other.name))
    }
}

fn extract_number(name: &str) -> i64 {
    NUMBER_REGEX
        .find(name)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(-1)
}

/// An ordered list of test cases.
#[derive(Clone, Debug, Default)]
pub struct TestCorpus {
    cases: Vec<TestCase>,
}

impl TestCorpus {
    /// Builds a corpus from an explicit list of cases, sorting them in natural order.
    pub fn new(mut cases: Vec<TestCase>) -> Self {
        cases.sort_by(TestCase::natural_cmp);
        Self { cases }
    }

    /// Discovers fixtures in `input_dir`, pairing each `<name>.in` with `<ref_dir>/<name>.ref`.
    ///
    /// Subdirectories and files without the `.in` extension are ignored. An input whose
    /// reference file does not exist is skipped with a warning.
    pub fn discover(input_dir: &Utf8Path, ref_dir: &Utf8Path) -> Result<Self, CorpusReadError> {
        let read_dir_err = |err| CorpusReadError::ReadInputDir {
            input_dir: input_dir.to_owned(),
            err,
        };

        let mut cases = Vec::new();
        for entry in input_dir.read_dir_utf8().map_err(read_dir_err)? {
            let entry = entry.map_err(read_dir_err)?;
            let path = entry.path();
            if path.extension() != Some("in") {
                continue;
            }
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => continue,
                Ok(_) => {}
                Err(err) => {
                    warn!("could not read file type of {path}, skipping: {err}");
                    continue;
                }
            }
            let Some(name) = path.file_stem() else {
                continue;
            };

            let ref_path = ref_dir.join(format!("{name}.ref"));
            match ref_path.metadata() {
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    warn!("could not find {ref_path}. Skipping...");
                    continue;
                }
                // Any other error surfaces when the fixture is read.
                Ok(_) | Err(_) => {}
            }

            debug!(%name, "discovered test case");
            cases.push(TestCase::new(name, path, ref_path));
        }

        Ok(Self::new(cases))
    }

    /// Creates `rounds` placeholder cases named `0..rounds`, used to size the status grid of a
    /// differential run.
    pub fn placeholders(rounds: usize) -> Self {
        Self {
            cases: (0..rounds).map(TestCase::placeholder).collect(),
        }
    }

    /// Returns the test cases in order.
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Returns the number of test cases.
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns true if the corpus has no test cases.
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::{Result, ensure, eyre};
use pantest_runner::{
    config::Candidate,
    reporter::{ReporterEvent, RunMode, Status, TestEvent},
    runner::{TestRunner, TestRunnerBuilder},
};
use std::{collections::BTreeMap, time::Duration};

/// A temporary directory holding an input dir, a ref dir and a scratch dir.
pub(crate) struct Workspace {
    dir: Utf8TempDir,
}

impl Workspace {
    pub(crate) fn new() -> Result<Self> {
        let dir = Utf8TempDir::new()?;
        for sub in ["in", "ref", "generated"] {
            std::fs::create_dir(dir.path().join(sub))?;
        }
        Ok(Self { dir })
    }

    pub(crate) fn input_dir(&self) -> Utf8PathBuf {
        self.dir.path().join("in")
    }

    pub(crate) fn ref_dir(&self) -> Utf8PathBuf {
        self.dir.path().join("ref")
    }

    pub(crate) fn scratch_dir(&self) -> Utf8PathBuf {
        self.dir.path().join("generated")
    }

    /// Writes `<name>.in` and `<name>.ref`.
    pub(crate) fn add_fixture(&self, name: &str, input: &str, reference: &str) -> Result<()> {
        self.add_input(name, input)?;
        std::fs::write(self.ref_dir().join(format!("{name}.ref")), reference)?;
        Ok(())
    }

    /// Writes `<name>.in` only.
    pub(crate) fn add_input(&self, name: &str, input: &str) -> Result<()> {
        std::fs::write(self.input_dir().join(format!("{name}.in")), input)?;
        Ok(())
    }

    pub(crate) fn scratch_files(&self) -> Result<Vec<String>> {
        list_dir(&self.scratch_dir())
    }
}

fn list_dir(dir: &Utf8Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in dir.read_dir_utf8()? {
        names.push(entry?.file_name().to_owned());
    }
    names.sort();
    Ok(names)
}

/// A candidate running `sh -c <script>`.
pub(crate) fn sh_candidate(name: &str, script: &str, timeout: Duration) -> Candidate {
    Candidate::new(
        Some(name.to_owned()),
        vec!["sh".to_owned(), "-c".to_owned(), script.to_owned()],
        timeout,
    )
    .expect("sh command is non-empty")
}

pub(crate) fn runner(workers: usize) -> Result<TestRunner> {
    let mut builder = TestRunnerBuilder::default();
    builder.set_workers(workers);
    Ok(builder.build()?)
}

/// Everything a run reported, in order.
#[derive(Debug, Default)]
pub(crate) struct RecordedRun {
    pub(crate) started: Option<(RunMode, Vec<String>, usize)>,
    pub(crate) events: Vec<TestEvent>,
    pub(crate) finished: bool,
    out_of_order: Vec<String>,
}

impl RecordedRun {
    pub(crate) fn record(&mut self, event: ReporterEvent) {
        match event {
            ReporterEvent::RunStarted {
                mode,
                candidate_names,
                unit_count,
            } => {
                if self.started.is_some() || !self.events.is_empty() || self.finished {
                    self.out_of_order.push("RunStarted was not first".to_owned());
                }
                self.started = Some((mode, candidate_names, unit_count));
            }
            ReporterEvent::Test(event) => {
                if self.started.is_none() || self.finished {
                    self.out_of_order
                        .push(format!("test event outside of the run: {event:?}"));
                }
                self.events.push(event);
            }
            ReporterEvent::RunFinished { .. } => {
                if self.finished {
                    self.out_of_order.push("RunFinished sent twice".to_owned());
                }
                self.finished = true;
            }
        }
    }

    /// Checks the event protocol for every (candidate, unit) pair: at least one announcement,
    /// then exactly one terminal status, and nothing after it.
    pub(crate) fn check_protocol(&self) -> Result<()> {
        ensure!(
            self.out_of_order.is_empty(),
            "run events out of order: {:?}",
            self.out_of_order
        );
        ensure!(self.finished, "run did not finish");
        let (_, names, unit_count) = self
            .started
            .as_ref()
            .ok_or_else(|| eyre!("run did not start"))?;

        let history = self.history();
        for candidate in 0..names.len() {
            for unit in 0..*unit_count {
                let statuses = history
                    .get(&(candidate, unit))
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let (last, announcements) = statuses
                    .split_last()
                    .ok_or_else(|| eyre!("no events for {candidate}/{unit}"))?;
                ensure!(
                    last.is_terminal(),
                    "last status for {candidate}/{unit} is not terminal: {statuses:?}"
                );
                ensure!(
                    !announcements.is_empty()
                        && announcements.iter().all(|status| !status.is_terminal()),
                    "bad announcements for {candidate}/{unit}: {statuses:?}"
                );
                ensure!(
                    !statuses.contains(&Status::None),
                    "NONE sent for {candidate}/{unit}"
                );
            }
        }
        Ok(())
    }

    /// Statuses per (candidate, unit), in the order they were received.
    pub(crate) fn history(&self) -> BTreeMap<(usize, usize), Vec<Status>> {
        let mut history: BTreeMap<_, Vec<_>> = BTreeMap::new();
        for event in &self.events {
            history
                .entry((event.candidate_index(), event.test_index()))
                .or_default()
                .push(event.status());
        }
        history
    }

    /// The terminal event for a (candidate, unit) pair.
    pub(crate) fn terminal(&self, candidate: usize, unit: usize) -> Option<&TestEvent> {
        self.events.iter().find(|event| {
            event.candidate_index() == candidate
                && event.test_index() == unit
                && event.status().is_terminal()
        })
    }

    /// Terminal statuses of a candidate, ordered by unit.
    pub(crate) fn terminal_statuses(&self, candidate: usize) -> Vec<Status> {
        let mut statuses: Vec<_> = self
            .events
            .iter()
            .filter(|event| event.candidate_index() == candidate && event.status().is_terminal())
            .map(|event| (event.test_index(), event.status()))
            .collect();
        statuses.sort();
        statuses.into_iter().map(|(_, status)| status).collect()
    }
}

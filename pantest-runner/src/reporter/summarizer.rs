// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::events::{RunMode, Status, TestEvent};
use std::collections::BTreeMap;
use swrite::{SWrite, swrite, swriteln};

/// Per-status occurrence counts for one candidate. Counts only ever go up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerdictCounter {
    counts: BTreeMap<Status, usize>,
}

impl VerdictCounter {
    /// Records one occurrence of `status`.
    pub fn add(&mut self, status: Status) {
        *self.counts.entry(status).or_default() += 1;
    }

    /// Returns how many times `status` was recorded.
    pub fn get(&self, status: Status) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Returns the number of terminal statuses recorded.
    pub fn terminal_count(&self) -> usize {
        self.counts
            .iter()
            .filter(|(status, _)| status.is_terminal())
            .map(|(_, count)| count)
            .sum()
    }
}

/// Aggregates a stream of [`TestEvent`]s into per-candidate counts and a diagnostic log.
#[derive(Clone, Debug)]
pub struct Summarizer {
    names: Vec<String>,
    counters: Vec<VerdictCounter>,
    messages: Vec<String>,
}

impl Summarizer {
    /// Creates a summarizer for the given candidates.
    pub fn new(names: Vec<String>) -> Self {
        let counters = vec![VerdictCounter::default(); names.len()];
        Self {
            names,
            counters,
            messages: Vec::new(),
        }
    }

    /// Records an event.
    ///
    /// # Panics
    ///
    /// Panics if the event refers to a candidate this summarizer was not created with.
    pub fn ingest(&mut self, event: &TestEvent) {
        let index = event.candidate_index();
        self.counters[index].add(event.status());

        let name = &self.names[index];
        for message in event.messages() {
            self.messages
                .push(format!("{name}: Test {}: {message}", event.test_index()));
        }
    }

    /// The counters, index-aligned with the candidate names.
    pub fn counters(&self) -> &[VerdictCounter] {
        &self.counters
    }

    /// Diagnostic lines, in ingestion order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Renders the final summary.
    pub fn summary(&self, mode: RunMode) -> String {
        let width = self
            .names
            .iter()
            .map(|name| name.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for (i, (name, counter)) in self.names.iter().zip(&self.counters).enumerate() {
            swrite!(out, "{}. {name:<width$}", i + 1);
            match mode {
                RunMode::Run => {
                    swrite!(out, "   OK {:2}", counter.get(Status::Ok));
                    swrite!(out, " | WA {:2}", counter.get(Status::WrongAnswer));
                }
                RunMode::Same => {
                    swrite!(out, "   SAME {:2}", counter.get(Status::Same));
                    swrite!(out, " | DIFF {:2}", counter.get(Status::Mismatch));
                }
            }
            swrite!(out, " | TLE {:2}", counter.get(Status::TimeLimitExceeded));

            let failed = counter.get(Status::Failed);
            if failed > 0 {
                swrite!(out, " ({failed} failed)");
            }
            let uncompared = counter.get(Status::Uncompared);
            if mode == RunMode::Same && uncompared > 0 {
                swrite!(out, " ({uncompared} uncompared)");
            }
            out.push('\n');
        }

        if !self.messages.is_empty() {
            out.push('\n');
            for message in &self.messages {
                swriteln!(out, "{message}");
            }
        }

        out
    }
}

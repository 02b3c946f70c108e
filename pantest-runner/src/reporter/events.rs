// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{fmt, time::Duration};

/// Which kind of run is being reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Candidates are run against a corpus of fixtures (`pantest run`).
    Run,

    /// Two candidates are compared on generated inputs (`pantest same`).
    Same,
}

/// The outcome, or progress, of one candidate on one test or round.
///
/// Statuses form a stable, enumerable set of tags. How they are drawn is up to the reporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    /// No information yet. Never sent for a real test.
    None,

    /// The candidate is about to run.
    Starting,

    /// The input for a round is being generated.
    Generating,

    /// The fixture could not be read, the input could not be generated, or the candidate exited
    /// unsuccessfully.
    Failed,

    /// The candidate's output did not match the reference output.
    WrongAnswer,

    /// The candidate exceeded its timeout.
    TimeLimitExceeded,

    /// The candidate's output matched the reference output.
    Ok,

    /// Both candidates produced equivalent outputs.
    Same,

    /// The candidates produced different outputs.
    Mismatch,

    /// The candidate ran successfully, but its sibling failed so no comparison happened.
    Uncompared,
}

impl Status {
    /// Every status, in declaration order.
    pub const ALL: [Status; 10] = [
        Status::None,
        Status::Starting,
        Status::Generating,
        Status::Failed,
        Status::WrongAnswer,
        Status::TimeLimitExceeded,
        Status::Ok,
        Status::Same,
        Status::Mismatch,
        Status::Uncompared,
    ];

    /// Returns true if this status ends a (candidate, test) pair.
    pub fn is_terminal(self) -> bool {
        match self {
            Status::None | Status::Starting | Status::Generating => false,
            Status::Failed
            | Status::WrongAnswer
            | Status::TimeLimitExceeded
            | Status::Ok
            | Status::Same
            | Status::Mismatch
            | Status::Uncompared => true,
        }
    }

    /// A stable tag for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::None => "NONE",
            Status::Starting => "STARTING",
            Status::Generating => "GENERATING",
            Status::Failed => "FAILED",
            Status::WrongAnswer => "WRONG_ANSWER",
            Status::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Status::Ok => "OK",
            Status::Same => "SAME",
            Status::Mismatch => "MISMATCH",
            Status::Uncompared => "UNCOMPARED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An update about one candidate on one test (or round).
///
/// Events are immutable values. The `with_*` methods return a new event and leave `self`
/// untouched, so a base event fixing the indexes can be reused for every update of a test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEvent {
    candidate_index: usize,
    test_index: usize,
    status: Status,
    messages: Vec<String>,
}

impl TestEvent {
    /// Creates a base event with [`Status::None`] and no messages.
    pub fn new(candidate_index: usize, test_index: usize) -> Self {
        Self {
            candidate_index,
            test_index,
            status: Status::None,
            messages: Vec::new(),
        }
    }

    /// Returns a copy of this event for another candidate.
    #[must_use]
    pub fn with_candidate(&self, candidate_index: usize) -> Self {
        Self {
            candidate_index,
            ..self.clone()
        }
    }

    /// Returns a copy of this event for another test.
    #[must_use]
    pub fn with_test(&self, test_index: usize) -> Self {
        Self {
            test_index,
            ..self.clone()
        }
    }

    /// Returns a copy of this event with the given status.
    #[must_use]
    pub fn with_status(&self, status: Status) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Returns a copy of this event with `message` appended.
    #[must_use]
    pub fn with_message(&self, message: impl Into<String>) -> Self {
        let mut messages = self.messages.clone();
        messages.push(message.into());
        Self {
            messages,
            ..self.clone()
        }
    }

    /// The index of the candidate, in the order candidates were passed to the runner.
    pub fn candidate_index(&self) -> usize {
        self.candidate_index
    }

    /// The index of the test (mode A) or round (mode B).
    pub fn test_index(&self) -> usize {
        self.test_index
    }

    /// The status carried by this event.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Diagnostic messages, in the order they were added.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// An event consumed by a [`TestReporter`](super::TestReporter).
#[derive(Clone, Debug)]
pub enum ReporterEvent {
    /// The run started. Sent exactly once, before any other event.
    RunStarted {
        /// The kind of run.
        mode: RunMode,

        /// Candidate names, index-aligned with [`TestEvent::candidate_index`].
        candidate_names: Vec<String>,

        /// The number of tests (mode A) or rounds (mode B).
        unit_count: usize,
    },

    /// A candidate made progress on a test.
    Test(TestEvent),

    /// Every task finished. Sent exactly once, last.
    RunFinished {
        /// The time the run took.
        elapsed: Duration,
    },
}

// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::differential::{RoundContext, run_round};
use crate::{
    compare::compatible_outputs,
    config::{Candidate, GeneratorConfig, decide_max_workers},
    corpus::{TestCase, TestCorpus},
    errors::{
        ChildError, DisplayErrorChain, TestRunnerBuildError, TestRunnerExecuteErrors,
    },
    process::{ChildInput, ProcessRunner},
    reporter::{ReporterEvent, RunMode, Status, TestEvent},
};
use bytes::Bytes;
use std::{
    convert::Infallible,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{
    runtime::Runtime,
    sync::{Semaphore, mpsc},
    task::{JoinError, JoinSet},
};
use tracing::debug;

/// Test runner options.
#[derive(Debug, Default)]
pub struct TestRunnerBuilder {
    workers: Option<usize>,
    timeout_program: Option<String>,
}

impl TestRunnerBuilder {
    /// The deadline wrapper used if none is set.
    pub const DEFAULT_TIMEOUT_PROGRAM: &'static str = "timeout";

    /// Sets the number of child processes allowed to run at the same time.
    ///
    /// This is usually computed with [`decide_max_workers`]. Values below 1 are raised to 1.
    pub fn set_workers(&mut self, workers: usize) -> &mut Self {
        self.workers = Some(workers.max(1));
        self
    }

    /// Sets the deadline wrapper every child is started through.
    pub fn set_timeout_program(&mut self, timeout_program: impl Into<String>) -> &mut Self {
        self.timeout_program = Some(timeout_program.into());
        self
    }

    /// Creates a new test runner.
    pub fn build(self) -> Result<TestRunner, TestRunnerBuildError> {
        let workers = self
            .workers
            .unwrap_or_else(|| decide_max_workers(usize::MAX));
        let timeout_program = self
            .timeout_program
            .unwrap_or_else(|| Self::DEFAULT_TIMEOUT_PROGRAM.to_owned());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("pantest-runner-worker")
            .build()
            .map_err(TestRunnerBuildError::TokioRuntimeCreate)?;

        Ok(TestRunner {
            workers,
            process_runner: ProcessRunner::new(timeout_program),
            runtime,
        })
    }
}

/// Statistics for a completed run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// The number of tests (run mode) or rounds (same mode).
    pub unit_count: usize,

    /// The number of terminal statuses received for each candidate.
    ///
    /// Unless a task panicked, every entry equals `unit_count`.
    pub finished: Vec<usize>,

    /// The time the run took.
    pub elapsed: Duration,
}

/// Context for running tests.
///
/// Created using [`TestRunnerBuilder::build`].
#[derive(Debug)]
pub struct TestRunner {
    workers: usize,
    process_runner: ProcessRunner,
    runtime: Runtime,
}

impl TestRunner {
    /// The maximum number of child processes running at the same time.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every candidate against every test in `corpus`.
    ///
    /// Accepts a callback that is called with every event of the run.
    ///
    /// Returns an error if any of the tasks panicked.
    pub fn execute_run<F>(
        self,
        corpus: &TestCorpus,
        candidates: &[Candidate],
        mut callback: F,
    ) -> Result<RunStats, TestRunnerExecuteErrors<Infallible>>
    where
        F: FnMut(ReporterEvent),
    {
        self.try_execute_run::<Infallible, _>(corpus, candidates, |event| {
            callback(event);
            Ok(())
        })
    }

    /// Runs every candidate against every test in `corpus`, with a fallible callback.
    ///
    /// One task is started per candidate. A candidate runs its tests in order, but candidates run
    /// concurrently, sharing the worker budget.
    ///
    /// If the callback returns an error, the run still completes (children are never cancelled)
    /// but the callback is no longer called. The first error is returned at the end.
    pub fn try_execute_run<E, F>(
        self,
        corpus: &TestCorpus,
        candidates: &[Candidate],
        callback: F,
    ) -> Result<RunStats, TestRunnerExecuteErrors<E>>
    where
        F: FnMut(ReporterEvent) -> Result<(), E>,
    {
        let started = ReporterEvent::RunStarted {
            mode: RunMode::Run,
            candidate_names: candidates.iter().map(|c| c.name().to_owned()).collect(),
            unit_count: corpus.len(),
        };
        let corpus = Arc::new(corpus.clone());
        let process_runner = self.process_runner.clone();

        self.try_execute_impl(
            started,
            candidates.len(),
            corpus.len(),
            |join_set, sender, semaphore| {
                for (index, candidate) in candidates.iter().enumerate() {
                    join_set.spawn(run_candidate(
                        CandidateContext {
                            index,
                            candidate: candidate.clone(),
                            corpus: corpus.clone(),
                            process_runner: process_runner.clone(),
                        },
                        semaphore.clone(),
                        sender.clone(),
                    ));
                }
            },
            callback,
        )
    }

    /// Compares two candidates on `rounds` inputs produced by `generator`.
    ///
    /// The generator's scratch directory must exist; see
    /// [`GeneratorConfig::create_scratch_dir`].
    ///
    /// Returns an error if any of the tasks panicked.
    pub fn execute_same<F>(
        self,
        rounds: usize,
        candidates: [&Candidate; 2],
        generator: &GeneratorConfig,
        mut callback: F,
    ) -> Result<RunStats, TestRunnerExecuteErrors<Infallible>>
    where
        F: FnMut(ReporterEvent),
    {
        self.try_execute_same::<Infallible, _>(rounds, candidates, generator, |event| {
            callback(event);
            Ok(())
        })
    }

    /// Compares two candidates on `rounds` generated inputs, with a fallible callback.
    ///
    /// One task is started per round, and every round holds one worker slot from generation to
    /// comparison. Callback errors are handled as in [`Self::try_execute_run`].
    pub fn try_execute_same<E, F>(
        self,
        rounds: usize,
        candidates: [&Candidate; 2],
        generator: &GeneratorConfig,
        callback: F,
    ) -> Result<RunStats, TestRunnerExecuteErrors<E>>
    where
        F: FnMut(ReporterEvent) -> Result<(), E>,
    {
        let started = ReporterEvent::RunStarted {
            mode: RunMode::Same,
            candidate_names: candidates.iter().map(|c| c.name().to_owned()).collect(),
            unit_count: rounds,
        };
        let ctx = Arc::new(RoundContext {
            process_runner: self.process_runner.clone(),
            candidates: candidates.map(Candidate::clone),
            generator: generator.clone(),
        });

        self.try_execute_impl(
            started,
            candidates.len(),
            rounds,
            |join_set, sender, semaphore| {
                for round in 0..rounds {
                    join_set.spawn(run_round(
                        ctx.clone(),
                        round,
                        semaphore.clone(),
                        sender.clone(),
                    ));
                }
            },
            callback,
        )
    }

    fn try_execute_impl<E, F, S>(
        self,
        started: ReporterEvent,
        candidate_count: usize,
        unit_count: usize,
        spawn_tasks: S,
        mut callback: F,
    ) -> Result<RunStats, TestRunnerExecuteErrors<E>>
    where
        F: FnMut(ReporterEvent) -> Result<(), E>,
        S: FnOnce(&mut JoinSet<()>, EventSender, Arc<Semaphore>),
    {
        // Once the callback fails it is no longer called, but the run carries on.
        let mut first_error = None;
        let mut report = |event: ReporterEvent| {
            if first_error.is_none() {
                if let Err(error) = callback(event) {
                    first_error = Some(error);
                }
            }
        };

        let start = Instant::now();
        report(started);

        let mut finished = vec![0; candidate_count];
        let semaphore = Arc::new(Semaphore::new(self.workers));
        debug!(workers = self.workers, unit_count, "starting run");

        let join_errors: Vec<JoinError> = self.runtime.block_on(async {
            let (sender, mut receiver) = mpsc::channel(1);
            let mut join_set = JoinSet::new();
            spawn_tasks(&mut join_set, EventSender(sender), semaphore);

            // The channel closes once every task has finished (or panicked).
            while let Some(event) = receiver.recv().await {
                if event.status().is_terminal() {
                    finished[event.candidate_index()] += 1;
                }
                report(ReporterEvent::Test(event));
            }

            let mut join_errors = Vec::new();
            while let Some(res) = join_set.join_next().await {
                if let Err(error) = res {
                    join_errors.push(error);
                }
            }
            join_errors
        });

        let elapsed = start.elapsed();
        report(ReporterEvent::RunFinished { elapsed });

        // Children are killed on drop, so there's nothing left to wait for.
        self.runtime.shutdown_background();

        let stats = RunStats {
            unit_count,
            finished,
            elapsed,
        };
        match (join_errors.is_empty(), first_error) {
            (true, None) => Ok(stats),
            (_, report_error) => Err(TestRunnerExecuteErrors {
                report_error,
                join_errors,
            }),
        }
    }
}

/// The producing side of the event channel, cloned into every task.
#[derive(Clone, Debug)]
pub(super) struct EventSender(mpsc::Sender<TestEvent>);

impl EventSender {
    /// Sends an event, waiting until the consumer has room for it.
    pub(super) async fn send(&self, event: TestEvent) {
        // The receiver is only dropped after every sender is gone.
        let _ = self.0.send(event).await;
    }
}

struct CandidateContext {
    index: usize,
    candidate: Candidate,
    corpus: Arc<TestCorpus>,
    process_runner: ProcessRunner,
}

async fn run_candidate(ctx: CandidateContext, semaphore: Arc<Semaphore>, sender: EventSender) {
    let base = TestEvent::new(ctx.index, 0);
    for (test_index, case) in ctx.corpus.cases().iter().enumerate() {
        let _permit = semaphore
            .acquire()
            .await
            .expect("the worker semaphore is never closed");
        debug!(
            candidate = ctx.candidate.name(),
            test = case.name(),
            "running test"
        );
        let event = run_test(&ctx, case, base.with_test(test_index), &sender).await;
        sender.send(event).await;
    }
}

/// Runs one test and returns the terminal event for it.
async fn run_test(
    ctx: &CandidateContext,
    case: &TestCase,
    base: TestEvent,
    sender: &EventSender,
) -> TestEvent {
    sender.send(base.with_status(Status::Starting)).await;

    let Some(locators) = case.locators() else {
        return base
            .with_status(Status::Failed)
            .with_message(format!("test {} has no input file", case.name()));
    };
    let input = match tokio::fs::read(&locators.input_path).await {
        Ok(input) => input,
        Err(err) => {
            return base
                .with_status(Status::Failed)
                .with_message(format!("failed to read input: {err}"));
        }
    };
    let reference = match tokio::fs::read(&locators.ref_path).await {
        Ok(reference) => reference,
        Err(err) => {
            return base
                .with_status(Status::Failed)
                .with_message(format!("failed to read ref: {err}"));
        }
    };

    let res = ctx
        .process_runner
        .run(
            ctx.candidate.command(),
            ctx.candidate.timeout(),
            ChildInput::Bytes(Bytes::from(input)),
        )
        .await;
    match res {
        Ok(output) if compatible_outputs(&output, &reference) => base.with_status(Status::Ok),
        Ok(_) => base.with_status(Status::WrongAnswer),
        Err(error) => child_failure(&base, &error),
    }
}

/// Maps a failed child to a terminal event: TLE for timeouts, FAILED otherwise.
pub(super) fn child_failure(base: &TestEvent, error: &ChildError) -> TestEvent {
    if error.is_timeout() {
        base.with_status(Status::TimeLimitExceeded)
            .with_message(format!("timed out: {error}"))
    } else {
        base.with_status(Status::Failed)
            .with_message(format!("failed to run: {}", DisplayErrorChain::new(error)))
    }
}

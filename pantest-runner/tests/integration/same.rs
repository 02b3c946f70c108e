// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use pantest_runner::{
    config::{Candidate, GeneratorConfig},
    reporter::{RunMode, Status},
};
use pretty_assertions::assert_eq;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(1);

fn generator(workspace: &Workspace, script: &str) -> GeneratorConfig {
    GeneratorConfig::new(
        vec!["sh".to_owned(), "-c".to_owned(), script.to_owned()],
        workspace.scratch_dir(),
        Duration::from_secs(5),
    )
}

fn cat(name: &str) -> Candidate {
    Candidate::new(Some(name.to_owned()), vec!["cat".to_owned()], TIMEOUT)
        .expect("cat command is non-empty")
}

fn execute(
    rounds: usize,
    candidates: [&Candidate; 2],
    generator: &GeneratorConfig,
) -> Result<RecordedRun> {
    generator.create_scratch_dir()?;
    let mut recorded = RecordedRun::default();
    let stats = runner(3)?.execute_same(rounds, candidates, generator, |event| {
        recorded.record(event);
    })?;

    ensure!(
        stats.finished == [rounds, rounds],
        "both candidates finish every round: {stats:?}"
    );
    recorded.check_protocol()?;
    check_rounds(&recorded, rounds)?;
    Ok(recorded)
}

/// Every round generates before starting anything, and ends with a matched pair of statuses.
fn check_rounds(recorded: &RecordedRun, rounds: usize) -> Result<()> {
    let history = recorded.history();
    for round in 0..rounds {
        for candidate in 0..2 {
            let statuses = &history[&(candidate, round)];
            ensure!(
                statuses[0] == Status::Generating,
                "round {round} of candidate {candidate} did not start by generating: {statuses:?}"
            );
        }

        let first = recorded.terminal(0, round).map(|event| event.status());
        let second = recorded.terminal(1, round).map(|event| event.status());
        let paired = match (first, second) {
            (Some(Status::Same), Some(Status::Same))
            | (Some(Status::Mismatch), Some(Status::Mismatch)) => true,
            (Some(first), Some(second)) => {
                let failed = |status: Status| {
                    matches!(status, Status::Failed | Status::TimeLimitExceeded)
                };
                (failed(first) || failed(second))
                    && [first, second]
                        .iter()
                        .all(|&status| failed(status) || status == Status::Uncompared)
            }
            _ => false,
        };
        ensure!(paired, "round {round} is not paired: {first:?} / {second:?}");
    }
    Ok(())
}

#[test]
fn identical_candidates_are_same() -> Result<()> {
    let workspace = Workspace::new()?;
    let generator = generator(&workspace, "echo $$");
    let (a, b) = (cat("a"), cat("b"));

    let recorded = execute(3, [&a, &b], &generator)?;
    assert_eq!(recorded.terminal_statuses(0), [Status::Same; 3]);
    assert_eq!(recorded.terminal_statuses(1), [Status::Same; 3]);
    assert_eq!(
        recorded.started,
        Some((RunMode::Same, vec!["a".to_owned(), "b".to_owned()], 3))
    );

    // Inputs both candidates agreed on are deleted.
    assert_eq!(workspace.scratch_files()?, Vec::<String>::new());
    Ok(())
}

#[test]
fn both_candidates_read_the_whole_input() -> Result<()> {
    let workspace = Workspace::new()?;
    let generator = generator(&workspace, "printf '3\\n1 2 3\\n'");
    let a = Candidate::new(
        Some("sum".to_owned()),
        vec![
            "sh".to_owned(),
            "-c".to_owned(),
            "read n; read a b c; echo $((a + b + c))".to_owned(),
        ],
        TIMEOUT,
    )?;
    let b = Candidate::new(
        Some("tail".to_owned()),
        vec![
            "sh".to_owned(),
            "-c".to_owned(),
            "read n; read a b c; echo $((n * 2))".to_owned(),
        ],
        TIMEOUT,
    )?;

    let recorded = execute(2, [&a, &b], &generator)?;
    assert_eq!(recorded.terminal_statuses(0), [Status::Same; 2]);
    Ok(())
}

#[test]
fn different_outputs_mismatch() -> Result<()> {
    let workspace = Workspace::new()?;
    let generator = generator(&workspace, "echo 1");
    let a = cat("a");
    let b = sh_candidate("b", "echo 2", TIMEOUT);

    let recorded = execute(2, [&a, &b], &generator)?;
    assert_eq!(recorded.terminal_statuses(0), [Status::Mismatch; 2]);
    assert_eq!(recorded.terminal_statuses(1), [Status::Mismatch; 2]);

    // Inputs the candidates disagree on are kept for inspection.
    assert_eq!(workspace.scratch_files()?, ["0", "1"]);
    Ok(())
}

#[test]
fn failed_cleanup_is_reported_without_changing_statuses() -> Result<()> {
    let workspace = Workspace::new()?;
    let generator = generator(&workspace, "echo 1");
    let a = cat("a");
    // Agrees with `a`, then swaps the input for a non-empty directory, which can't be unlinked.
    let input_path = workspace.scratch_dir().join("0");
    let b = sh_candidate(
        "b",
        &format!("cat; rm '{input_path}' && mkdir '{input_path}' && touch '{input_path}/keep'"),
        TIMEOUT,
    );

    let recorded = execute(1, [&a, &b], &generator)?;
    assert_eq!(recorded.terminal_statuses(0), [Status::Same]);
    assert_eq!(recorded.terminal_statuses(1), [Status::Same]);

    let first = recorded.terminal(0, 0).expect("terminal event recorded");
    assert_eq!(first.messages().len(), 1, "messages: {:?}", first.messages());
    assert!(
        first.messages()[0].starts_with(&format!("failed to remove {input_path}:")),
        "unexpected messages: {:?}",
        first.messages()
    );
    let second = recorded.terminal(1, 0).expect("terminal event recorded");
    assert!(second.messages().is_empty());
    Ok(())
}

#[test]
fn partial_failure_is_uncompared() -> Result<()> {
    let workspace = Workspace::new()?;
    let generator = generator(&workspace, "echo 1");
    let a = cat("a");
    let b = sh_candidate("b", "exit 1", TIMEOUT);

    let recorded = execute(2, [&a, &b], &generator)?;
    assert_eq!(recorded.terminal_statuses(0), [Status::Uncompared; 2]);
    assert_eq!(recorded.terminal_statuses(1), [Status::Failed; 2]);

    let failed = recorded.terminal(1, 0).expect("terminal event recorded");
    assert!(
        failed.messages()[0].starts_with("failed to run: `sh -c 'exit 1'` failed with"),
        "unexpected messages: {:?}",
        failed.messages()
    );
    Ok(())
}

#[test]
fn timeouts_are_tle() -> Result<()> {
    let workspace = Workspace::new()?;
    let generator = generator(&workspace, "echo 1");
    let a = Candidate::new(
        Some("slow".to_owned()),
        vec!["sleep".to_owned(), "5".to_owned()],
        Duration::from_millis(300),
    )?;
    let b = cat("b");

    let recorded = execute(1, [&a, &b], &generator)?;
    assert_eq!(recorded.terminal_statuses(0), [Status::TimeLimitExceeded]);
    assert_eq!(recorded.terminal_statuses(1), [Status::Uncompared]);
    Ok(())
}

#[test]
fn generator_failure_fails_both() -> Result<()> {
    let workspace = Workspace::new()?;
    let generator = generator(&workspace, "exit 2");
    let (a, b) = (cat("a"), cat("b"));

    let recorded = execute(2, [&a, &b], &generator)?;
    assert_eq!(recorded.terminal_statuses(0), [Status::Failed; 2]);
    assert_eq!(recorded.terminal_statuses(1), [Status::Failed; 2]);

    // Only the first candidate carries the diagnostic.
    let first = recorded.terminal(0, 0).expect("terminal event recorded");
    assert_eq!(first.messages().len(), 1);
    assert!(
        first.messages()[0].starts_with("failed to generate input:"),
        "unexpected messages: {:?}",
        first.messages()
    );
    let second = recorded.terminal(1, 0).expect("terminal event recorded");
    assert!(second.messages().is_empty());

    // Candidates never start when there is no input.
    let history = recorded.history();
    assert!(
        history
            .values()
            .all(|statuses| !statuses.contains(&Status::Starting)),
        "unexpected history: {history:?}"
    );
    Ok(())
}

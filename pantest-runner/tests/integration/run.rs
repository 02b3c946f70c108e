// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use pantest_runner::{
    config::Candidate,
    corpus::TestCorpus,
    reporter::{ReporterEvent, RunMode, Status, Summarizer},
};
use pretty_assertions::assert_eq;
use std::time::Duration;
use test_case::test_case;

const TIMEOUT: Duration = Duration::from_secs(1);

fn execute(workspace: &Workspace, candidates: &[Candidate], workers: usize) -> Result<RecordedRun> {
    let corpus = TestCorpus::discover(&workspace.input_dir(), &workspace.ref_dir())?;
    let mut recorded = RecordedRun::default();
    let stats = runner(workers)?.execute_run(&corpus, candidates, |event| {
        recorded.record(event);
    })?;

    ensure!(
        stats.finished.iter().all(|&count| count == corpus.len()),
        "every candidate finishes every test: {stats:?}"
    );
    recorded.check_protocol()?;
    Ok(recorded)
}

#[test_case("echo 3", Status::Ok; "matching output")]
#[test_case("echo 4", Status::WrongAnswer; "different output")]
#[test_case("printf '3  \\n\\n\\n'", Status::Ok; "trailing whitespace")]
#[test_case("sleep 5", Status::TimeLimitExceeded; "deadline exceeded")]
#[test_case("echo oops >&2; exit 1", Status::Failed; "nonzero exit")]
fn single_test_verdict(script: &str, expected: Status) -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.add_fixture("1", "1 2\n", "3\n")?;

    let recorded = execute(&workspace, &[sh_candidate("sol", script, TIMEOUT)], 2)?;
    assert_eq!(recorded.terminal_statuses(0), [expected]);
    Ok(())
}

#[test]
fn candidate_reads_input() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.add_fixture("1", "1 2\n", "3\n")?;
    workspace.add_fixture("2", "20 22\n", "42\n")?;

    let sum = sh_candidate("sum", "read a b; echo $((a + b))", TIMEOUT);
    let recorded = execute(&workspace, &[sum], 2)?;
    assert_eq!(recorded.terminal_statuses(0), [Status::Ok, Status::Ok]);
    Ok(())
}

#[test]
fn timeout_message_names_the_command() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.add_fixture("1", "", "3\n")?;

    let slow = Candidate::new(
        None,
        vec!["sleep".to_owned(), "5".to_owned()],
        Duration::from_millis(300),
    )?;
    let recorded = execute(&workspace, &[slow], 1)?;
    let event = recorded.terminal(0, 0).expect("terminal event recorded");
    assert_eq!(event.status(), Status::TimeLimitExceeded);
    assert_eq!(
        event.messages(),
        ["timed out: `sleep 5` did not finish within 0.3s"]
    );
    Ok(())
}

#[test]
fn missing_program_fails() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.add_fixture("1", "", "3\n")?;

    let missing = Candidate::new(None, vec!["./pantest-missing".to_owned()], TIMEOUT)?;
    let recorded = execute(&workspace, &[missing], 1)?;
    let event = recorded.terminal(0, 0).expect("terminal event recorded");
    assert_eq!(event.status(), Status::Failed);
    let message = &event.messages()[0];
    assert!(
        message.starts_with("failed to run: `./pantest-missing` failed with"),
        "unexpected message: {message}"
    );
    Ok(())
}

#[test]
fn missing_reference_is_skipped() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.add_fixture("1", "", "3\n")?;
    workspace.add_input("2", "")?;
    workspace.add_fixture("3", "", "3\n")?;

    let corpus = TestCorpus::discover(&workspace.input_dir(), &workspace.ref_dir())?;
    let names: Vec<_> = corpus.cases().iter().map(|case| case.name()).collect();
    assert_eq!(names, ["1", "3"]);

    let recorded = execute(&workspace, &[sh_candidate("sol", "echo 3", TIMEOUT)], 2)?;
    let (_, _, unit_count) = recorded.started.as_ref().expect("run started");
    assert_eq!(*unit_count, 2);
    Ok(())
}

#[test]
fn tests_run_in_natural_order() -> Result<()> {
    let workspace = Workspace::new()?;
    for name in ["t10", "t2", "t1", "abc"] {
        workspace.add_fixture(name, name, name)?;
    }

    let cat = Candidate::new(None, vec!["cat".to_owned()], TIMEOUT)?;
    let recorded = execute(&workspace, &[cat], 1)?;

    // With one candidate, tests are started in corpus order.
    let started: Vec<_> = recorded
        .events
        .iter()
        .filter(|event| event.status() == Status::Starting)
        .map(|event| event.test_index())
        .collect();
    assert_eq!(started, [0, 1, 2, 3]);
    assert_eq!(recorded.terminal_statuses(0), [Status::Ok; 4]);
    Ok(())
}

#[test]
fn every_candidate_gets_every_test() -> Result<()> {
    let workspace = Workspace::new()?;
    for i in 1..=12 {
        workspace.add_fixture(&i.to_string(), &format!("{i}\n"), &format!("{i}\n"))?;
    }

    let candidates = [
        Candidate::new(Some("cat".to_owned()), vec!["cat".to_owned()], TIMEOUT)?,
        sh_candidate("wrong", "echo 0", TIMEOUT),
        sh_candidate("crash", "exit 2", TIMEOUT),
    ];
    let recorded = execute(&workspace, &candidates, 4)?;

    let mut summarizer = Summarizer::new(candidates.iter().map(|c| c.name().to_owned()).collect());
    for event in &recorded.events {
        summarizer.ingest(event);
    }
    let counters = summarizer.counters();
    assert_eq!(counters[0].get(Status::Ok), 12);
    assert_eq!(counters[1].get(Status::WrongAnswer), 12);
    assert_eq!(counters[2].get(Status::Failed), 12);
    for counter in counters {
        assert_eq!(counter.terminal_count(), 12);
    }
    assert_eq!(summarizer.messages().len(), 12, "one message per crash");
    Ok(())
}

#[test]
fn single_worker_runs_one_test_at_a_time() -> Result<()> {
    let workspace = Workspace::new()?;
    for i in 1..=4 {
        workspace.add_fixture(&i.to_string(), "", "ok\n")?;
    }

    let candidates = [
        sh_candidate("a", "echo ok", TIMEOUT),
        sh_candidate("b", "echo ok", TIMEOUT),
    ];
    let recorded = execute(&workspace, &candidates, 1)?;

    // Every STARTING is followed by the terminal status of the same pair.
    for pair in recorded.events.chunks(2) {
        let [starting, terminal] = pair else {
            panic!("odd number of events: {:?}", recorded.events);
        };
        assert_eq!(starting.status(), Status::Starting);
        assert!(terminal.status().is_terminal());
        assert_eq!(
            (starting.candidate_index(), starting.test_index()),
            (terminal.candidate_index(), terminal.test_index())
        );
    }
    Ok(())
}

#[test]
fn run_is_announced_first() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.add_fixture("1", "", "3\n")?;

    let recorded = execute(&workspace, &[sh_candidate("sol", "echo 3", TIMEOUT)], 1)?;
    assert_eq!(
        recorded.started,
        Some((RunMode::Run, vec!["sol".to_owned()], 1))
    );
    Ok(())
}

#[test]
fn callback_errors_do_not_stop_the_run() -> Result<()> {
    let workspace = Workspace::new()?;
    for i in 1..=3 {
        workspace.add_fixture(&i.to_string(), "", "3\n")?;
    }
    let corpus = TestCorpus::discover(&workspace.input_dir(), &workspace.ref_dir())?;

    let mut calls = 0;
    let res = runner(2)?.try_execute_run(
        &corpus,
        &[sh_candidate("sol", "echo 3", TIMEOUT)],
        |event| {
            calls += 1;
            match event {
                ReporterEvent::Test(_) => Err("reporter broke"),
                _ => Ok(()),
            }
        },
    );

    let err = res.expect_err("callback error is returned");
    assert_eq!(err.report_error, Some("reporter broke"));
    assert!(err.join_errors.is_empty());
    // RunStarted and the first test event only.
    assert_eq!(calls, 2);
    Ok(())
}

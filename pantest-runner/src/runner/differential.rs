// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One round of differential testing.
//!
//! A round generates an input, runs both candidates on it one after the other, and compares
//! their outputs. Whatever happens, every round ends with exactly one terminal status per
//! candidate, so per-candidate counts always add up to the number of rounds.

use super::imp::{EventSender, child_failure};
use crate::{
    compare::compatible_outputs,
    config::{Candidate, GeneratorConfig},
    errors::{ChildError, DisplayErrorChain},
    process::{ChildInput, ProcessRunner},
    reporter::{Status, TestEvent},
};
use bytes::Bytes;
use camino::Utf8Path;
use std::{io::SeekFrom, sync::Arc};
use tokio::{fs::File, io::AsyncSeekExt, sync::Semaphore};
use tracing::debug;

/// Everything shared by the rounds of a differential run.
#[derive(Debug)]
pub(super) struct RoundContext {
    pub(super) process_runner: ProcessRunner,
    pub(super) candidates: [Candidate; 2],
    pub(super) generator: GeneratorConfig,
}

pub(super) async fn run_round(
    ctx: Arc<RoundContext>,
    round: usize,
    semaphore: Arc<Semaphore>,
    sender: EventSender,
) {
    let _permit = semaphore
        .acquire()
        .await
        .expect("the worker semaphore is never closed");
    let base = [TestEvent::new(0, round), TestEvent::new(1, round)];

    for event in &base {
        sender.send(event.with_status(Status::Generating)).await;
    }

    let input_path = ctx.generator.input_path(round);
    debug!(round, %input_path, "generating input");
    let mut input = match generate_input(&ctx, &input_path).await {
        Ok(input) => input,
        Err(message) => {
            // Both candidates fail so that their counts stay aligned.
            sender
                .send(base[0].with_status(Status::Failed).with_message(message))
                .await;
            sender.send(base[1].with_status(Status::Failed)).await;
            return;
        }
    };

    let first = run_on_input(&ctx, 0, &input, &base[0], &sender).await;
    // The first run consumed the file.
    let second = match input.seek(SeekFrom::Start(0)).await {
        Ok(_) => run_on_input(&ctx, 1, &input, &base[1], &sender).await,
        Err(err) => {
            sender.send(base[1].with_status(Status::Starting)).await;
            Err(ChildError::Io {
                command: ctx.candidates[1].name().to_owned(),
                err,
            })
        }
    };
    drop(input);

    let (first, second) = match (first, second) {
        (Ok(first), Ok(second)) => (first, second),
        (first, second) => {
            for (res, base) in [first, second].into_iter().zip(&base) {
                let event = match res {
                    Err(error) => child_failure(base, &error),
                    // Ran fine, but there is nothing to compare against.
                    Ok(_) => base.with_status(Status::Uncompared),
                };
                sender.send(event).await;
            }
            return;
        }
    };

    if !compatible_outputs(&first, &second) {
        for event in &base {
            sender.send(event.with_status(Status::Mismatch)).await;
        }
        return;
    }

    // The input is only kept around when the candidates disagree.
    let mut same = base.map(|event| event.with_status(Status::Same));
    if let Err(err) = tokio::fs::remove_file(&input_path).await {
        same[0] = same[0].with_message(format!("failed to remove {input_path}: {err}"));
    }
    for event in same {
        sender.send(event).await;
    }
}

/// Runs the generator, writing its output to `input_path`, and reopens the result for reading.
async fn generate_input(ctx: &RoundContext, input_path: &Utf8Path) -> Result<File, String> {
    let output = File::create(input_path)
        .await
        .map_err(|err| format!("failed to create input file {input_path}: {err}"))?;
    ctx.process_runner
        .run_to_file(
            ctx.generator.command(),
            ctx.generator.timeout(),
            output.into_std().await,
        )
        .await
        .map_err(|error| {
            format!(
                "failed to generate input: {}",
                DisplayErrorChain::new(&error)
            )
        })?;

    File::open(input_path)
        .await
        .map_err(|err| format!("failed to open input file: {err}"))
}

/// Announces and runs one candidate, returning its output. Failures are reported later, once
/// both candidates have run.
async fn run_on_input(
    ctx: &RoundContext,
    index: usize,
    input: &File,
    base: &TestEvent,
    sender: &EventSender,
) -> Result<Bytes, ChildError> {
    let candidate = &ctx.candidates[index];
    sender.send(base.with_status(Status::Starting)).await;

    // The clone shares the file position with `input`.
    let stdin = input.try_clone().await.map_err(|err| ChildError::Io {
        command: candidate.name().to_owned(),
        err,
    })?;
    ctx.process_runner
        .run(
            candidate.command(),
            candidate.timeout(),
            ChildInput::File(stdin.into_std().await),
        )
        .await
}

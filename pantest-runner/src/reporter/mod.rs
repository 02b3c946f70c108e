// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report the progress and results of a run.
//!
//! The main type here is [`TestReporter`], which is constructed via a [`TestReporterBuilder`]. It
//! is the single consumer of the events produced by a
//! [`TestRunner`](crate::runner::TestRunner): every event is fed to a [`Summarizer`] and drawn on
//! a live status grid.

mod events;
mod grid;
mod summarizer;

pub use events::*;
pub use summarizer::*;

use crate::errors::WriteEventError;
use grid::{GridCharacters, GridStyles, StatusGrid};
use std::io::{self, Write};
use tracing::debug;

/// Output destination for the reporter.
///
/// This is usually a terminal, but can be an in-memory buffer for tests.
pub enum ReporterOutput<'a> {
    /// Produce output on standard output.
    Terminal,

    /// Write output to a buffer.
    Buffer(&'a mut Vec<u8>),
}

/// Test reporter builder.
#[derive(Debug, Default)]
pub struct TestReporterBuilder {
    should_colorize: bool,
}

impl TestReporterBuilder {
    /// Sets whether the status grid should be colorized.
    pub fn set_colorize(&mut self, should_colorize: bool) -> &mut Self {
        self.should_colorize = should_colorize;
        self
    }

    /// Creates a new test reporter.
    pub fn build<'a>(&self, output: ReporterOutput<'a>) -> TestReporter<'a> {
        let mut styles = GridStyles::default();
        if self.should_colorize {
            styles.colorize();
        }

        let mut characters = GridCharacters::default();
        match output {
            ReporterOutput::Terminal => {
                if supports_unicode::on(supports_unicode::Stream::Stdout) {
                    characters.use_unicode();
                }
            }
            ReporterOutput::Buffer(_) => {
                // Always use Unicode for internal buffers.
                characters.use_unicode();
            }
        }

        TestReporter {
            output,
            styles,
            characters,
            state: None,
        }
    }
}

/// Functionality to report progress and results to the user.
pub struct TestReporter<'a> {
    output: ReporterOutput<'a>,
    styles: GridStyles,
    characters: GridCharacters,
    state: Option<RunState>,
}

struct RunState {
    mode: RunMode,
    summarizer: Summarizer,
    grid: StatusGrid,
}

impl TestReporter<'_> {
    /// Report a reporter event.
    pub fn report_event(&mut self, event: ReporterEvent) -> Result<(), WriteEventError> {
        let res = match &mut self.output {
            ReporterOutput::Terminal => {
                let stdout = io::stdout();
                let mut writer = stdout.lock();
                Self::write_event(
                    &mut self.state,
                    &self.styles,
                    &self.characters,
                    &mut writer,
                    event,
                )
            }
            ReporterOutput::Buffer(buf) => Self::write_event(
                &mut self.state,
                &self.styles,
                &self.characters,
                &mut **buf,
                event,
            ),
        };
        res.map_err(WriteEventError::Io)
    }

    /// The summarizer of the current run, once the run has started.
    pub fn summarizer(&self) -> Option<&Summarizer> {
        self.state.as_ref().map(|state| &state.summarizer)
    }

    fn write_event<W: Write>(
        state: &mut Option<RunState>,
        styles: &GridStyles,
        characters: &GridCharacters,
        writer: &mut W,
        event: ReporterEvent,
    ) -> io::Result<()> {
        match event {
            ReporterEvent::RunStarted {
                mode,
                candidate_names,
                unit_count,
            } => {
                let grid = StatusGrid::new(
                    candidate_names.clone(),
                    unit_count,
                    styles.clone(),
                    characters.clone(),
                );
                grid.init(writer)?;
                *state = Some(RunState {
                    mode,
                    summarizer: Summarizer::new(candidate_names),
                    grid,
                });
            }
            ReporterEvent::Test(event) => {
                // The runner always announces the run first.
                let Some(state) = state else {
                    return Ok(());
                };
                state.summarizer.ingest(&event);
                state.grid.draw(writer, &event)?;
            }
            ReporterEvent::RunFinished { elapsed } => {
                debug!("run finished in {:.3}s", elapsed.as_secs_f64());
                if let Some(state) = state {
                    writeln!(writer)?;
                    write!(writer, "{}", state.summarizer.summary(state.mode))?;
                    writer.flush()?;
                }
            }
        }
        Ok(())
    }
}

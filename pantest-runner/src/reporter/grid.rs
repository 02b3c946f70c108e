// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The live status grid: one row per candidate, one cell per test or round.

use super::events::{Status, TestEvent};
use crossterm::{
    cursor::{MoveDown, MoveToColumn, MoveUp},
    queue,
    style::Print,
};
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};

/// Extra space between the candidate names and the first cell.
const NAME_PADDING: usize = 3;

/// Cells are grouped in blocks of this size, separated by a blank column.
const CELL_GROUP: usize = 5;

/// Draws test statuses at fixed positions below the candidate names.
///
/// The grid assumes the cursor sits on the line right after the candidate names, at column 0,
/// and leaves it there after every cell. Nothing else may be printed while the grid is live.
#[derive(Debug)]
pub(super) struct StatusGrid {
    names: Vec<String>,
    unit_count: usize,
    name_width: usize,
    styles: GridStyles,
    characters: GridCharacters,
}

impl StatusGrid {
    pub(super) fn new(
        names: Vec<String>,
        unit_count: usize,
        styles: GridStyles,
        characters: GridCharacters,
    ) -> Self {
        let name_width = names
            .iter()
            .enumerate()
            .map(|(i, name)| numbered(i, name).chars().count())
            .max()
            .unwrap_or(0);
        Self {
            names,
            unit_count,
            name_width: name_width + NAME_PADDING,
            styles,
            characters,
        }
    }

    /// Prints the candidate names and an empty cell for every (candidate, test) pair.
    pub(super) fn init<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (i, name) in self.names.iter().enumerate() {
            writeln!(writer, "{}", numbered(i, name))?;
        }
        for candidate in 0..self.names.len() {
            for test in 0..self.unit_count {
                self.draw_cell(writer, candidate, test, Status::None)?;
            }
        }
        writer.flush()
    }

    /// Draws the status carried by `event`. Events with [`Status::None`] are not drawn.
    pub(super) fn draw<W: Write>(&self, writer: &mut W, event: &TestEvent) -> io::Result<()> {
        if event.status() == Status::None {
            return Ok(());
        }
        self.draw_cell(
            writer,
            event.candidate_index(),
            event.test_index(),
            event.status(),
        )?;
        writer.flush()
    }

    fn draw_cell<W: Write>(
        &self,
        writer: &mut W,
        candidate: usize,
        test: usize,
        status: Status,
    ) -> io::Result<()> {
        let (row, column) = self.cell_position(candidate, test);
        let symbol = self.characters.symbol(status);
        let styled = symbol.style(self.styles.style(status));
        queue!(
            writer,
            MoveUp(row),
            MoveToColumn(column),
            Print(styled),
            MoveDown(row),
            MoveToColumn(0),
        )
    }

    /// Returns (lines above the cursor, column) for a cell.
    fn cell_position(&self, candidate: usize, test: usize) -> (u16, u16) {
        let row = self.names.len().saturating_sub(candidate);
        let column = test * 2 + test / CELL_GROUP + self.name_width;
        (clamp_u16(row), clamp_u16(column))
    }
}

fn numbered(index: usize, name: &str) -> String {
    format!("{}. {name}", index + 1)
}

fn clamp_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[derive(Clone, Debug, Default)]
pub(super) struct GridStyles {
    none: Style,
    starting: Style,
    generating: Style,
    failed: Style,
    wrong_answer: Style,
    time_limit_exceeded: Style,
    ok: Style,
    same: Style,
    mismatch: Style,
    uncompared: Style,
}

impl GridStyles {
    pub(super) fn colorize(&mut self) {
        self.none = Style::new().white();
        self.starting = Style::new().yellow();
        self.generating = Style::new().cyan();
        self.failed = Style::new().magenta();
        self.wrong_answer = Style::new().red();
        self.time_limit_exceeded = Style::new().blue();
        self.ok = Style::new().green();
        self.same = Style::new().green();
        self.mismatch = Style::new().red();
        self.uncompared = Style::new().white();
    }

    fn style(&self, status: Status) -> Style {
        match status {
            Status::None => self.none,
            Status::Starting => self.starting,
            Status::Generating => self.generating,
            Status::Failed => self.failed,
            Status::WrongAnswer => self.wrong_answer,
            Status::TimeLimitExceeded => self.time_limit_exceeded,
            Status::Ok => self.ok,
            Status::Same => self.same,
            Status::Mismatch => self.mismatch,
            Status::Uncompared => self.uncompared,
        }
    }
}

#[derive(Clone, Debug)]
pub(super) struct GridCharacters {
    failed: &'static str,
    wrong_answer: &'static str,
    time_limit_exceeded: &'static str,
    ok: &'static str,
    mismatch: &'static str,
    uncompared: &'static str,
}

impl Default for GridCharacters {
    fn default() -> Self {
        Self {
            failed: "!",
            wrong_answer: "x",
            time_limit_exceeded: "t",
            ok: "+",
            mismatch: "#",
            uncompared: ".",
        }
    }
}

impl GridCharacters {
    pub(super) fn use_unicode(&mut self) {
        self.failed = "⚠";
        self.wrong_answer = "✖";
        self.time_limit_exceeded = "⏱";
        self.ok = "✓";
        self.mismatch = "≠";
        self.uncompared = "·";
    }

    fn symbol(&self, status: Status) -> &'static str {
        match status {
            Status::None => "_",
            Status::Starting => "?",
            Status::Generating => "~",
            Status::Failed => self.failed,
            Status::WrongAnswer => self.wrong_answer,
            Status::TimeLimitExceeded => self.time_limit_exceeded,
            Status::Ok => self.ok,
            Status::Same => "=",
            Status::Mismatch => self.mismatch,
            Status::Uncompared => self.uncompared,
        }
    }
}

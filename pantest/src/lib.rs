// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A concurrent test harness.
//!
//! `pantest run` runs every configured candidate against a corpus of `*.in`/`*.ref` pairs, and
//! `pantest same` compares two candidates on freshly generated inputs. Progress is drawn as a
//! live grid, followed by a summary of verdicts.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;

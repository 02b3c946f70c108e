// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [pantest](https://crates.io/crates/pantest).
//!
//! pantest runs candidate executables either against a corpus of input/reference pairs
//! ([`TestRunner::execute_run`](runner::TestRunner::execute_run)) or against each other on
//! freshly generated inputs ([`TestRunner::execute_same`](runner::TestRunner::execute_same)).
//! Workers communicate with the outside world exclusively through
//! [`ReporterEvent`](reporter::ReporterEvent)s, which are consumed one at a time by a
//! [`TestReporter`](reporter::TestReporter).

pub mod compare;
pub mod config;
pub mod corpus;
pub mod errors;
pub mod helpers;
pub mod process;
pub mod reporter;
pub mod runner;

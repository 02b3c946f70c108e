// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable contracts for [pantest](https://crates.io/crates/pantest).
//!
//! Currently this is the set of documented process exit codes.

mod exit_codes;

pub use exit_codes::*;

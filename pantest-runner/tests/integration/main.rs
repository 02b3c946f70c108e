// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the runner with real child processes.
//!
//! These tests need `sh`, `cat`, `sleep` and the coreutils `timeout` program on `PATH`.

mod fixtures;
mod run;
mod same;

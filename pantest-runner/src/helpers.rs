// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small formatting helpers shared between the runner and the command-line frontend.

/// Utilities for pluralizing various words based on count.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "round" if `count` is 1, otherwise "rounds".
    pub fn rounds_str(count: usize) -> &'static str {
        if count == 1 { "round" } else { "rounds" }
    }

    /// Returns "worker" if `count` is 1, otherwise "workers".
    pub fn workers_str(count: usize) -> &'static str {
        if count == 1 { "worker" } else { "workers" }
    }
}

/// Renders a command line for display in diagnostics, quoting arguments where needed.
pub(crate) fn display_command(command: &[String]) -> String {
    shell_words::join(command)
}

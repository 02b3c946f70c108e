// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `pantest` failures.
///
/// A run that completes exits with [`OK`](Self::OK) regardless of the verdicts it collected:
/// verdicts are reported in the summary, not through the exit code.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum PantestExitCode {}

impl PantestExitCode {
    /// No errors occurred and pantest exited normally.
    pub const OK: i32 = 0;

    /// A user issue happened while setting up a pantest invocation: a bad config file, an
    /// unreadable input directory, or an unknown candidate name.
    pub const SETUP_ERROR: i32 = 96;

    /// `pantest init` could not create the requested config file.
    pub const INIT_CONFIG_FAILED: i32 = 97;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A worker task panicked while executing tests.
    pub const RUN_PANICKED: i32 = 111;
}

// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test runner.
//!
//! The main structure in this module is [`TestRunner`].

mod differential;
mod imp;

pub use imp::*;

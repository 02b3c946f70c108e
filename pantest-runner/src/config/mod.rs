// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for pantest.
//!
//! The main structure in this module is [`PantestConfig`], read from a `pantest.toml` file and
//! layered on top of an embedded default config.

mod candidate;
mod imp;
mod init;
mod workers;

pub use candidate::*;
pub use imp::*;
pub use init::*;
pub use workers::*;

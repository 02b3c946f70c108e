// Copyright (c) The pantest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::InitConfigError;
use camino::Utf8Path;
use std::{fs::OpenOptions, io::Write};

/// A commented config file, ready to be used as a template for new `pantest.toml` files.
pub const CONFIG_TEMPLATE: &str = include_str!("../../config-template.toml");

/// Creates a new config file at `path` from [`CONFIG_TEMPLATE`].
///
/// Fails if anything already exists at `path`.
pub fn init_config_file(path: &Utf8Path) -> Result<(), InitConfigError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::AlreadyExists {
                InitConfigError::AlreadyExists {
                    path: path.to_owned(),
                }
            } else {
                InitConfigError::Write {
                    path: path.to_owned(),
                    err,
                }
            }
        })?;

    file.write_all(CONFIG_TEMPLATE.as_bytes())
        .map_err(|err| InitConfigError::Write {
            path: path.to_owned(),
            err,
        })
}

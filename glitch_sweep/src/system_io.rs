// This file is part of glitch-sweep, an application to sweep fault-injection parameters against embedded targets.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// glitch-sweep is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// glitch-sweep is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

//! Error Wrapping File System I/O Helpers
//!
//! Thin wrappers around the standard file operations the sweep needs: reading a
//! configuration file and opening a result log for appending. Every helper logs at
//! `trace` level and converts failures into [`GlitchError`] variants carrying the path.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use glitch_sweep::system_io::{fs_open_append, fs_read};
//! # use std::path::Path;
//! # fn example() -> Result<(), glitch_sweep::error::GlitchError> {
//! let config_text = fs_read(Path::new("sweep.toml"))?;
//! let (log_file, is_new) = fs_open_append(Path::new("results.csv"))?;
//! # Ok(())
//! # }
//! ```

use crate::error::GlitchError;
use log::trace;
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::Path;

/// Read the contents of a file to a String.
///
/// # Arguments
///
/// * `file_path` - Path to the file to read
///
/// # Returns: `Result<String, GlitchError>`
/// * `Ok(String)` - The complete contents of the file
/// * `Err(GlitchError::IORead)` - If the file cannot be read (doesn't exist, permissions, etc.)
pub fn fs_read(file_path: &Path) -> Result<String, GlitchError> {
    trace!("Attempting to read from {file_path:?}");
    let mut buf: String = String::new();
    let result = OpenOptions::new()
        .read(true)
        .open(file_path)
        .and_then(|mut f| f.read_to_string(&mut buf));

    match result {
        Ok(_) => {
            trace!("Reading done");
            Ok(buf)
        }
        Err(e) => Err(GlitchError::IORead {
            file: file_path.into(),
            e,
        }),
    }
}

/// Open (or create) a file for appending.
///
/// Existing content is never truncated. The second element of the returned tuple is
/// `true` when the file is empty, so callers know whether a header still has to be
/// written.
///
/// # Arguments
///
/// * `file_path` - Path to the log file
///
/// # Returns: `Result<(File, bool), GlitchError>`
/// * `Ok((File, bool))` - Handle positioned at the end of the file, and whether it was empty
/// * `Err(GlitchError::IOWrite)` - If the file cannot be opened or inspected
pub fn fs_open_append(file_path: &Path) -> Result<(File, bool), GlitchError> {
    trace!("Attempting to open {file_path:?} for appending");
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)
        .and_then(|f| f.metadata().map(|m| (f, m.len() == 0)));

    match result {
        Ok((file, is_empty)) => {
            trace!("Opened {file_path:?} (empty: {is_empty})");
            Ok((file, is_empty))
        }
        Err(e) => Err(GlitchError::IOWrite {
            file: file_path.into(),
            e,
        }),
    }
}

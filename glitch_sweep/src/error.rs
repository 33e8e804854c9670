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

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GlitchError {
    #[error("GlitchError::Setup: Could not set up the glitch bench: {0}")]
    Setup(String),
    #[error("GlitchError::Device: Device communication failed: {0}")]
    Device(String),
    #[error("GlitchError::Config: Invalid configuration: {0}")]
    Config(String),
    #[error("GlitchError::Parameter: Cannot access parameter {name:?}: {reason}")]
    Parameter { name: String, reason: String },
    #[error("GlitchError::IORead: An IO error occurred when reading from {file:?}: {e}")]
    IORead { file: PathBuf, e: std::io::Error },
    #[error("GlitchError::IOWrite: An IO error occurred when writing to {file:?}: {e}")]
    IOWrite { file: PathBuf, e: std::io::Error },
    #[error("GlitchError::Internal: An Internal error occurred: {0}")]
    Internal(String),
}

impl GlitchError {
    /// Errors which must abort before (or instead of) a sweep.
    ///
    /// `Device` and `Parameter` errors are local to one attempt and get recorded as
    /// `device-error` by the sweep runner. Everything else is fatal.
    pub fn is_setup(&self) -> bool {
        !matches!(
            self,
            GlitchError::Device(..) | GlitchError::Parameter { .. }
        )
    }

    pub(crate) fn parameter(name: &str, reason: impl Into<String>) -> Self {
        GlitchError::Parameter {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}

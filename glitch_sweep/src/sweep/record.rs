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

//! Append-only CSV log of attempts.
//!
//! One row per attempt with the columns
//! `index,width,offset,ext_offset,repeat,outcome,response,detail`. `response` is lower
//! case hex (empty for timeouts and device errors). Every row is flushed as soon as it is
//! written so an interrupted sweep leaves a usable log behind.

use crate::error::GlitchError;
use crate::sweep::classify::Outcome;
use crate::sweep::runner::{AttemptRecorder, AttemptResult};
use crate::system_io::fs_open_append;
use log::trace;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct AttemptRow<'a> {
    index: usize,
    width: i64,
    offset: i64,
    ext_offset: i64,
    repeat: i64,
    outcome: Outcome,
    response: String,
    detail: &'a str,
}

impl<'a> From<&'a AttemptResult> for AttemptRow<'a> {
    fn from(r: &'a AttemptResult) -> Self {
        AttemptRow {
            index: r.index,
            width: r.point.width,
            offset: r.point.offset,
            ext_offset: r.point.ext_offset,
            repeat: r.point.repeat,
            outcome: r.outcome,
            response: r.response.as_deref().map(hex::encode).unwrap_or_default(),
            detail: r.detail.as_deref().unwrap_or_default(),
        }
    }
}

/// [`AttemptRecorder`] writing CSV rows to any writer.
pub struct CsvRecorder<W: Write> {
    writer: csv::Writer<W>,
    destination: PathBuf,
}

impl<W: Write> CsvRecorder<W> {
    /// # Arguments
    ///
    /// * `writer` - Destination of the rows
    /// * `write_header` - Emit the header row before the first record
    /// * `destination` - Name of the destination used in error messages
    pub fn new(writer: W, write_header: bool, destination: impl Into<PathBuf>) -> Self {
        CsvRecorder {
            writer: csv::WriterBuilder::new()
                .has_headers(write_header)
                .from_writer(writer),
            destination: destination.into(),
        }
    }

    fn io_error(&self, e: std::io::Error) -> GlitchError {
        GlitchError::IOWrite {
            file: self.destination.clone(),
            e,
        }
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W, GlitchError> {
        let destination = self.destination;
        self.writer.into_inner().map_err(|e| GlitchError::IOWrite {
            file: destination,
            e: std::io::Error::new(e.error().kind(), e.error().to_string()),
        })
    }
}

impl CsvRecorder<File> {
    /// Open `path` for appending. The header is only written when the file is empty.
    pub fn append_to(path: &Path) -> Result<Self, GlitchError> {
        let (file, is_empty) = fs_open_append(path)?;
        trace!("Recording attempts to {path:?}");
        Ok(CsvRecorder::new(file, is_empty, path))
    }
}

impl<W: Write> AttemptRecorder for CsvRecorder<W> {
    fn record(&mut self, result: &AttemptResult) -> Result<(), GlitchError> {
        self.writer
            .serialize(AttemptRow::from(result))
            .map_err(|e| self.io_error(std::io::Error::other(e)))?;
        self.writer.flush().map_err(|e| self.io_error(e))
    }
}

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

use crate::{connect_bench, release_bench};
use glitch_sweep::config::sweep_config::SweepConfig;
use glitch_sweep::error::GlitchError;
use glitch_sweep::platforms::platform::Bench;
use glitch_sweep::sweep::record::CsvRecorder;
use glitch_sweep::sweep::runner::{AttemptRecorder, AttemptResult, SweepRunner, SweepSummary};
use log::info;
use std::io;
use std::path::PathBuf;

/// Sweep the configured plan on a connected bench, recording into `recorder`.
fn sweep(
    config: &SweepConfig,
    bench: &mut Bench,
    recorder: &mut dyn AttemptRecorder,
) -> Result<Vec<AttemptResult>, GlitchError> {
    config.apply_glitch_settings(bench.glitcher.as_mut())?;
    let classifier = config.target.classifier()?;
    let command = config.target.command_bytes()?;
    SweepRunner::new(
        bench.glitcher.as_mut(),
        bench.target.as_mut(),
        &classifier,
        &command,
    )
    .run(&config.sweep, recorder)
}

/// Argument parser for the run command
///
/// The log is opened before the bench is connected so an unwritable destination fails
/// before any glitch is fired. Returns the outcome summary as an ascii table.
pub fn run_handler(config: &SweepConfig, output: &Option<PathBuf>) -> Result<String, GlitchError> {
    config.validate()?;
    let results = match output {
        Some(path) => {
            let mut recorder = CsvRecorder::append_to(path)?;
            let mut bench = connect_bench(config)?;
            let results = sweep(config, &mut bench, &mut recorder);
            release_bench(bench);
            let results = results?;
            info!("Attempts logged to {path:?}");
            results
        }
        None => {
            let mut recorder = CsvRecorder::new(io::stdout().lock(), true, "<stdout>");
            let mut bench = connect_bench(config)?;
            let results = sweep(config, &mut bench, &mut recorder);
            release_bench(bench);
            results?
        }
    };
    Ok(SweepSummary::from_results(&results).to_string())
}

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

//! The parameter sweep loop.
//!
//! [`SweepRunner::run`] walks every point of a [`SweepPlan`] in order and, for each one:
//! 1. configures the glitcher with the point
//! 2. arms the glitcher
//! 3. sends the start command to the target
//! 4. triggers and waits for the capture
//! 5. reads the target's response
//! 6. classifies the response
//!
//! An error in steps 1-5 is recorded as [`Outcome::DeviceError`] for that point and the
//! loop moves on, so the result sequence always has exactly one entry per point. After a
//! `reset` outcome the target is reset before the next point.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use glitch_sweep::platforms::platform::Bench;
//! # use glitch_sweep::sweep::classify::GoldenClassifier;
//! # use glitch_sweep::sweep::parameters::SweepPlan;
//! # use glitch_sweep::sweep::runner::{AttemptResult, SweepRunner};
//! # fn example(bench: &mut Bench) -> Result<(), glitch_sweep::error::GlitchError> {
//! let classifier = GoldenClassifier::new(vec![0xc4, 0x09, 0x00, 0x00], None);
//! let mut runner = SweepRunner::new(
//!     bench.glitcher.as_mut(),
//!     bench.target.as_mut(),
//!     &classifier,
//!     b"g",
//! );
//! let mut log: Vec<AttemptResult> = Vec::new();
//! let results = runner.run(&SweepPlan::default(), &mut log)?;
//! # Ok(())
//! # }
//! ```

use crate::error::GlitchError;
use crate::platforms::platform::{Glitcher, Target};
use crate::sweep::classify::{Classifier, Outcome, Response};
use crate::sweep::parameters::{ParameterPoint, SweepPlan};
use log::{debug, info, trace, warn};
use std::fmt;

/// Result of one fault attempt. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    /// Position of the point in sweep order, starting at 0.
    pub index: usize,
    pub point: ParameterPoint,
    pub outcome: Outcome,
    /// Bytes returned by the target, `None` for a timeout or a device error.
    pub response: Option<Vec<u8>>,
    /// Error text for `device-error` outcomes.
    pub detail: Option<String>,
}

/// Sink receiving every attempt as soon as it has been classified.
pub trait AttemptRecorder {
    fn record(&mut self, result: &AttemptResult) -> Result<(), GlitchError>;
}

impl AttemptRecorder for Vec<AttemptResult> {
    fn record(&mut self, result: &AttemptResult) -> Result<(), GlitchError> {
        self.push(result.clone());
        Ok(())
    }
}

/// Drives one glitcher/target pair through a sweep.
pub struct SweepRunner<'a> {
    glitcher: &'a mut dyn Glitcher,
    target: &'a mut dyn Target,
    classifier: &'a dyn Classifier,
    command: &'a [u8],
}

impl<'a> SweepRunner<'a> {
    /// # Arguments
    ///
    /// * `glitcher` - Fault-injection device, held exclusively for the whole sweep
    /// * `target` - Target communication handle
    /// * `classifier` - Rule classifying each response
    /// * `command` - Bytes sent to the target to start its glitchable operation
    pub fn new(
        glitcher: &'a mut dyn Glitcher,
        target: &'a mut dyn Target,
        classifier: &'a dyn Classifier,
        command: &'a [u8],
    ) -> Self {
        Self {
            glitcher,
            target,
            classifier,
            command,
        }
    }

    fn fire(&mut self, point: &ParameterPoint) -> Result<Response, GlitchError> {
        self.glitcher.configure(point)?;
        self.glitcher.arm()?;
        self.target.send(self.command)?;
        self.glitcher.trigger()?;
        self.target.read_response()
    }

    /// Carry out a single attempt and classify it.
    ///
    /// Never fails: device communication errors become [`Outcome::DeviceError`].
    pub fn attempt(&mut self, index: usize, point: ParameterPoint) -> AttemptResult {
        let result = match self.fire(&point) {
            Ok(response) => {
                let outcome = self.classifier.classify(&point, &response);
                let response = match response {
                    Response::Data(bytes) => Some(bytes),
                    Response::Timeout => None,
                };
                AttemptResult {
                    index,
                    point,
                    outcome,
                    response,
                    detail: None,
                }
            }
            Err(e) => {
                warn!("Attempt {index} at {point:?} failed: {e}");
                AttemptResult {
                    index,
                    point,
                    outcome: Outcome::DeviceError,
                    response: None,
                    detail: Some(e.to_string()),
                }
            }
        };

        if result.outcome == Outcome::Reset {
            trace!("Resetting target after attempt {index}");
            if let Err(e) = self.target.reset() {
                warn!("Failed to reset target after attempt {index}: {e}");
            }
        }
        result
    }

    /// Run every point of `plan` in sweep order.
    ///
    /// # Arguments
    ///
    /// * `plan` - Parameter space to sweep
    /// * `recorder` - Receives each result as soon as it exists
    ///
    /// # Returns: `Result<Vec<AttemptResult>, GlitchError>`
    /// * `Ok(Vec<AttemptResult>)` - One result per point, in sweep order
    /// * `Err(GlitchError::Config)` - The plan is invalid, nothing was attempted
    /// * `Err(GlitchError::IOWrite)` - The recorder failed, the sweep was stopped
    pub fn run(
        &mut self,
        plan: &SweepPlan,
        recorder: &mut dyn AttemptRecorder,
    ) -> Result<Vec<AttemptResult>, GlitchError> {
        plan.validate()?;
        let total = plan.len();
        let progress_step = (total / 10).max(1);
        info!(
            "Sweeping {total} points on {}",
            self.glitcher.device_handle()
        );

        let mut results = Vec::with_capacity(total);
        for (index, point) in plan.points().enumerate() {
            let result = self.attempt(index, point);
            debug!("[{index}] {point:?} -> {}", result.outcome);
            if result.outcome == Outcome::Success {
                info!(
                    "Fault at width={} offset={} ext_offset={} repeat={}: {}",
                    point.width,
                    point.offset,
                    point.ext_offset,
                    point.repeat,
                    hex::encode(result.response.as_deref().unwrap_or_default())
                );
            }
            recorder.record(&result)?;
            results.push(result);

            if (index + 1) % progress_step == 0 {
                info!("{}/{total} points done", index + 1);
            }
        }
        Ok(results)
    }
}

/// Outcome counts of a finished sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    pub normal: usize,
    pub reset: usize,
    pub success: usize,
    pub device_error: usize,
}

impl SweepSummary {
    pub fn from_results(results: &[AttemptResult]) -> Self {
        results.iter().fold(
            SweepSummary {
                total: results.len(),
                ..SweepSummary::default()
            },
            |mut summary, r| {
                match r.outcome {
                    Outcome::Normal => summary.normal += 1,
                    Outcome::Reset => summary.reset += 1,
                    Outcome::Success => summary.success += 1,
                    Outcome::DeviceError => summary.device_error += 1,
                }
                summary
            },
        )
    }
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = |n: usize| {
            if self.total == 0 {
                0.0
            } else {
                100.0 * n as f64 / self.total as f64
            }
        };
        writeln!(f, "---- SWEEP SUMMARY ----")?;
        writeln!(f, "| outcome | count | share |")?;
        for (outcome, count) in [
            (Outcome::Normal, self.normal),
            (Outcome::Reset, self.reset),
            (Outcome::Success, self.success),
            (Outcome::DeviceError, self.device_error),
        ] {
            writeln!(f, "| {outcome} | {count} | {:.1}% |", pct(count))?;
        }
        write!(f, "| total | {} | 100.0% |", self.total)
    }
}

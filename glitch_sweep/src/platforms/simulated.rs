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

//! Simulated platform: a Husky-style glitcher wired to a serial target, in memory.
//!
//! This platform needs no hardware and behaves deterministically, so it is used for
//! dry runs of a sweep configuration and throughout the test suite. The glitcher keeps
//! the same parameter names and value constraints as the real glitch module, and the
//! target answers according to a [`FaultModel`] read from `[device.options]`.
//!
//! # Architecture
//!
//! [`SimulatedPlatform::connect`] builds one [`BenchState`] per connection and hands
//! it to both halves of the bench:
//! - [`SimulatedGlitcher`] - Parameter store, arm and trigger
//! - [`SimulatedTarget`] - Command/response channel and reset line
//!
//! # Registration
//!
//! The platform registers itself under the name "simulated" via the `#[platform]`
//! procedural macro. It is compiled in with the default `simulated` feature.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use glitch_sweep::config::sweep_config::DeviceConfig;
//! # use glitch_sweep::platforms::platform::Platform;
//! # use glitch_sweep::platforms::simulated::SimulatedPlatform;
//! # fn example() -> Result<(), glitch_sweep::error::GlitchError> {
//! let mut bench = SimulatedPlatform::new().connect(&DeviceConfig::default())?;
//! bench.target.send(b"g")?;
//! # Ok(())
//! # }
//! ```

use crate::config::sweep_config::DeviceConfig;
use crate::error::GlitchError;
use crate::platforms::platform::{Bench, Platform};
use crate::platforms::simulated_components::bench_state::BenchState;
use crate::platforms::simulated_components::fault_model::FaultModel;
use crate::platforms::simulated_components::simulated_glitcher::SimulatedGlitcher;
use crate::platforms::simulated_components::simulated_target::SimulatedTarget;
use glitch_sweep_macros::platform;
use log::{debug, trace};

/// In-memory glitch bench.
///
/// Holds no state itself; every [`Platform::connect`] call creates an independent bench.
#[platform(name = "simulated")]
#[derive(Debug)]
pub struct SimulatedPlatform {}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlatform {
    pub fn new() -> Self {
        trace!("creating new simulated_platform");
        SimulatedPlatform {}
    }
}

impl Platform for SimulatedPlatform {
    /// Build a fresh simulated bench.
    ///
    /// # Arguments
    ///
    /// * `device` - The handle names the glitcher; `options` holds the [`FaultModel`]
    ///
    /// # Returns: `Result<Bench, GlitchError>`
    /// * `Ok(Bench)` - Connected bench with power-on parameter values
    /// * `Err(GlitchError::Setup)` - Empty device handle
    /// * `Err(GlitchError::Config)` - Invalid fault model options
    fn connect(&self, device: &DeviceConfig) -> Result<Bench, GlitchError> {
        let handle = device.handle();
        if handle.trim().is_empty() {
            return Err(GlitchError::Setup(String::from(
                "cannot connect to a glitcher with an empty device handle",
            )));
        }
        let model = FaultModel::from_options(&device.options)?;
        debug!("connecting simulated bench '{handle}' with {model:?}");
        let state = BenchState::shared(model)?;
        Ok(Bench {
            glitcher: Box::new(SimulatedGlitcher::new(handle, state.clone())),
            target: Box::new(SimulatedTarget::new(state)),
        })
    }
}

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

//! Deterministic model of how the simulated target reacts to a glitch.
//!
//! The model is read from the `[device.options]` table of the sweep configuration. All
//! keys are optional:
//!
//! | key | default | meaning |
//! |---|---|---|
//! | `fault_width` | `[20, 30]` | inclusive width window producing a fault |
//! | `fault_offset` | `[1000, 1400]` | inclusive offset window producing a fault |
//! | `fault_ext_offset` | `[4, 6]` | inclusive ext_offset window producing a fault |
//! | `reset_width` | `3000` | widths at or above this crash the target |
//! | `reset_repeat` | `50` | repeat counts at or above this crash the target |
//! | `unstable_ext_offsets` | `[]` | ext_offsets at which the capture fails |
//! | `normal_response` | `"c4090000"` | hex reply of an undisturbed run |
//! | `fault_response` | `"c3090000"` | hex reply of a faulted run |

use crate::config::DEFAULT_GOLDEN_RESPONSE;
use crate::config::sweep_config::decode_hex;
use crate::error::GlitchError;
use crate::sweep::parameters::ParameterPoint;
use serde::Deserialize;

/// Effect of one fired glitch on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlitchEffect {
    None,
    Fault,
    Crash,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FaultModel {
    pub fault_width: [i64; 2],
    pub fault_offset: [i64; 2],
    pub fault_ext_offset: [i64; 2],
    pub reset_width: i64,
    pub reset_repeat: i64,
    pub unstable_ext_offsets: Vec<i64>,
    pub normal_response: String,
    pub fault_response: String,
}

impl Default for FaultModel {
    fn default() -> Self {
        FaultModel {
            fault_width: [20, 30],
            fault_offset: [1000, 1400],
            fault_ext_offset: [4, 6],
            reset_width: 3000,
            reset_repeat: 50,
            unstable_ext_offsets: Vec::new(),
            normal_response: DEFAULT_GOLDEN_RESPONSE.to_owned(),
            fault_response: String::from("c3090000"),
        }
    }
}

fn within(window: [i64; 2], value: i64) -> bool {
    window[0] <= value && value <= window[1]
}

impl FaultModel {
    /// Build the model from platform options.
    ///
    /// # Returns: `Result<FaultModel, GlitchError>`
    /// * `Ok(FaultModel)` - Model with defaults filled in
    /// * `Err(GlitchError::Config)` - Unknown key, wrong type or bad hex
    pub fn from_options(options: &toml::Table) -> Result<FaultModel, GlitchError> {
        let model: FaultModel = toml::Value::Table(options.clone())
            .try_into()
            .map_err(|e: toml::de::Error| {
                GlitchError::Config(format!("invalid simulated platform options: {e}"))
            })?;
        model.normal_bytes()?;
        model.fault_bytes()?;
        Ok(model)
    }

    pub fn normal_bytes(&self) -> Result<Vec<u8>, GlitchError> {
        decode_hex("device.options.normal_response", &self.normal_response)
    }

    pub fn fault_bytes(&self) -> Result<Vec<u8>, GlitchError> {
        decode_hex("device.options.fault_response", &self.fault_response)
    }

    pub fn is_unstable(&self, ext_offset: i64) -> bool {
        self.unstable_ext_offsets.contains(&ext_offset)
    }

    pub fn effect(&self, point: &ParameterPoint) -> GlitchEffect {
        if point.width >= self.reset_width || point.repeat >= self.reset_repeat {
            GlitchEffect::Crash
        } else if within(self.fault_width, point.width)
            && within(self.fault_offset, point.offset)
            && within(self.fault_ext_offset, point.ext_offset)
        {
            GlitchEffect::Fault
        } else {
            GlitchEffect::None
        }
    }
}

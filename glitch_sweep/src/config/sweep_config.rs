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

//! TOML sweep configuration.
//!
//! Every section and key is optional; missing values fall back to the constants in
//! [`crate::config`]. A complete file looks like:
//!
//! ```toml
//! [device]
//! platform = "simulated"
//! handle = "husky0"
//!
//! [device.options]          # platform specific, see the platform's documentation
//! reset_width = 3000
//!
//! [glitch]                  # written to the glitcher before the sweep starts
//! output = "clock_xor"
//! trigger_src = "ext_single"
//!
//! [target]
//! command = "67"            # hex bytes starting the target's glitchable operation
//! expected = "c4090000"     # hex golden response
//! success = "c3090000"      # optional hex response counted as a successful fault
//!
//! [sweep]
//! width = { min = 0, max = 40, step = 4 }
//! offset = { min = 1000, max = 1400, step = 50 }
//! ext_offset = { min = 0, max = 10 }
//! ```

use crate::config::{
    DEFAULT_DEVICE_HANDLE, DEFAULT_GOLDEN_RESPONSE, DEFAULT_PLATFORM, DEFAULT_TARGET_COMMAND,
};
use crate::error::GlitchError;
use crate::platforms::platform::{Glitcher, ParameterValue};
use crate::sweep::classify::GoldenClassifier;
use crate::sweep::parameters::SweepPlan;
use crate::system_io::fs_read;
use log::trace;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// This is the top level struct which holds all sections
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub glitch: BTreeMap<String, ParameterValue>,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub sweep: SweepPlan,
}

/// This is the "device" section struct
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub platform: Option<String>,
    pub handle: Option<String>,
    /// Free-form options interpreted by the selected platform.
    #[serde(default)]
    pub options: toml::Table,
}

/// This is the "target" section struct
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub command: Option<String>,
    pub expected: Option<String>,
    pub success: Option<String>,
}

/// Decode a hex string from the configuration, naming the key on failure.
pub fn decode_hex(key: &str, value: &str) -> Result<Vec<u8>, GlitchError> {
    hex::decode(value.trim())
        .map_err(|e| GlitchError::Config(format!("{key} = {value:?} is not valid hex: {e}")))
}

impl DeviceConfig {
    pub fn platform(&self) -> &str {
        self.platform.as_deref().unwrap_or_else(|| {
            trace!("No platform provided. Using hardcoded value.");
            DEFAULT_PLATFORM
        })
    }

    pub fn handle(&self) -> &str {
        self.handle.as_deref().unwrap_or_else(|| {
            trace!("No device handle provided. Using hardcoded value.");
            DEFAULT_DEVICE_HANDLE
        })
    }
}

impl TargetConfig {
    pub fn command_bytes(&self) -> Result<Vec<u8>, GlitchError> {
        let command = self.command.as_deref().unwrap_or_else(|| {
            trace!("No target command provided. Using hardcoded value.");
            DEFAULT_TARGET_COMMAND
        });
        decode_hex("target.command", command)
    }

    /// Build the golden-response classifier from `expected` and `success`.
    pub fn classifier(&self) -> Result<GoldenClassifier, GlitchError> {
        let expected = self.expected.as_deref().unwrap_or_else(|| {
            trace!("No golden response provided. Using hardcoded value.");
            DEFAULT_GOLDEN_RESPONSE
        });
        let expected = decode_hex("target.expected", expected)?;
        let success = self
            .success
            .as_deref()
            .map(|s| decode_hex("target.success", s))
            .transpose()?;
        if success.as_ref() == Some(&expected) {
            return Err(GlitchError::Config(String::from(
                "target.success must differ from target.expected",
            )));
        }
        Ok(GoldenClassifier::new(expected, success))
    }
}

impl SweepConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<SweepConfig, GlitchError> {
        let config: SweepConfig =
            toml::from_str(text).map_err(|e| GlitchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Returns: `Result<SweepConfig, GlitchError>`
    /// * `Ok(SweepConfig)` - Valid configuration
    /// * `Err(GlitchError::IORead)` - File could not be read
    /// * `Err(GlitchError::Config)` - File could not be parsed or holds invalid values
    pub fn load(path: &Path) -> Result<SweepConfig, GlitchError> {
        trace!("Loading sweep configuration from {path:?}");
        let text = fs_read(path)?;
        SweepConfig::from_toml_str(&text)
    }

    /// Check everything that can be checked without a device.
    pub fn validate(&self) -> Result<(), GlitchError> {
        self.sweep.validate()?;
        self.target.command_bytes()?;
        self.target.classifier()?;
        Ok(())
    }

    /// Glitcher settings written before the sweep: the glitch module is enabled with the
    /// PLL as clock source, then the `[glitch]` section is applied on top.
    pub fn glitch_settings(&self) -> Vec<(String, ParameterValue)> {
        let mut settings: BTreeMap<String, ParameterValue> = BTreeMap::from([
            (String::from("enabled"), ParameterValue::Bool(true)),
            (String::from("clk_src"), ParameterValue::from("pll")),
        ]);
        settings.extend(self.glitch.clone());
        // the module has to be enabled before anything else is accepted
        let enabled = settings.remove_entry("enabled");
        enabled.into_iter().chain(settings).collect()
    }

    /// Write [`SweepConfig::glitch_settings`] to the glitcher.
    ///
    /// # Returns: `Result<(), GlitchError>`
    /// * `Ok(())` - Every setting was accepted
    /// * `Err(GlitchError::Setup)` - The glitcher rejected a setting
    pub fn apply_glitch_settings(&self, glitcher: &mut dyn Glitcher) -> Result<(), GlitchError> {
        for (name, value) in self.glitch_settings() {
            trace!("Applying glitch setting {name} = {value}");
            glitcher.set_parameter(&name, &value).map_err(|e| {
                GlitchError::Setup(format!(
                    "{} rejected glitch.{name} = {value}: {e}",
                    glitcher.device_handle()
                ))
            })?;
        }
        Ok(())
    }
}

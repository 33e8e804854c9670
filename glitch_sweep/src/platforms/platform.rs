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

//! Platform abstraction layer for glitch benches.
//!
//! This module defines the traits a hardware driver implements so the sweep runner and
//! the parameter verifier can drive it without knowing anything about the vendor's
//! protocol:
//! - [`Glitcher`] - The fault-injection device (scope, glitch module, trigger)
//! - [`Target`] - The communication channel to the embedded device under test
//! - [`Platform`] - A driver family which connects a glitcher and a target into a [`Bench`]
//!
//! # Platform Registration
//!
//! Platforms register a constructor under a name in [`PLATFORM_REGISTRY`], normally
//! through the `#[platform(name = "...")]` macro and [`register_platforms`]. The name is
//! what the `[device] platform` key of a sweep configuration refers to. Lookups are exact
//! and case sensitive; an unknown name is a setup error.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use glitch_sweep::config::sweep_config::DeviceConfig;
//! # use glitch_sweep::platforms::{platform::platform_for_name, register_platforms};
//! # fn example() -> Result<(), glitch_sweep::error::GlitchError> {
//! register_platforms();
//! let platform = platform_for_name("simulated")?;
//! let mut bench = platform.connect(&DeviceConfig::default())?;
//! bench.glitcher.arm()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`register_platforms`]: crate::platforms::register_platforms

use crate::config::sweep_config::DeviceConfig;
use crate::error::GlitchError;
use crate::sweep::classify::Response;
use crate::sweep::parameters::ParameterPoint;
use log::trace;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

/// Type alias for platform constructor functions.
///
/// Constructors take no arguments; everything device specific is passed later to
/// [`Platform::connect`].
type PlatformConstructor = fn() -> Box<dyn Platform>;

/// Global registry of platform implementations, keyed by platform name.
///
/// Initialised lazily by [`register_platform`] and read by [`platform_for_name`].
pub static PLATFORM_REGISTRY: OnceLock<Mutex<HashMap<&'static str, PlatformConstructor>>> =
    OnceLock::new();

/// Value of a device parameter as read from or written to a driver.
///
/// Deserializes untagged, so TOML `true`, `42`, `7.37e6` and `"pll"` map to `Bool`,
/// `Int`, `Float` and `Text` respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParameterValue {
    /// Compare a read-back value with the value that was written.
    ///
    /// Floats (and ints compared to floats) match within 1% of the written value, or
    /// within `0.01` absolute when the written value is zero. Everything else must be
    /// equal.
    pub fn matches(&self, written: &ParameterValue) -> bool {
        match (self.as_float(), written) {
            (Some(read), ParameterValue::Float(w)) => {
                if *w == 0.0 {
                    read.abs() < 0.01
                } else {
                    (read - w).abs() < 0.01 * w.abs()
                }
            }
            _ => self == written,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(v) => write!(f, "{v}"),
            ParameterValue::Int(v) => write!(f, "{v}"),
            ParameterValue::Float(v) => write!(f, "{v}"),
            ParameterValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Int(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Float(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Text(value.to_owned())
    }
}

/// Trait for driving a fault-injection device.
pub trait Glitcher {
    /// Get the handle this glitcher was connected with (e.g. "husky0").
    fn device_handle(&self) -> &str;

    /// Read a named device parameter.
    ///
    /// # Returns: `Result<ParameterValue, GlitchError>`
    /// * `Ok(ParameterValue)` - Current value
    /// * `Err(GlitchError::Parameter)` - Unknown parameter
    /// * `Err(GlitchError::Device)` - Communication with the device failed
    fn parameter(&self, name: &str) -> Result<ParameterValue, GlitchError>;

    /// Write a named device parameter.
    ///
    /// # Returns: `Result<(), GlitchError>`
    /// * `Ok(())` - Value accepted (the device may still coerce it, read it back to be sure)
    /// * `Err(GlitchError::Parameter)` - Unknown, read-only or out-of-range parameter
    /// * `Err(GlitchError::Device)` - Communication with the device failed
    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<(), GlitchError>;

    /// Apply the glitch settings of one sweep point.
    ///
    /// The default implementation writes `width`, `offset`, `ext_offset` and `repeat`
    /// through [`Glitcher::set_parameter`].
    fn configure(&mut self, point: &ParameterPoint) -> Result<(), GlitchError> {
        trace!("Configuring {} with {point:?}", self.device_handle());
        self.set_parameter("width", &ParameterValue::Int(point.width))?;
        self.set_parameter("offset", &ParameterValue::Int(point.offset))?;
        self.set_parameter("ext_offset", &ParameterValue::Int(point.ext_offset))?;
        self.set_parameter("repeat", &ParameterValue::Int(point.repeat))
    }

    /// Arm the trigger so the next target trigger event fires the glitch.
    fn arm(&mut self) -> Result<(), GlitchError>;

    /// Wait for the armed glitch to fire and the capture to complete.
    ///
    /// # Returns: `Result<(), GlitchError>`
    /// * `Ok(())` - Capture completed
    /// * `Err(GlitchError::Device)` - Not armed, capture timed out, or communication failed
    fn trigger(&mut self) -> Result<(), GlitchError>;

    /// Invoke a named driver method (e.g. "arm", "vglitch_reset").
    ///
    /// # Arguments
    ///
    /// * `method` - Method name
    /// * `argument` - Optional argument, such as the mode of "vglitch_setup"
    ///
    /// # Returns: `Result<String, GlitchError>`
    /// * `Ok(String)` - Human readable result of the call
    /// * `Err(GlitchError::Parameter)` - Unknown method
    fn invoke(&mut self, method: &str, argument: Option<&str>) -> Result<String, GlitchError>;

    /// Release the device. Called once when the bench is torn down.
    fn disconnect(&mut self) -> Result<(), GlitchError> {
        Ok(())
    }
}

/// Trait for talking to the embedded target under test.
pub trait Target {
    /// Send a command which starts the target's glitchable operation.
    fn send(&mut self, command: &[u8]) -> Result<(), GlitchError>;

    /// Read the target's reply to the last command.
    ///
    /// # Returns: `Result<Response, GlitchError>`
    /// * `Ok(Response::Data)` - Bytes returned by the target
    /// * `Ok(Response::Timeout)` - No reply within the driver's timeout
    /// * `Err(GlitchError::Device)` - The communication channel itself failed
    fn read_response(&mut self) -> Result<Response, GlitchError>;

    /// Reset the target so it responds again after a crash.
    fn reset(&mut self) -> Result<(), GlitchError>;

    /// Read a named target parameter (e.g. "baud").
    fn parameter(&self, name: &str) -> Result<ParameterValue, GlitchError>;

    /// Write a named target parameter.
    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<(), GlitchError>;

    /// Release the target channel. Called once when the bench is torn down.
    fn disconnect(&mut self) -> Result<(), GlitchError> {
        Ok(())
    }
}

/// A connected glitcher and target pair, owned exclusively by one sweep.
pub struct Bench {
    pub glitcher: Box<dyn Glitcher>,
    pub target: Box<dyn Target>,
}

impl Bench {
    /// Disconnect the target and then the glitcher.
    ///
    /// Both are attempted even if the first fails; the first error is returned.
    pub fn disconnect(mut self) -> Result<(), GlitchError> {
        let target_res = self.target.disconnect();
        let glitcher_res = self.glitcher.disconnect();
        target_res.and(glitcher_res)
    }
}

impl fmt::Debug for Bench {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bench")
            .field("glitcher", &self.glitcher.device_handle())
            .finish_non_exhaustive()
    }
}

/// Trait representing a complete glitch platform implementation.
///
/// The trait extends `Any` to allow for runtime type checking and downcasting.
pub trait Platform: Any {
    /// Connect to the glitcher and target described by `device`.
    ///
    /// # Arguments
    ///
    /// * `device` - Device handle plus platform specific options
    ///
    /// # Returns: `Result<Bench, GlitchError>`
    /// * `Ok(Bench)` - Connected bench, ready for configuration
    /// * `Err(GlitchError::Setup)` - Device or target not reachable
    /// * `Err(GlitchError::Config)` - Invalid platform options
    fn connect(&self, device: &DeviceConfig) -> Result<Bench, GlitchError>;
}

/// Find the registered constructor for `platform_name` and build the platform.
///
/// # Returns: `Result<Box<dyn Platform>, GlitchError>`
/// * `Ok(Box<dyn Platform>)` - Newly constructed platform instance
/// * `Err(GlitchError::Internal)` - Registry not initialized or lock failure
/// * `Err(GlitchError::Setup)` - No platform registered under that name
fn match_platform_name(platform_name: &str) -> Result<Box<dyn Platform>, GlitchError> {
    let registry = PLATFORM_REGISTRY
        .get()
        .ok_or(GlitchError::Internal(String::from(
            "couldn't get PLATFORM_REGISTRY",
        )))?
        .lock()
        .map_err(|_| GlitchError::Internal(String::from("couldn't lock PLATFORM_REGISTRY")))?;

    match registry.get(platform_name) {
        Some(platform_constructor) => Ok(platform_constructor()),
        None => {
            let mut known: Vec<&str> = registry.keys().copied().collect();
            known.sort_unstable();
            Err(GlitchError::Setup(format!(
                "no platform named '{platform_name}' is available. Known platforms: [{}]",
                known.join(", ")
            )))
        }
    }
}

/// Get a platform instance for a registered platform name.
///
/// # Examples
///
/// ```rust,no_run
/// # use glitch_sweep::platforms::platform::platform_for_name;
/// # fn example() -> Result<(), glitch_sweep::error::GlitchError> {
/// let platform = platform_for_name("simulated")?;
/// # Ok(())
/// # }
/// ```
pub fn platform_for_name(platform_name: &str) -> Result<Box<dyn Platform>, GlitchError> {
    trace!("Looking up platform '{platform_name}'");
    match_platform_name(platform_name)
}

/// Initialize the platform registry.
///
/// Called automatically by [`register_platform`] via `OnceLock::get_or_init`.
pub fn init_platform_registry() -> Mutex<HashMap<&'static str, PlatformConstructor>> {
    Mutex::new(HashMap::new())
}

/// Register a platform implementation in the global registry.
///
/// Registering the same name twice replaces the earlier constructor.
///
/// # Panics
///
/// Panics if the registry lock is poisoned (should never happen in normal operation).
pub fn register_platform(name: &'static str, constructor: PlatformConstructor) {
    let mut registry = PLATFORM_REGISTRY
        .get_or_init(init_platform_registry)
        .lock()
        .expect("couldnt get PLATFORM_REGISTRY");

    registry.insert(name, constructor);
}

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

//! Device drivers for glitch benches.
//!
//! See [`platform`] for the traits every driver implements and for the registry the
//! `[device] platform` configuration key is resolved against.

pub mod platform;

#[cfg(feature = "simulated")]
pub mod simulated;

#[cfg(feature = "simulated")]
pub mod simulated_components {
    pub mod bench_state;
    pub mod fault_model;
    pub mod parameter_store;
    pub mod simulated_glitcher;
    pub mod simulated_target;
}

#[cfg(feature = "simulated")]
use crate::platforms::simulated::SimulatedPlatform;

/// Register all compiled-in platform implementations.
///
/// Must be called before [`platform::platform_for_name`]. Calling it more than once is
/// harmless.
pub fn register_platforms() {
    #[cfg(feature = "simulated")]
    SimulatedPlatform::register_platform();
}

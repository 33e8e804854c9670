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

pub mod sweep_config;

/// Platform used when the configuration file does not name one.
pub static DEFAULT_PLATFORM: &str = "simulated";

/// Device handle used when the configuration file does not name one.
pub static DEFAULT_DEVICE_HANDLE: &str = "husky0";

/// Number of phase-shift steps the glitch module's MMCM offers. `width` and `offset` are
/// expressed in these steps and are bounded by this value.
pub const PHASE_SHIFT_STEPS: i64 = 4592;

/// Largest glitch repeat count the glitch module accepts.
pub const MAX_REPEAT: i64 = 255;

/// Command byte which makes the stock glitch-loop firmware run its loop and report the
/// iteration counter (`'g'` in simpleserial).
pub static DEFAULT_TARGET_COMMAND: &str = "67";

/// Response of the stock glitch-loop firmware when the loop ran undisturbed.
pub static DEFAULT_GOLDEN_RESPONSE: &str = "c4090000";

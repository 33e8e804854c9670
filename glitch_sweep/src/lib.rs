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

//! glitch_sweep - Sweep fault-injection glitch parameters against an embedded target.
//!
//! For every combination of glitch `width`, `offset`, `ext_offset` and `repeat` the sweep
//! runner configures the glitcher, arms it, sends the target its command, fires the glitch,
//! reads the target's reply and classifies the attempt as `normal`, `reset`, `success` or
//! `device-error`. A device failure during one attempt is recorded and the sweep moves on.
//!
//! # Architecture
//!
//! - [`platforms`] - [`Glitcher`](platforms::platform::Glitcher) and
//!   [`Target`](platforms::platform::Target) traits, the platform registry and the
//!   simulated bench
//! - [`sweep`] - Parameter ranges, classification, the runner and the CSV result log
//! - [`verify`] - Read/write/readback checks of every glitch parameter
//! - [`config`] - Built-in defaults and the TOML sweep configuration
//! - [`error`] - [`GlitchError`](error::GlitchError)
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (`trace`, `debug`, `info`, `warn`, `error`
//!   or `off`). The `glitch-sweep` binary defaults to `info`
//!
//! # Examples
//!
//! ```rust,no_run
//! # use glitch_sweep::config::sweep_config::SweepConfig;
//! # use glitch_sweep::platforms::{platform::platform_for_name, register_platforms};
//! # use glitch_sweep::sweep::runner::{AttemptResult, SweepRunner, SweepSummary};
//! # fn example() -> Result<(), glitch_sweep::error::GlitchError> {
//! register_platforms();
//! let config = SweepConfig::from_toml_str("[sweep]\nwidth = { min = 0, max = 40, step = 4 }")?;
//! let mut bench = platform_for_name(config.device.platform())?.connect(&config.device)?;
//! let classifier = config.target.classifier()?;
//! let command = config.target.command_bytes()?;
//! let mut log: Vec<AttemptResult> = Vec::new();
//! let results = SweepRunner::new(
//!     bench.glitcher.as_mut(),
//!     bench.target.as_mut(),
//!     &classifier,
//!     &command,
//! )
//! .run(&config.sweep, &mut log)?;
//! println!("{}", SweepSummary::from_results(&results));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod platforms;
pub mod sweep;
pub mod system_io;
pub mod verify;

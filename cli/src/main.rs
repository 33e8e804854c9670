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

//! glitch-sweep - Command line front end of the glitch_sweep library.
//!
//! # Subcommands
//!
//! - `run` - Sweep the configured parameter space and log every attempt as CSV
//! - `plan` - Print the points a sweep would visit without touching any device
//! - `verify` - Read/write/readback check of every glitch parameter
//!
//! # Exit Codes
//!
//! - `0` - Command completed. A sweep with device errors still completed.
//! - `1` - Invalid configuration, unknown platform, unreachable bench, unwritable log,
//!   or at least one failed verification check
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (`trace`, `debug`, `info`, `warn`, `error`
//!   or `off`). Defaults to `info`

mod plan;
mod run;
mod verify;

use crate::plan::plan_handler;
use crate::run::run_handler;
use crate::verify::verify_handler;
use clap::{Parser, Subcommand, arg, command};
use glitch_sweep::config::sweep_config::SweepConfig;
use glitch_sweep::error::GlitchError;
use glitch_sweep::platforms::platform::{Bench, platform_for_name};
use glitch_sweep::platforms::register_platforms;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "glitch-sweep")]
#[command(bin_name = "glitch-sweep")]
struct Cli {
    #[arg(
        long = "config",
        help = r#"TOML sweep configuration.
Every section is optional; without this option the built-in defaults
are used (simulated platform, single point sweep)."#
    )]
    config: Option<PathBuf>,
    #[arg(
        long = "handle",
        help = "glitcher device handle, overrides [device] handle from the configuration"
    )]
    handle: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sweep and write one CSV row per attempt
    Run {
        #[arg(
            long = "output",
            help = "append the CSV log to this file instead of writing it to stdout"
        )]
        output: Option<PathBuf>,
    },
    /// Print the points of the configured sweep
    Plan,
    /// Check that every glitch parameter can be read, written and read back
    Verify {
        #[arg(long = "target", help = "also check the target's parameters")]
        target: bool,
    },
}

/// Load the configuration file, or fall back to the built-in defaults.
fn load_config(path: &Option<PathBuf>, handle: &Option<String>) -> Result<SweepConfig, GlitchError> {
    let mut config = match path {
        Some(path) => SweepConfig::load(path)?,
        None => {
            info!("No configuration file given, using built-in defaults");
            SweepConfig::default()
        }
    };
    if let Some(handle) = handle {
        config.device.handle = Some(handle.clone());
    }
    Ok(config)
}

/// Look up the configured platform and connect to its bench.
pub(crate) fn connect_bench(config: &SweepConfig) -> Result<Bench, GlitchError> {
    let platform = platform_for_name(config.device.platform())?;
    let bench = platform.connect(&config.device)?;
    info!(
        "Connected to {} on platform '{}'",
        bench.glitcher.device_handle(),
        config.device.platform()
    );
    Ok(bench)
}

/// Disconnect, logging instead of failing: the command's work is already done.
pub(crate) fn release_bench(bench: Bench) {
    if let Err(e) = bench.disconnect() {
        warn!("Failed to disconnect the bench cleanly: {e}");
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    register_platforms();
    let cli = Cli::parse();
    debug!("parsed cli command with {cli:?}");

    let config = match load_config(&cli.config, &cli.handle) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match &cli.command {
        Commands::Run { output } => run_handler(&config, output).map(|summary| {
            eprintln!("{summary}");
            true
        }),
        Commands::Plan => plan_handler(&config).map(|plan| {
            println!("{plan}");
            true
        }),
        Commands::Verify { target } => verify_handler(&config, *target).map(|(report, passed)| {
            println!("{report}");
            passed
        }),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

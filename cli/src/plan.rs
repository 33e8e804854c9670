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

use glitch_sweep::config::sweep_config::SweepConfig;
use glitch_sweep::error::GlitchError;
use glitch_sweep::sweep::parameters::SWEPT_PARAMETERS;

/// Argument parser for the plan command
///
/// Returns the point count followed by every point as CSV, in sweep order.
pub fn plan_handler(config: &SweepConfig) -> Result<String, GlitchError> {
    config.validate()?;
    let plan = &config.sweep;
    let mut ret_string = format!(
        "---- SWEEP PLAN ----\n        {} points on {} ({})\n",
        plan.len(),
        config.device.handle(),
        config.device.platform()
    );
    let ranges = [plan.width, plan.offset, plan.ext_offset, plan.repeat];
    for (name, range) in SWEPT_PARAMETERS.iter().zip(ranges) {
        ret_string += format!(
            "| {name} | {}..={} step {} | {} values |\n",
            range.min,
            range.max,
            range.step,
            range.len()
        )
        .as_str();
    }
    ret_string.push_str("\nindex,width,offset,ext_offset,repeat\n");
    for (index, p) in plan.points().enumerate() {
        ret_string.push_str(&format!(
            "{index},{},{},{},{}\n",
            p.width, p.offset, p.ext_offset, p.repeat
        ));
    }
    Ok(ret_string)
}

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

use crate::error::GlitchError;
use crate::platforms::platform::{Glitcher, ParameterValue};
use crate::platforms::simulated_components::bench_state::SharedBench;
use crate::platforms::simulated_components::fault_model::GlitchEffect;
use log::{debug, trace};

#[derive(Debug)]
pub struct SimulatedGlitcher {
    handle: String,
    bench: SharedBench,
}

impl SimulatedGlitcher {
    pub(crate) fn new(handle: &str, bench: SharedBench) -> Self {
        trace!("creating new SimulatedGlitcher for {handle}");
        SimulatedGlitcher {
            handle: handle.to_owned(),
            bench,
        }
    }

    fn vglitch_setup(&mut self, mode: Option<&str>) -> Result<String, GlitchError> {
        let (lp, hp) = match mode.unwrap_or("both") {
            "lp" => (true, false),
            "hp" => (false, true),
            "both" => (true, true),
            other => {
                return Err(GlitchError::parameter(
                    "vglitch_setup",
                    format!("unknown mode {other:?}, expected lp, hp or both"),
                ));
            }
        };
        let mut bench = self.bench.borrow_mut();
        let params = &mut bench.glitcher_params;
        params.set("enabled", &ParameterValue::Bool(true))?;
        params.set("output", &ParameterValue::from("glitch_only"))?;
        params.set("trigger_src", &ParameterValue::from("ext_single"))?;
        params.set("glitch_lp", &ParameterValue::Bool(lp))?;
        params.set("glitch_hp", &ParameterValue::Bool(hp))?;
        Ok(format!("voltage glitch set up (lp={lp}, hp={hp})"))
    }
}

impl Glitcher for SimulatedGlitcher {
    fn device_handle(&self) -> &str {
        &self.handle
    }

    fn parameter(&self, name: &str) -> Result<ParameterValue, GlitchError> {
        let bench = self.bench.borrow();
        bench.ensure_connected()?;
        bench.glitcher_params.get(name)
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<(), GlitchError> {
        let mut bench = self.bench.borrow_mut();
        bench.ensure_connected()?;
        bench.glitcher_params.set(name, value)
    }

    fn arm(&mut self) -> Result<(), GlitchError> {
        let mut bench = self.bench.borrow_mut();
        bench.ensure_connected()?;
        if !bench.glitcher_params.flag("enabled") {
            return Err(GlitchError::Device(String::from(
                "cannot arm: the glitch module is disabled",
            )));
        }
        bench.armed = true;
        bench.glitcher_params.update("adc_state", ParameterValue::Bool(true));
        Ok(())
    }

    fn trigger(&mut self) -> Result<(), GlitchError> {
        let mut bench = self.bench.borrow_mut();
        bench.ensure_connected()?;
        if !bench.armed {
            return Err(GlitchError::Device(String::from(
                "trigger received while the glitcher was not armed",
            )));
        }
        bench.armed = false;
        bench.glitcher_params.update("adc_state", ParameterValue::Bool(false));

        let point = bench.current_point();
        if bench.model.is_unstable(point.ext_offset) {
            bench.last_effect = None;
            return Err(GlitchError::Device(format!(
                "capture timed out at ext_offset {}",
                point.ext_offset
            )));
        }

        let effect = bench.model.effect(&point);
        debug!("glitch at {point:?} -> {effect:?}");
        if effect == GlitchEffect::Crash {
            bench.crashed = true;
        }
        bench.last_effect = Some(effect);
        let count = bench.glitcher_params.int("adc_trig_count") + 1;
        bench
            .glitcher_params
            .update("adc_trig_count", ParameterValue::Int(count));
        Ok(())
    }

    fn invoke(&mut self, method: &str, argument: Option<&str>) -> Result<String, GlitchError> {
        self.bench.borrow().ensure_connected()?;
        match method {
            "arm" => self.arm().map(|_| String::from("armed")),
            "vglitch_setup" => self.vglitch_setup(argument),
            "vglitch_reset" => {
                let mut bench = self.bench.borrow_mut();
                bench.glitcher_params.set("glitch_lp", &ParameterValue::Bool(false))?;
                bench.glitcher_params.set("glitch_hp", &ParameterValue::Bool(false))?;
                Ok(String::from("voltage glitch disabled"))
            }
            _ => Err(GlitchError::parameter(method, "unknown method")),
        }
    }

    fn disconnect(&mut self) -> Result<(), GlitchError> {
        trace!("disconnecting glitcher {}", self.handle);
        self.bench.borrow_mut().disconnected = true;
        Ok(())
    }
}

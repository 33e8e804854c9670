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
use crate::platforms::platform::{ParameterValue, Target};
use crate::platforms::simulated_components::bench_state::SharedBench;
use crate::platforms::simulated_components::fault_model::GlitchEffect;
use crate::sweep::classify::Response;
use log::trace;

/// Serial target answering every command with the model's normal or fault reply.
#[derive(Debug)]
pub struct SimulatedTarget {
    bench: SharedBench,
}

impl SimulatedTarget {
    pub(crate) fn new(bench: SharedBench) -> Self {
        SimulatedTarget { bench }
    }
}

impl Target for SimulatedTarget {
    fn send(&mut self, command: &[u8]) -> Result<(), GlitchError> {
        let mut bench = self.bench.borrow_mut();
        bench.ensure_connected()?;
        trace!("target <- {}", hex::encode(command));
        bench.pending_command = Some(command.to_vec());
        bench
            .target_params
            .update("in_waiting", ParameterValue::Int(0));
        Ok(())
    }

    fn read_response(&mut self) -> Result<Response, GlitchError> {
        let mut bench = self.bench.borrow_mut();
        bench.ensure_connected()?;
        let command = bench.pending_command.take();
        let effect = bench.last_effect.take();
        if bench.crashed || command.is_none() {
            return Ok(Response::Timeout);
        }
        let reply = match effect {
            Some(GlitchEffect::Fault) => bench.fault_response.clone(),
            _ => bench.normal_response.clone(),
        };
        trace!("target -> {}", hex::encode(&reply));
        Ok(Response::Data(reply))
    }

    fn reset(&mut self) -> Result<(), GlitchError> {
        let mut bench = self.bench.borrow_mut();
        bench.ensure_connected()?;
        trace!("resetting simulated target");
        bench.crashed = false;
        bench.pending_command = None;
        bench.last_effect = None;
        Ok(())
    }

    fn parameter(&self, name: &str) -> Result<ParameterValue, GlitchError> {
        let bench = self.bench.borrow();
        bench.ensure_connected()?;
        bench.target_params.get(name)
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<(), GlitchError> {
        let mut bench = self.bench.borrow_mut();
        bench.ensure_connected()?;
        bench.target_params.set(name, value)
    }

    fn disconnect(&mut self) -> Result<(), GlitchError> {
        trace!("disconnecting simulated target");
        self.bench.borrow_mut().pending_command = None;
        Ok(())
    }
}

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

//! State shared by the simulated glitcher and target of one bench.
//!
//! The glitch fired by the glitcher has to reach the target, so both halves of a
//! simulated bench hold an [`Rc`] to the same [`BenchState`]. Benches are single-threaded
//! so a `RefCell` is enough.

use crate::error::GlitchError;
use crate::platforms::simulated_components::fault_model::{FaultModel, GlitchEffect};
use crate::platforms::simulated_components::parameter_store::{
    GLITCHER_PARAMETERS, ParameterStore, TARGET_PARAMETERS,
};
use crate::sweep::parameters::ParameterPoint;
use std::cell::RefCell;
use std::rc::Rc;

pub type SharedBench = Rc<RefCell<BenchState>>;

#[derive(Debug)]
pub struct BenchState {
    pub model: FaultModel,
    pub normal_response: Vec<u8>,
    pub fault_response: Vec<u8>,
    pub glitcher_params: ParameterStore,
    pub target_params: ParameterStore,
    pub armed: bool,
    /// Command received by the target and not yet answered.
    pub pending_command: Option<Vec<u8>>,
    /// Effect of the last fired glitch, consumed by the next response.
    pub last_effect: Option<GlitchEffect>,
    /// Set by a crash, cleared by a target reset.
    pub crashed: bool,
    pub disconnected: bool,
}

impl BenchState {
    pub fn new(model: FaultModel) -> Result<BenchState, GlitchError> {
        Ok(BenchState {
            normal_response: model.normal_bytes()?,
            fault_response: model.fault_bytes()?,
            model,
            glitcher_params: ParameterStore::new(GLITCHER_PARAMETERS),
            target_params: ParameterStore::new(TARGET_PARAMETERS),
            armed: false,
            pending_command: None,
            last_effect: None,
            crashed: false,
            disconnected: false,
        })
    }

    pub fn shared(model: FaultModel) -> Result<SharedBench, GlitchError> {
        Ok(Rc::new(RefCell::new(BenchState::new(model)?)))
    }

    /// The glitch settings currently loaded into the glitcher.
    pub fn current_point(&self) -> ParameterPoint {
        ParameterPoint {
            width: self.glitcher_params.int("width"),
            offset: self.glitcher_params.int("offset"),
            ext_offset: self.glitcher_params.int("ext_offset"),
            repeat: self.glitcher_params.int("repeat"),
        }
    }

    pub fn ensure_connected(&self) -> Result<(), GlitchError> {
        if self.disconnected {
            return Err(GlitchError::Device(String::from(
                "the simulated bench has been disconnected",
            )));
        }
        Ok(())
    }
}

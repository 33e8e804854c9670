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

//! Scripted glitcher/target pair recording every call.

use glitch_sweep::error::GlitchError;
use glitch_sweep::platforms::platform::{Glitcher, ParameterValue, Target};
use glitch_sweep::sweep::classify::Response;
use glitch_sweep::sweep::parameters::ParameterPoint;
use std::cell::RefCell;
use std::rc::Rc;

pub type Responder = fn(&ParameterPoint) -> Response;

pub struct MockState {
    pub point: ParameterPoint,
    /// Number of `configure` calls so far, i.e. the index of the next attempt.
    pub attempts: usize,
    /// Attempt indices at which `trigger` fails.
    pub fail_trigger_at: Vec<usize>,
    pub responder: Responder,
    pub resets: Vec<usize>,
    pub calls: Vec<String>,
}

pub type SharedMock = Rc<RefCell<MockState>>;

pub struct MockGlitcher(pub SharedMock);
pub struct MockTarget(pub SharedMock);

pub fn always_golden(_: &ParameterPoint) -> Response {
    Response::Data(vec![0xc4, 0x09, 0x00, 0x00])
}

/// Golden response except for `width == 2`, which times out.
pub fn wide_glitch_crashes(point: &ParameterPoint) -> Response {
    if point.width == 2 {
        Response::Timeout
    } else {
        always_golden(point)
    }
}

pub fn mock_bench(responder: Responder, fail_trigger_at: &[usize]) -> (MockGlitcher, MockTarget, SharedMock) {
    let state = Rc::new(RefCell::new(MockState {
        point: ParameterPoint {
            width: 0,
            offset: 0,
            ext_offset: 0,
            repeat: 1,
        },
        attempts: 0,
        fail_trigger_at: fail_trigger_at.to_vec(),
        responder,
        resets: Vec::new(),
        calls: Vec::new(),
    }));
    (
        MockGlitcher(state.clone()),
        MockTarget(state.clone()),
        state,
    )
}

impl Glitcher for MockGlitcher {
    fn device_handle(&self) -> &str {
        "mock0"
    }

    fn parameter(&self, name: &str) -> Result<ParameterValue, GlitchError> {
        let state = self.0.borrow();
        match name {
            "width" => Ok(ParameterValue::Int(state.point.width)),
            "offset" => Ok(ParameterValue::Int(state.point.offset)),
            "ext_offset" => Ok(ParameterValue::Int(state.point.ext_offset)),
            "repeat" => Ok(ParameterValue::Int(state.point.repeat)),
            _ => Err(GlitchError::Parameter {
                name: name.to_owned(),
                reason: String::from("unknown parameter"),
            }),
        }
    }

    fn set_parameter(&mut self, name: &str, _: &ParameterValue) -> Result<(), GlitchError> {
        Err(GlitchError::Parameter {
            name: name.to_owned(),
            reason: String::from("use configure"),
        })
    }

    fn configure(&mut self, point: &ParameterPoint) -> Result<(), GlitchError> {
        let mut state = self.0.borrow_mut();
        state.point = *point;
        state.attempts += 1;
        state.calls.push(String::from("configure"));
        Ok(())
    }

    fn arm(&mut self) -> Result<(), GlitchError> {
        self.0.borrow_mut().calls.push(String::from("arm"));
        Ok(())
    }

    fn trigger(&mut self) -> Result<(), GlitchError> {
        let mut state = self.0.borrow_mut();
        state.calls.push(String::from("trigger"));
        let index = state.attempts - 1;
        if state.fail_trigger_at.contains(&index) {
            return Err(GlitchError::Device(format!("capture timed out at attempt {index}")));
        }
        Ok(())
    }

    fn invoke(&mut self, method: &str, _: Option<&str>) -> Result<String, GlitchError> {
        Err(GlitchError::Parameter {
            name: method.to_owned(),
            reason: String::from("unknown method"),
        })
    }
}

impl Target for MockTarget {
    fn send(&mut self, command: &[u8]) -> Result<(), GlitchError> {
        self.0
            .borrow_mut()
            .calls
            .push(format!("send {}", hex::encode(command)));
        Ok(())
    }

    fn read_response(&mut self) -> Result<Response, GlitchError> {
        let mut state = self.0.borrow_mut();
        state.calls.push(String::from("read_response"));
        Ok((state.responder)(&state.point))
    }

    fn reset(&mut self) -> Result<(), GlitchError> {
        let mut state = self.0.borrow_mut();
        let index = state.attempts - 1;
        state.resets.push(index);
        state.calls.push(String::from("reset"));
        Ok(())
    }

    fn parameter(&self, name: &str) -> Result<ParameterValue, GlitchError> {
        Err(GlitchError::Parameter {
            name: name.to_owned(),
            reason: String::from("unknown parameter"),
        })
    }

    fn set_parameter(&mut self, name: &str, _: &ParameterValue) -> Result<(), GlitchError> {
        Err(GlitchError::Parameter {
            name: name.to_owned(),
            reason: String::from("unknown parameter"),
        })
    }
}

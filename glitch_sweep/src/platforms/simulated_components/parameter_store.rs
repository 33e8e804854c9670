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

//! Validated parameter storage for the simulated devices.
//!
//! Each parameter is declared with a [`Constraint`] and an initial value. Writes are
//! checked against the constraint the way the real glitch module rejects them, including
//! the silent `clk_src = "clkgen"` to `"pll"` conversion of the Husky.

use crate::config::{MAX_REPEAT, PHASE_SHIFT_STEPS};
use crate::error::GlitchError;
use crate::platforms::platform::ParameterValue;
use log::{trace, warn};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub enum Constraint {
    Bool,
    Int {
        min: i64,
        max: i64,
    },
    Float {
        min: f64,
        max: f64,
    },
    /// One of `options`; values listed in `aliases` are stored as their replacement.
    Choice {
        options: &'static [&'static str],
        aliases: &'static [(&'static str, &'static str)],
    },
    ReadOnly,
}

#[derive(Debug, Clone, Copy)]
pub enum Initial {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'static str),
}

impl Initial {
    fn value(&self) -> ParameterValue {
        match self {
            Initial::Bool(v) => ParameterValue::Bool(*v),
            Initial::Int(v) => ParameterValue::Int(*v),
            Initial::Float(v) => ParameterValue::Float(*v),
            Initial::Text(v) => ParameterValue::from(*v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub constraint: Constraint,
    pub initial: Initial,
}

const fn spec(name: &'static str, constraint: Constraint, initial: Initial) -> ParameterSpec {
    ParameterSpec {
        name,
        constraint,
        initial,
    }
}

const NO_ALIASES: &[(&str, &str)] = &[];

/// Parameters of the simulated Husky-style glitcher.
pub const GLITCHER_PARAMETERS: &[ParameterSpec] = &[
    spec("enabled", Constraint::Bool, Initial::Bool(false)),
    spec(
        "clk_src",
        Constraint::Choice {
            options: &["pll"],
            aliases: &[("clkgen", "pll")],
        },
        Initial::Text("pll"),
    ),
    spec(
        "width",
        Constraint::Int {
            min: 0,
            max: PHASE_SHIFT_STEPS,
        },
        Initial::Int(0),
    ),
    spec(
        "offset",
        Constraint::Int {
            min: 0,
            max: PHASE_SHIFT_STEPS,
        },
        Initial::Int(0),
    ),
    spec(
        "ext_offset",
        Constraint::Int {
            min: 0,
            max: u32::MAX as i64,
        },
        Initial::Int(0),
    ),
    spec(
        "repeat",
        Constraint::Int {
            min: 1,
            max: MAX_REPEAT,
        },
        Initial::Int(1),
    ),
    spec(
        "output",
        Constraint::Choice {
            options: &["clock_xor", "clock_or", "glitch_only", "enable_only"],
            aliases: NO_ALIASES,
        },
        Initial::Text("clock_xor"),
    ),
    spec(
        "trigger_src",
        Constraint::Choice {
            options: &["ext_single", "ext_continuous", "manual"],
            aliases: NO_ALIASES,
        },
        Initial::Text("ext_single"),
    ),
    spec(
        "clkgen_freq",
        Constraint::Float {
            min: 1e6,
            max: 300e6,
        },
        Initial::Float(7.37e6),
    ),
    spec(
        "phase_shift_steps",
        Constraint::ReadOnly,
        Initial::Int(PHASE_SHIFT_STEPS),
    ),
    spec(
        "hs2",
        Constraint::Choice {
            options: &["clkgen", "glitch", "disabled"],
            aliases: NO_ALIASES,
        },
        Initial::Text("clkgen"),
    ),
    spec("glitch_lp", Constraint::Bool, Initial::Bool(false)),
    spec("glitch_hp", Constraint::Bool, Initial::Bool(false)),
    spec(
        "adc_samples",
        Constraint::Int { min: 1, max: 131_070 },
        Initial::Int(5000),
    ),
    spec(
        "adc_timeout",
        Constraint::Float {
            min: 0.0,
            max: 60.0,
        },
        Initial::Float(2.0),
    ),
    spec(
        "trigger_module",
        Constraint::Choice {
            options: &["basic"],
            aliases: NO_ALIASES,
        },
        Initial::Text("basic"),
    ),
    spec(
        "nrst",
        Constraint::Choice {
            options: &["high_z", "low", "high"],
            aliases: NO_ALIASES,
        },
        Initial::Text("high_z"),
    ),
    spec("adc_trig_count", Constraint::ReadOnly, Initial::Int(0)),
    spec("adc_state", Constraint::ReadOnly, Initial::Bool(false)),
    spec(
        "lo_gain_errors_disabled",
        Constraint::Bool,
        Initial::Bool(false),
    ),
    spec("clip_errors_disabled", Constraint::Bool, Initial::Bool(false)),
    spec(
        "clkgen_src",
        Constraint::Choice {
            options: &["system", "extclk"],
            aliases: NO_ALIASES,
        },
        Initial::Text("system"),
    ),
    spec("adc_mul", Constraint::Int { min: 1, max: 60 }, Initial::Int(4)),
    spec("pll_locked", Constraint::ReadOnly, Initial::Bool(true)),
    spec("mmcm_locked", Constraint::ReadOnly, Initial::Bool(true)),
    spec("adc_freq", Constraint::ReadOnly, Initial::Float(29.48e6)),
    spec("is_husky", Constraint::ReadOnly, Initial::Bool(true)),
    spec(
        "name",
        Constraint::ReadOnly,
        Initial::Text("ChipWhisperer Husky (simulated)"),
    ),
];

/// Parameters of the simulated serial target.
pub const TARGET_PARAMETERS: &[ParameterSpec] = &[
    spec(
        "baud",
        Constraint::Int {
            min: 300,
            max: 1_000_000,
        },
        Initial::Int(38400),
    ),
    spec("in_waiting", Constraint::ReadOnly, Initial::Int(0)),
];

/// Current values of a fixed set of parameters.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    specs: &'static [ParameterSpec],
    values: BTreeMap<&'static str, ParameterValue>,
}

impl ParameterStore {
    pub fn new(specs: &'static [ParameterSpec]) -> Self {
        let values = specs.iter().map(|s| (s.name, s.initial.value())).collect();
        ParameterStore { specs, values }
    }

    fn spec(&self, name: &str) -> Result<&'static ParameterSpec, GlitchError> {
        self.specs
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| GlitchError::parameter(name, "unknown parameter"))
    }

    pub fn get(&self, name: &str) -> Result<ParameterValue, GlitchError> {
        let spec = self.spec(name)?;
        self.values
            .get(spec.name)
            .cloned()
            .ok_or_else(|| GlitchError::Internal(format!("no value stored for {name}")))
    }

    /// Validated write, as seen from outside the device.
    pub fn set(&mut self, name: &str, value: &ParameterValue) -> Result<(), GlitchError> {
        let spec = self.spec(name)?;
        let stored = coerce(spec, value)?;
        trace!("{name} <- {stored}");
        self.values.insert(spec.name, stored);
        Ok(())
    }

    /// Write bypassing the constraint, for values the device itself updates.
    pub fn update(&mut self, name: &'static str, value: ParameterValue) {
        self.values.insert(name, value);
    }

    pub fn int(&self, name: &str) -> i64 {
        self.get(name).ok().and_then(|v| v.as_int()).unwrap_or(0)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name)
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

fn coerce(spec: &ParameterSpec, value: &ParameterValue) -> Result<ParameterValue, GlitchError> {
    let name = spec.name;
    match (spec.constraint, value) {
        (Constraint::ReadOnly, _) => Err(GlitchError::parameter(name, "parameter is read-only")),
        (Constraint::Bool, ParameterValue::Bool(_)) => Ok(value.clone()),
        (Constraint::Int { min, max }, ParameterValue::Int(v)) => {
            if (min..=max).contains(v) {
                Ok(value.clone())
            } else {
                Err(GlitchError::parameter(
                    name,
                    format!("{v} is outside {min}..={max}"),
                ))
            }
        }
        (Constraint::Float { min, max }, v) if v.as_float().is_some() => {
            let f = v.as_float().unwrap_or_default();
            if (min..=max).contains(&f) {
                Ok(ParameterValue::Float(f))
            } else {
                Err(GlitchError::parameter(
                    name,
                    format!("{f} is outside {min}..={max}"),
                ))
            }
        }
        (Constraint::Choice { options, aliases }, ParameterValue::Text(t)) => {
            if let Some((_, replacement)) = aliases.iter().find(|(alias, _)| *alias == t.as_str()) {
                warn!("{name} = {t:?} is not supported, using {replacement:?}");
                return Ok(ParameterValue::from(*replacement));
            }
            if options.contains(&t.as_str()) {
                Ok(value.clone())
            } else {
                Err(GlitchError::parameter(
                    name,
                    format!("{t:?} is not one of {options:?}"),
                ))
            }
        }
        (constraint, value) => Err(GlitchError::parameter(
            name,
            format!("{value:?} does not fit {constraint:?}"),
        )),
    }
}

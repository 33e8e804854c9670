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

//! Classification of one fault attempt.
//!
//! The rule deciding whether an attempt was `normal`, a `reset` or a `success` is target
//! specific, so it is supplied by the caller as a [`Classifier`]. Any
//! `Fn(&ParameterPoint, &Response) -> Outcome` closure is a classifier; the
//! [`GoldenClassifier`] covers the usual "compare with the undisturbed response" case.

use crate::sweep::parameters::ParameterPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the target sent back after a fault attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Response {
    Data(Vec<u8>),
    /// Nothing arrived before the driver's timeout.
    Timeout,
}

impl Response {
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Response::Data(bytes) => Some(bytes),
            Response::Timeout => None,
        }
    }
}

/// Classification of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// The target behaved as if no glitch happened.
    Normal,
    /// The target crashed, stopped answering or answered with garbage.
    Reset,
    /// The target answered with a faulted result.
    Success,
    /// The attempt could not be carried out because device communication failed.
    DeviceError,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::Normal,
        Outcome::Reset,
        Outcome::Success,
        Outcome::DeviceError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Normal => "normal",
            Outcome::Reset => "reset",
            Outcome::Success => "success",
            Outcome::DeviceError => "device-error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule turning a target response into an [`Outcome`].
pub trait Classifier {
    fn classify(&self, point: &ParameterPoint, response: &Response) -> Outcome;
}

impl<F> Classifier for F
where
    F: Fn(&ParameterPoint, &Response) -> Outcome,
{
    fn classify(&self, point: &ParameterPoint, response: &Response) -> Outcome {
        self(point, response)
    }
}

/// Compares responses with the golden (undisturbed) response of the target.
///
/// * a timeout is a `reset`
/// * the golden response is `normal`
/// * with a `success` pattern: that pattern is `success`, anything else is `reset`
/// * without one: any other response is `success`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldenClassifier {
    expected: Vec<u8>,
    success: Option<Vec<u8>>,
}

impl GoldenClassifier {
    pub fn new(expected: Vec<u8>, success: Option<Vec<u8>>) -> Self {
        Self { expected, success }
    }
}

impl Classifier for GoldenClassifier {
    fn classify(&self, _point: &ParameterPoint, response: &Response) -> Outcome {
        let Some(data) = response.data() else {
            return Outcome::Reset;
        };
        if data == self.expected.as_slice() {
            return Outcome::Normal;
        }
        match &self.success {
            Some(pattern) if data == pattern.as_slice() => Outcome::Success,
            Some(_) => Outcome::Reset,
            None => Outcome::Success,
        }
    }
}

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

//! Glitch parameter ranges and their Cartesian enumeration.
//!
//! A [`SweepPlan`] holds one inclusive [`ParameterRange`] per glitch parameter. Iterating
//! [`SweepPlan::points`] yields every [`ParameterPoint`] exactly once, nesting the
//! dimensions outer-to-inner as `width`, `offset`, `ext_offset`, `repeat`, each in
//! ascending order. The enumeration is a pure function of the plan, so two iterations of
//! the same plan always produce the same sequence.
//!
//! # Examples
//!
//! ```rust
//! # use glitch_sweep::sweep::parameters::{ParameterRange, SweepPlan};
//! let plan = SweepPlan {
//!     width: ParameterRange::new(1, 2, 1),
//!     offset: ParameterRange::new(10, 20, 10),
//!     ..SweepPlan::default()
//! };
//! let points: Vec<_> = plan.points().map(|p| (p.width, p.offset)).collect();
//! assert_eq!(points, vec![(1, 10), (1, 20), (2, 10), (2, 20)]);
//! ```

use crate::config::{MAX_REPEAT, PHASE_SHIFT_STEPS};
use crate::error::GlitchError;
use serde::{Deserialize, Serialize};

/// Names of the swept glitch parameters, outermost dimension first.
pub const SWEPT_PARAMETERS: [&str; 4] = ["width", "offset", "ext_offset", "repeat"];

/// Inclusive numeric range `min, min + step, ...` up to the largest value `<= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterRange {
    pub min: i64,
    pub max: i64,
    #[serde(default = "ParameterRange::default_step")]
    pub step: i64,
}

impl ParameterRange {
    const fn default_step() -> i64 {
        1
    }

    pub const fn new(min: i64, max: i64, step: i64) -> Self {
        Self { min, max, step }
    }

    /// A range holding exactly one value.
    pub const fn fixed(value: i64) -> Self {
        Self::new(value, value, 1)
    }

    /// Number of values in the range, `0` for a malformed range.
    ///
    /// Saturates at `usize::MAX` for spans too wide to count.
    pub fn len(&self) -> usize {
        if self.step <= 0 || self.min > self.max {
            return 0;
        }
        let steps = self.max.abs_diff(self.min) / self.step.unsigned_abs();
        usize::try_from(steps).unwrap_or(usize::MAX).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Values at valid indices lie within min..=max, so the narrowing cast is exact.
    fn value_at(&self, idx: usize) -> i64 {
        (i128::from(self.min) + i128::from(self.step) * idx as i128) as i64
    }

    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len()).map(|idx| self.value_at(idx))
    }

    /// Check the range is well formed and lies within `lower..=upper`.
    ///
    /// # Arguments
    ///
    /// * `name` - Parameter name used in the error message
    /// * `lower` - Smallest value the device accepts
    /// * `upper` - Largest value the device accepts, `None` for unbounded
    ///
    /// # Returns: `Result<(), GlitchError>`
    /// * `Ok(())` - Range is usable
    /// * `Err(GlitchError::Config)` - Non-positive step, inverted bounds or out-of-range values
    pub fn validate(&self, name: &str, lower: i64, upper: Option<i64>) -> Result<(), GlitchError> {
        if self.step <= 0 {
            return Err(GlitchError::Config(format!(
                "{name}: step must be positive but is {}",
                self.step
            )));
        }
        if self.min > self.max {
            return Err(GlitchError::Config(format!(
                "{name}: min ({}) is larger than max ({})",
                self.min, self.max
            )));
        }
        if self.min < lower {
            return Err(GlitchError::Config(format!(
                "{name}: min ({}) is below the lowest accepted value {lower}",
                self.min
            )));
        }
        match upper {
            Some(upper) if self.max > upper => Err(GlitchError::Config(format!(
                "{name}: max ({}) is above the highest accepted value {upper}",
                self.max
            ))),
            _ => Ok(()),
        }
    }
}

/// One combination of glitch settings applied for a single fault attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterPoint {
    /// Glitch pulse width in phase-shift steps.
    pub width: i64,
    /// Glitch offset within the clock cycle in phase-shift steps.
    pub offset: i64,
    /// Clock cycles between the trigger and the glitch.
    pub ext_offset: i64,
    /// Number of consecutive glitched cycles.
    pub repeat: i64,
}

/// The parameter space of one sweep.
///
/// Fields left out of a configuration file fall back to a single fixed value (`0` for
/// width, offset and ext_offset, `1` for repeat).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepPlan {
    #[serde(default = "SweepPlan::default_width")]
    pub width: ParameterRange,
    #[serde(default = "SweepPlan::default_offset")]
    pub offset: ParameterRange,
    #[serde(default = "SweepPlan::default_ext_offset")]
    pub ext_offset: ParameterRange,
    #[serde(default = "SweepPlan::default_repeat")]
    pub repeat: ParameterRange,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            offset: Self::default_offset(),
            ext_offset: Self::default_ext_offset(),
            repeat: Self::default_repeat(),
        }
    }
}

impl SweepPlan {
    const fn default_width() -> ParameterRange {
        ParameterRange::fixed(0)
    }

    const fn default_offset() -> ParameterRange {
        ParameterRange::fixed(0)
    }

    const fn default_ext_offset() -> ParameterRange {
        ParameterRange::fixed(0)
    }

    const fn default_repeat() -> ParameterRange {
        ParameterRange::fixed(1)
    }

    fn ranges(&self) -> [ParameterRange; 4] {
        [self.width, self.offset, self.ext_offset, self.repeat]
    }

    /// Validate every range against the glitch module's limits and make sure the
    /// product of the ranges can be enumerated.
    pub fn validate(&self) -> Result<(), GlitchError> {
        self.width.validate("width", 0, Some(PHASE_SHIFT_STEPS))?;
        self.offset.validate("offset", 0, Some(PHASE_SHIFT_STEPS))?;
        self.ext_offset.validate("ext_offset", 0, None)?;
        self.repeat.validate("repeat", 1, Some(MAX_REPEAT))?;
        self.ranges()
            .iter()
            .try_fold(1usize, |acc, r| acc.checked_mul(r.len()))
            .ok_or(GlitchError::Config(String::from(
                "the sweep has more points than can be enumerated",
            )))?;
        Ok(())
    }

    /// Exact number of points, the product of all range lengths.
    pub fn len(&self) -> usize {
        self.ranges()
            .iter()
            .fold(1usize, |acc, r| acc.saturating_mul(r.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> SweepPoints {
        SweepPoints {
            ranges: self.ranges(),
            next: 0,
            total: self.len(),
        }
    }
}

/// Iterator over the points of a [`SweepPlan`], see the module documentation for the order.
#[derive(Debug, Clone)]
pub struct SweepPoints {
    ranges: [ParameterRange; 4],
    next: usize,
    total: usize,
}

impl SweepPoints {
    fn point_at(&self, mut idx: usize) -> ParameterPoint {
        // mixed radix decomposition, innermost dimension (repeat) varies fastest
        let mut values = [0i64; 4];
        for (slot, range) in values.iter_mut().zip(self.ranges.iter()).rev() {
            let len = range.len();
            *slot = range.value_at(idx % len);
            idx /= len;
        }
        ParameterPoint {
            width: values[0],
            offset: values[1],
            ext_offset: values[2],
            repeat: values[3],
        }
    }
}

impl Iterator for SweepPoints {
    type Item = ParameterPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let point = self.point_at(self.next);
        self.next += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SweepPoints {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn plan(width: ParameterRange, offset: ParameterRange) -> SweepPlan {
        SweepPlan {
            width,
            offset,
            ..SweepPlan::default()
        }
    }

    #[rstest]
    #[case::single(ParameterRange::fixed(7), 1)]
    #[case::unit_step(ParameterRange::new(0, 9, 1), 10)]
    #[case::exact_step(ParameterRange::new(0, 100, 25), 5)]
    #[case::step_overshoots_max(ParameterRange::new(0, 10, 4), 3)]
    #[case::zero_step(ParameterRange::new(0, 10, 0), 0)]
    #[case::inverted(ParameterRange::new(10, 0, 1), 0)]
    fn test_range_len(#[case] range: ParameterRange, #[case] expected: usize) {
        assert_eq!(range.len(), expected);
        assert_eq!(range.values().count(), expected);
    }

    #[test]
    fn test_full_span_range_does_not_overflow() {
        let range = ParameterRange::new(i64::MIN, i64::MAX, 1);
        assert_eq!(range.len(), usize::MAX);
        let wide = ParameterRange::new(i64::MIN, i64::MAX, i64::MAX);
        let values: Vec<i64> = wide.values().collect();
        assert_eq!(values, vec![i64::MIN, -1, i64::MAX - 1]);
    }

    #[test]
    fn test_range_values_never_exceed_max() {
        let values: Vec<i64> = ParameterRange::new(0, 10, 4).values().collect();
        assert_eq!(values, vec![0, 4, 8]);
    }

    #[test]
    fn test_points_follow_nested_ascending_order() {
        let p = plan(ParameterRange::new(1, 2, 1), ParameterRange::new(10, 20, 10));
        let points: Vec<(i64, i64)> = p.points().map(|pt| (pt.width, pt.offset)).collect();
        assert_eq!(points, vec![(1, 10), (1, 20), (2, 10), (2, 20)]);
    }

    #[test]
    fn test_innermost_dimension_is_repeat() {
        let p = SweepPlan {
            ext_offset: ParameterRange::new(0, 1, 1),
            repeat: ParameterRange::new(1, 2, 1),
            ..SweepPlan::default()
        };
        let points: Vec<(i64, i64)> = p.points().map(|pt| (pt.ext_offset, pt.repeat)).collect();
        assert_eq!(points, vec![(0, 1), (0, 2), (1, 1), (1, 2)]);
    }

    #[rstest]
    #[case(ParameterRange::new(0, 4, 1), ParameterRange::new(0, 30, 10), 20)]
    #[case(ParameterRange::new(0, 4592, 1000), ParameterRange::fixed(0), 5)]
    #[case(ParameterRange::new(3, 3, 1), ParameterRange::new(5, 95, 10), 10)]
    fn test_point_count_is_cartesian_product(
        #[case] width: ParameterRange,
        #[case] offset: ParameterRange,
        #[case] expected: usize,
    ) {
        let p = plan(width, offset);
        assert_eq!(p.len(), expected);
        assert_eq!(p.points().len(), expected);
        assert_eq!(p.points().count(), expected);
    }

    #[test]
    fn test_points_are_reproducible() {
        let p = SweepPlan {
            width: ParameterRange::new(0, 40, 10),
            offset: ParameterRange::new(100, 300, 100),
            ext_offset: ParameterRange::new(0, 3, 1),
            repeat: ParameterRange::new(1, 5, 2),
        };
        let first: Vec<ParameterPoint> = p.points().collect();
        let second: Vec<ParameterPoint> = p.points().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5 * 3 * 4 * 3);
    }

    #[rstest]
    #[case::zero_step(plan(ParameterRange::new(0, 10, 0), ParameterRange::fixed(0)), "step must be positive")]
    #[case::inverted(plan(ParameterRange::new(5, 1, 1), ParameterRange::fixed(0)), "is larger than max")]
    #[case::negative_width(plan(ParameterRange::new(-1, 1, 1), ParameterRange::fixed(0)), "below the lowest")]
    #[case::offset_too_large(plan(ParameterRange::fixed(0), ParameterRange::new(0, 5000, 1)), "above the highest")]
    #[case::zero_repeat(SweepPlan { repeat: ParameterRange::fixed(0), ..SweepPlan::default() }, "repeat")]
    fn test_validate_rejects(#[case] p: SweepPlan, #[case] message: &str) {
        let err = p.validate().expect_err("plan should be rejected");
        assert!(
            err.to_string().contains(message),
            "unexpected error message: {err}"
        );
    }

    #[test]
    fn test_validate_rejects_unenumerable_plan() {
        let p = SweepPlan {
            ext_offset: ParameterRange::new(0, i64::MAX - 1, 1),
            width: ParameterRange::new(0, 4592, 1),
            ..SweepPlan::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_default_plan_is_one_point() {
        let p = SweepPlan::default();
        assert!(p.validate().is_ok());
        let points: Vec<ParameterPoint> = p.points().collect();
        assert_eq!(
            points,
            vec![ParameterPoint {
                width: 0,
                offset: 0,
                ext_offset: 0,
                repeat: 1
            }]
        );
    }
}

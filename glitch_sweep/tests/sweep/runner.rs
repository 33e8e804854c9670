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

use crate::common::mock_bench::{always_golden, mock_bench, wide_glitch_crashes};
use crate::sweep::four_point_plan;
use glitch_sweep::error::GlitchError;
use glitch_sweep::sweep::classify::{GoldenClassifier, Outcome, Response};
use glitch_sweep::sweep::parameters::{ParameterPoint, ParameterRange, SweepPlan};
use glitch_sweep::sweep::runner::{AttemptRecorder, AttemptResult, SweepRunner, SweepSummary};
use googletest::prelude::*;
use rstest::*;

const GOLDEN: [u8; 4] = [0xc4, 0x09, 0x00, 0x00];

fn golden() -> GoldenClassifier {
    GoldenClassifier::new(GOLDEN.to_vec(), None)
}

#[gtest]
fn test_four_point_sweep_all_normal() {
    let (mut glitcher, mut target, state) = mock_bench(always_golden, &[]);
    let classifier = golden();
    let mut log: Vec<AttemptResult> = Vec::new();
    let results = SweepRunner::new(&mut glitcher, &mut target, &classifier, b"g")
        .run(&four_point_plan(), &mut log)
        .expect("sweep should complete");

    assert_eq!(results.len(), 4);
    assert_eq!(results, log);
    let points: Vec<(i64, i64, i64, i64)> = results
        .iter()
        .map(|r| (r.point.width, r.point.offset, r.point.ext_offset, r.point.repeat))
        .collect();
    assert_eq!(
        points,
        vec![(1, 10, 0, 1), (1, 20, 0, 1), (2, 10, 0, 1), (2, 20, 0, 1)]
    );
    for (i, r) in results.iter().enumerate() {
        expect_that!(r.index, eq(i));
        expect_that!(r.outcome, eq(Outcome::Normal));
        assert_eq!(r.response.as_deref(), Some(&GOLDEN[..]));
        assert_eq!(r.detail, None);
    }
    assert!(state.borrow().resets.is_empty());
}

#[gtest]
fn test_steps_run_in_order_for_each_point() {
    let (mut glitcher, mut target, state) = mock_bench(always_golden, &[]);
    let classifier = golden();
    let plan = SweepPlan::default();
    SweepRunner::new(&mut glitcher, &mut target, &classifier, &[0x67])
        .run(&plan, &mut Vec::<AttemptResult>::new())
        .expect("sweep should complete");
    assert_eq!(
        state.borrow().calls,
        vec!["configure", "arm", "send 67", "trigger", "read_response"]
    );
}

#[rstest]
#[case::first(0)]
#[case::middle(2)]
#[case::last(3)]
fn test_device_error_is_recorded_and_sweep_continues(#[case] k: usize) {
    let (mut glitcher, mut target, _) = mock_bench(always_golden, &[k]);
    let classifier = golden();
    let results = SweepRunner::new(&mut glitcher, &mut target, &classifier, b"g")
        .run(&four_point_plan(), &mut Vec::<AttemptResult>::new())
        .expect("device errors must not abort the sweep");

    assert_eq!(results.len(), 4);
    for r in &results {
        if r.index == k {
            assert_eq!(r.outcome, Outcome::DeviceError);
            assert_eq!(r.response, None);
            let detail = r.detail.as_deref().unwrap_or_default();
            assert!(detail.contains("GlitchError::Device"), "detail: {detail}");
        } else {
            assert_eq!(r.outcome, Outcome::Normal);
        }
    }
}

#[rstest]
#[case::single_point(SweepPlan::default(), 1)]
#[case::width_only(SweepPlan { width: ParameterRange::new(0, 40, 4), ..SweepPlan::default() }, 11)]
#[case::all_dimensions(
    SweepPlan {
        width: ParameterRange::new(1, 3, 1),
        offset: ParameterRange::new(0, 100, 50),
        ext_offset: ParameterRange::new(4, 5, 1),
        repeat: ParameterRange::new(1, 10, 5),
    },
    36
)]
fn test_result_count_is_cartesian_product(#[case] plan: SweepPlan, #[case] expected: usize) {
    let (mut glitcher, mut target, state) = mock_bench(always_golden, &[]);
    let classifier = golden();
    let results = SweepRunner::new(&mut glitcher, &mut target, &classifier, b"g")
        .run(&plan, &mut Vec::<AttemptResult>::new())
        .expect("sweep should complete");
    assert_eq!(results.len(), expected);
    assert_eq!(plan.len(), expected);
    assert_eq!(state.borrow().attempts, expected);
}

#[test]
fn test_same_plan_same_results() {
    let run = || {
        let (mut glitcher, mut target, _) = mock_bench(wide_glitch_crashes, &[1]);
        let classifier = golden();
        SweepRunner::new(&mut glitcher, &mut target, &classifier, b"g")
            .run(&four_point_plan(), &mut Vec::<AttemptResult>::new())
            .expect("sweep should complete")
    };
    assert_eq!(run(), run());
}

#[gtest]
fn test_timeout_is_reset_and_target_is_reset() {
    let (mut glitcher, mut target, state) = mock_bench(wide_glitch_crashes, &[]);
    let classifier = golden();
    let results = SweepRunner::new(&mut glitcher, &mut target, &classifier, b"g")
        .run(&four_point_plan(), &mut Vec::<AttemptResult>::new())
        .expect("sweep should complete");
    let outcomes: Vec<Outcome> = results.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![Outcome::Normal, Outcome::Normal, Outcome::Reset, Outcome::Reset]
    );
    assert_eq!(results[2].response, None);
    assert_eq!(state.borrow().resets, vec![2, 3]);
}

#[test]
fn test_closure_classifier() {
    let (mut glitcher, mut target, _) = mock_bench(always_golden, &[]);
    let by_offset = |point: &ParameterPoint, _: &Response| {
        if point.offset == 20 {
            Outcome::Success
        } else {
            Outcome::Normal
        }
    };
    let results = SweepRunner::new(&mut glitcher, &mut target, &by_offset, b"g")
        .run(&four_point_plan(), &mut Vec::<AttemptResult>::new())
        .expect("sweep should complete");
    let summary = SweepSummary::from_results(&results);
    assert_eq!(summary.success, 2);
    assert_eq!(summary.normal, 2);
}

#[test]
fn test_invalid_plan_touches_no_device() {
    let (mut glitcher, mut target, state) = mock_bench(always_golden, &[]);
    let classifier = golden();
    let plan = SweepPlan {
        repeat: ParameterRange::new(0, 3, 1),
        ..SweepPlan::default()
    };
    let err = SweepRunner::new(&mut glitcher, &mut target, &classifier, b"g")
        .run(&plan, &mut Vec::<AttemptResult>::new())
        .expect_err("repeat 0 is out of range");
    assert!(matches!(err, GlitchError::Config(..)));
    assert!(state.borrow().calls.is_empty());
}

struct FailingRecorder {
    accepted: usize,
}

impl AttemptRecorder for FailingRecorder {
    fn record(&mut self, _: &AttemptResult) -> Result<(), GlitchError> {
        if self.accepted == 2 {
            return Err(GlitchError::IOWrite {
                file: "results.csv".into(),
                e: std::io::Error::other("disk full"),
            });
        }
        self.accepted += 1;
        Ok(())
    }
}

#[test]
fn test_recorder_failure_stops_sweep() {
    let (mut glitcher, mut target, state) = mock_bench(always_golden, &[]);
    let classifier = golden();
    let mut recorder = FailingRecorder { accepted: 0 };
    let err = SweepRunner::new(&mut glitcher, &mut target, &classifier, b"g")
        .run(&four_point_plan(), &mut recorder)
        .expect_err("recorder failure is fatal");
    assert!(matches!(err, GlitchError::IOWrite { .. }));
    assert_eq!(state.borrow().attempts, 3);
}

#[test]
fn test_single_attempt() {
    let (mut glitcher, mut target, _) = mock_bench(always_golden, &[]);
    let classifier = golden();
    let point = ParameterPoint {
        width: 7,
        offset: 8,
        ext_offset: 9,
        repeat: 2,
    };
    let result = SweepRunner::new(&mut glitcher, &mut target, &classifier, b"g").attempt(5, point);
    assert_eq!(result.index, 5);
    assert_eq!(result.point, point);
    assert_eq!(result.outcome, Outcome::Normal);
}

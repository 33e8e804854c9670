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

use crate::common::mock_bench::{mock_bench, wide_glitch_crashes};
use crate::sweep::four_point_plan;
use glitch_sweep::error::GlitchError;
use glitch_sweep::sweep::classify::GoldenClassifier;
use glitch_sweep::sweep::record::CsvRecorder;
use glitch_sweep::sweep::runner::SweepRunner;
use googletest::prelude::*;
use std::fs;

fn sweep_into(path: &std::path::Path) {
    let (mut glitcher, mut target, _) = mock_bench(wide_glitch_crashes, &[1]);
    let classifier = GoldenClassifier::new(vec![0xc4, 0x09, 0x00, 0x00], None);
    let mut recorder = CsvRecorder::append_to(path).expect("log should open");
    SweepRunner::new(&mut glitcher, &mut target, &classifier, b"g")
        .run(&four_point_plan(), &mut recorder)
        .expect("sweep should complete");
}

#[gtest]
fn test_log_file_rows() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let path = dir.path().join("results.csv");
    sweep_into(&path);

    let text = fs::read_to_string(&path).expect("log should be readable");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "0,1,10,0,1,normal,c4090000,");
    expect_that!(lines[2], starts_with("1,1,20,0,1,device-error,,"));
    assert_eq!(lines[3], "2,2,10,0,1,reset,,");
    assert_eq!(lines[4], "3,2,20,0,1,reset,,");
}

#[test]
fn test_second_sweep_appends_without_header() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let path = dir.path().join("results.csv");
    sweep_into(&path);
    let first = fs::read_to_string(&path).expect("log should be readable");
    sweep_into(&path);
    let both = fs::read_to_string(&path).expect("log should be readable");

    assert_eq!(both.lines().count(), 9);
    assert_eq!(both.matches("index,width,offset").count(), 1);
    assert!(both.starts_with(&first));
}

#[test]
fn test_unopenable_log_is_io_error() {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let err = CsvRecorder::append_to(dir.path())
        .err()
        .expect("a directory cannot be opened for appending");
    assert!(matches!(err, GlitchError::IOWrite { .. }));
    assert!(err.is_setup());
}

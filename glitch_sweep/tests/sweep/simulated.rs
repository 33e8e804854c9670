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

use glitch_sweep::config::sweep_config::{DeviceConfig, SweepConfig};
use glitch_sweep::error::GlitchError;
use glitch_sweep::platforms::platform::{Bench, Platform, platform_for_name};
use glitch_sweep::platforms::register_platforms;
use glitch_sweep::platforms::simulated::SimulatedPlatform;
use glitch_sweep::sweep::classify::Outcome;
use glitch_sweep::sweep::record::CsvRecorder;
use glitch_sweep::sweep::runner::{AttemptResult, SweepRunner, SweepSummary};
use glitch_sweep::verify::{Category, verify_bench};
use googletest::prelude::*;
use rstest::*;

const FAULT_CONFIG: &str = r#"
[device]
platform = "simulated"
handle = "husky-sim"

[device.options]
reset_width = 35
unstable_ext_offsets = [6]

[target]
command = "67"
expected = "c4090000"
success = "c3090000"

[sweep]
width = { min = 20, max = 40, step = 10 }
offset = { min = 1000, max = 1400, step = 400 }
ext_offset = { min = 5, max = 6 }
"#;

fn connect(config: &SweepConfig) -> Bench {
    register_platforms();
    let mut bench = platform_for_name(config.device.platform())
        .and_then(|platform| platform.connect(&config.device))
        .expect("simulated bench should connect");
    config
        .apply_glitch_settings(bench.glitcher.as_mut())
        .expect("glitch settings should be accepted");
    bench
}

fn sweep_to_csv(config: &SweepConfig) -> (Vec<AttemptResult>, Vec<u8>) {
    let mut bench = connect(config);
    let classifier = config.target.classifier().expect("bad classifier");
    let command = config.target.command_bytes().expect("bad command");
    let mut recorder = CsvRecorder::new(Vec::new(), true, "<memory>");
    let results = SweepRunner::new(
        bench.glitcher.as_mut(),
        bench.target.as_mut(),
        &classifier,
        &command,
    )
    .run(&config.sweep, &mut recorder)
    .expect("sweep should complete");
    bench.disconnect().expect("disconnect failed");
    (results, recorder.into_inner().expect("flush failed"))
}

#[gtest]
#[rstest]
#[case::defaults("husky0", "", ok(anything()))]
#[case::custom_model("bench-b", "fault_width = [1, 2]", ok(anything()))]
#[case::empty_handle("", "", err(displays_as(contains_substring("GlitchError::Setup:"))))]
#[case::unknown_option("husky0", "glitch_power = 3", err(displays_as(contains_substring("GlitchError::Config:"))))]
fn connect_cases<M: for<'a> Matcher<&'a std::result::Result<Bench, GlitchError>>>(
    #[case] handle: &str,
    #[case] options: &str,
    #[case] condition: M,
) {
    let device = DeviceConfig {
        platform: None,
        handle: Some(handle.to_owned()),
        options: toml::from_str(options).expect("bad options"),
    };
    let result = SimulatedPlatform::new().connect(&device);
    expect_that!(&result, condition);
}

#[gtest]
fn test_unknown_platform_is_setup_error() {
    register_platforms();
    let config = SweepConfig::from_toml_str("[device]\nplatform = \"husky\"").expect("config should parse");
    let err = platform_for_name(config.device.platform())
        .err()
        .expect("husky is not a registered platform");
    assert!(err.is_setup());
    expect_that!(err.to_string(), contains_substring("Known platforms: [simulated]"));
}

#[test]
fn test_fault_window_reset_region_and_unstable_offset() {
    let config = SweepConfig::from_toml_str(FAULT_CONFIG).expect("config should parse");
    let (results, _) = sweep_to_csv(&config);

    use Outcome::{DeviceError as E, Reset as R, Success as S};
    let outcomes: Vec<Outcome> = results.iter().map(|r| r.outcome).collect();
    assert_eq!(outcomes, vec![S, E, S, E, S, E, S, E, R, E, R, E]);

    let summary = SweepSummary::from_results(&results);
    assert_eq!(summary.total, 12);
    assert_eq!(summary.success, 4);
    assert_eq!(summary.reset, 2);
    assert_eq!(summary.device_error, 6);
    assert_eq!(summary.normal, 0);
    assert_eq!(results[0].response.as_deref(), Some(&[0xc3, 0x09, 0x00, 0x00][..]));
}

#[test]
fn test_target_recovers_after_crash() {
    let config = SweepConfig::from_toml_str(
        r#"
        [device.options]
        reset_width = 10
        [sweep]
        width = { min = 5, max = 10, step = 5 }
        ext_offset = { min = 0, max = 1 }
        "#,
    )
    .expect("config should parse");
    let (results, _) = sweep_to_csv(&config);
    let outcomes: Vec<Outcome> = results.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![Outcome::Normal, Outcome::Normal, Outcome::Reset, Outcome::Reset]
    );
}

#[gtest]
fn test_rerun_produces_identical_csv() {
    let config = SweepConfig::from_toml_str(FAULT_CONFIG).expect("config should parse");
    let (first_results, first_csv) = sweep_to_csv(&config);
    let (second_results, second_csv) = sweep_to_csv(&config);
    assert_eq!(first_results, second_results);
    assert_eq!(first_csv, second_csv);

    let text = String::from_utf8(first_csv).expect("csv is utf-8");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("index,width,offset,ext_offset,repeat,outcome,response,detail")
    );
    assert_eq!(lines.next(), Some("0,20,1000,5,1,success,c3090000,"));
    expect_that!(
        lines.next().unwrap_or_default(),
        starts_with("1,20,1000,6,1,device-error,,GlitchError::Device:")
    );
    assert_eq!(text.lines().count(), 13);
}

#[gtest]
fn test_verify_simulated_bench_passes() {
    let mut bench = connect(&SweepConfig::default());
    let report = verify_bench(bench.glitcher.as_mut(), Some(bench.target.as_mut()))
        .expect("verification should run");
    assert_that!(report.failed(), eq(0), "{}", report.summary());
    expect_that!(report.total(), eq(35));
    assert!(report.results.iter().any(|r| r.category == Category::Husky));
    assert!(report.results.iter().any(|r| r.category == Category::Target));
}

#[test]
fn test_verify_without_target_skips_target_checks() {
    let mut bench = connect(&SweepConfig::default());
    let report = verify_bench(bench.glitcher.as_mut(), None).expect("verification should run");
    assert!(report.all_passed());
    assert_eq!(report.total(), 33);
    assert!(report.results.iter().all(|r| r.category != Category::Target));
}

#[test]
fn test_verify_restores_original_values() {
    let mut bench = connect(&SweepConfig::default());
    let before = bench.glitcher.parameter("clkgen_freq").expect("read failed");
    verify_bench(bench.glitcher.as_mut(), None).expect("verification should run");
    assert_eq!(bench.glitcher.parameter("clkgen_freq").ok(), Some(before));
    assert_eq!(
        bench.target.parameter("baud").ok(),
        Some(glitch_sweep::platforms::platform::ParameterValue::Int(38400))
    );
}

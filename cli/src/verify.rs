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

use crate::{connect_bench, release_bench};
use glitch_sweep::config::sweep_config::SweepConfig;
use glitch_sweep::error::GlitchError;
use glitch_sweep::platforms::platform::Target;
use glitch_sweep::verify::verify_bench;

/// Argument parser for the verify command
///
/// Returns the summary and the table of every check, plus whether all checks passed.
pub fn verify_handler(config: &SweepConfig, with_target: bool) -> Result<(String, bool), GlitchError> {
    let mut bench = connect_bench(config)?;
    let target: Option<&mut dyn Target> = if with_target {
        Some(bench.target.as_mut())
    } else {
        None
    };
    let report = verify_bench(bench.glitcher.as_mut(), target);
    release_bench(bench);
    let report = report?;

    let ret_string = format!(
        "---- VERIFICATION SUMMARY ----\n{}\n---- PARAMETER TABLE ----\n{}",
        report.summary(),
        report.table()
    );
    Ok((ret_string, report.all_passed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glitch_sweep::platforms::register_platforms;
    use googletest::prelude::*;
    use rstest::rstest;

    #[gtest]
    #[rstest]
    #[case::with_target(true, "Total checks: 35")]
    #[case::glitcher_only(false, "Total checks: 33")]
    fn verify_simulated_bench(#[case] with_target: bool, #[case] total: &str) {
        register_platforms();
        let config = SweepConfig::default();
        let (report, passed) = verify_handler(&config, with_target).expect("verify failed");
        assert!(passed, "{report}");
        expect_that!(report, contains_substring(total));
        expect_that!(report, contains_substring("---- PARAMETER TABLE ----"));
        expect_that!(report, contains_substring("--- PASSED CHECKS ---"));
    }

    #[test]
    fn test_verify_unknown_platform_is_setup_error() {
        register_platforms();
        let config = SweepConfig::from_toml_str("[device]\nplatform = \"not-registered\"")
            .expect("bad test config");
        let err = verify_handler(&config, false).expect_err("unknown platform must fail");
        assert!(err.is_setup());
    }
}

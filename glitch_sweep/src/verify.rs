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

//! Parameter verification pass.
//!
//! Before trusting a bench with a long sweep it is worth checking that every glitch
//! parameter can actually be read, written and read back. [`verify_bench`] walks a static
//! catalog of [`Check`]s grouped by [`Category`] and collects a [`VerificationReport`].
//!
//! A read/write check restores the original value afterwards and passes when at least one
//! of its test values reads back as written (see [`ParameterValue::matches`]). Checks
//! never abort the pass; only the initial glitch module setup can.
//!
//! Set `RUST_LOG=debug` to see every read, write and readback as it happens.

use crate::error::GlitchError;
use crate::platforms::platform::{Glitcher, ParameterValue, Target};
use log::{debug, info, warn};
use std::fmt;
use Category::{ClockGlitch, Husky, Shared, VoltageGlitch};
use TestValue::{Bool, Float, Int, Text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    ClockGlitch,
    VoltageGlitch,
    Shared,
    Target,
    /// Only run when the glitcher reports `is_husky = true`.
    Husky,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self {
            Category::ClockGlitch => "clock glitch parameters",
            Category::VoltageGlitch => "voltage glitch parameters",
            Category::Shared => "shared configuration parameters",
            Category::Target => "target parameters",
            Category::Husky => "husky-specific parameters",
        };
        write!(f, "{title}")
    }
}

/// A test value which can live in a `static` catalog.
#[derive(Debug, Clone, Copy)]
pub enum TestValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'static str),
}

impl From<TestValue> for ParameterValue {
    fn from(value: TestValue) -> Self {
        match value {
            TestValue::Bool(v) => ParameterValue::Bool(v),
            TestValue::Int(v) => ParameterValue::Int(v),
            TestValue::Float(v) => ParameterValue::Float(v),
            TestValue::Text(v) => ParameterValue::from(v),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CheckKind {
    Read,
    ReadWrite(&'static [TestValue]),
    /// Invoke a glitcher method with an optional argument.
    Method(Option<&'static str>),
}

#[derive(Debug, Clone, Copy)]
pub struct Check {
    pub category: Category,
    /// Human readable label, e.g. "Ext_Offset".
    pub label: &'static str,
    /// Driver level path, e.g. "scope.glitch.ext_offset".
    pub api_path: &'static str,
    /// Parameter or method name passed to the driver.
    pub name: &'static str,
    pub kind: CheckKind,
}

const fn read(category: Category, label: &'static str, api_path: &'static str, name: &'static str) -> Check {
    Check {
        category,
        label,
        api_path,
        name,
        kind: CheckKind::Read,
    }
}

const fn read_write(
    category: Category,
    label: &'static str,
    api_path: &'static str,
    name: &'static str,
    values: &'static [TestValue],
) -> Check {
    Check {
        category,
        label,
        api_path,
        name,
        kind: CheckKind::ReadWrite(values),
    }
}

const fn method(
    category: Category,
    label: &'static str,
    api_path: &'static str,
    name: &'static str,
    argument: Option<&'static str>,
) -> Check {
    Check {
        category,
        label,
        api_path,
        name,
        kind: CheckKind::Method(argument),
    }
}

const TOGGLE: &[TestValue] = &[Bool(true), Bool(false), Bool(true)];

/// Checks run against the glitcher, in order.
pub static GLITCHER_CHECKS: &[Check] = &[
    read_write(ClockGlitch, "Width", "scope.glitch.width", "width", &[Int(0), Int(1000), Int(2000), Int(3000), Int(4592)]),
    read_write(ClockGlitch, "Offset", "scope.glitch.offset", "offset", &[Int(0), Int(1000), Int(2000), Int(3000), Int(4592)]),
    read_write(ClockGlitch, "Ext_Offset", "scope.glitch.ext_offset", "ext_offset", &[Int(0), Int(10), Int(50), Int(100), Int(500)]),
    read_write(ClockGlitch, "Repeat", "scope.glitch.repeat", "repeat", &[Int(1), Int(5), Int(10), Int(50), Int(255)]),
    read_write(ClockGlitch, "Clock Source", "scope.glitch.clk_src", "clk_src", &[Text("pll")]),
    read_write(
        ClockGlitch,
        "Output Mode",
        "scope.glitch.output",
        "output",
        &[Text("clock_xor"), Text("clock_or"), Text("glitch_only"), Text("enable_only")],
    ),
    read_write(
        ClockGlitch,
        "Trigger Source",
        "scope.glitch.trigger_src",
        "trigger_src",
        &[Text("ext_single"), Text("ext_continuous"), Text("manual")],
    ),
    read_write(
        ClockGlitch,
        "Clock Frequency",
        "scope.clock.clkgen_freq",
        "clkgen_freq",
        &[Float(7.37e6), Float(24e6), Float(48e6), Float(100e6)],
    ),
    read(ClockGlitch, "Phase Shift Steps", "scope.glitch.phase_shift_steps", "phase_shift_steps"),
    read_write(ClockGlitch, "Glitch Enabled", "scope.glitch.enabled", "enabled", TOGGLE),
    read_write(ClockGlitch, "HS2 Output", "scope.io.hs2", "hs2", &[Text("clkgen"), Text("glitch")]),
    method(ClockGlitch, "Arm", "scope.arm()", "arm", None),
    method(VoltageGlitch, "vglitch_setup (lp)", "scope.vglitch_setup('lp')", "vglitch_setup", Some("lp")),
    method(VoltageGlitch, "vglitch_setup (hp)", "scope.vglitch_setup('hp')", "vglitch_setup", Some("hp")),
    method(VoltageGlitch, "vglitch_setup (both)", "scope.vglitch_setup('both')", "vglitch_setup", Some("both")),
    read_write(VoltageGlitch, "LP MOSFET", "scope.io.glitch_lp", "glitch_lp", TOGGLE),
    read_write(VoltageGlitch, "HP MOSFET", "scope.io.glitch_hp", "glitch_hp", TOGGLE),
    read_write(
        VoltageGlitch,
        "Output Mode (Voltage)",
        "scope.glitch.output",
        "output",
        &[Text("glitch_only"), Text("enable_only")],
    ),
    method(VoltageGlitch, "vglitch_reset", "scope.io.vglitch_reset()", "vglitch_reset", None),
    read_write(Shared, "ADC Samples", "scope.adc.samples", "adc_samples", &[Int(1000), Int(5000), Int(24000), Int(50000)]),
    read_write(Shared, "ADC Timeout", "scope.adc.timeout", "adc_timeout", &[Float(0.5), Float(1.0), Float(2.0), Float(5.0)]),
    read_write(Shared, "Trigger Module", "scope.trigger.module", "trigger_module", &[Text("basic")]),
    read_write(Shared, "Target Reset", "scope.io.nrst", "nrst", &[Text("high_z"), Text("low"), Text("high_z")]),
    read(Shared, "ADC Trig Count", "scope.adc.trig_count", "adc_trig_count"),
    read(Shared, "ADC State", "scope.adc.state", "adc_state"),
    read_write(
        Shared,
        "ADC Lo Gain Errors Disabled",
        "scope.adc.lo_gain_errors_disabled",
        "lo_gain_errors_disabled",
        TOGGLE,
    ),
    read_write(Shared, "ADC Clip Errors Disabled", "scope.adc.clip_errors_disabled", "clip_errors_disabled", TOGGLE),
    read_write(Husky, "Clkgen Source", "scope.clock.clkgen_src", "clkgen_src", &[Text("system"), Text("extclk")]),
    read_write(Husky, "ADC Mul", "scope.clock.adc_mul", "adc_mul", &[Int(1), Int(2), Int(4)]),
    read(Husky, "PLL Locked", "scope.clock.pll.pll_locked", "pll_locked"),
    read(Husky, "Glitch MMCM Locked", "scope.glitch.mmcm_locked", "mmcm_locked"),
    read(Husky, "ADC Frequency", "scope.clock.adc_freq", "adc_freq"),
    read(Husky, "Scope Name", "scope.getName()", "name"),
];

/// Checks run against the target when one is requested.
pub static TARGET_CHECKS: &[Check] = &[
    read_write(
        Category::Target,
        "Baud Rate",
        "target.baud",
        "baud",
        &[Int(38400), Int(115_200), Int(230_400)],
    ),
    read(Category::Target, "In Waiting", "target.in_waiting()", "in_waiting"),
];

/// One written test value and what came back.
#[derive(Debug, Clone, PartialEq)]
pub struct Readback {
    pub written: ParameterValue,
    pub read: Option<ParameterValue>,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckType {
    Read,
    ReadWrite,
    Method,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub category: Category,
    pub label: &'static str,
    pub api_path: &'static str,
    pub check_type: CheckType,
    pub success: bool,
    /// Value read (or original value before writing, or the method's reply).
    pub value: Option<String>,
    pub readbacks: Vec<Readback>,
    pub error: Option<String>,
}

impl CheckResult {
    fn new(check: &Check) -> Self {
        CheckResult {
            category: check.category,
            label: check.label,
            api_path: check.api_path,
            check_type: match check.kind {
                CheckKind::Read => CheckType::Read,
                CheckKind::ReadWrite(_) => CheckType::ReadWrite,
                CheckKind::Method(_) => CheckType::Method,
            },
            success: false,
            value: None,
            readbacks: Vec::new(),
            error: None,
        }
    }

    fn notes(&self) -> String {
        if !self.success {
            return self.error.clone().unwrap_or_default();
        }
        let value = self.value.as_deref().unwrap_or_default();
        match self.check_type {
            CheckType::Read => value.to_owned(),
            CheckType::ReadWrite => format!("Original: {value}"),
            CheckType::Method => String::from("Method OK"),
        }
    }
}

/// Results of one verification pass, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    pub results: Vec<CheckResult>,
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn percent(part: usize, total: usize) -> f64 {
    100.0 * part as f64 / total as f64
}

impl VerificationReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Pass/fail counts, the failed checks with their errors, then the passed checks
    /// with the value they read.
    pub fn summary(&self) -> String {
        let (passed, failed, total) = (self.passed(), self.failed(), self.total());
        let mut ret_string = format!("Total checks: {total}\n");
        if total > 0 {
            ret_string += format!("Passed: {passed} ({:.1}%)\n", percent(passed, total)).as_str();
            ret_string += format!("Failed: {failed} ({:.1}%)\n", percent(failed, total)).as_str();
        } else {
            ret_string.push_str("Passed: 0\nFailed: 0\n");
        }
        if failed > 0 {
            ret_string.push_str("\n--- FAILED CHECKS ---\n");
            for r in self.results.iter().filter(|r| !r.success) {
                ret_string += format!(
                    "  {}\n    API: {}\n    Error: {}\n",
                    r.label,
                    r.api_path,
                    r.error.as_deref().unwrap_or_default()
                )
                .as_str();
            }
        }
        ret_string.push_str("\n--- PASSED CHECKS ---\n");
        for r in self.results.iter().filter(|r| r.success) {
            let value = r.value.as_deref().unwrap_or_default();
            let line = match r.check_type {
                CheckType::Read => format!("  {}: {value}\n", r.label),
                CheckType::ReadWrite => format!("  {}: {value} (original)\n", r.label),
                CheckType::Method => format!("  {}: OK\n", r.label),
            };
            ret_string.push_str(&line);
        }
        ret_string
    }

    /// Fixed-width table with one row per check.
    pub fn table(&self) -> String {
        let mut ret_string = String::from(
            "| Parameter | API Path | Status | Value/Notes |\n|-----------|----------|--------|-------------|\n",
        );
        for r in &self.results {
            let status = if r.success { "[PASS]" } else { "[FAIL]" };
            ret_string += format!(
                "| {:25} | {:30} | {:6} | {:30} |\n",
                truncate(r.label, 25),
                truncate(r.api_path, 30),
                status,
                truncate(&r.notes(), 30),
            )
            .as_str();
        }
        ret_string
    }
}

/// Uniform parameter access to glitchers and targets.
trait ParameterAccess {
    fn read(&self, name: &str) -> Result<ParameterValue, GlitchError>;
    fn write(&mut self, name: &str, value: &ParameterValue) -> Result<(), GlitchError>;
}

impl ParameterAccess for dyn Glitcher + '_ {
    fn read(&self, name: &str) -> Result<ParameterValue, GlitchError> {
        self.parameter(name)
    }

    fn write(&mut self, name: &str, value: &ParameterValue) -> Result<(), GlitchError> {
        self.set_parameter(name, value)
    }
}

impl ParameterAccess for dyn Target + '_ {
    fn read(&self, name: &str) -> Result<ParameterValue, GlitchError> {
        self.parameter(name)
    }

    fn write(&mut self, name: &str, value: &ParameterValue) -> Result<(), GlitchError> {
        self.set_parameter(name, value)
    }
}

fn run_read<P: ParameterAccess + ?Sized>(device: &P, check: &Check) -> CheckResult {
    let mut result = CheckResult::new(check);
    match device.read(check.name) {
        Ok(value) => {
            debug!("READ {} = {value}", check.api_path);
            result.success = true;
            result.value = Some(value.to_string());
        }
        Err(e) => {
            debug!("READ {} FAILED: {e}", check.api_path);
            result.error = Some(e.to_string());
        }
    }
    result
}

fn run_read_write<P: ParameterAccess + ?Sized>(
    device: &mut P,
    check: &Check,
    values: &[TestValue],
) -> CheckResult {
    let mut result = CheckResult::new(check);
    let original = match device.read(check.name) {
        Ok(original) => original,
        Err(e) => {
            debug!("WRITE TEST {} FAILED: {e}", check.api_path);
            result.error = Some(e.to_string());
            return result;
        }
    };
    debug!("Original {} = {original}", check.api_path);

    let mut last_error = None;
    for value in values {
        let written = ParameterValue::from(*value);
        let read = device
            .write(check.name, &written)
            .and_then(|_| device.read(check.name));
        let readback = match read {
            Ok(read) => {
                let matched = read.matches(&written);
                debug!(
                    "  SET {written} -> READ {read} {}",
                    if matched { "OK" } else { "MISMATCH" }
                );
                Readback {
                    written,
                    read: Some(read),
                    matched,
                }
            }
            Err(e) => {
                debug!("  SET {written} FAILED: {e}");
                last_error = Some(e.to_string());
                Readback {
                    written,
                    read: None,
                    matched: false,
                }
            }
        };
        result.readbacks.push(readback);
    }

    match device.write(check.name, &original) {
        Ok(()) => debug!("Restored {} = {original}", check.api_path),
        Err(e) => warn!("Could not restore {} to {original}: {e}", check.api_path),
    }

    result.success = result.readbacks.iter().any(|r| r.matched);
    if !result.success {
        result.error = Some(last_error.unwrap_or_else(|| String::from("no value read back as written")));
    }
    result.value = Some(original.to_string());
    result
}

fn run_method(glitcher: &mut dyn Glitcher, check: &Check, argument: Option<&str>) -> CheckResult {
    let mut result = CheckResult::new(check);
    match glitcher.invoke(check.name, argument) {
        Ok(reply) => {
            debug!("METHOD {} = {reply}", check.api_path);
            result.success = true;
            result.value = Some(reply);
        }
        Err(e) => {
            debug!("METHOD {} FAILED: {e}", check.api_path);
            result.error = Some(e.to_string());
        }
    }
    result
}

fn run_glitcher_check(glitcher: &mut dyn Glitcher, check: &Check) -> CheckResult {
    match check.kind {
        CheckKind::Read => run_read(&*glitcher, check),
        CheckKind::ReadWrite(values) => run_read_write(glitcher, check, values),
        CheckKind::Method(argument) => run_method(glitcher, check, argument),
    }
}

fn run_target_check(target: &mut dyn Target, check: &Check) -> CheckResult {
    match check.kind {
        CheckKind::Read => run_read(&*target, check),
        CheckKind::ReadWrite(values) => run_read_write(target, check, values),
        CheckKind::Method(_) => {
            let mut result = CheckResult::new(check);
            result.error = Some(String::from("targets have no invokable methods"));
            result
        }
    }
}

/// Run the whole catalog against a connected bench.
///
/// # Arguments
///
/// * `glitcher` - Glitcher to verify
/// * `target` - Target to verify as well, or `None` to skip the target checks
///
/// # Returns: `Result<VerificationReport, GlitchError>`
/// * `Ok(VerificationReport)` - Every check ran, failed or not
/// * `Err(GlitchError)` - The glitch module could not be enabled, nothing was checked
///
/// # Examples
///
/// ```rust,no_run
/// # use glitch_sweep::config::sweep_config::DeviceConfig;
/// # use glitch_sweep::platforms::platform::platform_for_name;
/// # use glitch_sweep::verify::verify_bench;
/// # fn example() -> Result<(), glitch_sweep::error::GlitchError> {
/// let mut bench = platform_for_name("simulated")?.connect(&DeviceConfig::default())?;
/// let report = verify_bench(bench.glitcher.as_mut(), Some(bench.target.as_mut()))?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
pub fn verify_bench(
    glitcher: &mut dyn Glitcher,
    target: Option<&mut dyn Target>,
) -> Result<VerificationReport, GlitchError> {
    // width and offset are only writable once the glitch module runs off the PLL
    glitcher.set_parameter("enabled", &ParameterValue::Bool(true))?;
    glitcher.set_parameter("clk_src", &ParameterValue::from("pll"))?;

    let mut report = VerificationReport::default();
    let mut current = None;
    for check in GLITCHER_CHECKS.iter().filter(|c| c.category != Category::Husky) {
        if current != Some(check.category) {
            info!("Checking {}", check.category);
            current = Some(check.category);
        }
        report.results.push(run_glitcher_check(glitcher, check));
    }

    match target {
        Some(target) => {
            info!("Checking {}", Category::Target);
            for check in TARGET_CHECKS {
                report.results.push(run_target_check(target, check));
            }
        }
        None => info!("Skipping {}: no target requested", Category::Target),
    }

    let is_husky = matches!(glitcher.parameter("is_husky"), Ok(ParameterValue::Bool(true)));
    if is_husky {
        info!("Checking {}", Category::Husky);
        for check in GLITCHER_CHECKS.iter().filter(|c| c.category == Category::Husky) {
            report.results.push(run_glitcher_check(glitcher, check));
        }
    } else {
        info!("Skipping {}: device is not a Husky", Category::Husky);
    }

    Ok(report)
}

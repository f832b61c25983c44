//! Throughput readings and the human-readable speed syntax.
//!
//! All rates are bytes per second. Expected speeds are written as a
//! number with an optional `b`/`k`/`m`/`g` suffix (bytes, KiB, MiB, GiB).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Binary unit step used by both the parser and the formatter.
const UNIT_STEP: f64 = 1024.0;

/// Units used by [`format_speed`], smallest first.
const SPEED_UNITS: [&str; 5] = ["B/s", "KiB/s", "MiB/s", "GiB/s", "TiB/s"];

/// Regex pattern for `<number>[unit]` speed strings.
pub const SPEED_PATTERN: &str = r"(?i)^(?P<value>[0-9]+(?:\.[0-9]+)?)(?P<unit>[bkmg])?$";

static SPEED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SPEED_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Bandwidth
// ---------------------------------------------------------------------------

/// A download/upload throughput pair in bytes per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bandwidth {
    pub download: f64,
    pub upload: f64,
}

impl Bandwidth {
    pub const fn new(download: f64, upload: f64) -> Self {
        Self { download, upload }
    }

    /// Component-wise multiplication by `ratio`.
    pub fn scaled(self, ratio: f64) -> Self {
        Self {
            download: self.download * ratio,
            upload: self.upload * ratio,
        }
    }

    /// `true` if either direction is strictly below the matching `floor`
    /// component.
    pub fn falls_below(&self, floor: &Bandwidth) -> bool {
        self.download < floor.download || self.upload < floor.upload
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            format_speed(self.download),
            format_speed(self.upload)
        )
    }
}

// ---------------------------------------------------------------------------
// Parsing / formatting
// ---------------------------------------------------------------------------

/// Parse a speed such as `"10m"`, `"512K"` or `"2000"` into bytes per second.
///
/// A missing suffix means bytes. Fractional results are truncated to a
/// whole number of bytes.
pub fn parse_speed(input: &str) -> Result<f64, CoreError> {
    let trimmed = input.trim();
    let captures = SPEED_RE.captures(trimmed).ok_or_else(|| {
        CoreError::Validation(format!(
            "Invalid speed '{trimmed}': expected a number with an optional b/k/m/g suffix"
        ))
    })?;

    let value: f64 = captures["value"]
        .parse()
        .map_err(|e| CoreError::Validation(format!("Invalid speed '{trimmed}': {e}")))?;

    let unit = captures
        .name("unit")
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| "b".to_string());

    let multiplier = match unit.as_str() {
        "k" => UNIT_STEP,
        "m" => UNIT_STEP * UNIT_STEP,
        "g" => UNIT_STEP * UNIT_STEP * UNIT_STEP,
        _ => 1.0,
    };

    Ok((value * multiplier).trunc())
}

/// Render a byte rate with two decimals in the largest unit that keeps the
/// value below 1024, e.g. `5452595.2` -> `"5.20 MiB/s"`.
pub fn format_speed(bytes_per_sec: f64) -> String {
    let mut value = bytes_per_sec;
    let mut unit = 0;
    while value >= UNIT_STEP && unit < SPEED_UNITS.len() - 1 {
        value /= UNIT_STEP;
        unit += 1;
    }
    format!("{value:.2} {}", SPEED_UNITS[unit])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

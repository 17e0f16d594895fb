//! Parsers for rep targets and logged sets.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{WEIGHT_ROUNDING_STEP, WEIGHT_UNIT};

static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*-\s*(\d+)$").expect("valid range regex"));
static SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)$").expect("valid single regex"));
static FIRST_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid integer regex"));

/// A rep target. Both bounds are `None` when the target can't be evaluated
/// (AMRAP, empty, free text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl RepRange {
    pub fn unparseable() -> Self {
        Self::default()
    }

    /// `(min, max)` when both bounds are known.
    pub fn bounds(&self) -> Option<(u32, u32)> {
        Some((self.min?, self.max?))
    }

    /// Single-number target such as "5".
    pub fn is_single(&self) -> bool {
        matches!(self.bounds(), Some((min, max)) if min == max)
    }
}

/// Parse "8-12", "5", or anything else into a `RepRange`.
pub fn parse_rep_range(target: Option<&str>) -> RepRange {
    let Some(target) = target.map(str::trim).filter(|t| !t.is_empty()) else {
        return RepRange::unparseable();
    };

    if let Some(caps) = RANGE.captures(target) {
        let min = caps[1].parse::<u32>().ok();
        let max = caps[2].parse::<u32>().ok();
        return match (min, max) {
            (Some(min), Some(max)) if min <= max => RepRange {
                min: Some(min),
                max: Some(max),
            },
            _ => RepRange::unparseable(),
        };
    }

    if let Some(caps) = SINGLE.captures(target)
        && let Ok(n) = caps[1].parse::<u32>()
    {
        return RepRange {
            min: Some(n),
            max: Some(n),
        };
    }

    RepRange::unparseable()
}

/// First integer in the logged reps, e.g. "10 reps" → 10.
pub fn parse_logged_reps(reps: Option<&str>) -> Option<u32> {
    FIRST_INT.find(reps?)?.as_str().parse().ok()
}

/// Logged weight as a number. Missing, empty and "bodyweight" count as 0.
pub fn parse_weight(weight: Option<&str>) -> Option<f64> {
    let raw = match weight.map(str::trim) {
        None | Some("") => return Some(0.0),
        Some(w) if w.eq_ignore_ascii_case("bodyweight") => return Some(0.0),
        Some(w) => w,
    };

    let numeric: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse::<f64>().ok().filter(|w| w.is_finite())
}

/// Round to the nearest 2.5 and format with a unit, or `None` if ≤ 0.
pub fn format_weight(weight: f64) -> Option<String> {
    if !weight.is_finite() {
        return None;
    }
    let rounded = (weight / WEIGHT_ROUNDING_STEP).round() * WEIGHT_ROUNDING_STEP;
    if rounded <= 0.0 {
        return None;
    }
    if rounded.fract() == 0.0 {
        Some(format!("{rounded:.0} {WEIGHT_UNIT}"))
    } else {
        Some(format!("{rounded:.1} {WEIGHT_UNIT}"))
    }
}

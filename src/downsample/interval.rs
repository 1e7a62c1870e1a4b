//! Bucket interval specifiers
//!
//! An interval is a width in milliseconds plus a unit selecting how bucket
//! boundaries are computed.
//!
//! ```text
//! 10s  -> 10_000 ms fixed buckets
//! 1h   -> 3_600_000 ms fixed buckets
//! 1n   -> calendar months
//! 1y   -> calendar years
//! 0o   -> data-driven runs
//! ```

use super::error::{DownsampleError, DownsampleResult};
use nom::{
    character::complete::{alpha0, digit1},
    combinator::{all_consuming, map_res},
    sequence::pair,
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SECOND: i64 = 1000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// How bucket boundaries are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    /// Fixed millisecond width
    Fixed,
    /// Calendar month in the configured time zone
    Month,
    /// Calendar year in the configured time zone
    Year,
    /// Boundaries inferred from transitions in the data
    Run,
}

impl IntervalUnit {
    /// Select a unit from the trailing character of a token
    ///
    /// Anything unrecognized falls back to fixed width.
    pub fn from_token(token: &str) -> Self {
        match token.trim().chars().last() {
            Some('n') => Self::Month,
            Some('y') => Self::Year,
            Some('o') => Self::Run,
            _ => Self::Fixed,
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Month => write!(f, "month"),
            Self::Year => write!(f, "year"),
            Self::Run => write!(f, "run"),
        }
    }
}

/// A bucket width and its unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSpec {
    /// Width in milliseconds; the starting width for calendar units
    pub width_ms: i64,
    /// Boundary unit
    pub unit: IntervalUnit,
}

impl IntervalSpec {
    /// Pair a width with a unit token such as `"1d"`, `"n"` or `"o"`
    pub fn new(width_ms: i64, token: &str) -> Self {
        Self {
            width_ms,
            unit: IntervalUnit::from_token(token),
        }
    }

    /// Fixed-width buckets of `width_ms`
    pub fn fixed(width_ms: i64) -> Self {
        Self {
            width_ms,
            unit: IntervalUnit::Fixed,
        }
    }

    /// Calendar months
    pub fn month() -> Self {
        Self {
            width_ms: 30 * DAY,
            unit: IntervalUnit::Month,
        }
    }

    /// Calendar years
    pub fn year() -> Self {
        Self {
            width_ms: 365 * DAY,
            unit: IntervalUnit::Year,
        }
    }

    /// Data-driven run buckets
    pub fn run() -> Self {
        Self {
            width_ms: 0,
            unit: IntervalUnit::Run,
        }
    }

    /// Parse `<amount><unit>`
    ///
    /// Calendar units always span one month or year, so `n` and `y` only
    /// accept an amount of 1.
    pub fn parse(input: &str) -> DownsampleResult<Self> {
        let trimmed = input.trim();
        let (_, (amount, unit)) = all_consuming(parse_amount_unit)(trimmed).map_err(|_| {
            DownsampleError::InvalidConfig(format!("invalid interval '{}'", input))
        })?;

        let (multiplier, unit) = match unit {
            "" | "ms" => (1, IntervalUnit::Fixed),
            "s" => (SECOND, IntervalUnit::Fixed),
            "m" => (MINUTE, IntervalUnit::Fixed),
            "h" => (HOUR, IntervalUnit::Fixed),
            "d" => (DAY, IntervalUnit::Fixed),
            "w" => (7 * DAY, IntervalUnit::Fixed),
            "n" => (30 * DAY, IntervalUnit::Month),
            "y" => (365 * DAY, IntervalUnit::Year),
            "o" => (1, IntervalUnit::Run),
            other => {
                return Err(DownsampleError::InvalidConfig(format!(
                    "unknown interval unit '{}' in '{}'",
                    other, input
                )))
            }
        };

        if matches!(unit, IntervalUnit::Month | IntervalUnit::Year) && amount != 1 {
            return Err(DownsampleError::InvalidConfig(format!(
                "calendar interval '{}' must span exactly one {}",
                input, unit
            )));
        }

        let width_ms = amount.checked_mul(multiplier).ok_or_else(|| {
            DownsampleError::InvalidConfig(format!("interval '{}' overflows", input))
        })?;

        if width_ms <= 0 && unit != IntervalUnit::Run {
            return Err(DownsampleError::InvalidConfig(format!(
                "interval '{}' must be positive",
                input
            )));
        }

        Ok(Self { width_ms, unit })
    }
}

fn parse_amount_unit(input: &str) -> IResult<&str, (i64, &str)> {
    pair(map_res(digit1, |s: &str| s.parse::<i64>()), alpha0)(input)
}

impl FromStr for IntervalSpec {
    type Err = DownsampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IntervalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms/{}", self.width_ms, self.unit)
    }
}

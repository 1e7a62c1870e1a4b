//! Rate options
//!
//! Selects between plain values and counter semantics for a downsampler.
//! Textual form: `<kind>[,max[,reset]]`, e.g. `counter,65535,1000`.

use super::error::{DownsampleError, DownsampleResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How consecutive counter readings are turned into deltas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CounterKind {
    /// Only increases; a decrease means the counter wrapped at its max
    Monotonic,
    /// Increases are kept, decreases clamp to zero
    BiInc,
    /// Decreases are kept (as a positive amount), increases clamp to zero
    BiDec,
}

impl CounterKind {
    /// Parse a kind token, `None` when the token names no counter
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "counter" | "mono-inc-counter" => Some(Self::Monotonic),
            "bi-inc-counter" => Some(Self::BiInc),
            "bi-dec-counter" => Some(Self::BiDec),
            _ => None,
        }
    }

    /// Canonical token for this kind
    pub fn token(&self) -> &'static str {
        match self {
            Self::Monotonic => "counter",
            Self::BiInc => "bi-inc-counter",
            Self::BiDec => "bi-dec-counter",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Counter configuration for a downsampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateOptions {
    /// Whether samples are cumulative counter readings
    pub counter: bool,
    /// Delta policy, meaningful only when `counter` is set
    pub counter_kind: CounterKind,
    /// Value at which a monotonic counter rolls over
    pub counter_max: i64,
    /// Rate (per second) above which a delta is treated as a reset; 0 disables
    pub reset_value: i64,
}

impl Default for RateOptions {
    fn default() -> Self {
        Self {
            counter: false,
            counter_kind: CounterKind::Monotonic,
            counter_max: i64::MAX,
            reset_value: 0,
        }
    }
}

impl RateOptions {
    /// Counter options of the given kind with default max and no reset threshold
    pub fn counter(kind: CounterKind) -> Self {
        Self {
            counter: true,
            counter_kind: kind,
            ..Self::default()
        }
    }

    /// Set the rollover maximum
    pub fn with_counter_max(mut self, counter_max: i64) -> Self {
        self.counter_max = counter_max;
        self
    }

    /// Set the reset threshold
    pub fn with_reset_value(mut self, reset_value: i64) -> Self {
        self.reset_value = reset_value;
        self
    }

    /// The counter kind, or `None` for plain values
    pub fn counter_kind(&self) -> Option<CounterKind> {
        self.counter.then_some(self.counter_kind)
    }

    /// Parse `<kind>[,max[,reset]]`
    ///
    /// An unrecognized kind yields plain (non-counter) options. Empty numeric
    /// fields take their defaults; anything else non-numeric is rejected.
    pub fn parse(spec: &str) -> DownsampleResult<Self> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        if parts.len() > 3 {
            return Err(DownsampleError::InvalidConfig(format!(
                "rate options must be kind[,max[,reset]], received {} parts",
                parts.len()
            )));
        }

        let mut options = match CounterKind::from_token(parts[0]) {
            Some(kind) => Self::counter(kind),
            None => Self::default(),
        };

        if let Some(max) = parts.get(1).filter(|p| !p.is_empty()) {
            options.counter_max = max.parse().map_err(|_| {
                DownsampleError::InvalidConfig(format!(
                    "counter max is not a number, received '{}'",
                    max
                ))
            })?;
        }

        if let Some(reset) = parts.get(2).filter(|p| !p.is_empty()) {
            options.reset_value = reset.parse().map_err(|_| {
                DownsampleError::InvalidConfig(format!(
                    "reset value is not a number, received '{}'",
                    reset
                ))
            })?;
        }

        Ok(options)
    }
}

impl FromStr for RateOptions {
    type Err = DownsampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.counter_kind() {
            Some(kind) => write!(f, "{},{},{}", kind, self.counter_max, self.reset_value),
            None => write!(f, "none,{},{}", self.counter_max, self.reset_value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = RateOptions::default();
        assert!(!opts.counter);
        assert_eq!(opts.counter_kind(), None);
        assert_eq!(opts.counter_max, i64::MAX);
        assert_eq!(opts.reset_value, 0);
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!(
            RateOptions::parse("counter").unwrap().counter_kind(),
            Some(CounterKind::Monotonic)
        );
        assert_eq!(
            RateOptions::parse("mono-inc-counter").unwrap().counter_kind(),
            Some(CounterKind::Monotonic)
        );
        assert_eq!(
            RateOptions::parse("bi-inc-counter").unwrap().counter_kind(),
            Some(CounterKind::BiInc)
        );
        assert_eq!(
            RateOptions::parse("bi-dec-counter").unwrap().counter_kind(),
            Some(CounterKind::BiDec)
        );
        assert_eq!(RateOptions::parse("gauge").unwrap().counter_kind(), None);
    }

    #[test]
    fn test_parse_numeric_fields() {
        let opts: RateOptions = "counter,65535,1000".parse().unwrap();
        assert_eq!(opts.counter_max, 65535);
        assert_eq!(opts.reset_value, 1000);

        let opts = RateOptions::parse("counter,,5").unwrap();
        assert_eq!(opts.counter_max, i64::MAX);
        assert_eq!(opts.reset_value, 5);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            RateOptions::parse("counter,big"),
            Err(DownsampleError::InvalidConfig(_))
        ));
        assert!(matches!(
            RateOptions::parse("counter,10,often"),
            Err(DownsampleError::InvalidConfig(_))
        ));
        assert!(matches!(
            RateOptions::parse("counter,1,2,3"),
            Err(DownsampleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_display_reparses() {
        let opts = RateOptions::counter(CounterKind::BiDec)
            .with_counter_max(100)
            .with_reset_value(2);
        assert_eq!(opts.to_string(), "bi-dec-counter,100,2");
        assert_eq!(RateOptions::parse(&opts.to_string()).unwrap(), opts);
    }
}

//! Counter delta computation
//!
//! Turns two consecutive cumulative counter readings into the amount the
//! counter moved between them, according to a [`CounterKind`]:
//!
//! - **Monotonic**: a decrease means the counter wrapped at `counter_max`;
//!   a rate above the reset threshold is treated as a counter reset and
//!   contributes 0
//! - **BiInc**: decreases clamp to 0
//! - **BiDec**: increases clamp to 0; decreases are reported as a positive amount

use super::error::{DownsampleError, DownsampleResult};
use super::rate::{CounterKind, RateOptions};
use crate::source::{Sample, SampleValue};
use std::fmt;

/// Delta policy applied to consecutive counter samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterTransform {
    kind: CounterKind,
    counter_max: i64,
    reset_value: i64,
}

impl CounterTransform {
    pub fn new(kind: CounterKind, counter_max: i64, reset_value: i64) -> Self {
        Self {
            kind,
            counter_max,
            reset_value,
        }
    }

    /// Monotonic counter rolling over at `counter_max`
    pub fn monotonic(counter_max: i64, reset_value: i64) -> Self {
        Self::new(CounterKind::Monotonic, counter_max, reset_value)
    }

    /// Transform described by rate options, `None` for plain values
    pub fn from_options(options: &RateOptions) -> Option<Self> {
        options
            .counter_kind()
            .map(|kind| Self::new(kind, options.counter_max, options.reset_value))
    }

    /// Amount the counter moved from `previous` to `next`
    ///
    /// Integer samples are differenced in integer arithmetic; overflow wraps.
    /// Callers check ordering with [`ensure_increasing`] first.
    pub fn delta(&self, previous: &Sample, next: &Sample) -> f64 {
        match self.kind {
            CounterKind::Monotonic => {
                let delta = self.wrapped_delta(previous.value, next.value);
                if self.is_reset(delta, next.timestamp - previous.timestamp) {
                    0.0
                } else {
                    delta
                }
            }
            CounterKind::BiInc => raw_delta(previous.value, next.value).max(0.0),
            CounterKind::BiDec => {
                let delta = raw_delta(previous.value, next.value);
                if delta < 0.0 {
                    -delta
                } else {
                    0.0
                }
            }
        }
    }

    fn wrapped_delta(&self, previous: SampleValue, next: SampleValue) -> f64 {
        match (previous, next) {
            (SampleValue::Integer(a), SampleValue::Integer(b)) => {
                let delta = b.wrapping_sub(a);
                if delta < 0 {
                    self.counter_max.wrapping_sub(a).wrapping_add(b) as f64
                } else {
                    delta as f64
                }
            }
            _ => {
                let (a, b) = (previous.to_f64(), next.to_f64());
                let delta = b - a;
                if delta < 0.0 {
                    self.counter_max as f64 - a + b
                } else {
                    delta
                }
            }
        }
    }

    fn is_reset(&self, delta: f64, elapsed_ms: i64) -> bool {
        self.reset_value > 0 && delta * 1000.0 / elapsed_ms as f64 > self.reset_value as f64
    }
}

impl fmt::Display for CounterTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(max={}, reset={})",
            self.kind, self.counter_max, self.reset_value
        )
    }
}

fn raw_delta(previous: SampleValue, next: SampleValue) -> f64 {
    match (previous, next) {
        (SampleValue::Integer(a), SampleValue::Integer(b)) => b.wrapping_sub(a) as f64,
        _ => next.to_f64() - previous.to_f64(),
    }
}

/// Fail unless `next` is strictly later than `previous`
pub fn ensure_increasing(
    previous: &Sample,
    next: &Sample,
    cursor: &dyn fmt::Display,
) -> DownsampleResult<()> {
    if next.timestamp <= previous.timestamp {
        return Err(DownsampleError::OrderingViolated {
            previous: previous.timestamp,
            next: next.timestamp,
            cursor: cursor.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    #[test]
    fn test_monotonic_plain_increase() {
        let t = CounterTransform::monotonic(i64::MAX, 0);
        let d = t.delta(&Sample::integer(0, 100), &Sample::integer(MINUTE, 160));
        assert_eq!(d, 60.0);
    }

    #[test]
    fn test_monotonic_rollover() {
        let t = CounterTransform::monotonic(1000, 0);
        let d = t.delta(&Sample::integer(0, 990), &Sample::integer(MINUTE, 5));
        assert_eq!(d, 15.0);

        let d = t.delta(&Sample::float(0, 990.0), &Sample::float(MINUTE, 5.5));
        assert_eq!(d, 15.5);
    }

    #[test]
    fn test_monotonic_reset_threshold() {
        // 600 per minute is 10 per second
        let t = CounterTransform::monotonic(i64::MAX, 5);
        let d = t.delta(&Sample::integer(0, 0), &Sample::integer(MINUTE, 600));
        assert_eq!(d, 0.0);

        let t = CounterTransform::monotonic(i64::MAX, 10);
        let d = t.delta(&Sample::integer(0, 0), &Sample::integer(MINUTE, 600));
        assert_eq!(d, 600.0);
    }

    #[test]
    fn test_integer_precision_preserved() {
        let t = CounterTransform::monotonic(i64::MAX, 0);
        let big = 9_007_199_254_740_993; // 2^53 + 1
        let d = t.delta(&Sample::integer(0, big), &Sample::integer(1, big + 2));
        assert_eq!(d, 2.0);
    }

    #[test]
    fn test_bidirectional_clamps() {
        let inc = CounterTransform::new(CounterKind::BiInc, i64::MAX, 0);
        let dec = CounterTransform::new(CounterKind::BiDec, i64::MAX, 0);
        let up = (Sample::integer(0, 10), Sample::integer(MINUTE, 25));
        let down = (Sample::integer(0, 25), Sample::integer(MINUTE, 10));

        assert_eq!(inc.delta(&up.0, &up.1), 15.0);
        assert_eq!(inc.delta(&down.0, &down.1), 0.0);
        assert_eq!(dec.delta(&up.0, &up.1), 0.0);
        assert_eq!(dec.delta(&down.0, &down.1), 15.0);
    }

    #[test]
    fn test_from_options() {
        assert!(CounterTransform::from_options(&RateOptions::default()).is_none());

        let opts = RateOptions::counter(CounterKind::BiInc).with_counter_max(50);
        let t = CounterTransform::from_options(&opts).unwrap();
        assert_eq!(t, CounterTransform::new(CounterKind::BiInc, 50, 0));
        assert_eq!(t.to_string(), "bi-inc-counter(max=50, reset=0)");
    }

    #[test]
    fn test_ensure_increasing() {
        let a = Sample::integer(1000, 1);
        let b = Sample::integer(1000, 2);
        assert!(ensure_increasing(&a, &Sample::integer(1001, 2), &"cursor").is_ok());

        let err = ensure_increasing(&a, &b, &"cursor").unwrap_err();
        assert!(matches!(
            err,
            DownsampleError::OrderingViolated {
                previous: 1000,
                next: 1000,
                ..
            }
        ));
    }
}

//! Fixed-width interval cursor
//!
//! Buckets are `width` milliseconds wide and aligned so that
//! `(bucket_start + offset) % width == 0`. The offset shifts bucket edges
//! onto local time, e.g. `+19_800_000` puts hourly edges on IST half hours.
//!
//! With a [`CounterTransform`] the cursor yields deltas between consecutive
//! samples instead of the samples themselves. Each delta belongs to the
//! bucket of its earlier sample, and a trailing sample with no successor
//! produces nothing.

use super::counter::{ensure_increasing, CounterTransform};
use super::cursor::{exhausted, IntervalCursor, Lifecycle, ValueStream};
use super::error::{DownsampleError, DownsampleResult};
use crate::source::{Sample, SeekableSource};
use std::fmt;

/// What the cursor yields for each sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueTransform {
    /// The sample value itself
    Passthrough,
    /// The counter delta to the following sample
    Counter(CounterTransform),
}

impl fmt::Display for ValueTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueTransform::Passthrough => write!(f, "passthrough"),
            ValueTransform::Counter(transform) => write!(f, "{}", transform),
        }
    }
}

/// Cursor producing fixed-width buckets from a sample source
pub struct FixedIntervalCursor<S> {
    source: S,
    width: i64,
    offset: i64,
    transform: ValueTransform,
    /// End (exclusive) of the current bucket
    boundary: i64,
    /// Lookahead sample once initialized
    state: Lifecycle<Sample>,
}

impl<S: SeekableSource> FixedIntervalCursor<S> {
    /// Cursor yielding sample values
    pub fn new(source: S, width: i64, offset: i64) -> DownsampleResult<Self> {
        Self::with_transform(source, width, offset, ValueTransform::Passthrough)
    }

    /// Cursor yielding counter deltas
    pub fn with_counter(
        source: S,
        width: i64,
        offset: i64,
        transform: CounterTransform,
    ) -> DownsampleResult<Self> {
        Self::with_transform(source, width, offset, ValueTransform::Counter(transform))
    }

    pub fn with_transform(
        source: S,
        width: i64,
        offset: i64,
        transform: ValueTransform,
    ) -> DownsampleResult<Self> {
        if width <= 0 {
            return Err(DownsampleError::InvalidConfig(format!(
                "interval width must be positive, got {}",
                width
            )));
        }
        Ok(Self {
            source,
            width,
            offset,
            transform,
            boundary: width,
            state: Lifecycle::Uninitialized,
        })
    }

    /// Current bucket width in milliseconds
    pub fn width(&self) -> i64 {
        self.width
    }

    /// Start of the bucket containing `timestamp`
    pub fn align(&self, timestamp: i64) -> DownsampleResult<i64> {
        // Widened so offsets near the ends of the range cannot overflow
        let phase = (i128::from(timestamp) + i128::from(self.offset))
            .rem_euclid(i128::from(self.width)) as i64;
        timestamp
            .checked_sub(phase)
            .ok_or(DownsampleError::TimestampOutOfRange(timestamp))
    }

    /// End (exclusive) of the bucket containing `timestamp`
    fn bucket_end(&self, timestamp: i64) -> DownsampleResult<i64> {
        self.align(timestamp)?
            .checked_add(self.width)
            .ok_or(DownsampleError::TimestampOutOfRange(timestamp))
    }

    fn ensure_ready(&mut self) -> DownsampleResult<()> {
        if self.state.is_uninitialized() {
            self.pull()?;
            if let Lifecycle::Ready(lookahead) = self.state {
                self.boundary = self.bucket_end(lookahead.timestamp)?;
            }
        }
        Ok(())
    }

    /// Buffer the next sample as lookahead
    ///
    /// Counter mode only keeps a lookahead that has a successor to pair with.
    fn pull(&mut self) -> DownsampleResult<()> {
        self.state = if self.source.has_next()? {
            let sample = self.source.next_sample()?;
            if self.is_counter() && !self.source.has_next()? {
                Lifecycle::Exhausted
            } else {
                Lifecycle::Ready(sample)
            }
        } else {
            Lifecycle::Exhausted
        };
        Ok(())
    }

    fn is_counter(&self) -> bool {
        matches!(self.transform, ValueTransform::Counter(_))
    }
}

impl<S: SeekableSource> ValueStream for FixedIntervalCursor<S> {
    fn has_next_value(&mut self) -> DownsampleResult<bool> {
        self.ensure_ready()?;
        Ok(self
            .state
            .ready()
            .is_some_and(|lookahead| lookahead.timestamp < self.boundary))
    }

    fn next_value(&mut self) -> DownsampleResult<f64> {
        if !self.has_next_value()? {
            return Err(exhausted(&*self));
        }
        let current = match self.state {
            Lifecycle::Ready(sample) => sample,
            _ => return Err(exhausted(&*self)),
        };

        match self.transform {
            ValueTransform::Passthrough => {
                self.pull()?;
                Ok(current.to_f64())
            }
            ValueTransform::Counter(transform) => {
                let next = self.source.next_sample()?;
                ensure_increasing(&current, &next, &*self)?;
                self.state = if self.source.has_next()? {
                    Lifecycle::Ready(next)
                } else {
                    Lifecycle::Exhausted
                };
                Ok(transform.delta(&current, &next))
            }
        }
    }
}

impl<S: SeekableSource> IntervalCursor for FixedIntervalCursor<S> {
    fn interval_timestamp(&self) -> DownsampleResult<i64> {
        let start = self
            .boundary
            .checked_sub(self.width)
            .ok_or(DownsampleError::TimestampOutOfRange(self.boundary))?;
        self.align(start)
    }

    fn move_to_next_interval(&mut self) -> DownsampleResult<()> {
        self.ensure_ready()?;
        if let Lifecycle::Ready(lookahead) = self.state {
            self.boundary = self.bucket_end(lookahead.timestamp)?;
        }
        Ok(())
    }

    fn seek_interval(&mut self, timestamp: i64) -> DownsampleResult<()> {
        let target = self.align(timestamp.saturating_add(self.width - 1))?;
        self.reposition(target)
    }

    fn reposition(&mut self, timestamp: i64) -> DownsampleResult<()> {
        self.source.seek(timestamp)?;
        self.state = Lifecycle::Uninitialized;
        Ok(())
    }

    fn current_timestamp(&self) -> Option<i64> {
        self.state.ready().map(|lookahead| lookahead.timestamp)
    }

    fn set_interval_width(&mut self, width_ms: i64) {
        if width_ms > 0 {
            self.width = width_ms;
        }
    }

    fn set_interval_end(&mut self, end: i64) {
        self.boundary = end;
    }
}

impl<S: SeekableSource> fmt::Display for FixedIntervalCursor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FixedIntervalCursor(width={}, offset={}, boundary={}, transform={}, state={}",
            self.width,
            self.offset,
            self.boundary,
            self.transform,
            self.state.label()
        )?;
        if let Some(lookahead) = self.state.ready() {
            write!(f, ", lookahead={}", lookahead)?;
        }
        write!(f, ", source={:?})", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downsample::rate::CounterKind;
    use crate::source::MemorySource;

    const BASE: i64 = 1_356_998_400_000;
    const HALF_HOUR: i64 = 30 * 60 * 1000;
    const HOUR: i64 = 60 * 60 * 1000;
    const IST: i64 = 19_800_000;

    /// Sum each bucket, returning (bucket start, sum)
    fn drain_sums<S: SeekableSource>(cursor: &mut FixedIntervalCursor<S>) -> Vec<(i64, f64)> {
        let mut out = Vec::new();
        while cursor.has_next_value().unwrap() {
            let mut sum = 0.0;
            while cursor.has_next_value().unwrap() {
                sum += cursor.next_value().unwrap();
            }
            out.push((cursor.interval_timestamp().unwrap(), sum));
            cursor.move_to_next_interval().unwrap();
        }
        out
    }

    fn half_hourly(values: &[i64]) -> MemorySource {
        MemorySource::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| Sample::integer(BASE + HALF_HOUR * i as i64, *v))
                .collect(),
        )
    }

    #[test]
    fn test_align() {
        let cursor = FixedIntervalCursor::new(MemorySource::default(), 10_000, 0).unwrap();
        assert_eq!(cursor.align(BASE + 9_999).unwrap(), BASE);
        assert_eq!(cursor.align(BASE + 10_000).unwrap(), BASE + 10_000);
        assert_eq!(cursor.align(-1).unwrap(), -10_000);

        let cursor = FixedIntervalCursor::new(MemorySource::default(), HOUR, IST).unwrap();
        // 05:30 IST is a half hour into the 05:00 local bucket
        assert_eq!(cursor.align(BASE).unwrap(), BASE - HALF_HOUR);
    }

    #[test]
    fn test_align_at_range_limits() {
        let cursor = FixedIntervalCursor::new(MemorySource::default(), HOUR, IST).unwrap();
        let top = cursor.align(i64::MAX).unwrap();
        assert!(top <= i64::MAX && i64::MAX - top < HOUR);
        assert_eq!((i128::from(top) + i128::from(IST)) % i128::from(HOUR), 0);

        assert!(matches!(
            cursor.align(i64::MIN),
            Err(DownsampleError::TimestampOutOfRange(i64::MIN))
        ));
    }

    #[test]
    fn test_bucket_end_past_range_is_an_error() {
        let source = MemorySource::new(vec![Sample::integer(i64::MAX - 5, 1)]);
        let mut cursor = FixedIntervalCursor::new(source, HOUR, 0).unwrap();

        assert!(matches!(
            cursor.has_next_value(),
            Err(DownsampleError::TimestampOutOfRange(_))
        ));
    }

    #[test]
    fn test_seek_near_range_end() {
        let mut cursor =
            FixedIntervalCursor::new(half_hourly(&[100, 110, 120]), HOUR, IST).unwrap();

        cursor.seek_interval(i64::MAX - 10).unwrap();
        assert!(!cursor.has_next_value().unwrap());
    }

    #[test]
    fn test_rejects_non_positive_width() {
        assert!(matches!(
            FixedIntervalCursor::new(MemorySource::default(), 0, 0),
            Err(DownsampleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_passthrough_buckets() {
        let mut cursor =
            FixedIntervalCursor::new(half_hourly(&[100, 110, 120, 130, 140]), HOUR, IST).unwrap();

        assert_eq!(
            drain_sums(&mut cursor),
            vec![
                (BASE - HALF_HOUR, 100.0),
                (BASE + HALF_HOUR, 230.0),
                (BASE + 3 * HALF_HOUR, 270.0),
            ]
        );
        assert!(matches!(
            cursor.next_value(),
            Err(DownsampleError::Exhausted(_))
        ));
    }

    #[test]
    fn test_monotonic_counter_buckets() {
        let transform = CounterTransform::monotonic(i64::MAX, 0);
        let mut cursor = FixedIntervalCursor::with_counter(
            half_hourly(&[100, 110, 120, 130, 140]),
            HOUR,
            IST,
            transform,
        )
        .unwrap();

        // The delta starting at the last sample has no successor
        assert_eq!(
            drain_sums(&mut cursor),
            vec![
                (BASE - HALF_HOUR, 10.0),
                (BASE + HALF_HOUR, 20.0),
                (BASE + 3 * HALF_HOUR, 10.0),
            ]
        );
    }

    #[test]
    fn test_counter_reset_suppressed() {
        let transform = CounterTransform::monotonic(999_999, 5);
        let mut cursor = FixedIntervalCursor::with_counter(
            half_hourly(&[0, 15_000, 0, 15_000, 0]),
            HOUR,
            IST,
            transform,
        )
        .unwrap();

        let values: Vec<f64> = drain_sums(&mut cursor).into_iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bidirectional_counters() {
        let series = [10, 30, 20, 50, 40];

        let inc = CounterTransform::new(CounterKind::BiInc, i64::MAX, 0);
        let mut cursor =
            FixedIntervalCursor::with_counter(half_hourly(&series), HOUR, IST, inc).unwrap();
        let values: Vec<f64> = drain_sums(&mut cursor).into_iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![20.0, 30.0, 0.0]);

        let dec = CounterTransform::new(CounterKind::BiDec, i64::MAX, 0);
        let mut cursor =
            FixedIntervalCursor::with_counter(half_hourly(&series), HOUR, IST, dec).unwrap();
        let values: Vec<f64> = drain_sums(&mut cursor).into_iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_single_counter_sample_yields_nothing() {
        let transform = CounterTransform::monotonic(i64::MAX, 0);
        let mut cursor =
            FixedIntervalCursor::with_counter(half_hourly(&[7]), HOUR, 0, transform).unwrap();
        assert!(!cursor.has_next_value().unwrap());
    }

    #[test]
    fn test_counter_ordering_violation() {
        let source = MemorySource::new(vec![
            Sample::integer(BASE, 1),
            Sample::integer(BASE, 2),
            Sample::integer(BASE + 1, 3),
        ]);
        let transform = CounterTransform::monotonic(i64::MAX, 0);
        let mut cursor = FixedIntervalCursor::with_counter(source, HOUR, 0, transform).unwrap();

        assert!(cursor.has_next_value().unwrap());
        assert!(matches!(
            cursor.next_value(),
            Err(DownsampleError::OrderingViolated { .. })
        ));
    }

    #[test]
    fn test_seek_rounds_up_to_whole_bucket() {
        let samples = (0..=10)
            .map(|k| Sample::integer(BASE + 100 + k * 1000, 40))
            .collect();
        let mut cursor = FixedIntervalCursor::new(MemorySource::new(samples), 10_000, 0).unwrap();

        cursor.seek_interval(BASE + 2_000).unwrap();
        assert_eq!(drain_sums(&mut cursor), vec![(BASE + 10_000, 40.0)]);

        cursor.seek_interval(BASE).unwrap();
        assert_eq!(
            drain_sums(&mut cursor),
            vec![(BASE, 400.0), (BASE + 10_000, 40.0)]
        );
    }

    #[test]
    fn test_width_change_applies_on_next_interval() {
        let mut cursor =
            FixedIntervalCursor::new(half_hourly(&[1, 2, 3, 4]), HOUR, 0).unwrap();
        assert!(cursor.has_next_value().unwrap());

        cursor.set_interval_width(2 * HOUR);
        cursor.move_to_next_interval().unwrap();
        assert_eq!(cursor.width(), 2 * HOUR);

        let mut sum = 0.0;
        while cursor.has_next_value().unwrap() {
            sum += cursor.next_value().unwrap();
        }
        assert_eq!(sum, 10.0);
    }

    #[test]
    fn test_display_mentions_state() {
        let mut cursor = FixedIntervalCursor::new(half_hourly(&[1]), HOUR, 0).unwrap();
        assert!(cursor.to_string().contains("state=uninitialized"));
        cursor.has_next_value().unwrap();
        let rendered = cursor.to_string();
        assert!(rendered.contains("state=ready"));
        assert!(rendered.contains("lookahead=(timestamp=1356998400000, value=1)"));
    }
}

//! Downsampler driver
//!
//! Composes one [`IntervalCursor`] chosen from the interval spec and rate
//! options with a [`Reducer`], and exposes the result as a seekable
//! iterator of `(timestamp, value)` points.
//!
//! | Interval unit | Counter options | Cursor                                   |
//! |---------------|-----------------|------------------------------------------|
//! | fixed         | none            | `FixedIntervalCursor`                    |
//! | fixed         | set             | `FixedIntervalCursor` with counter deltas |
//! | month / year  | either          | `CalendarUnitCursor` over the above      |
//! | run           | either          | `RunBoundaryCursor`                      |

use super::aggregator::Reducer;
use super::calendar::{MonthCursor, YearCursor};
use super::counter::CounterTransform;
use super::cursor::IntervalCursor;
use super::error::{DownsampleError, DownsampleResult};
use super::fixed::{FixedIntervalCursor, ValueTransform};
use super::interval::{IntervalSpec, IntervalUnit};
use super::rate::RateOptions;
use super::run::{RunBoundaryCursor, RunSignal};
use crate::source::SeekableSource;
use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::{OffsetComponents, Tz};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One aggregated bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownsampledPoint {
    /// Bucket start in Unix milliseconds
    pub timestamp: i64,
    /// Reduced value of the bucket
    pub value: f64,
}

impl fmt::Display for DownsampledPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(timestamp={}, value={})", self.timestamp, self.value)
    }
}

/// Seekable iterator of aggregated buckets over one sample source
pub struct Downsampler {
    cursor: Box<dyn IntervalCursor>,
    reducer: Box<dyn Reducer>,
    interval: IntervalSpec,
    current: Option<DownsampledPoint>,
}

impl Downsampler {
    /// Plain values bucketed in UTC
    pub fn new<S, R>(source: S, interval: IntervalSpec, reducer: R) -> DownsampleResult<Self>
    where
        S: SeekableSource + 'static,
        R: Reducer + 'static,
    {
        Self::with_options(source, interval, reducer, Tz::UTC, RateOptions::default())
    }

    /// Full configuration: time zone for bucket alignment and rate options
    pub fn with_options<S, R>(
        source: S,
        interval: IntervalSpec,
        reducer: R,
        tz: Tz,
        options: RateOptions,
    ) -> DownsampleResult<Self>
    where
        S: SeekableSource + 'static,
        R: Reducer + 'static,
    {
        let reducer: Box<dyn Reducer> = Box::new(reducer);
        let cursor = build_cursor(source, interval, tz, options)?;

        tracing::debug!(
            "Downsampler over {} with {} ({}, rate {})",
            interval,
            reducer.name(),
            tz,
            options
        );

        Ok(Self {
            cursor,
            reducer,
            interval,
            current: None,
        })
    }

    /// Whether another bucket is available
    pub fn has_next(&mut self) -> DownsampleResult<bool> {
        self.cursor.has_next_value()
    }

    /// Reduce the current bucket and advance to the next one
    pub fn next_point(&mut self) -> DownsampleResult<DownsampledPoint> {
        if !self.has_next()? {
            return Err(DownsampleError::Exhausted(format!(
                "no bucket pending in {}",
                self
            )));
        }

        let mut bucket = self.cursor.as_mut();
        let value = self.reducer.reduce(&mut bucket)?;
        let timestamp = self.cursor.interval_timestamp()?;
        self.cursor.move_to_next_interval()?;

        let point = DownsampledPoint { timestamp, value };
        tracing::trace!("Emitted bucket {}", point);
        self.current = Some(point);
        Ok(point)
    }

    /// Restart at the first complete bucket at or after `timestamp`
    pub fn seek(&mut self, timestamp: i64) -> DownsampleResult<()> {
        tracing::debug!("Seeking downsampler to {}", timestamp);
        self.cursor.seek_interval(timestamp)
    }

    /// Buckets are read-only
    pub fn remove(&mut self) -> DownsampleResult<()> {
        Err(DownsampleError::Unsupported("remove"))
    }

    /// The most recently emitted point
    pub fn current(&self) -> Option<DownsampledPoint> {
        self.current
    }

    pub fn interval(&self) -> IntervalSpec {
        self.interval
    }
}

impl Iterator for Downsampler {
    type Item = DownsampleResult<DownsampledPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.next_point()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl fmt::Display for Downsampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downsampler(interval={}, reducer={}, current=",
            self.interval,
            self.reducer.name()
        )?;
        match &self.current {
            Some(point) => write!(f, "{}", point)?,
            None => write!(f, "none")?,
        }
        write!(f, ", cursor={})", self.cursor)
    }
}

/// Standard (non-DST) UTC offset of `tz` at the Unix epoch, in milliseconds
pub fn zone_offset_ms(tz: &Tz) -> i64 {
    tz.offset_from_utc_datetime(&NaiveDateTime::default())
        .base_utc_offset()
        .num_milliseconds()
}

fn build_cursor<S: SeekableSource + 'static>(
    source: S,
    interval: IntervalSpec,
    tz: Tz,
    options: RateOptions,
) -> DownsampleResult<Box<dyn IntervalCursor>> {
    let transform = match CounterTransform::from_options(&options) {
        Some(counter) => ValueTransform::Counter(counter),
        None => ValueTransform::Passthrough,
    };

    if interval.unit == IntervalUnit::Run {
        let signal = if options.counter {
            RunSignal::Counter(CounterTransform::monotonic(
                options.counter_max,
                options.reset_value,
            ))
        } else {
            RunSignal::Level
        };
        tracing::debug!("Selected run boundary cursor ({})", signal);
        return Ok(Box::new(RunBoundaryCursor::new(source, signal)));
    }

    let offset = zone_offset_ms(&tz);
    let fixed = FixedIntervalCursor::with_transform(source, interval.width_ms, offset, transform)?;
    tracing::debug!(
        "Selected {} cursor over fixed width {}ms, offset {}ms, {}",
        interval.unit,
        interval.width_ms,
        offset,
        transform
    );

    let cursor: Box<dyn IntervalCursor> = match interval.unit {
        IntervalUnit::Month => Box::new(MonthCursor::new(Box::new(fixed), tz)),
        IntervalUnit::Year => Box::new(YearCursor::new(Box::new(fixed), tz)),
        IntervalUnit::Fixed | IntervalUnit::Run => Box::new(fixed),
    };
    Ok(cursor)
}

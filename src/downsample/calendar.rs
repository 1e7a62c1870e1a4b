//! Calendar-aligned interval cursors
//!
//! Months and years have no fixed millisecond width, so these cursors wrap
//! an inner cursor (plain or counter) and impose boundaries at local
//! midnight of the first day of each unit in a configured time zone.
//!
//! Every inner value whose sample falls inside the calendar unit passes
//! straight through, so the downsampler's reducer sees the unit's values
//! directly. The inner bucket is pinned to end at the unit boundary, and
//! month cursors also resize the inner cursor to the month being opened.

use super::cursor::{exhausted, IntervalCursor, Lifecycle, ValueStream};
use super::error::{DownsampleError, DownsampleResult};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use chrono_tz::Tz;
use std::fmt;
use std::marker::PhantomData;

const DAY_MS: i64 = 86_400_000;

/// Calendar arithmetic for one unit size
pub trait CalendarUnit {
    /// Name used in diagnostics
    const NAME: &'static str;

    /// First day of the unit containing `date`
    fn unit_start(date: NaiveDate) -> Option<NaiveDate>;

    /// First day of the unit after the one starting at `start`
    fn next_unit(start: NaiveDate) -> Option<NaiveDate>;

    /// First day of the unit before the one starting at `start`
    fn previous_unit(start: NaiveDate) -> Option<NaiveDate>;

    /// Width to give the inner cursor for the unit starting at `start`
    fn inner_width_ms(_start: NaiveDate) -> Option<i64> {
        None
    }
}

/// Calendar month
#[derive(Debug, Clone, Copy, Default)]
pub struct Month;

impl CalendarUnit for Month {
    const NAME: &'static str = "month";

    fn unit_start(date: NaiveDate) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
    }

    fn next_unit(start: NaiveDate) -> Option<NaiveDate> {
        if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        }
    }

    fn previous_unit(start: NaiveDate) -> Option<NaiveDate> {
        if start.month() == 1 {
            NaiveDate::from_ymd_opt(start.year() - 1, 12, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() - 1, 1)
        }
    }

    fn inner_width_ms(start: NaiveDate) -> Option<i64> {
        let next = Self::next_unit(start)?;
        Some((next - start).num_days() * DAY_MS)
    }
}

/// Calendar year
#[derive(Debug, Clone, Copy, Default)]
pub struct Year;

impl CalendarUnit for Year {
    const NAME: &'static str = "year";

    fn unit_start(date: NaiveDate) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(date.year(), 1, 1)
    }

    fn next_unit(start: NaiveDate) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    }

    fn previous_unit(start: NaiveDate) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(start.year() - 1, 1, 1)
    }
}

/// Month-aligned cursor
pub type MonthCursor = CalendarUnitCursor<Month>;

/// Year-aligned cursor
pub type YearCursor = CalendarUnitCursor<Year>;

/// Cursor whose buckets are calendar units in a time zone
pub struct CalendarUnitCursor<U> {
    inner: Box<dyn IntervalCursor>,
    tz: Tz,
    /// End (exclusive) of the current calendar unit
    state: Lifecycle<i64>,
    unit: PhantomData<U>,
}

impl<U: CalendarUnit> CalendarUnitCursor<U> {
    /// Wrap `inner`, bucketing its values by calendar unit in `tz`
    pub fn new(inner: Box<dyn IntervalCursor>, tz: Tz) -> Self {
        Self {
            inner,
            tz,
            state: Lifecycle::Uninitialized,
            unit: PhantomData,
        }
    }

    fn ensure_ready(&mut self) -> DownsampleResult<()> {
        if self.state.is_uninitialized() {
            self.open_unit()?;
        }
        Ok(())
    }

    /// Open the unit holding the inner cursor's pending value
    fn open_unit(&mut self) -> DownsampleResult<()> {
        // Release the inner cursor from the previous unit's end
        self.inner.move_to_next_interval()?;
        let current = if self.inner.has_next_value()? {
            self.inner.current_timestamp()
        } else {
            None
        };

        let Some(timestamp) = current else {
            self.state = Lifecycle::Exhausted;
            return Ok(());
        };

        let start = U::unit_start(self.local_date(timestamp)?)
            .ok_or(DownsampleError::TimestampOutOfRange(timestamp))?;
        let next = U::next_unit(start).ok_or(DownsampleError::TimestampOutOfRange(timestamp))?;
        let boundary = self.local_midnight(next, timestamp)?;

        if let Some(width) = U::inner_width_ms(start) {
            self.inner.set_interval_width(width);
        }
        self.inner.set_interval_end(boundary);

        tracing::trace!("Opened {} unit {} ending at {}", U::NAME, start, boundary);
        self.state = Lifecycle::Ready(boundary);
        Ok(())
    }

    fn local_date(&self, timestamp: i64) -> DownsampleResult<NaiveDate> {
        DateTime::from_timestamp_millis(timestamp)
            .map(|utc| utc.with_timezone(&self.tz).date_naive())
            .ok_or(DownsampleError::TimestampOutOfRange(timestamp))
    }

    /// Epoch millis of local midnight on `date`
    ///
    /// A midnight skipped by a DST change resolves to the first valid local
    /// hour after it; an ambiguous one to the earlier instant.
    fn local_midnight(&self, date: NaiveDate, context: i64) -> DownsampleResult<i64> {
        (0..=3)
            .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
            .find_map(|local| self.tz.from_local_datetime(&local).earliest())
            .map(|instant| instant.timestamp_millis())
            .ok_or(DownsampleError::TimestampOutOfRange(context))
    }
}

impl<U: CalendarUnit> ValueStream for CalendarUnitCursor<U> {
    fn has_next_value(&mut self) -> DownsampleResult<bool> {
        self.ensure_ready()?;
        let boundary = match self.state {
            Lifecycle::Ready(boundary) => boundary,
            _ => return Ok(false),
        };
        Ok(self.inner.has_next_value()?
            && self.inner.current_timestamp().is_some_and(|ts| ts < boundary))
    }

    fn next_value(&mut self) -> DownsampleResult<f64> {
        if !self.has_next_value()? {
            return Err(exhausted(&*self));
        }
        self.inner.next_value()
    }
}

impl<U: CalendarUnit> IntervalCursor for CalendarUnitCursor<U> {
    fn interval_timestamp(&self) -> DownsampleResult<i64> {
        let boundary = match self.state {
            Lifecycle::Ready(boundary) => boundary,
            _ => return Err(exhausted(self)),
        };
        let out_of_range = DownsampleError::TimestampOutOfRange(boundary);
        let start = U::unit_start(self.local_date(boundary)?)
            .and_then(U::previous_unit)
            .ok_or(out_of_range)?;
        self.local_midnight(start, boundary)
    }

    fn move_to_next_interval(&mut self) -> DownsampleResult<()> {
        if self.state.is_exhausted() {
            return Ok(());
        }
        self.open_unit()
    }

    fn seek_interval(&mut self, timestamp: i64) -> DownsampleResult<()> {
        let start = U::unit_start(self.local_date(timestamp)?)
            .ok_or(DownsampleError::TimestampOutOfRange(timestamp))?;
        let unit_midnight = self.local_midnight(start, timestamp)?;

        let target = if unit_midnight == timestamp {
            timestamp
        } else {
            let next =
                U::next_unit(start).ok_or(DownsampleError::TimestampOutOfRange(timestamp))?;
            self.local_midnight(next, timestamp)?
        };

        self.reposition(target)
    }

    fn reposition(&mut self, timestamp: i64) -> DownsampleResult<()> {
        self.inner.reposition(timestamp)?;
        self.state = Lifecycle::Uninitialized;
        Ok(())
    }

    fn current_timestamp(&self) -> Option<i64> {
        self.inner.current_timestamp()
    }
}

impl<U: CalendarUnit> fmt::Display for CalendarUnitCursor<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CalendarUnitCursor<{}>(tz={}, state={}", U::NAME, self.tz, self.state.label())?;
        if let Some(boundary) = self.state.ready() {
            write!(f, ", boundary={}", boundary)?;
        }
        write!(f, ", inner={})", self.inner)
    }
}

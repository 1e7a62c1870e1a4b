//! The interval cursor contract
//!
//! Every bucketing strategy (fixed width, calendar units, data-driven runs)
//! is an [`IntervalCursor`]: a lazy stream of bucket-local values plus the
//! operations a [`Downsampler`](super::Downsampler) needs to walk buckets.
//!
//! A cursor performs no I/O until the first `has_next_value` or
//! `seek_interval` call. Its state moves through [`Lifecycle`]:
//!
//! ```text
//! Uninitialized --first read--> Ready | Exhausted
//! Ready --move_to_next_interval--> Ready | Exhausted
//! any --seek_interval--> Uninitialized
//! ```

use super::error::{DownsampleError, DownsampleResult};
use std::fmt;

/// A lazy sequence of values belonging to the current bucket
pub trait ValueStream {
    /// Whether the current bucket still has a value
    fn has_next_value(&mut self) -> DownsampleResult<bool>;

    /// Consume the next value of the current bucket
    fn next_value(&mut self) -> DownsampleResult<f64>;
}

/// A bucketing strategy over one sample source
pub trait IntervalCursor: ValueStream + fmt::Display {
    /// Representative timestamp (bucket start) of the current bucket
    fn interval_timestamp(&self) -> DownsampleResult<i64>;

    /// Advance to the bucket holding the next pending value
    fn move_to_next_interval(&mut self) -> DownsampleResult<()>;

    /// Restart iteration at the first complete bucket at or after `timestamp`
    fn seek_interval(&mut self, timestamp: i64) -> DownsampleResult<()>;

    /// Restart iteration at exactly `timestamp`, without bucket rounding
    ///
    /// Used by wrapping cursors that have already rounded the target to
    /// their own boundaries.
    fn reposition(&mut self, timestamp: i64) -> DownsampleResult<()>;

    /// Raw timestamp of the pending value, if the cursor is ready
    fn current_timestamp(&self) -> Option<i64>;

    /// Change the bucket width of a fixed-width cursor
    fn set_interval_width(&mut self, _width_ms: i64) {}

    /// End the current bucket at `end` instead of its own boundary
    ///
    /// Lets a wrapping cursor impose boundaries the inner cursor cannot
    /// compute, such as calendar months.
    fn set_interval_end(&mut self, _end: i64) {}
}

impl<C: IntervalCursor + ?Sized> ValueStream for &mut C {
    fn has_next_value(&mut self) -> DownsampleResult<bool> {
        (**self).has_next_value()
    }

    fn next_value(&mut self) -> DownsampleResult<f64> {
        (**self).next_value()
    }
}

/// Initialization state of a cursor, carrying what only exists once ready
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lifecycle<T> {
    /// Nothing has been read yet (or a seek discarded what was read)
    Uninitialized,
    /// Buffered state is available
    Ready(T),
    /// The source has nothing more for this cursor
    Exhausted,
}

impl<T> Lifecycle<T> {
    /// Buffered state, if ready
    pub fn ready(&self) -> Option<&T> {
        match self {
            Lifecycle::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Whether nothing has been read yet
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, Lifecycle::Uninitialized)
    }

    /// Whether the cursor has run out of samples
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Lifecycle::Exhausted)
    }

    /// Short label for diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Ready(_) => "ready",
            Lifecycle::Exhausted => "exhausted",
        }
    }
}

impl<T> Default for Lifecycle<T> {
    fn default() -> Self {
        Lifecycle::Uninitialized
    }
}

/// Exhaustion error naming the cursor it came from
pub(crate) fn exhausted(cursor: &dyn fmt::Display) -> DownsampleError {
    DownsampleError::Exhausted(format!("no value pending in {}", cursor))
}

//! Data-driven run buckets
//!
//! Bucket edges come from the data: a bucket is one "active run", a stretch
//! of consecutive sample pairs whose contribution is non-zero. Idle pairs
//! between runs are skipped and never produce a bucket.
//!
//! For a level signal a pair contributes the later sample's value, so a
//! gauge resting at 0 is idle. For a counter it contributes the monotonic
//! delta, so a counter that stops moving is idle.

use super::counter::{ensure_increasing, CounterTransform};
use super::cursor::{exhausted, IntervalCursor, Lifecycle, ValueStream};
use super::error::DownsampleResult;
use crate::source::{Sample, SeekableSource};
use std::fmt;

/// How a pair of consecutive samples contributes to a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunSignal {
    /// The later sample's value
    Level,
    /// The counter delta between the two samples
    Counter(CounterTransform),
}

impl RunSignal {
    fn contribution(&self, window: &RunWindow) -> f64 {
        match self {
            RunSignal::Level => window.current.to_f64(),
            RunSignal::Counter(transform) => transform.delta(&window.previous, &window.current),
        }
    }
}

impl fmt::Display for RunSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSignal::Level => write!(f, "level"),
            RunSignal::Counter(transform) => write!(f, "{}", transform),
        }
    }
}

/// Two consecutive buffered samples
#[derive(Debug, Clone, Copy, PartialEq)]
struct RunWindow {
    previous: Sample,
    current: Sample,
}

/// Cursor whose buckets are active runs in the data
pub struct RunBoundaryCursor<S> {
    source: S,
    signal: RunSignal,
    /// Timestamp of the first sample of the current run
    run_start: i64,
    state: Lifecycle<RunWindow>,
}

impl<S: SeekableSource> RunBoundaryCursor<S> {
    pub fn new(source: S, signal: RunSignal) -> Self {
        Self {
            source,
            signal,
            run_start: 0,
            state: Lifecycle::Uninitialized,
        }
    }

    fn ensure_ready(&mut self) -> DownsampleResult<()> {
        if !self.state.is_uninitialized() {
            return Ok(());
        }

        self.state = Lifecycle::Exhausted;
        if self.source.has_next()? {
            let first = self.source.next_sample()?;
            if self.source.has_next()? {
                let second = self.source.next_sample()?;
                ensure_increasing(&first, &second, &*self)?;
                self.state = Lifecycle::Ready(RunWindow {
                    previous: first,
                    current: second,
                });
            }
        }
        self.skip_idle()
    }

    /// Slide the window forward by one sample
    fn advance(&mut self) -> DownsampleResult<()> {
        let Lifecycle::Ready(window) = self.state else {
            return Ok(());
        };

        self.state = if self.source.has_next()? {
            let next = self.source.next_sample()?;
            ensure_increasing(&window.current, &next, &*self)?;
            Lifecycle::Ready(RunWindow {
                previous: window.current,
                current: next,
            })
        } else {
            Lifecycle::Exhausted
        };
        Ok(())
    }

    /// Advance past idle pairs and mark the start of the next run
    fn skip_idle(&mut self) -> DownsampleResult<()> {
        while let Lifecycle::Ready(window) = self.state {
            if self.signal.contribution(&window) != 0.0 {
                self.run_start = window.previous.timestamp;
                tracing::trace!("Run starts at {}", self.run_start);
                break;
            }
            self.advance()?;
        }
        Ok(())
    }
}

impl<S: SeekableSource> ValueStream for RunBoundaryCursor<S> {
    fn has_next_value(&mut self) -> DownsampleResult<bool> {
        self.ensure_ready()?;
        Ok(self
            .state
            .ready()
            .is_some_and(|window| self.signal.contribution(window) != 0.0))
    }

    fn next_value(&mut self) -> DownsampleResult<f64> {
        if !self.has_next_value()? {
            return Err(exhausted(&*self));
        }
        let Lifecycle::Ready(window) = self.state else {
            return Err(exhausted(&*self));
        };

        let value = self.signal.contribution(&window);
        self.advance()?;
        Ok(value)
    }
}

impl<S: SeekableSource> IntervalCursor for RunBoundaryCursor<S> {
    fn interval_timestamp(&self) -> DownsampleResult<i64> {
        Ok(self.run_start)
    }

    fn move_to_next_interval(&mut self) -> DownsampleResult<()> {
        self.ensure_ready()?;
        self.skip_idle()
    }

    fn seek_interval(&mut self, timestamp: i64) -> DownsampleResult<()> {
        self.reposition(timestamp)
    }

    fn reposition(&mut self, timestamp: i64) -> DownsampleResult<()> {
        self.source.seek(timestamp)?;
        self.state = Lifecycle::Uninitialized;
        Ok(())
    }

    fn current_timestamp(&self) -> Option<i64> {
        self.state.ready().map(|window| window.previous.timestamp)
    }
}

impl<S: SeekableSource> fmt::Display for RunBoundaryCursor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RunBoundaryCursor(signal={}, run_start={}, state={}",
            self.signal,
            self.run_start,
            self.state.label()
        )?;
        if let Some(window) = self.state.ready() {
            write!(f, ", previous={}, current={}", window.previous, window.current)?;
        }
        write!(f, ", source={:?})", self.source)
    }
}

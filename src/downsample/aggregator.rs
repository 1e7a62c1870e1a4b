//! Bucket reducers
//!
//! A [`Reducer`] folds the lazy value stream of one bucket into a single
//! value. Reducers always drain the whole stream so the cursor is left at
//! the end of the bucket.

use super::cursor::ValueStream;
use super::error::{DownsampleError, DownsampleResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Folds one bucket's values into a single value
pub trait Reducer: fmt::Debug + Send + Sync {
    /// Drain `values` and return the aggregate
    ///
    /// Fails with [`DownsampleError::Exhausted`] when the stream is empty.
    fn reduce(&self, values: &mut dyn ValueStream) -> DownsampleResult<f64>;

    /// Short name for diagnostics
    fn name(&self) -> &str;
}

/// Built-in reducers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregator {
    /// Sum of values
    Sum,
    /// Average of values
    Avg,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// First value in the bucket
    First,
    /// Last value in the bucket
    Last,
    /// Number of values
    Count,
}

impl Aggregator {
    /// All built-in reducers
    pub const ALL: [Aggregator; 7] = [
        Self::Sum,
        Self::Avg,
        Self::Min,
        Self::Max,
        Self::First,
        Self::Last,
        Self::Count,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::First => "first",
            Self::Last => "last",
            Self::Count => "count",
        }
    }
}

impl Reducer for Aggregator {
    fn reduce(&self, values: &mut dyn ValueStream) -> DownsampleResult<f64> {
        let mut count = 0u64;
        let mut acc = 0.0;

        while values.has_next_value()? {
            let value = values.next_value()?;
            acc = if count == 0 {
                match self {
                    Self::Count => 1.0,
                    _ => value,
                }
            } else {
                match self {
                    Self::Sum | Self::Avg => acc + value,
                    Self::Min => acc.min(value),
                    Self::Max => acc.max(value),
                    Self::First => acc,
                    Self::Last => value,
                    Self::Count => acc + 1.0,
                }
            };
            count += 1;
        }

        if count == 0 {
            return Err(DownsampleError::Exhausted(format!(
                "{} over an empty bucket",
                self.as_str()
            )));
        }

        Ok(match self {
            Self::Avg => acc / count as f64,
            _ => acc,
        })
    }

    fn name(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Aggregator {
    type Err = DownsampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "avg" | "average" | "mean" => Ok(Self::Avg),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "count" => Ok(Self::Count),
            other => {
                let known: Vec<&str> = Self::ALL.iter().map(Aggregator::as_str).collect();
                Err(DownsampleError::InvalidConfig(format!(
                    "unknown aggregator '{}', expected one of {}",
                    other,
                    known.join(", ")
                )))
            }
        }
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Downsampling error types
//!
//! Defines all error conditions that can occur while configuring or driving
//! a downsampling pipeline.

use crate::source::SourceError;
use thiserror::Error;

/// Errors that can occur during downsampling
#[derive(Error, Debug)]
pub enum DownsampleError {
    /// A value or bucket was requested with none pending
    #[error("Iterator exhausted: {0}")]
    Exhausted(String),

    /// Two samples feeding a delta were not strictly increasing in time
    #[error("Source ordering violated: timestamp {next} does not follow {previous} in {cursor}")]
    OrderingViolated {
        previous: i64,
        next: i64,
        cursor: String,
    },

    /// The operation is not supported by this iterator
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Rate options, interval spec, aggregator or time zone could not be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Calendar arithmetic left the representable date range
    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(i64),

    /// Sample source error
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Result type for downsampling operations
pub type DownsampleResult<T> = Result<T, DownsampleError>;

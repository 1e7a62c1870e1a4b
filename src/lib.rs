//! # chronicle-rollup
//!
//! Lazy downsampling and counter-rate iterators for time-series queries.
//! Given an ordered, seekable stream of samples, produces one aggregated
//! value per bucket without materializing the input.
//!
//! ## Features
//!
//! - **Fixed-width buckets**: aligned to a time zone's standard offset
//! - **Calendar buckets**: months and years in any IANA time zone
//! - **Run buckets**: boundaries inferred from active stretches in the data
//! - **Counter rates**: monotonic with rollover and reset suppression, or
//!   bidirectional increment/decrement
//! - **Seekable**: restart at the first complete bucket after any timestamp
//!
//! ## Modules
//!
//! - [`source`]: Sample types and seekable sources
//! - [`downsample`]: Interval cursors, reducers and the downsampler
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use chronicle_rollup::downsample::{Aggregator, Downsampler, IntervalSpec, RateOptions};
//! use chronicle_rollup::source::{MemorySource, Sample};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let half_hour = 30 * 60 * 1000;
//! let source = MemorySource::ordered(
//!     (0..5).map(|k| Sample::integer(k * half_hour, 100 + 10 * k)).collect(),
//! )?;
//!
//! let mut downsampler = Downsampler::with_options(
//!     source,
//!     IntervalSpec::parse("1h")?,
//!     Aggregator::Sum,
//!     chrono_tz::Tz::UTC,
//!     RateOptions::parse("counter")?,
//! )?;
//!
//! while downsampler.has_next()? {
//!     let point = downsampler.next_point()?;
//!     println!("{} -> {}", point.timestamp, point.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod downsample;
pub mod source;

// Re-export top-level types for convenience
pub use source::{
    CsvSampleReader, MemorySource, Sample, SampleValue, SeekableSource, SourceError, SourceResult,
};

pub use downsample::{
    Aggregator, CounterKind, DownsampleError, DownsampleResult, DownsampledPoint, Downsampler,
    IntervalCursor, IntervalSpec, IntervalUnit, RateOptions, Reducer,
};

pub use config::{Config, ConfigError, DownsampleConfig, InputConfig, LoggingConfig};

//! Downsampling Pipeline
//!
//! Lazily turns an ordered sample stream into one aggregated value per
//! bucket:
//!
//! - **cursor**: The `IntervalCursor` contract and its lifecycle
//! - **fixed**: Fixed-width buckets, plain or counter deltas
//! - **counter**: Monotonic and bidirectional counter delta rules
//! - **calendar**: Month and year buckets in a time zone
//! - **run**: Buckets inferred from active runs in the data
//! - **aggregator**: Bucket reducers
//! - **downsampler**: The driver composing a cursor with a reducer
//! - **interval** / **rate**: Configuration types
//! - **error**: Error types
//!
//! ## Example
//!
//! ```rust
//! use chronicle_rollup::downsample::{Aggregator, Downsampler, IntervalSpec};
//! use chronicle_rollup::source::{MemorySource, Sample};
//!
//! let source = MemorySource::new(vec![
//!     Sample::integer(0, 1),
//!     Sample::integer(5_000, 2),
//!     Sample::integer(10_000, 4),
//! ]);
//! let interval: IntervalSpec = "10s".parse().unwrap();
//!
//! let points: Vec<_> = Downsampler::new(source, interval, Aggregator::Sum)
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert_eq!(points.len(), 2);
//! assert_eq!(points[0].value, 3.0);
//! ```

pub mod aggregator;
pub mod calendar;
pub mod counter;
pub mod cursor;
pub mod downsampler;
pub mod error;
pub mod fixed;
pub mod interval;
pub mod rate;
pub mod run;

pub use aggregator::{Aggregator, Reducer};
pub use calendar::{CalendarUnit, CalendarUnitCursor, Month, MonthCursor, Year, YearCursor};
pub use counter::CounterTransform;
pub use cursor::{IntervalCursor, Lifecycle, ValueStream};
pub use downsampler::{zone_offset_ms, DownsampledPoint, Downsampler};
pub use error::{DownsampleError, DownsampleResult};
pub use fixed::{FixedIntervalCursor, ValueTransform};
pub use interval::{IntervalSpec, IntervalUnit};
pub use rate::{CounterKind, RateOptions};
pub use run::{RunBoundaryCursor, RunSignal};

//! Sample Sources
//!
//! The boundary between the downsampling pipeline and whatever stores raw
//! samples:
//!
//! - **sample**: Raw sample types (`Sample`, `SampleValue`)
//! - **memory**: Vector-backed seekable source
//! - **csv_reader**: Load samples from CSV files
//! - **error**: Error types
//!
//! Any storage layer can feed the pipeline by implementing [`SeekableSource`].

pub mod csv_reader;
pub mod error;
pub mod memory;
pub mod sample;

pub use csv_reader::CsvSampleReader;
pub use error::{SourceError, SourceResult};
pub use memory::MemorySource;
pub use sample::{Sample, SampleValue};

use std::fmt;

/// An ordered, seekable stream of raw samples
///
/// Implementations must yield samples in strictly increasing timestamp order.
/// `seek` positions the stream at the first sample whose timestamp is greater
/// than or equal to the argument.
pub trait SeekableSource: fmt::Debug {
    /// Whether another sample can be read
    fn has_next(&mut self) -> SourceResult<bool>;

    /// Read the next sample
    fn next_sample(&mut self) -> SourceResult<Sample>;

    /// Reposition at the first sample at or after `timestamp`
    fn seek(&mut self, timestamp: i64) -> SourceResult<()>;
}

impl<S: SeekableSource + ?Sized> SeekableSource for Box<S> {
    fn has_next(&mut self) -> SourceResult<bool> {
        (**self).has_next()
    }

    fn next_sample(&mut self) -> SourceResult<Sample> {
        (**self).next_sample()
    }

    fn seek(&mut self, timestamp: i64) -> SourceResult<()> {
        (**self).seek(timestamp)
    }
}

//! In-memory sample source

use super::{Sample, SeekableSource, SourceError, SourceResult};
use std::fmt;

/// A seekable source backed by a vector of samples
#[derive(Clone, Default)]
pub struct MemorySource {
    samples: Vec<Sample>,
    position: usize,
}

impl MemorySource {
    /// Create a source over `samples` as given
    ///
    /// The caller is responsible for the ordering contract.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            position: 0,
        }
    }

    /// Create a source, rejecting samples that are not strictly increasing
    pub fn ordered(samples: Vec<Sample>) -> SourceResult<Self> {
        if let Some(pair) = samples
            .windows(2)
            .find(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(SourceError::Unordered(format!(
                "timestamp {} follows {}",
                pair[1].timestamp, pair[0].timestamp
            )));
        }
        Ok(Self::new(samples))
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the source holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All samples held, regardless of position
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

impl From<Vec<Sample>> for MemorySource {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}

impl SeekableSource for MemorySource {
    fn has_next(&mut self) -> SourceResult<bool> {
        Ok(self.position < self.samples.len())
    }

    fn next_sample(&mut self) -> SourceResult<Sample> {
        let sample = self
            .samples
            .get(self.position)
            .copied()
            .ok_or(SourceError::Exhausted)?;
        self.position += 1;
        Ok(sample)
    }

    fn seek(&mut self, timestamp: i64) -> SourceResult<()> {
        self.position = self.samples.partition_point(|s| s.timestamp < timestamp);
        Ok(())
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("len", &self.samples.len())
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemorySource {
        MemorySource::new(vec![
            Sample::integer(1000, 1),
            Sample::integer(2000, 2),
            Sample::integer(3000, 3),
        ])
    }

    #[test]
    fn test_iterates_in_order() {
        let mut src = source();
        let mut seen = Vec::new();
        while src.has_next().unwrap() {
            seen.push(src.next_sample().unwrap().timestamp);
        }
        assert_eq!(seen, vec![1000, 2000, 3000]);
        assert!(matches!(src.next_sample(), Err(SourceError::Exhausted)));
    }

    #[test]
    fn test_seek_lands_on_first_at_or_after() {
        let mut src = source();
        src.seek(1500).unwrap();
        assert_eq!(src.next_sample().unwrap().timestamp, 2000);

        src.seek(2000).unwrap();
        assert_eq!(src.next_sample().unwrap().timestamp, 2000);

        src.seek(0).unwrap();
        assert_eq!(src.next_sample().unwrap().timestamp, 1000);

        src.seek(5000).unwrap();
        assert!(!src.has_next().unwrap());
    }

    #[test]
    fn test_ordered_rejects_duplicates() {
        let result = MemorySource::ordered(vec![Sample::integer(1000, 1), Sample::integer(1000, 2)]);
        assert!(matches!(result, Err(SourceError::Unordered(_))));

        assert_eq!(MemorySource::ordered(source().samples().to_vec()).unwrap().len(), 3);
    }

    #[test]
    fn test_debug_is_compact() {
        assert_eq!(format!("{:?}", source()), "MemorySource { len: 3, position: 0 }");
    }
}

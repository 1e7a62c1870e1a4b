//! CSV Sample Loading
//!
//! Loads one series of raw samples from a CSV file into a [`MemorySource`].
//! Supports configurable column mapping and multiple timestamp formats.

use super::{MemorySource, Sample, SampleValue, SourceError, SourceResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::io::Read;
use std::path::Path;

/// Fallback timestamp formats tried after the configured one
const COMMON_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
];

/// CSV sample reader with configurable column mapping
#[derive(Debug, Clone)]
pub struct CsvSampleReader {
    /// Column index for timestamps (0-indexed)
    timestamp_column: usize,
    /// Column index for values (0-indexed)
    value_column: usize,
    /// Optional format string for parsing timestamps
    timestamp_format: Option<String>,
    /// Whether the CSV has a header row
    has_header: bool,
    /// Skip unparsable rows instead of failing
    skip_invalid: bool,
}

impl Default for CsvSampleReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvSampleReader {
    /// Create a reader expecting `timestamp,value` with a header row
    pub fn new() -> Self {
        Self {
            timestamp_column: 0,
            value_column: 1,
            timestamp_format: None,
            has_header: true,
            skip_invalid: false,
        }
    }

    /// Set the timestamp column index
    pub fn with_timestamp_column(mut self, column: usize) -> Self {
        self.timestamp_column = column;
        self
    }

    /// Set the value column index
    pub fn with_value_column(mut self, column: usize) -> Self {
        self.value_column = column;
        self
    }

    /// Set the timestamp format string
    pub fn with_timestamp_format(mut self, format: &str) -> Self {
        self.timestamp_format = Some(format.to_string());
        self
    }

    /// Set whether the CSV has a header row
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Skip rows that fail to parse (logged) instead of failing the load
    pub fn skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }

    /// Load samples from a CSV file
    pub fn read_path(&self, path: &Path) -> SourceResult<MemorySource> {
        let file = std::fs::File::open(path)?;
        self.read(file)
    }

    /// Load samples from any reader
    pub fn read<R: Read>(&self, input: R) -> SourceResult<MemorySource> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_header)
            .flexible(true)
            .from_reader(input);

        let mut samples = Vec::new();
        let mut skipped = 0usize;

        for (line_num, result) in reader.records().enumerate() {
            let row = if self.has_header {
                line_num + 2
            } else {
                line_num + 1
            };

            match result
                .map_err(SourceError::from)
                .and_then(|record| self.parse_record(&record, row))
            {
                Ok(sample) => samples.push(sample),
                Err(e) if self.skip_invalid => {
                    tracing::warn!("Skipping CSV row {}: {}", row, e);
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        samples.sort_by_key(|s| s.timestamp);
        tracing::debug!("Loaded {} samples from CSV ({} skipped)", samples.len(), skipped);

        MemorySource::ordered(samples)
    }

    fn parse_record(&self, record: &csv::StringRecord, row: usize) -> SourceResult<Sample> {
        let ts_str = record
            .get(self.timestamp_column)
            .map(str::trim)
            .ok_or_else(|| parse_error(row, "missing timestamp column"))?;
        let value_str = record
            .get(self.value_column)
            .map(str::trim)
            .ok_or_else(|| parse_error(row, "missing value column"))?;

        Ok(Sample {
            timestamp: self.parse_timestamp(ts_str, row)?,
            value: parse_value(value_str, row)?,
        })
    }

    /// Parse a timestamp string: epoch millis, configured format, common formats, RFC 3339
    fn parse_timestamp(&self, ts_str: &str, row: usize) -> SourceResult<i64> {
        if let Ok(millis) = ts_str.parse::<i64>() {
            return Ok(millis);
        }

        let configured = self.timestamp_format.as_deref();
        for fmt in configured.into_iter().chain(COMMON_FORMATS) {
            if let Ok(dt) = NaiveDateTime::parse_from_str(ts_str, fmt) {
                return Ok(dt.and_utc().timestamp_millis());
            }
            if let Some(dt) = NaiveDate::parse_from_str(ts_str, fmt)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
            {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(ts_str) {
            return Ok(dt.with_timezone(&Utc).timestamp_millis());
        }

        Err(parse_error(
            row,
            &format!("could not parse timestamp '{}'", ts_str),
        ))
    }
}

fn parse_value(value_str: &str, row: usize) -> SourceResult<SampleValue> {
    if let Ok(v) = value_str.parse::<i64>() {
        return Ok(SampleValue::Integer(v));
    }
    value_str
        .parse::<f64>()
        .map(SampleValue::Float)
        .map_err(|_| parse_error(row, &format!("could not parse value '{}'", value_str)))
}

fn parse_error(row: usize, message: &str) -> SourceError {
    SourceError::Parse {
        row,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SeekableSource;
    use std::io::Write;

    fn drain(mut source: MemorySource) -> Vec<Sample> {
        let mut out = Vec::new();
        while source.has_next().unwrap() {
            out.push(source.next_sample().unwrap());
        }
        out
    }

    #[test]
    fn test_epoch_millis_and_integer_values() {
        let csv_data = "timestamp,value
1000,10
2000,12.5
3000,-4";

        let samples = drain(CsvSampleReader::new().read(csv_data.as_bytes()).unwrap());

        assert_eq!(
            samples,
            vec![
                Sample::integer(1000, 10),
                Sample::float(2000, 12.5),
                Sample::integer(3000, -4),
            ]
        );
    }

    #[test]
    fn test_custom_columns_and_formats() {
        let csv_data = "host,when,reading
a,2024-01-16,8
a,2024-01-15T06:00:00Z,7";

        let reader = CsvSampleReader::new()
            .with_timestamp_column(1)
            .with_value_column(2)
            .with_timestamp_format("%Y-%m-%d");
        let samples = drain(reader.read(csv_data.as_bytes()).unwrap());

        // Rows come back sorted by timestamp
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp, 1705298400000);
        assert_eq!(samples[1].timestamp, 1705363200000);
    }

    #[test]
    fn test_invalid_row_fails_or_skips() {
        let csv_data = "1000,1
oops,2
3000,3";

        let strict = CsvSampleReader::new().with_header(false).read(csv_data.as_bytes());
        assert!(matches!(strict, Err(SourceError::Parse { row: 2, .. })));

        let lenient = CsvSampleReader::new()
            .with_header(false)
            .skip_invalid(true)
            .read(csv_data.as_bytes())
            .unwrap();
        assert_eq!(lenient.len(), 2);
    }

    #[test]
    fn test_duplicate_timestamps_rejected() {
        let csv_data = "ts,v
1000,1
1000,2";
        let result = CsvSampleReader::new().read(csv_data.as_bytes());
        assert!(matches!(result, Err(SourceError::Unordered(_))));
    }

    #[test]
    fn test_read_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ts,v").unwrap();
        writeln!(file, "5000,50").unwrap();
        writeln!(file, "6000,60").unwrap();

        let source = CsvSampleReader::new().read_path(file.path()).unwrap();
        assert_eq!(source.len(), 2);
    }
}

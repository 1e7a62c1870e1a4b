//! Raw sample types delivered by a sample source
//!
//! - `SampleValue`: an integer or floating-point reading
//! - `Sample`: one timestamped reading

use serde::{Deserialize, Serialize};
use std::fmt;

/// The value carried by a raw sample
///
/// Integer readings are kept as integers so counter deltas can be computed
/// without the precision loss of a round trip through `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    /// Integer reading
    Integer(i64),
    /// Floating-point reading
    Float(f64),
}

impl SampleValue {
    /// Whether this value is integer-typed
    pub fn is_integer(&self) -> bool {
        matches!(self, SampleValue::Integer(_))
    }

    /// The value as a double
    pub fn to_f64(&self) -> f64 {
        match *self {
            SampleValue::Integer(v) => v as f64,
            SampleValue::Float(v) => v,
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Integer(v) => write!(f, "{}", v),
            SampleValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// A single raw time-series sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// The measured value
    pub value: SampleValue,
}

impl Sample {
    /// Create an integer-valued sample
    pub fn integer(timestamp: i64, value: i64) -> Self {
        Self {
            timestamp,
            value: SampleValue::Integer(value),
        }
    }

    /// Create a float-valued sample
    pub fn float(timestamp: i64, value: f64) -> Self {
        Self {
            timestamp,
            value: SampleValue::Float(value),
        }
    }

    /// Whether the value is integer-typed
    pub fn is_integer(&self) -> bool {
        self.value.is_integer()
    }

    /// The value as a double
    pub fn to_f64(&self) -> f64 {
        self.value.to_f64()
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(timestamp={}, value={})", self.timestamp, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        let int = Sample::integer(1000, 42);
        assert!(int.is_integer());
        assert_eq!(int.to_f64(), 42.0);

        let float = Sample::float(2000, 1.5);
        assert!(!float.is_integer());
        assert_eq!(float.to_f64(), 1.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Sample::integer(1000, 7).to_string(),
            "(timestamp=1000, value=7)"
        );
    }

    #[test]
    fn test_serde_untagged_value() {
        let json = serde_json::to_string(&Sample::integer(5, 3)).unwrap();
        assert_eq!(json, r#"{"timestamp":5,"value":3}"#);

        let parsed: Sample = serde_json::from_str(r#"{"timestamp":5,"value":2.5}"#).unwrap();
        assert_eq!(parsed, Sample::float(5, 2.5));
    }
}

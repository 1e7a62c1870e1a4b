//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::downsample::{
    Aggregator, DownsampleError, DownsampleResult, IntervalSpec, RateOptions,
};
use crate::source::CsvSampleReader;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Prefix for environment variable overrides
const ENV_PREFIX: &str = "CHRONICLE_ROLLUP_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub downsample: DownsampleConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bucketing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DownsampleConfig {
    /// Interval spec, e.g. "10s", "1h", "1n", "0o"
    #[serde(default = "default_interval")]
    pub interval: String,

    #[serde(default = "default_aggregator")]
    pub aggregator: String,

    /// IANA time zone name used for bucket alignment
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Rate options, e.g. "counter,65535,1000"
    pub rate: Option<String>,
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_aggregator() -> String {
    "avg".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for DownsampleConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            aggregator: default_aggregator(),
            timezone: default_timezone(),
            rate: None,
        }
    }
}

impl DownsampleConfig {
    pub fn interval_spec(&self) -> DownsampleResult<IntervalSpec> {
        self.interval.parse()
    }

    pub fn aggregator(&self) -> DownsampleResult<Aggregator> {
        self.aggregator.parse()
    }

    pub fn time_zone(&self) -> DownsampleResult<Tz> {
        self.timezone.parse().map_err(|_| {
            DownsampleError::InvalidConfig(format!("unknown time zone '{}'", self.timezone))
        })
    }

    /// Parsed rate options, plain values when unset
    pub fn rate_options(&self) -> DownsampleResult<RateOptions> {
        match &self.rate {
            Some(rate) => rate.parse(),
            None => Ok(RateOptions::default()),
        }
    }
}

/// CSV input configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub timestamp_column: usize,

    #[serde(default = "default_value_column")]
    pub value_column: usize,

    #[serde(default = "default_has_header")]
    pub has_header: bool,

    /// strftime format tried before the built-in formats
    pub timestamp_format: Option<String>,

    #[serde(default)]
    pub skip_invalid: bool,
}

fn default_value_column() -> usize {
    1
}

fn default_has_header() -> bool {
    true
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            timestamp_column: 0,
            value_column: default_value_column(),
            has_header: default_has_header(),
            timestamp_format: None,
            skip_invalid: false,
        }
    }
}

impl InputConfig {
    /// CSV reader configured from this section
    pub fn reader(&self) -> CsvSampleReader {
        let reader = CsvSampleReader::new()
            .with_timestamp_column(self.timestamp_column)
            .with_value_column(self.value_column)
            .with_header(self.has_header)
            .skip_invalid(self.skip_invalid);
        match &self.timestamp_format {
            Some(format) => reader.with_timestamp_format(format),
            None => reader,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("chronicle-rollup").join("config.toml")),
            Some(PathBuf::from("/etc/chronicle-rollup/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Check every textual setting parses into its typed form
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.downsample.interval_spec()?;
        self.downsample.aggregator()?;
        self.downsample.time_zone()?;
        self.downsample.rate_options()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok());
    }

    /// Apply overrides from `lookup`, keyed without the environment prefix
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(interval) = lookup("INTERVAL") {
            self.downsample.interval = interval;
        }
        if let Some(aggregator) = lookup("AGGREGATOR") {
            self.downsample.aggregator = aggregator;
        }
        if let Some(timezone) = lookup("TIMEZONE") {
            self.downsample.timezone = timezone;
        }
        if let Some(rate) = lookup("RATE") {
            self.downsample.rate = Some(rate);
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid setting: {0}")]
    Invalid(#[from] DownsampleError),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# chronicle-rollup configuration
#
# Environment variables override these settings:
# - CHRONICLE_ROLLUP_INTERVAL
# - CHRONICLE_ROLLUP_AGGREGATOR
# - CHRONICLE_ROLLUP_TIMEZONE
# - CHRONICLE_ROLLUP_RATE
# - CHRONICLE_ROLLUP_LOG_LEVEL
# - CHRONICLE_ROLLUP_LOG_FORMAT

[downsample]
# Bucket width: <amount><unit> with unit ms, s, m, h, d, w,
# n (calendar month), y (calendar year) or o (active runs)
interval = "1h"

# Reducer: sum, avg, min, max, first, last, count
aggregator = "avg"

# Time zone used to align buckets (IANA name)
timezone = "UTC"

# Treat values as counters: kind[,max[,reset]]
# kind: counter | mono-inc-counter | bi-inc-counter | bi-dec-counter
# rate = "counter,65535,1000"

[input]
# Zero-based CSV columns
timestamp_column = 0
value_column = 1

# Whether the first CSV row is a header
has_header = true

# Optional strftime format for timestamps
# timestamp_format = "%Y-%m-%d %H:%M:%S"

# Skip unparsable rows instead of failing
skip_invalid = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downsample::{CounterKind, IntervalUnit};
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(
            config.downsample.interval_spec().unwrap(),
            IntervalSpec::fixed(3_600_000)
        );
        assert_eq!(config.downsample.aggregator().unwrap(), Aggregator::Avg);
        assert_eq!(config.downsample.time_zone().unwrap(), Tz::UTC);
        assert_eq!(config.downsample.rate_options().unwrap(), RateOptions::default());
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.input.value_column, 1);
        assert!(config.input.has_header);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[downsample]
interval = "1n"
aggregator = "sum"
timezone = "Asia/Kolkata"
rate = "bi-dec-counter,100"

[input]
value_column = 3
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.downsample.interval_spec().unwrap().unit, IntervalUnit::Month);
        assert_eq!(config.downsample.time_zone().unwrap(), chrono_tz::Asia::Kolkata);
        let rate = config.downsample.rate_options().unwrap();
        assert_eq!(rate.counter_kind(), Some(CounterKind::BiDec));
        assert_eq!(rate.counter_max, 100);
        assert_eq!(config.input.value_column, 3);
        assert_eq!(config.input.timestamp_column, 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/nonexistent/chronicle-rollup.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[downsample\ninterval = ").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.downsample.timezone = "Mars/Olympus".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.downsample.rate = Some("counter,lots".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.downsample.interval = "5 fortnights".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("INTERVAL", "15m"),
            ("RATE", "counter"),
            ("LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.downsample.interval, "15m");
        assert_eq!(config.downsample.rate.as_deref(), Some("counter"));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.downsample.aggregator, "avg");
    }

    #[test]
    fn test_input_reader() {
        let input = InputConfig {
            timestamp_column: 1,
            value_column: 2,
            has_header: false,
            timestamp_format: None,
            skip_invalid: false,
        };
        let source = input.reader().read("x,1000,5\nx,2000,6".as_bytes()).unwrap();
        assert_eq!(source.len(), 2);
    }
}

//! chronicle-rollup CLI
//!
//! Command-line interface for downsampling time-series CSV files:
//! - Bucket samples by fixed width, calendar unit or active run
//! - Convert counter readings to per-bucket deltas
//! - Generate a default config file

use anyhow::{Context, Result};
use chrono::DateTime;
use chronicle_rollup::config::{generate_default_config, Config, LoggingConfig};
use chronicle_rollup::downsample::{DownsampledPoint, Downsampler};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chronicle-rollup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Downsample time-series samples into aggregated buckets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Downsample a CSV file of samples
    Downsample {
        /// Path to CSV file
        input: PathBuf,
        /// Bucket interval (e.g. 10s, 1h, 1n, 1y, 0o)
        #[arg(short, long)]
        interval: Option<String>,
        /// Aggregation function (sum, avg, min, max, first, last, count)
        #[arg(short, long)]
        aggregator: Option<String>,
        /// Time zone for bucket alignment (IANA name)
        #[arg(short = 'z', long)]
        timezone: Option<String>,
        /// Rate options: kind[,max[,reset]]
        #[arg(short, long)]
        rate: Option<String>,
        /// Start at the first complete bucket at or after this Unix ms timestamp
        #[arg(long)]
        seek: Option<i64>,
        /// Timestamp column (0-indexed)
        #[arg(long)]
        timestamp_col: Option<usize>,
        /// Value column (0-indexed)
        #[arg(long)]
        value_col: Option<usize>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => Config::load_default(),
    };

    match cli.command {
        Commands::Downsample {
            input,
            interval,
            aggregator,
            timezone,
            rate,
            seek,
            timestamp_col,
            value_col,
        } => {
            if let Some(interval) = interval {
                config.downsample.interval = interval;
            }
            if let Some(aggregator) = aggregator {
                config.downsample.aggregator = aggregator;
            }
            if let Some(timezone) = timezone {
                config.downsample.timezone = timezone;
            }
            if rate.is_some() {
                config.downsample.rate = rate;
            }
            if let Some(col) = timestamp_col {
                config.input.timestamp_column = col;
            }
            if let Some(col) = value_col {
                config.input.value_column = col;
            }

            init_logging(&config.logging)?;
            config.validate().context("invalid configuration")?;

            let points = downsample(&config, &input, seek)?;
            print_points(&points, &cli.format, &config.downsample.timezone)?;
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)
                        .with_context(|| format!("writing config to {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            tracing_subscriber::EnvFilter::try_new(format!("chronicle_rollup={}", logging.level))
        })
        .context("invalid log level")?;

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

fn downsample(config: &Config, input: &Path, seek: Option<i64>) -> Result<Vec<DownsampledPoint>> {
    let source = config
        .input
        .reader()
        .read_path(input)
        .with_context(|| format!("reading samples from {:?}", input))?;
    tracing::info!("Loaded {} samples from {:?}", source.len(), input);

    let settings = &config.downsample;
    let mut downsampler = Downsampler::with_options(
        source,
        settings.interval_spec()?,
        settings.aggregator()?,
        settings.time_zone()?,
        settings.rate_options()?,
    )?;

    if let Some(timestamp) = seek {
        downsampler.seek(timestamp)?;
    }

    let points = downsampler
        .collect::<Result<Vec<_>, _>>()
        .context("downsampling failed")?;
    tracing::info!("Produced {} buckets", points.len());
    Ok(points)
}

fn print_points(points: &[DownsampledPoint], format: &str, timezone: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(points)?);
        }
        "csv" => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["timestamp", "value"])?;
            for point in points {
                writer.write_record([point.timestamp.to_string(), point.value.to_string()])?;
            }
            writer.flush()?;
        }
        _ => {
            let tz: chrono_tz::Tz = timezone.parse().unwrap_or(chrono_tz::Tz::UTC);
            println!("{:<16} {:<26} {:>14}", "Timestamp", "Bucket start", "Value");
            println!("{}", "-".repeat(58));
            for point in points {
                let local = DateTime::from_timestamp_millis(point.timestamp)
                    .map(|dt| dt.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<16} {:<26} {:>14.4}", point.timestamp, local, point.value);
            }
        }
    }
    Ok(())
}

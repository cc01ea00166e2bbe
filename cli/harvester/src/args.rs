//! CLI argument definitions for log-harvester.

use clap::{Parser, ValueEnum};

/// Incremental S3 access-log harvester.
///
/// Polls time-bucketed log segments under a bucket prefix, reads only the
/// bytes appended since the last poll, and writes one JSON event per record
/// to stdout. Logs go to stderr.
///
/// ## Examples
///
/// Follow a bucket:
///   log-harvester -b my-logs -p W3SVC1
///
/// Start from yesterday and keep position across restarts:
///   log-harvester -b my-logs -p W3SVC1 --skip-until -24h \
///       --checkpoint /var/lib/log-harvester/state.json
///
/// Against LocalStack:
///   log-harvester -b my-logs --s3-endpoint http://localhost:4566 --once
#[derive(Parser, Debug)]
#[command(name = "log-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === S3 Configuration ===
    /// S3 bucket name
    #[arg(short, long, env = "LH_S3_BUCKET")]
    pub bucket: String,

    /// Base prefix under which segments are bucketed by yyyy/mm/dd/HH
    #[arg(short, long, env = "LH_S3_PREFIX", default_value = "")]
    pub prefix: String,

    /// Custom S3 endpoint URL (for LocalStack)
    #[arg(long, env = "LH_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY")]
    pub secret_key: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    // === Harvest Options ===
    /// Seconds between poll cycles
    #[arg(long, env = "LH_POLL_INTERVAL", default_value = "30", value_parser = parse_positive_u64)]
    pub poll_interval: u64,

    /// Ignore objects modified at or before this date (ISO 8601, date only, or relative like -24h)
    #[arg(long, env = "LH_SKIP_UNTIL")]
    pub skip_until: Option<String>,

    /// Glob pattern on file names (e.g., "u_ex*.log")
    #[arg(long, env = "LH_PATTERN")]
    pub pattern: Option<String>,

    /// Days within which per-day prefixes are listed instead of the base prefix
    #[arg(long, default_value = "7")]
    pub lookback_days: u32,

    /// Maximum bytes per range read
    #[arg(long, default_value = "8388608", value_parser = parse_positive_u64)]
    pub max_fetch_bytes: u64,

    /// Seconds allowed for each list, read or sink call, S3 retries included
    #[arg(long, default_value = "30", value_parser = parse_positive_u64)]
    pub request_timeout: u64,

    /// Retries for a failed S3 list or read before giving up for the cycle
    #[arg(long, env = "LH_MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// Escape rule MARKER=CHAR (can be specified multiple times, default "~1=/")
    #[arg(long = "escape")]
    pub escapes: Vec<String>,

    /// Checkpoint file for resuming after restart
    #[arg(long, env = "LH_CHECKPOINT")]
    pub checkpoint: Option<std::path::PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    // === Output Options ===
    /// Output format for events
    #[arg(long, value_enum, default_value = "jsonl")]
    pub output_format: OutputFormatArg,

    // === Logging Options ===
    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

/// Output format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// JSON Lines (one JSON object per line)
    Jsonl,
    /// Pretty-printed JSON
    Json,
    /// Count events only, print totals on exit
    Stats,
}

/// Log level argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Parse a positive u64 (>= 1).
fn parse_positive_u64(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

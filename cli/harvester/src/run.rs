//! Main execution logic for log-harvester CLI.

use anyhow::Result;
use lh_discoverer::{RetryConfig, S3Config, S3Store, parse_date};
use lh_harvester::{
    FileCheckpointStore, Harvester, HarvesterConfig, OutputFormat, RunStats, StatsReport,
    StatsSink, StdoutSink,
};
use lh_reader::EscapeRule;
use lh_traits::EventSink;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use crate::args::{Cli, LogLevel, OutputFormatArg};

/// Outcome of a harvester run.
pub struct Outcome {
    pub stats: RunStats,
    pub counted: Option<StatsReport>,
}

/// Initialize logging.
///
/// `RUST_LOG` overrides `--log-level` when set.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let level: Level = level.into();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout carries the events
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Execute the harvester with the provided arguments.
pub async fn execute(args: Cli) -> Result<Outcome> {
    let config = build_config(&args)?;
    let store = Arc::new(S3Store::from_config(&build_s3_config(&args)).await?);

    let counter = (args.output_format == OutputFormatArg::Stats).then(|| Arc::new(StatsSink::new()));
    let sink: Arc<dyn EventSink> = match (&counter, args.output_format) {
        (Some(counter), _) => counter.clone(),
        (None, OutputFormatArg::Json) => Arc::new(StdoutSink::new(OutputFormat::Json)),
        (None, _) => Arc::new(StdoutSink::new(OutputFormat::Jsonl)),
    };

    let mut harvester = Harvester::new(config, store, sink)?;
    if let Some(path) = &args.checkpoint {
        harvester = harvester.with_checkpoint_store(Arc::new(FileCheckpointStore::new(path)));
    }

    let stats = if args.once {
        let mut totals = RunStats::new();
        harvester.load_checkpoint().await;
        let cycle = harvester.run_cycle().await;
        totals.record_cycle(&cycle);
        totals.complete();
        totals
    } else {
        let cancel = CancellationToken::new();
        spawn_shutdown_listener(cancel.clone());
        harvester.run(cancel).await
    };

    Ok(Outcome {
        stats,
        counted: counter.map(|c| c.get_stats()),
    })
}

/// Build the S3 client configuration from CLI arguments.
///
/// The harvester bounds each store call by `--request-timeout`; the S3
/// attempts and the backoff between them are sized to fit inside it.
fn build_s3_config(args: &Cli) -> S3Config {
    let mut s3_config = S3Config::new(&args.bucket)
        .with_region(&args.region)
        .with_request_deadline(Duration::from_secs(args.request_timeout))
        .with_retry(RetryConfig::new().with_max_retries(args.max_retries));

    if let Some(endpoint) = &args.s3_endpoint {
        s3_config = s3_config.with_endpoint(endpoint);
    }

    if let (Some(access_key), Some(secret_key)) = (&args.access_key, &args.secret_key) {
        s3_config = s3_config.with_credentials(access_key, secret_key);
    }

    if let Some(profile) = &args.profile {
        s3_config = s3_config.with_profile(profile);
    }

    s3_config
}

/// Build the harvester configuration from CLI arguments.
fn build_config(args: &Cli) -> Result<HarvesterConfig> {
    let mut config = HarvesterConfig::new(&args.prefix)
        .with_poll_interval(Duration::from_secs(args.poll_interval))
        .with_request_timeout(Duration::from_secs(args.request_timeout))
        .with_max_fetch_bytes(args.max_fetch_bytes)
        .with_lookback_days(args.lookback_days);

    if let Some(skip_until) = &args.skip_until {
        let dt = parse_date(skip_until)
            .map_err(|e| anyhow::anyhow!("Invalid --skip-until: {}", e))?;
        config = config.with_skip_until(dt);
    }

    if let Some(pattern) = &args.pattern {
        config = config.with_key_pattern(pattern);
    }

    if !args.escapes.is_empty() {
        let escapes = args
            .escapes
            .iter()
            .map(|rule| EscapeRule::parse(rule))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid --escape: {}", e))?;
        config = config.with_escapes(escapes);
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

/// Cancel `token` on Ctrl-C. The cycle in progress completes first.
fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested, finishing current cycle");
            token.cancel();
        }
    });
}

//! log-harvester CLI
//!
//! Incremental harvesting of W3C access logs from S3.

use clap::Parser;

mod args;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr so stdout carries only events
    run::init_logging(args.log_level)?;

    let outcome = run::execute(args).await?;
    let stats = outcome.stats;

    eprintln!();
    eprintln!("Harvest stopped:");
    eprintln!("  Cycles:           {}", stats.cycles);
    eprintln!("  Cycles w/ errors: {}", stats.cycles_with_errors);
    eprintln!("  Objects read:     {}", stats.objects_processed);
    eprintln!("  Objects failed:   {}", stats.objects_failed);
    eprintln!("  Objects dropped:  {}", stats.objects_dropped);
    eprintln!("  Events emitted:   {}", stats.events_emitted);
    eprintln!("  Malformed lines:  {}", stats.lines_malformed);
    eprintln!("  Bytes read:       {}", format_bytes(stats.bytes_read));
    eprintln!("  Watermark:        {}", stats.watermark);

    if let Some(eps) = stats.events_per_second() {
        eprintln!("  Throughput:       {:.1} events/sec", eps);
    }

    if let Some(counted) = outcome.counted {
        eprintln!("  Fields counted:   {}", counted.fields);
        eprintln!("  Flushes:          {}", counted.flushes);
    }

    Ok(())
}

/// Format bytes as human-readable string.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

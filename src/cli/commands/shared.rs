//! Shared components for CLI commands
//!
//! Logging setup, layered configuration loading and the colored run summary
//! used by every subcommand.

use crate::cli::args::Args;
use crate::config::PipelineConfig;
use crate::constants::LOG_TARGET;
use crate::models::ProcessingStats;
use anyhow::{Context, Result};
use colored::*;
use tracing::debug;

/// Set up structured logging on stderr
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{LOG_TARGET}={log_level}")));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Defaults, config file and environment; command-line overrides come after
pub fn load_configuration(args: &Args) -> Result<PipelineConfig> {
    let config = PipelineConfig::load(args.config_file.as_deref()).with_context(|| {
        match &args.config_file {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Failed to load configuration".to_string(),
        }
    })?;
    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

/// Print the end-of-run summary
pub fn print_summary(title: &str, stats: &ProcessingStats) {
    println!("\n{}", title.bright_green().bold());

    if let Some(weather) = &stats.weather {
        println!("  {}", "Weather".bright_yellow());
        println!(
            "    {} {} rows read, {} hours written",
            "Rows:".bright_cyan(),
            weather.rows_read,
            weather.hours.to_string().bright_white().bold()
        );
        println!(
            "    {} {} unparseable timestamps, {} without station, {} other stations, {} outside year",
            "Dropped:".bright_cyan(),
            weather.unparseable_timestamps,
            weather.missing_station,
            weather.other_station,
            weather.out_of_year
        );
        if weather.skipped_local_times > 0 {
            println!(
                "    {} {} local times inside a DST gap kept as recorded",
                "Kept:".bright_cyan(),
                weather.skipped_local_times.to_string().yellow()
            );
        }
        if weather.temperature_missing_hours > 0 {
            println!(
                "    {} {} hours without air temperature",
                "Gaps:".bright_cyan(),
                weather.temperature_missing_hours.to_string().yellow()
            );
        }
    }

    if let Some(join) = &stats.join {
        println!("  {}", "Join".bright_yellow());
        println!(
            "    {} {} complaints read, {} dropped for unparseable timestamps",
            "Rows:".bright_cyan(),
            join.complaints_read,
            join.unparseable_timestamps
        );
        let coverage = crate::invariants::Coverage::new(join.joined_rows, join.matched_rows);
        println!(
            "    {} {} ({} of {} joined rows have a temperature)",
            "Coverage:".bright_cyan(),
            coverage.to_string().bright_white().bold(),
            join.matched_rows,
            join.joined_rows
        );
    }

    for output in &stats.outputs {
        println!("  {} {}", "Wrote".bright_green(), output.display());
    }
    println!(
        "  {} {:.2}s",
        "Time:".bright_cyan(),
        stats.processing_time_ms as f64 / 1000.0
    );
}

//! `weather`, `join` and `run` commands

use super::shared::{load_configuration, print_summary};
use crate::cli::args::{Args, PipelineArgs};
use crate::processor::JoinProcessor;
use anyhow::{Context, Result};
use colored::*;
use tracing::info;

fn build_processor(args: &Args, overrides: &PipelineArgs) -> Result<JoinProcessor> {
    let config = overrides.apply(load_configuration(args)?);
    let processor = JoinProcessor::new(config).context("Invalid configuration")?;
    Ok(processor.with_progress(args.show_progress()))
}

fn announce(args: &Args, processor: &JoinProcessor, stage: &str) {
    if args.quiet {
        return;
    }
    let config = processor.config();
    println!("{}", stage.bright_green().bold());
    println!(
        "  {} {} ({})",
        "Time zone:".bright_cyan(),
        config.timezone,
        config.year
    );
    println!(
        "  {} weather={}, complaints={}",
        "Source zones:".bright_cyan(),
        config.weather_zone,
        config.complaint_zone
    );
}

pub fn run_weather(args: &Args, overrides: &PipelineArgs) -> Result<()> {
    let processor = build_processor(args, overrides)?;
    announce(args, &processor, "Preparing hourly weather");

    let stats = processor
        .run_weather()
        .context("Weather stage failed; no hourly table was written")?;
    info!("Weather stage finished in {} ms", stats.processing_time_ms);

    if !args.quiet {
        print_summary("Hourly weather ready", &stats);
    }
    Ok(())
}

pub fn run_join(args: &Args, overrides: &PipelineArgs) -> Result<()> {
    let processor = build_processor(args, overrides)?;
    announce(args, &processor, "Joining complaints to hourly weather");

    let stats = processor
        .run_join()
        .context("Join stage failed; no canonical table was written")?;
    info!("Join stage finished in {} ms", stats.processing_time_ms);

    if !args.quiet {
        print_summary("Canonical table ready", &stats);
    }
    Ok(())
}

pub fn run_all(args: &Args, overrides: &PipelineArgs) -> Result<()> {
    let processor = build_processor(args, overrides)?;
    announce(args, &processor, "Running weather and join stages");

    let stats = processor
        .run_all()
        .context("Pipeline failed; no output was written")?;
    info!("Pipeline finished in {} ms", stats.processing_time_ms);

    if !args.quiet {
        print_summary("Pipeline complete", &stats);
    }
    Ok(())
}

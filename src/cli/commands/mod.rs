//! Command implementations for the nyc311-weather CLI
//!
//! Each subcommand lives in its own module:
//! - `pipeline`: `weather`, `join` and `run`
//! - `report`: day-part by temperature series
//! - `inspect`: dry-run alignment check

pub mod inspect;
pub mod pipeline;
pub mod report;
pub mod shared;

use crate::cli::args::{Args, Commands};
use anyhow::Result;

/// Dispatch to the subcommand handler; a missing subcommand is a no-op
pub fn run(args: Args) -> Result<()> {
    let Some(command) = args.command.clone() else {
        return Ok(());
    };

    shared::setup_logging(&args)?;

    match command {
        Commands::Weather(overrides) => pipeline::run_weather(&args, &overrides),
        Commands::Join(overrides) => pipeline::run_join(&args, &overrides),
        Commands::Run(overrides) => pipeline::run_all(&args, &overrides),
        Commands::Report(report_args) => report::run_report(&args, &report_args),
        Commands::Inspect(overrides) => inspect::run_inspect(&args, &overrides),
    }
}

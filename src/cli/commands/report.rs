//! `report` command

use super::shared::load_configuration;
use crate::cli::args::{Args, ReportArgs};
use crate::report::{build_series, load_canonical, render, validate_bin_width};
use anyhow::{Context, Result};
use tracing::info;

pub fn run_report(args: &Args, report_args: &ReportArgs) -> Result<()> {
    let config = load_configuration(args)?;
    let input = report_args
        .input
        .clone()
        .unwrap_or_else(|| config.paths.canonical_output.clone());
    let bin_width = validate_bin_width(report_args.bin_width.unwrap_or(config.bin_width_c))?;

    let records = load_canonical(&input)
        .with_context(|| format!("Cannot report from {}", input.display()))?;
    let series = build_series(&records, bin_width);
    info!(
        "Report over {} rows, {} coverage",
        records.len(),
        series.coverage
    );

    print!("{}", render(&series, report_args.format)?);
    Ok(())
}

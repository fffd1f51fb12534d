//! `inspect` command

use super::shared::load_configuration;
use crate::cli::args::{Args, PipelineArgs};
use crate::processor::JoinProcessor;
use anyhow::{Context, Result};

pub fn run_inspect(args: &Args, overrides: &PipelineArgs) -> Result<()> {
    let config = overrides.apply(load_configuration(args)?);
    let inspection = JoinProcessor::new(config)
        .context("Invalid configuration")?
        .with_progress(args.show_progress())
        .inspect()
        .context("Inspection failed")?;

    inspection.print();
    Ok(())
}

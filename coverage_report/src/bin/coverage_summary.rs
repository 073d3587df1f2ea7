use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use coverage_report::app::{self, SummaryArgs, SummaryConfig};

fn main() -> Result<ExitCode> {
    let args = SummaryArgs::parse();
    app::init_tracing();
    let config = SummaryConfig::from(args);
    Ok(app::run_summary(config)?.into())
}

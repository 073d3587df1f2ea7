use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use coverage_report::app::{self, AnalyzeArgs, AnalyzeConfig};

fn main() -> Result<ExitCode> {
    let args = AnalyzeArgs::parse();
    app::init_tracing();
    let config = AnalyzeConfig::from(args);
    Ok(app::run_analyze(config)?.into())
}

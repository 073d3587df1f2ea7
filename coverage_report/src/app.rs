use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    error::ReportError,
    filter::SubtreeFilter,
    output::{self, AnalysisDocument, OutputFormat},
    report::{self, CoverageSummary, DEFAULT_TOP_N},
    summary::{self, CoverageRecord},
    uncovered::{self, UncoveredReport, DEFAULT_MAX_LINES},
};

pub const DEFAULT_SUMMARY_FILE: &str = "gcov_summary.txt";
pub const DEFAULT_INCLUDE_PREFIX: &str = "../include/";

pub fn default_summary_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_SUMMARY_FILE)
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "coverage_analyze",
    author,
    version,
    about = "Analyze gcov summary for SDK include coverage",
    long_about = None
)]
pub struct AnalyzeArgs {
    /// Path to gcov summary output
    #[arg(long, value_name = "PATH", env = "GCOV_SUMMARY", default_value_os_t = default_summary_path())]
    pub summary: PathBuf,

    /// How many lowest-coverage files to list
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top: usize,

    /// Show uncovered lines for a specific .gcov file (case-insensitive substring)
    #[arg(long = "file", value_name = "NAME")]
    pub file_filter: Option<String>,

    /// Max uncovered lines to print
    #[arg(long, default_value_t = DEFAULT_MAX_LINES)]
    pub max_lines: usize,

    /// Directory gcov ran in; relative paths in the summary resolve against it
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub tests_root: PathBuf,

    /// Include subtree to report on [default: <tests-root>/../include]
    #[arg(long, value_name = "DIR")]
    pub include_root: Option<PathBuf>,

    /// Directory holding detailed .gcov reports [default: <tests-root>/coverage]
    #[arg(long, value_name = "DIR")]
    pub coverage_dir: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    pub summary_path: PathBuf,
    pub top_n: usize,
    pub file_filter: Option<String>,
    pub max_lines: usize,
    pub tests_root: PathBuf,
    /// `None` selects `<tests_root>/../include`.
    pub include_root: Option<PathBuf>,
    pub coverage_dir: PathBuf,
    pub format: OutputFormat,
}

impl From<AnalyzeArgs> for AnalyzeConfig {
    fn from(value: AnalyzeArgs) -> Self {
        let coverage_dir = value
            .coverage_dir
            .unwrap_or_else(|| value.tests_root.join("coverage"));
        Self {
            summary_path: value.summary,
            top_n: value.top,
            file_filter: value.file_filter,
            max_lines: value.max_lines,
            tests_root: value.tests_root,
            include_root: value.include_root,
            coverage_dir,
            format: value.format,
        }
    }
}

impl AnalyzeConfig {
    /// Root-containment filter anchored at the absolute tests root.
    ///
    /// An explicit include root resolves against the working directory, like
    /// `--coverage-dir`; the default sits beside the tests root.
    pub fn subtree_filter(&self) -> Result<SubtreeFilter> {
        let base_dir = absolute(&self.tests_root)?;
        let target_root = match &self.include_root {
            Some(include_root) => absolute(include_root)?,
            None => base_dir.join("..").join("include"),
        };
        Ok(SubtreeFilter::root(base_dir, target_root))
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "coverage_summary",
    author,
    version,
    about = "Print aggregate SDK include line coverage from a gcov summary",
    long_about = None
)]
pub struct SummaryArgs {
    /// Path to gcov summary output
    #[arg(value_name = "PATH", env = "GCOV_SUMMARY", default_value_os_t = default_summary_path())]
    pub summary: PathBuf,

    /// Path prefix selecting include files
    #[arg(long, default_value = DEFAULT_INCLUDE_PREFIX)]
    pub prefix: String,
}

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub summary_path: PathBuf,
    pub prefix: String,
}

impl From<SummaryArgs> for SummaryConfig {
    fn from(value: SummaryArgs) -> Self {
        Self {
            summary_path: value.summary,
            prefix: value.prefix,
        }
    }
}

/// Process outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::from(1),
        }
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// What the summary section of `coverage_analyze` found.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Missing,
    NoRecords,
    NoIncludedFiles,
    Report(CoverageSummary),
}

#[derive(Debug)]
pub struct Analysis {
    pub summary: SummaryOutcome,
    /// `None` when no `--file` lookup was requested.
    pub uncovered: Option<Result<UncoveredReport, ReportError>>,
}

impl Analysis {
    pub fn status(&self) -> Status {
        match self.uncovered {
            Some(Err(_)) => Status::Failure,
            _ => Status::Success,
        }
    }
}

/// Gather everything `coverage_analyze` reports, without printing.
///
/// Missing inputs and unresolved lookups are recorded in the result; only
/// unexpected I/O failures are returned as errors.
pub fn analyze(config: &AnalyzeConfig) -> Result<Analysis> {
    let summary = match load_records(&config.summary_path)? {
        None => SummaryOutcome::Missing,
        Some(records) if records.is_empty() => SummaryOutcome::NoRecords,
        Some(records) => {
            let files = config.subtree_filter()?.apply(&records);
            match CoverageSummary::build(&files, config.top_n) {
                Some(report) => SummaryOutcome::Report(report),
                None => SummaryOutcome::NoIncludedFiles,
            }
        }
    };

    let uncovered = match config.file_filter.as_deref() {
        None => None,
        Some(filter) => match uncovered::load_uncovered(&config.coverage_dir, filter, config.max_lines) {
            Err(err) if !err.is_lookup_failure() => {
                return Err(err).context("failed to read detailed coverage report");
            }
            Err(err) => {
                warn!(filter, error = %err, "Detailed report lookup failed");
                Some(Err(err))
            }
            Ok(report) => Some(Ok(report)),
        },
    };

    Ok(Analysis { summary, uncovered })
}

pub fn run_analyze(config: AnalyzeConfig) -> Result<Status> {
    info!(
        summary = %config.summary_path.display(),
        include_root = ?config.include_root,
        coverage_dir = %config.coverage_dir.display(),
        "Analyzing gcov summary",
    );

    let analysis = analyze(&config)?;
    match config.format {
        OutputFormat::Text => print!("{}", render_analysis_text(&config, &analysis)),
        OutputFormat::Json => println!("{}", render_analysis_json(&config, &analysis)),
    }

    Ok(analysis.status())
}

pub fn render_analysis_text(config: &AnalyzeConfig, analysis: &Analysis) -> String {
    let mut out = String::new();

    match &analysis.summary {
        SummaryOutcome::Missing => {
            out.push_str(&ReportError::missing_input(&config.summary_path).to_string());
            out.push('\n');
        }
        SummaryOutcome::NoRecords => {}
        SummaryOutcome::NoIncludedFiles => {
            out.push_str(output::NO_INCLUDE_FILES);
            out.push('\n');
            out.push_str(&output::format_raw_source(&config.summary_path));
            out.push('\n');
        }
        SummaryOutcome::Report(report) => {
            out.push_str(&output::format_coverage_text(report));
            out.push_str(&output::format_raw_source(&config.summary_path));
            out.push('\n');
        }
    }

    match &analysis.uncovered {
        None => {
            out.push_str(&tip(&config.coverage_dir));
            out.push('\n');
        }
        Some(Ok(report)) => out.push_str(&output::format_uncovered_text(report)),
        Some(Err(ReportError::AmbiguousMatch { candidates, .. })) => {
            out.push_str(&output::format_candidates(candidates));
        }
        Some(Err(err)) => {
            out.push_str(&err.to_string());
            out.push('\n');
        }
    }

    out
}

pub fn render_analysis_json(config: &AnalyzeConfig, analysis: &Analysis) -> String {
    let mut messages = Vec::new();
    match &analysis.summary {
        SummaryOutcome::Missing => {
            messages.push(ReportError::missing_input(&config.summary_path).to_string());
        }
        SummaryOutcome::NoIncludedFiles => messages.push(output::NO_INCLUDE_FILES.to_string()),
        SummaryOutcome::NoRecords | SummaryOutcome::Report(_) => {}
    }
    match &analysis.uncovered {
        None => messages.push(tip(&config.coverage_dir)),
        Some(Err(err)) => messages.push(err.to_string()),
        Some(Ok(_)) => {}
    }

    let coverage = match &analysis.summary {
        SummaryOutcome::Report(report) => Some(report),
        _ => None,
    };
    let uncovered = analysis
        .uncovered
        .as_ref()
        .and_then(|result| result.as_ref().ok());

    output::format_analysis_json(&AnalysisDocument {
        summary_path: &config.summary_path,
        coverage,
        uncovered,
        messages: &messages,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .with_context(|| format!("failed to resolve {}", path.display()))
}

fn tip(coverage_dir: &Path) -> String {
    format!(
        "Tip: use --file <name> to list uncovered lines from {}",
        coverage_dir.display()
    )
}

/// `coverage_summary`: aggregate line only; a missing summary is a failure.
pub fn run_summary(config: SummaryConfig) -> Result<Status> {
    let Some(records) = load_records(&config.summary_path)? else {
        println!("{}", ReportError::missing_input(&config.summary_path));
        return Ok(Status::Failure);
    };

    let files = SubtreeFilter::prefix(config.prefix.as_str()).apply(&records);
    match report::aggregate(&files) {
        None => println!("{}", output::NO_PREFIX_MATCHES),
        Some(agg) => {
            println!("{}", output::format_aggregate_line(&agg));
            println!("{}", output::format_raw_source(&config.summary_path));
        }
    }

    Ok(Status::Success)
}

/// `None` when the summary file does not exist.
fn load_records(path: &Path) -> Result<Option<Vec<CoverageRecord>>> {
    match summary::load_summary(path) {
        Ok(records) => Ok(Some(records)),
        Err(ReportError::MissingInput { path }) => {
            warn!(path = %path.display(), "Coverage summary not found");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

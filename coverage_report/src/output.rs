//! Output formatters for coverage reports
//!
//! Supports text and JSON output formats.

use std::path::Path;

use serde::Serialize;

use crate::report::{Aggregate, CoverageSummary};
use crate::uncovered::UncoveredReport;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format '{}'. Use 'text' or 'json'", s)),
        }
    }
}

pub const NO_INCLUDE_FILES: &str = "No SDK include files found in coverage summary.";
pub const NO_PREFIX_MATCHES: &str = "No include files matched in gcov output.";

/// Aggregate line plus the lowest-coverage listing.
pub fn format_coverage_text(summary: &CoverageSummary) -> String {
    let agg = &summary.aggregate;
    let mut output = String::new();

    output.push_str(&format!(
        "SDK include line coverage: {:.2}% ({:.1}/{})\n",
        agg.overall_percent, agg.covered_lines, agg.total_lines
    ));
    output.push_str(&format!("Files considered: {}\n", agg.files));
    output.push_str("Lowest coverage files:\n");

    for file in &summary.lowest {
        output.push_str(&format!(
            "  {:6.2}% ({:5} lines)  {}\n",
            file.record.percent_covered, file.record.total_lines, file.relative_path
        ));
    }

    output
}

/// One-line aggregate used by `coverage_summary`.
pub fn format_aggregate_line(agg: &Aggregate) -> String {
    format!(
        "SDK include line coverage: {:.2}% ({:.1}/{}) across {} files",
        agg.overall_percent, agg.covered_lines, agg.total_lines, agg.files
    )
}

pub fn format_raw_source(summary_path: &Path) -> String {
    format!("Raw gcov output: {}", summary_path.display())
}

pub fn format_uncovered_text(report: &UncoveredReport) -> String {
    if report.lines.is_empty() {
        return format!("No uncovered lines found in {}\n", report.report_name);
    }

    let mut output = format!(
        "Uncovered lines in {} (showing up to {}):\n",
        report.report_name, report.max_lines
    );
    for line in report.shown() {
        output.push_str(&format!("  {:6}: {}\n", line.line_number, line.source_text));
    }

    let remaining = report.remaining();
    if remaining > 0 {
        output.push_str(&format!("  ... {} more\n", remaining));
    }

    output
}

/// Candidate listing for an ambiguous `--file` lookup.
pub fn format_candidates(candidates: &[String]) -> String {
    let mut output = String::from("Multiple matches found. Be more specific:\n");
    for name in candidates {
        output.push_str(&format!("  {}\n", name));
    }
    output
}

/// Everything `coverage_analyze` produced, as one JSON document.
#[derive(Debug, Serialize)]
pub struct AnalysisDocument<'a> {
    pub summary_path: &'a Path,
    pub coverage: Option<&'a CoverageSummary>,
    pub uncovered: Option<&'a UncoveredReport>,
    pub messages: &'a [String],
}

pub fn format_analysis_json(document: &AnalysisDocument<'_>) -> String {
    serde_json::to_string_pretty(document).unwrap_or_else(|_| "{}".to_string())
}

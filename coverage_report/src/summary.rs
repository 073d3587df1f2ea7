//! gcov summary parser
//!
//! Turns the text printed by `gcov` into one [`CoverageRecord`] per file block:
//!
//! ```text
//! File '../include/Numerics/Base16.h'
//! Lines executed:85.00% of 20
//! Creating 'Base16.h.gcov'
//! ```

use std::fs;
use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ReportError, ReportResult};

static FILE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^File '([^']+)'").expect("file header pattern"));

static LINES_EXECUTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Lines executed:\s*([0-9.]+)% of (\d+)").expect("lines executed pattern")
});

/// Line coverage of a single file block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageRecord {
    pub file_path: String,
    pub percent_covered: f64,
    pub total_lines: u64,
}

impl CoverageRecord {
    /// Fractional number of executed lines (`percent / 100 * total`).
    pub fn covered_lines(&self) -> f64 {
        self.percent_covered / 100.0 * self.total_lines as f64
    }
}

/// Parse summary text into records, in input order.
///
/// A header stays pending until the next `Lines executed` line; a second
/// header replaces it. Repeated paths produce repeated records.
pub fn parse_summary(text: &str) -> Vec<CoverageRecord> {
    let mut records = Vec::new();
    let mut current_file: Option<&str> = None;

    for line in text.lines() {
        if let Some(caps) = FILE_HEADER.captures(line) {
            current_file = caps.get(1).map(|m| m.as_str());
            continue;
        }

        let Some(file_path) = current_file else {
            continue;
        };

        if let Some(record) = parse_lines_executed(file_path, line) {
            records.push(record);
            current_file = None;
        }
    }

    debug!(records = records.len(), "Parsed gcov summary");
    records
}

fn parse_lines_executed(file_path: &str, line: &str) -> Option<CoverageRecord> {
    let caps = LINES_EXECUTED.captures(line)?;
    let (Ok(percent_covered), Ok(total_lines)) = (caps[1].parse::<f64>(), caps[2].parse::<u64>())
    else {
        warn!(file = file_path, line, "Skipping unparseable Lines executed entry");
        return None;
    };

    Some(CoverageRecord {
        file_path: file_path.to_string(),
        percent_covered,
        total_lines,
    })
}

/// Read and parse a summary file.
pub fn load_summary(path: &Path) -> ReportResult<Vec<CoverageRecord>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ReportError::missing_input(path));
        }
        Err(err) => return Err(ReportError::io(path, err)),
    };

    Ok(parse_summary(&text))
}

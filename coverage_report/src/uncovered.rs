//! Uncovered-line extraction from detailed `.gcov` reports.
//!
//! A detailed report annotates each source line with an execution count; lines
//! that were never executed carry a `#####` marker:
//!
//! ```text
//!         5:   13:int y = 1;
//!     #####:   14:return x;
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ReportError, ReportResult};

pub const DEFAULT_MAX_LINES: usize = 30;

static NEVER_EXECUTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#####:\s*(\d+):(.*)$").expect("never executed pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncoveredLine {
    pub line_number: u64,
    pub source_text: String,
}

/// Uncovered lines of the one report a lookup resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncoveredReport {
    pub report_name: String,
    pub lines: Vec<UncoveredLine>,
    pub max_lines: usize,
}

impl UncoveredReport {
    pub fn shown(&self) -> &[UncoveredLine] {
        &self.lines[..self.lines.len().min(self.max_lines)]
    }

    pub fn remaining(&self) -> usize {
        self.lines.len().saturating_sub(self.max_lines)
    }
}

/// Collect `#####` lines in file order, source text trimmed.
pub fn parse_uncovered(text: &str) -> Vec<UncoveredLine> {
    text.lines()
        .filter_map(|line| {
            let caps = NEVER_EXECUTED.captures(line)?;
            let line_number = match caps[1].parse::<u64>() {
                Ok(number) => number,
                Err(err) => {
                    warn!(line, error = %err, "Skipping uncovered line with unparseable number");
                    return None;
                }
            };
            Some(UncoveredLine {
                line_number,
                source_text: caps[2].trim().to_string(),
            })
        })
        .collect()
}

/// Resolve `filter` to exactly one `*.gcov` file in `dir` (case-insensitive
/// substring match on the file name).
pub fn find_report(dir: &Path, filter: &str) -> ReportResult<PathBuf> {
    if !dir.is_dir() {
        return Err(ReportError::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }

    let pattern = format!(
        "{}/*.gcov",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let needle = filter.to_lowercase();

    let mut matches: Vec<PathBuf> = glob::glob(&pattern)?
        .flatten()
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect();

    debug!(filter, candidates = matches.len(), "Matched .gcov reports");

    match matches.len() {
        0 => Err(ReportError::NoMatch {
            filter: filter.to_string(),
            dir: dir.to_path_buf(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(ReportError::AmbiguousMatch {
            filter: filter.to_string(),
            candidates: matches.iter().map(|path| file_name(path)).collect(),
        }),
    }
}

/// Find the single report for `filter` and extract its uncovered lines.
pub fn load_uncovered(dir: &Path, filter: &str, max_lines: usize) -> ReportResult<UncoveredReport> {
    let path = find_report(dir, filter)?;
    info!(report = %path.display(), "Reading detailed coverage report");

    let text = fs::read_to_string(&path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ReportError::missing_input(&path),
        _ => ReportError::io(&path, err),
    })?;

    Ok(UncoveredReport {
        report_name: file_name(&path),
        lines: parse_uncovered(&text),
        max_lines,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

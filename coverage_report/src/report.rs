//! Aggregation over the filtered record set.

use serde::Serialize;

use crate::filter::FileCoverage;

pub const DEFAULT_TOP_N: usize = 15;

/// Line-weighted totals over a non-empty file set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregate {
    pub overall_percent: f64,
    pub covered_lines: f64,
    /// Widened so any number of `u64` per-file counts sums without overflow.
    pub total_lines: u128,
    pub files: usize,
}

/// Aggregate plus the lowest-coverage listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageSummary {
    #[serde(flatten)]
    pub aggregate: Aggregate,
    pub lowest: Vec<FileCoverage>,
}

impl CoverageSummary {
    /// `None` when no lines are available to weight against.
    pub fn build(files: &[FileCoverage], top_n: usize) -> Option<Self> {
        let aggregate = aggregate(files)?;
        Some(Self {
            aggregate,
            lowest: lowest_coverage(files, top_n),
        })
    }
}

/// Weighted average `sum(pct/100 * total) / sum(total)`.
///
/// Returns `None` for an empty set, and for a set whose files report zero
/// executable lines, since there is nothing to divide by.
pub fn aggregate(files: &[FileCoverage]) -> Option<Aggregate> {
    let (covered_lines, total_lines) = files.iter().fold((0.0, 0u128), |(covered, total), f| {
        (
            covered + f.record.covered_lines(),
            total + u128::from(f.record.total_lines),
        )
    });

    if total_lines == 0 {
        return None;
    }

    Some(Aggregate {
        overall_percent: covered_lines / total_lines as f64 * 100.0,
        covered_lines,
        total_lines,
        files: files.len(),
    })
}

/// The `n` least-covered files, ascending. Ties keep their input order.
pub fn lowest_coverage(files: &[FileCoverage], n: usize) -> Vec<FileCoverage> {
    let mut sorted = files.to_vec();
    sorted.sort_by(|a, b| {
        a.record
            .percent_covered
            .total_cmp(&b.record.percent_covered)
    });
    sorted.truncate(n);
    sorted
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::summary::CoverageRecord;

    fn file(path: &str, pct: f64, total: u64) -> FileCoverage {
        FileCoverage {
            relative_path: path.to_string(),
            record: CoverageRecord {
                file_path: format!("../include/{path}"),
                percent_covered: pct,
                total_lines: total,
            },
        }
    }

    #[test]
    fn aggregate__two_files__then_weighted_by_lines() {
        let files = vec![file("a.h", 50.0, 10), file("b.h", 100.0, 5)];

        let agg = aggregate(&files).expect("aggregate");

        assert!((agg.overall_percent - 66.666_666_666).abs() < 1e-6);
        assert!((agg.covered_lines - 10.0).abs() < 1e-9);
        assert_eq!(agg.total_lines, 15);
        assert_eq!(agg.files, 2);
    }

    #[test]
    fn aggregate__totals_beyond_u64__then_summed_without_overflow() {
        let files = vec![file("huge.h", 1.0, u64::MAX), file("small.h", 1.0, 5)];

        let agg = aggregate(&files).expect("aggregate");

        assert_eq!(agg.total_lines, u128::from(u64::MAX) + 5);
        assert!((agg.overall_percent - 1.0).abs() < 1e-9);
        assert_eq!(agg.files, 2);
    }

    #[test]
    fn aggregate__empty_set__then_none() {
        assert_eq!(aggregate(&[]), None);
    }

    #[test]
    fn aggregate__only_zero_line_files__then_none() {
        let files = vec![file("empty.h", 0.0, 0)];
        assert_eq!(aggregate(&files), None);
    }

    #[test]
    fn lowest_coverage__unsorted_input__then_ascending() {
        let files = vec![
            file("a.h", 90.0, 1),
            file("b.h", 10.0, 1),
            file("c.h", 50.0, 1),
        ];

        let lowest = lowest_coverage(&files, 15);
        let paths: Vec<_> = lowest.iter().map(|f| f.relative_path.as_str()).collect();

        assert_eq!(paths, vec!["b.h", "c.h", "a.h"]);
    }

    #[test]
    fn lowest_coverage__ties__then_input_order_kept() {
        let files = vec![
            file("z.h", 40.0, 1),
            file("first.h", 20.0, 1),
            file("a.h", 40.0, 1),
            file("second.h", 20.0, 1),
        ];

        let lowest = lowest_coverage(&files, 15);
        let paths: Vec<_> = lowest.iter().map(|f| f.relative_path.as_str()).collect();

        assert_eq!(paths, vec!["first.h", "second.h", "z.h", "a.h"]);
    }

    #[test]
    fn lowest_coverage__truncates_to_n() {
        let files: Vec<_> = (0..20).map(|i| file(&format!("f{i}.h"), i as f64, 1)).collect();

        let lowest = lowest_coverage(&files, 3);

        assert_eq!(lowest.len(), 3);
        assert_eq!(lowest[2].relative_path, "f2.h");
    }

    #[test]
    fn coverage_summary__build_empty__then_none() {
        assert!(CoverageSummary::build(&[], DEFAULT_TOP_N).is_none());
    }

    #[test]
    fn coverage_summary__build__then_aggregate_and_listing() {
        let files = vec![file("a.h", 80.0, 10), file("b.h", 20.0, 10)];

        let summary = CoverageSummary::build(&files, 1).expect("summary");

        assert_eq!(summary.aggregate.files, 2);
        assert!((summary.aggregate.overall_percent - 50.0).abs() < 1e-9);
        assert_eq!(summary.lowest.len(), 1);
        assert_eq!(summary.lowest[0].relative_path, "b.h");
    }
}

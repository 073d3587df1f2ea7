//! Reporting over `gcov` text output.
//!
//! Parses the per-file summary gcov prints, narrows it to the SDK include
//! subtree, aggregates line coverage, and pulls never-executed lines out of a
//! single detailed `.gcov` report.

pub mod app;
pub mod error;
pub mod filter;
pub mod output;
pub mod report;
pub mod summary;
pub mod uncovered;

pub use error::{ReportError, ReportResult};
pub use filter::{FileCoverage, SubtreeFilter};
pub use report::{Aggregate, CoverageSummary};
pub use summary::{parse_summary, CoverageRecord};
pub use uncovered::{parse_uncovered, UncoveredLine, UncoveredReport};

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Coverage summary not found: {}", .path.display())]
    MissingInput { path: PathBuf },
    #[error("Coverage directory not found: {}", .path.display())]
    MissingDirectory { path: PathBuf },
    #[error("No .gcov files matching '{filter}' in {}", .dir.display())]
    NoMatch { filter: String, dir: PathBuf },
    #[error("Multiple matches found for '{filter}': {}", .candidates.join(", "))]
    AmbiguousMatch {
        filter: String,
        candidates: Vec<String>,
    },
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid report pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub type ReportResult<T> = Result<T, ReportError>;

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    /// Failures that resolve to an informative message plus exit status 1
    /// rather than an error chain.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingDirectory { .. } | Self::NoMatch { .. } | Self::AmbiguousMatch { .. }
        )
    }
}

//! Subtree filtering for coverage records.
//!
//! gcov reports paths relative to the directory it ran in (`../include/VM/Opcodes.h`)
//! or absolute for headers pulled in from elsewhere. Only files under the include
//! subtree take part in the report.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::summary::CoverageRecord;

/// A record that passed the subtree filter, with its display path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCoverage {
    pub relative_path: String,
    #[serde(flatten)]
    pub record: CoverageRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtreeFilter {
    /// Keep paths starting with a literal prefix such as `../include/`.
    Prefix(String),
    /// Keep paths that resolve strictly inside `target_root`.
    Root {
        base_dir: PathBuf,
        target_root: PathBuf,
    },
}

impl SubtreeFilter {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn root(base_dir: impl AsRef<Path>, target_root: impl AsRef<Path>) -> Self {
        let base_dir = normalize(base_dir.as_ref());
        let target_root = if target_root.as_ref().is_absolute() {
            normalize(target_root.as_ref())
        } else {
            normalize(&base_dir.join(target_root))
        };
        Self::Root {
            base_dir,
            target_root,
        }
    }

    /// Display path for `path`, or `None` when it lies outside the subtree.
    pub fn display_path(&self, path: &str) -> Option<String> {
        match self {
            Self::Prefix(prefix) => path.strip_prefix(prefix.as_str()).map(str::to_string),
            Self::Root {
                base_dir,
                target_root,
            } => {
                let resolved = resolve(base_dir, path);
                let relative = resolved.strip_prefix(target_root).ok()?;
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect();
                if parts.is_empty() {
                    return None;
                }
                Some(parts.join("/"))
            }
        }
    }

    pub fn apply(&self, records: &[CoverageRecord]) -> Vec<FileCoverage> {
        let files: Vec<FileCoverage> = records
            .iter()
            .filter_map(|record| {
                self.display_path(&record.file_path)
                    .map(|relative_path| FileCoverage {
                        relative_path,
                        record: record.clone(),
                    })
            })
            .collect();

        debug!(
            kept = files.len(),
            dropped = records.len() - files.len(),
            "Filtered coverage records to subtree"
        );
        files
    }
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base_dir.join(path))
    }
}

/// Lexical normalization: drops `.` and lets `..` pop the previous component.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                let pops = matches!(last, Some(Component::Normal(_)));
                let at_root = matches!(last, Some(Component::RootDir | Component::Prefix(_)));
                if pops {
                    out.pop();
                } else if !at_root {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    fn record(path: &str) -> CoverageRecord {
        CoverageRecord {
            file_path: path.to_string(),
            percent_covered: 50.0,
            total_lines: 10,
        }
    }

    #[test]
    fn prefix_filter__matching_path__then_prefix_stripped() {
        let filter = SubtreeFilter::prefix("../include/");

        assert_eq!(
            filter.display_path("../include/VM/Opcodes.h").as_deref(),
            Some("VM/Opcodes.h")
        );
        assert_eq!(filter.display_path("../src/main.cpp"), None);
        assert_eq!(filter.display_path("/usr/include/stdio.h"), None);
    }

    #[cfg(unix)]
    #[test]
    fn root_filter__relative_path__then_resolved_against_base() {
        let filter = SubtreeFilter::root("/repo/tests", "/repo/include");

        assert_eq!(
            filter.display_path("../include/Carbon/Tx.h").as_deref(),
            Some("Carbon/Tx.h")
        );
        assert_eq!(
            filter.display_path("./../include/./VM/../VM/Opcodes.h").as_deref(),
            Some("VM/Opcodes.h")
        );
    }

    #[cfg(unix)]
    #[test]
    fn root_filter__absolute_path_inside_root__then_kept() {
        let filter = SubtreeFilter::root("/repo/tests", "/repo/include");

        assert_eq!(
            filter.display_path("/repo/include/Numerics/Base16.h").as_deref(),
            Some("Numerics/Base16.h")
        );
    }

    #[cfg(unix)]
    #[test]
    fn root_filter__path_outside_root__then_excluded() {
        let filter = SubtreeFilter::root("/repo/tests", "/repo/include");

        assert_eq!(filter.display_path("/other/project/foo.h"), None);
        assert_eq!(filter.display_path("test_main.cpp"), None);
        assert_eq!(filter.display_path("/repo/include_extra/foo.h"), None);
    }

    #[cfg(unix)]
    #[test]
    fn root_filter__root_itself__then_excluded() {
        let filter = SubtreeFilter::root("/repo/tests", "/repo/include");

        assert_eq!(filter.display_path("../include"), None);
    }

    #[cfg(unix)]
    #[test]
    fn root_filter__relative_target_root__then_joined_onto_base() {
        let filter = SubtreeFilter::root("/repo/tests", "../include");

        assert_eq!(
            filter,
            SubtreeFilter::Root {
                base_dir: PathBuf::from("/repo/tests"),
                target_root: PathBuf::from("/repo/include"),
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn apply__mixed_records__then_keeps_order_and_drops_outsiders() {
        let filter = SubtreeFilter::root("/repo/tests", "/repo/include");
        let records = vec![
            record("../include/b.h"),
            record("/usr/include/c++/vector"),
            record("../include/a.h"),
        ];

        let files = filter.apply(&records);
        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();

        assert_eq!(paths, vec!["b.h", "a.h"]);
        assert_eq!(files[0].record, records[0]);
    }

    #[test]
    fn normalize__leading_parent_dirs__then_preserved() {
        assert_eq!(normalize(Path::new("../../a/./b")), PathBuf::from("../../a/b"));
    }

    #[cfg(unix)]
    #[test]
    fn normalize__parent_of_root__then_stays_at_root() {
        assert_eq!(normalize(Path::new("/../repo/x/../y")), PathBuf::from("/repo/y"));
    }
}

//! Per-category version numbering derived from a source-tree
//! snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{PackrollError, Result};
use crate::logging::{emit, LogSink};

/// Highest observed version suffix per category.
///
/// Built fresh from one directory listing and never persisted. Only
/// directories named `<category>-<digits>` contribute; the suffix is
/// stored as its original string so leading zeros keep their width.
#[derive(Debug, Default, Clone)]
pub struct VersionIndex {
    max_codes: BTreeMap<String, String>,
}

impl VersionIndex {
    /// Scan the immediate entries of `source_dir` and record, per
    /// category, the highest numeric suffix seen.
    ///
    /// Non-directories and names without a `-` are ignored. A name
    /// whose suffix does not parse is logged and skipped, never
    /// fatal.
    pub fn build(source_dir: &Path, log: LogSink<'_>) -> Result<Self> {
        if !source_dir.is_dir() {
            return Err(PackrollError::SourceNotFound {
                path: source_dir.to_path_buf(),
            });
        }

        let mut index = Self::default();

        for entry in fs::read_dir(source_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(sep) = name.rfind('-') else {
                continue;
            };
            let (category, suffix) = (&name[..sep], &name[sep + 1..]);

            let Ok(number) = suffix.parse::<u64>() else {
                emit(log, &format!("文件名 '{name}' 的数字部分无效，跳过处理"));
                continue;
            };

            let current = index
                .max_codes
                .get(category)
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            if number > current {
                index
                    .max_codes
                    .insert(category.to_string(), suffix.to_string());
                emit(
                    log,
                    &format!("更新类别 '{category}' 的最大索引为: {suffix}"),
                );
            }
        }

        Ok(index)
    }

    /// Stored suffix for a category, as observed in the snapshot.
    pub fn current_code(&self, category: &str) -> Option<&str> {
        self.max_codes.get(category).map(String::as_str)
    }

    /// Next version code for a category: observed max plus one,
    /// zero-padded to at least four digits.
    pub fn next_code(&self, category: &str) -> Result<String> {
        let value = self.max_codes.get(category).ok_or_else(|| {
            PackrollError::BadVersionSuffix {
                category: category.to_string(),
                value: String::new(),
            }
        })?;
        let number: u64 =
            value
                .parse()
                .map_err(|_| PackrollError::BadVersionSuffix {
                    category: category.to_string(),
                    value: value.clone(),
                })?;
        Ok(format!("{:04}", number + 1))
    }

    /// Categories in deterministic (sorted) order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.max_codes.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.max_codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.max_codes.len()
    }
}

//! Rename pass: advance the version number embedded in file names
//! across the rolled-over tree.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::logging::{emit, ItemOutcome, LogSink};
use crate::numbering::increment_number;

const TEMP_MARKER: &str = "~$";

#[derive(Debug, Default)]
pub struct RenameReport {
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RenameReport {
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Done => self.renamed += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }
}

pub struct Renamer<'a> {
    log: LogSink<'a>,
}

impl<'a> Renamer<'a> {
    pub fn new(log: LogSink<'a>) -> Self {
        Self { log }
    }

    /// Loose entries at the target root are incremented on their
    /// first digit run; files inside category folders are incremented
    /// on the digit run between parentheses, ASCII or fullwidth,
    /// whichever the name carries.
    pub fn rename_all(&self, target_dir: &Path) -> Result<RenameReport> {
        let mut report = RenameReport::default();

        for entry in fs::read_dir(target_dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if !path.is_dir() {
                // Cover file at the root, no delimiters.
                let outcome = self.rename_item(&path, &name, "", "");
                report.record(&outcome);
                continue;
            }

            for child in fs::read_dir(&path)? {
                let child = child?;
                let child_path = child.path();
                let child_name = child.file_name().to_string_lossy().into_owned();

                if !child_path.is_file() || child_name.starts_with(TEMP_MARKER) {
                    continue;
                }

                let start = if child_name.contains('(') { "(" } else { "（" };
                let end = if child_name.contains(')') { ")" } else { "）" };
                let outcome = self.rename_item(&child_path, &child_name, start, end);
                report.record(&outcome);
            }
        }

        Ok(report)
    }

    fn rename_item(
        &self,
        path: &Path,
        name: &str,
        start_marker: &str,
        end_marker: &str,
    ) -> ItemOutcome {
        let new_name = increment_number(name, start_marker, end_marker);
        if new_name == name {
            return ItemOutcome::Skipped(format!("无可递增数字：{name}"));
        }

        let new_path = match path.parent() {
            Some(parent) => parent.join(&new_name),
            None => return ItemOutcome::Skipped(format!("无父目录：{name}")),
        };

        match fs::rename(path, &new_path) {
            Ok(()) => {
                emit(self.log, &format!("已重命名: {name} -> {new_name}"));
                ItemOutcome::Done
            }
            Err(e) => {
                let msg = format!("重命名文件时出错: {e}");
                emit(self.log, &msg);
                ItemOutcome::Failed(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rename_cover_and_nested_files() {
        let dir = tempdir().unwrap();
        let category = dir.path().join("Product-0039");
        fs::create_dir_all(&category).unwrap();
        fs::write(dir.path().join("封面REC-0038.docx"), b"").unwrap();
        fs::write(category.join("REC-Q680003-A2-01(0038)表单.docx"), b"").unwrap();
        fs::write(category.join("申请（0038）表.docx"), b"").unwrap();
        fs::write(category.join("~$REC-Q680003-A2-01(0038)表单.docx"), b"").unwrap();

        let report = Renamer::new(None).rename_all(dir.path()).unwrap();

        assert_eq!(report.renamed, 3);
        assert_eq!(report.failed, 0);
        assert!(dir.path().join("封面REC-0039.docx").exists());
        assert!(category.join("REC-Q680003-A2-01(0039)表单.docx").exists());
        assert!(category.join("申请（0039）表.docx").exists());
        // Temp artifacts are never renamed.
        assert!(category
            .join("~$REC-Q680003-A2-01(0038)表单.docx")
            .exists());
    }

    #[test]
    fn test_rename_leaves_undelimited_nested_numbers_alone() {
        let dir = tempdir().unwrap();
        let category = dir.path().join("Stage-0002");
        fs::create_dir_all(&category).unwrap();
        // Digits but no parentheses: the windowed search finds no
        // markers, so the name is an identity case.
        fs::write(category.join("notes-0038.txt"), b"").unwrap();

        let report = Renamer::new(None).rename_all(dir.path()).unwrap();
        assert_eq!(report.renamed, 0);
        assert_eq!(report.skipped, 1);
        assert!(category.join("notes-0038.txt").exists());
    }
}

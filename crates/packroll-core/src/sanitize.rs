//! Post-copy cleanup of the target tree: lock artifacts out,
//! directory skeletons kept.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::logging::{emit, LogSink};

/// Reserved prefix of word-processor lock/temp artifacts.
const TEMP_MARKER: &str = "~$";

#[derive(Debug, Default)]
pub struct SanitizeReport {
    pub removed_temp: usize,
    pub emptied_dirs: usize,
    pub failed: usize,
}

pub struct Sanitizer<'a> {
    log: LogSink<'a>,
}

impl<'a> Sanitizer<'a> {
    pub fn new(log: LogSink<'a>) -> Self {
        Self { log }
    }

    /// For each category folder directly under `target_dir`: delete
    /// `~$`-prefixed children outright, empty child directories while
    /// keeping the child itself, leave other files untouched.
    ///
    /// Per-item delete failures are logged and counted; failing to
    /// enumerate any directory aborts the stage, so the caller never
    /// proceeds over a tree that was only partially scanned.
    pub fn sanitize(&self, target_dir: &Path) -> Result<SanitizeReport> {
        let mut report = SanitizeReport::default();

        for entry in fs::read_dir(target_dir)? {
            let entry = entry?;
            let folder_path = entry.path();
            if !folder_path.is_dir() {
                continue;
            }

            for child in fs::read_dir(&folder_path)? {
                let child = child?;
                let child_path = child.path();
                let child_name = child.file_name().to_string_lossy().into_owned();

                if child_name.starts_with(TEMP_MARKER) {
                    match fs::remove_file(&child_path) {
                        Ok(()) => {
                            emit(self.log, &format!("已删除临时文件: {child_name}"));
                            report.removed_temp += 1;
                        }
                        Err(e) => {
                            emit(self.log, &format!("删除临时文件时出错: {e}"));
                            report.failed += 1;
                        }
                    }
                } else if child_path.is_dir() {
                    match empty_directory(&child_path) {
                        Ok(()) => {
                            emit(
                                self.log,
                                &format!("已清空文件夹: {}", child_path.display()),
                            );
                            report.emptied_dirs += 1;
                        }
                        Err(e) => {
                            emit(self.log, &format!("删除文件夹时出错: {e}"));
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        Ok(report)
    }
}

/// Remove everything inside `dir` while keeping `dir` itself.
///
/// Iterative depth-first walk with an explicit stack, so deep nesting
/// cannot overflow. Subdirectories are rmdir'ed only once emptied;
/// residual permission-denied items leave them in place.
fn empty_directory(dir: &Path) -> std::io::Result<()> {
    // (path, visited): a directory is pushed twice, the second visit
    // happens after its contents were handled and attempts the rmdir.
    let mut stack: Vec<(PathBuf, bool)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        stack.push((entry.path(), false));
    }

    while let Some((path, visited)) = stack.pop() {
        if visited {
            // Tolerate non-empty: an item below failed to delete.
            let _ = fs::remove_dir(&path);
        } else if path.is_dir() {
            stack.push((path.clone(), true));
            for entry in fs::read_dir(&path)? {
                let entry = entry?;
                stack.push((entry.path(), false));
            }
        } else {
            fs::remove_file(&path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_removes_temp_and_empties_subdirs() {
        let dir = tempdir().unwrap();
        let category = dir.path().join("Product-0002");
        let evidence = category.join("证据");
        fs::create_dir_all(&evidence).unwrap();
        fs::create_dir_all(evidence.join("nested")).unwrap();
        fs::write(category.join("~$lock.tmp"), b"lock").unwrap();
        fs::write(category.join("form.docx"), b"keep").unwrap();
        fs::write(evidence.join("shot.png"), b"img").unwrap();
        fs::write(evidence.join("nested/deep.txt"), b"deep").unwrap();

        let report = Sanitizer::new(None).sanitize(dir.path()).unwrap();

        assert_eq!(report.removed_temp, 1);
        assert_eq!(report.emptied_dirs, 1);
        assert_eq!(report.failed, 0);
        assert!(!category.join("~$lock.tmp").exists());
        assert!(category.join("form.docx").exists());
        // Skeleton preserved, contents gone.
        assert!(evidence.exists());
        assert!(!evidence.join("shot.png").exists());
        assert!(!evidence.join("nested").exists());
    }

    #[test]
    fn test_sanitize_ignores_loose_files_at_root() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("cover.docx"), b"cover").unwrap();

        let report = Sanitizer::new(None).sanitize(dir.path()).unwrap();
        assert_eq!(report.removed_temp, 0);
        assert!(dir.path().join("cover.docx").exists());
    }

    #[test]
    fn test_sanitize_missing_target_is_stage_failure() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent");
        assert!(Sanitizer::new(None).sanitize(&missing).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_sanitize_unreadable_category_folder_is_stage_failure() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let category = dir.path().join("Product-0002");
        fs::create_dir_all(&category).unwrap();
        fs::write(category.join("~$lock.tmp"), b"lock").unwrap();
        fs::set_permissions(&category, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged processes bypass the permission bits, so only
        // assert the halt when enumeration actually fails.
        let enumerable = fs::read_dir(&category).is_ok();
        let result = Sanitizer::new(None).sanitize(dir.path());
        fs::set_permissions(&category, fs::Permissions::from_mode(0o755)).unwrap();

        if enumerable {
            assert!(result.is_ok());
        } else {
            assert!(result.is_err());
            // Nothing was cleaned past the failed enumeration.
            assert!(category.join("~$lock.tmp").exists());
        }
    }
}

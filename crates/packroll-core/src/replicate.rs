//! Forward-copy of a versioned source tree into a fresh target tree.

use std::fs;
use std::path::Path;

use filetime::FileTime;
use walkdir::WalkDir;

use crate::error::{PackrollError, Result};
use crate::logging::{emit, ItemOutcome, LogSink};
use crate::version::VersionIndex;

/// Counters for one replication run.
#[derive(Debug, Default)]
pub struct ReplicateReport {
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ReplicateReport {
    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Done => self.copied += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }
}

pub struct Replicator<'a> {
    log: LogSink<'a>,
}

impl<'a> Replicator<'a> {
    pub fn new(log: LogSink<'a>) -> Self {
        Self { log }
    }

    /// Copy every category subtree of `source_dir` into `target_dir`
    /// under its next version code, then copy loose cover files.
    ///
    /// A pre-existing target is archived aside as
    /// `<target>_<unixsecs>` before a fresh target is created.
    /// Individual pair or cover failures are logged and do not abort
    /// the remaining copies.
    pub fn replicate(
        &self,
        source_dir: &Path,
        target_dir: &Path,
        index: &VersionIndex,
    ) -> Result<ReplicateReport> {
        if !source_dir.is_dir() {
            return Err(PackrollError::SourceNotFound {
                path: source_dir.to_path_buf(),
            });
        }

        self.prepare_target(target_dir)?;

        let mut report = ReplicateReport::default();

        for category in index.categories() {
            let outcome = self.copy_pair(source_dir, target_dir, index, category);
            report.record(&outcome);
        }

        for entry in fs::read_dir(source_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                continue;
            }
            let outcome = self.copy_cover(&entry.path(), target_dir);
            report.record(&outcome);
        }

        Ok(report)
    }

    /// Archive an existing target aside, then create a fresh one.
    ///
    /// The suffix is seconds-resolution; the rename happens at most
    /// once per run, so collisions cannot occur within a run.
    fn prepare_target(&self, target_dir: &Path) -> Result<()> {
        if target_dir.exists() {
            let timestamp = chrono::Utc::now().timestamp();
            let mut archived = target_dir.as_os_str().to_os_string();
            archived.push(format!("_{timestamp}"));
            fs::rename(target_dir, &archived)?;
            emit(
                self.log,
                &format!(
                    "目标目录已存在，已重命名为: {}",
                    Path::new(&archived).display()
                ),
            );
        }
        fs::create_dir_all(target_dir)?;
        emit(
            self.log,
            &format!("已创建目标目录: {}", target_dir.display()),
        );
        Ok(())
    }

    /// Copy one `<category>-<old>` folder to `<category>-<new>`.
    fn copy_pair(
        &self,
        source_dir: &Path,
        target_dir: &Path,
        index: &VersionIndex,
        category: &str,
    ) -> ItemOutcome {
        let old_code = match index.current_code(category) {
            Some(code) => code,
            None => return ItemOutcome::Skipped(format!("类别 '{category}' 无索引")),
        };
        let new_code = match index.next_code(category) {
            Ok(code) => code,
            Err(e) => {
                emit(self.log, &format!("{e}，跳过处理"));
                return ItemOutcome::Failed(e.to_string());
            }
        };

        let source_folder = source_dir.join(format!("{category}-{old_code}"));
        let target_folder = target_dir.join(format!("{category}-{new_code}"));

        if !source_folder.exists() {
            let msg = format!("源文件夹不存在：{}", source_folder.display());
            emit(self.log, &msg);
            return ItemOutcome::Skipped(msg);
        }
        if target_folder.exists() {
            let msg = format!("文件夹已存在于：{}", target_folder.display());
            emit(self.log, &msg);
            return ItemOutcome::Skipped(msg);
        }

        match self.copy_tree(&source_folder, &target_folder) {
            Ok(()) => {
                emit(
                    self.log,
                    &format!(
                        "已复制: {} -> {}",
                        source_folder.display(),
                        target_folder.display()
                    ),
                );
                ItemOutcome::Done
            }
            Err(e) => {
                let msg = format!("复制文件夹时出错: {e}");
                emit(self.log, &msg);
                ItemOutcome::Failed(msg)
            }
        }
    }

    /// Recursive subtree copy with per-entry isolation, followed by a
    /// metadata pass: permissions copied from the source folder, then
    /// the modify time stamped to now so the target sorts by operation
    /// recency rather than inherited source time.
    fn copy_tree(&self, source: &Path, target: &Path) -> Result<()> {
        for entry in WalkDir::new(source) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    emit(self.log, &format!("复制文件夹时出错: {e}"));
                    continue;
                }
            };
            // Walkdir yields paths under its root.
            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let dest = target.join(relative);

            let result = if entry.file_type().is_dir() {
                fs::create_dir_all(&dest).map_err(PackrollError::from)
            } else {
                fs::copy(entry.path(), &dest)
                    .map(|_| ())
                    .map_err(PackrollError::from)
            };
            if let Err(e) = result {
                emit(
                    self.log,
                    &format!("复制 {} 时出错: {e}", entry.path().display()),
                );
            }
        }

        if let Ok(meta) = fs::metadata(source) {
            let _ = fs::set_permissions(target, meta.permissions());
        }
        let now = FileTime::now();
        filetime::set_file_times(target, now, now)?;
        Ok(())
    }

    /// Copy a loose top-level cover file, skipping existing targets.
    fn copy_cover(&self, source_file: &Path, target_dir: &Path) -> ItemOutcome {
        let Some(name) = source_file.file_name() else {
            return ItemOutcome::Skipped("无文件名".to_string());
        };
        let target_file = target_dir.join(name);

        if target_file.exists() {
            let msg = format!("文件已存在于：{}", target_file.display());
            emit(self.log, &msg);
            return ItemOutcome::Skipped(msg);
        }

        let copied = fs::copy(source_file, &target_file)
            .map_err(PackrollError::from)
            .and_then(|_| {
                if let Ok(meta) = fs::metadata(source_file) {
                    let _ = fs::set_permissions(&target_file, meta.permissions());
                }
                let now = FileTime::now();
                filetime::set_file_times(&target_file, now, now)?;
                Ok(())
            });

        match copied {
            Ok(()) => {
                emit(
                    self.log,
                    &format!("已复制文件: {}", name.to_string_lossy()),
                );
                ItemOutcome::Done
            }
            Err(e) => {
                let msg = format!("复制文件时出错: {e}");
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

    fn seed_source(root: &Path) {
        let pkg = root.join("PKG-0001");
        fs::create_dir_all(pkg.join("Data Pack")).unwrap();
        fs::write(pkg.join("a.txt"), b"alpha").unwrap();
        fs::write(pkg.join("Data Pack/b.txt"), b"beta").unwrap();
        fs::write(root.join("cover.docx"), b"cover").unwrap();
    }

    #[test]
    fn test_replicate_rolls_categories_forward() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("old");
        let target = dir.path().join("new");
        fs::create_dir_all(&source).unwrap();
        seed_source(&source);

        let index = VersionIndex::build(&source, None).unwrap();
        let report = Replicator::new(None)
            .replicate(&source, &target, &index)
            .unwrap();

        assert_eq!(report.copied, 2); // one pair, one cover
        assert_eq!(report.failed, 0);
        assert!(target.join("PKG-0002/a.txt").exists());
        assert!(target.join("PKG-0002/Data Pack/b.txt").exists());
        assert!(target.join("cover.docx").exists());
        assert_eq!(
            fs::read(target.join("PKG-0002/a.txt")).unwrap(),
            b"alpha"
        );
    }

    #[test]
    fn test_replicate_archives_existing_target() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("old");
        let target = dir.path().join("new");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.txt"), b"stale").unwrap();
        seed_source(&source);

        let index = VersionIndex::build(&source, None).unwrap();
        Replicator::new(None)
            .replicate(&source, &target, &index)
            .unwrap();

        // Fresh target holds only the rollover output.
        assert!(!target.join("stale.txt").exists());
        assert!(target.join("PKG-0002").exists());

        // The old tree was archived aside with a timestamp suffix.
        let archived: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("new_"))
            .collect();
        assert_eq!(archived.len(), 1);
        assert!(archived[0].path().join("stale.txt").exists());
    }

    #[test]
    fn test_replicate_is_idempotent_against_populated_target() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("old");
        fs::create_dir_all(&source).unwrap();
        seed_source(&source);

        let index = VersionIndex::build(&source, None).unwrap();
        let replicator = Replicator::new(None);

        let target = dir.path().join("new");
        replicator.replicate(&source, &target, &index).unwrap();
        fs::write(target.join("PKG-0002/a.txt"), b"edited").unwrap();

        // Second run archives the first target; the re-created pair in
        // the fresh target must come from the source, and within one
        // target no destination is ever overwritten.
        let report = replicator.replicate(&source, &target, &index).unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(fs::read(target.join("PKG-0002/a.txt")).unwrap(), b"alpha");
    }

    #[test]
    fn test_replicate_skips_existing_destination_folder() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("old");
        let target = dir.path().join("new");
        fs::create_dir_all(&source).unwrap();
        seed_source(&source);

        let index = VersionIndex::build(&source, None).unwrap();
        let replicator = Replicator::new(None);

        fs::create_dir_all(target.join("PKG-0002")).unwrap();
        fs::write(target.join("PKG-0002/keep.txt"), b"keep").unwrap();
        let outcome = replicator.copy_pair(&source, &target, &index, "PKG");
        assert!(matches!(outcome, ItemOutcome::Skipped(_)));
        assert_eq!(
            fs::read(target.join("PKG-0002/keep.txt")).unwrap(),
            b"keep"
        );
    }

    #[test]
    fn test_replicate_missing_source_is_hard_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent");
        let target = dir.path().join("new");
        let err = Replicator::new(None)
            .replicate(&missing, &target, &VersionIndex::default())
            .unwrap_err();
        assert!(matches!(err, PackrollError::SourceNotFound { .. }));
    }
}

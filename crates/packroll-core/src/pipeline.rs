//! Stage sequencing for one rollover run, plus the independent
//! extraction operation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::docedit::DocEditor;
use crate::error::Result;
use crate::export::write_csv;
use crate::extract::Extractor;
use crate::logging::{emit, LogSink};
use crate::rename::Renamer;
use crate::replicate::Replicator;
use crate::sanitize::Sanitizer;
use crate::version::VersionIndex;

const BANNER: &str = "==================================================";

/// Linear rollover pipeline: COPY → SANITIZE → RENAME → EDIT → DONE.
///
/// The first stage failure halts the remainder; mutations already
/// applied stay in place (no rollback), so an aborted run's target
/// tree needs manual inspection before re-running.
pub struct Pipeline<'a> {
    source: PathBuf,
    target: PathBuf,
    head_list: &'a [String],
    log: LogSink<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        head_list: &'a [String],
        log: LogSink<'a>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            head_list,
            log,
        }
    }

    pub fn run(&self) -> Result<()> {
        emit(self.log, BANNER);
        emit(self.log, "开始执行文件操作流程");
        emit(self.log, BANNER);

        emit(self.log, "开始复制文件...");
        if let Err(e) = self.copy_stage() {
            emit(self.log, &format!("文件复制失败，中止操作: {e}"));
            return Err(e);
        }
        emit(self.log, "文件复制完成");

        emit(self.log, "开始删除临时文件...");
        if let Err(e) = Sanitizer::new(self.log).sanitize(&self.target) {
            emit(self.log, &format!("文件删除失败，中止操作: {e}"));
            return Err(e);
        }
        emit(self.log, "临时文件删除完成");

        emit(self.log, "开始重命名文件...");
        if let Err(e) = Renamer::new(self.log).rename_all(&self.target) {
            emit(self.log, &format!("文件重命名失败，中止操作: {e}"));
            return Err(e);
        }
        emit(self.log, "文件重命名完成");

        emit(self.log, "开始编辑Word文档...");
        if let Err(e) = DocEditor::new(self.head_list, self.log).edit_tree(&self.target) {
            emit(self.log, &format!("文件编辑失败，中止操作: {e}"));
            return Err(e);
        }
        emit(self.log, "Word文档编辑完成");

        emit(self.log, BANNER);
        emit(self.log, "所有操作成功完成");
        emit(self.log, BANNER);
        emit(self.log, &directory_tree(&self.target));
        Ok(())
    }

    fn copy_stage(&self) -> Result<()> {
        let index = VersionIndex::build(&self.source, self.log)?;
        Replicator::new(self.log).replicate(&self.source, &self.target, &index)?;
        Ok(())
    }
}

/// Indented `|--` listing of a tree, iterative so nesting depth is
/// not bounded by the call stack. Entries are sorted for stable
/// output; an unreadable directory contributes an error line instead
/// of aborting the summary.
pub fn directory_tree(path: &Path) -> String {
    let mut out = String::new();
    // Reverse-sorted stack: pop order is sorted order.
    let mut stack: Vec<(PathBuf, usize)> = Vec::new();
    push_children(path, 0, &mut stack, &mut out);

    while let Some((entry, indent)) = stack.pop() {
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| entry.display().to_string());
        out.push_str(&" ".repeat(indent));
        out.push_str("|-- ");
        out.push_str(&name);
        out.push('\n');
        if entry.is_dir() {
            push_children(&entry, indent + 4, &mut stack, &mut out);
        }
    }
    out
}

fn push_children(
    dir: &Path,
    indent: usize,
    stack: &mut Vec<(PathBuf, usize)>,
    out: &mut String,
) {
    match fs::read_dir(dir) {
        Ok(entries) => {
            let mut children: Vec<PathBuf> =
                entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
            children.sort();
            for child in children.into_iter().rev() {
                stack.push((child, indent));
            }
        }
        Err(e) => {
            out.push_str(&format!("获取目录树时出错: {e}\n"));
        }
    }
}

/// Which extraction to run over a rolled-over tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractKind {
    A2,
    A5,
}

/// Walk `target_dir`, extract the requested records and write the
/// timestamped CSV file(s) into `out_dir`. Returns the paths written.
///
/// Export failures are logged per file and do not stop the remaining
/// file (the A5 detail export is still attempted when the summary
/// export failed).
pub fn run_extract(
    kind: ExtractKind,
    target_dir: &Path,
    out_dir: &Path,
    log: LogSink<'_>,
) -> Result<Vec<PathBuf>> {
    let extractor = Extractor::new(log);
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let mut written = Vec::new();

    match kind {
        ExtractKind::A2 => {
            let records = extractor.extract_a2_tree(target_dir)?;
            let rows: Vec<Vec<String>> = records
                .into_iter()
                .map(|r| vec![r.package_name, r.record_name, r.validation_date, r.production_date])
                .collect();
            let header = strings(&["数据包名称", "记录名称", "验证环境迁移日期", "生产环境迁移日期"]);
            let path = out_dir.join(format!("A2迁移记录_{stamp}.csv"));
            if export(&path, &header, &rows, log) {
                written.push(path);
            }
        }
        ExtractKind::A5 => {
            let (summaries, details) = extractor.extract_a5_tree(target_dir)?;

            let summary_rows: Vec<Vec<String>> = summaries
                .into_iter()
                .map(|s| vec![s.package_name, s.justification, s.related_files])
                .collect();
            let summary_header = strings(&["数据包名称", "变更理由", "相关文件"]);
            let summary_path = out_dir.join(format!("A5申请概要_{stamp}.csv"));
            if export(&summary_path, &summary_header, &summary_rows, log) {
                written.push(summary_path);
            }

            let detail_rows: Vec<Vec<String>> = details
                .into_iter()
                .map(|d| {
                    vec![
                        d.package_name,
                        d.record_name,
                        d.operation_type,
                        d.classification,
                        d.risk_assessment,
                    ]
                })
                .collect();
            let detail_header =
                strings(&["数据包名称", "记录名称", "操作类型", "分类", "风险评估"]);
            let detail_path = out_dir.join(format!("A5申请明细_{stamp}.csv"));
            if export(&detail_path, &detail_header, &detail_rows, log) {
                written.push(detail_path);
            }
        }
    }

    Ok(written)
}

fn export(path: &Path, header: &[String], rows: &[Vec<String>], log: LogSink<'_>) -> bool {
    match write_csv(path, header, rows) {
        Ok(()) => {
            emit(log, &format!("已导出: {}", path.display()));
            true
        }
        Err(e) => {
            emit(log, &format!("导出失败 {}: {e}", path.display()));
            false
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::testdoc;
    use std::cell::RefCell;
    use tempfile::tempdir;

    fn head_list() -> Vec<String> {
        vec!["PKG".to_string()]
    }

    #[test]
    fn test_pipeline_end_to_end_rollover() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("old");
        let target = dir.path().join("new");
        let pkg = source.join("PKG-0001");
        fs::create_dir_all(pkg.join("证据")).unwrap();
        fs::write(pkg.join("~$lock.tmp"), b"lock").unwrap();
        fs::write(pkg.join("证据/old.png"), b"img").unwrap();

        let a2 = testdoc::document(vec![
            testdoc::table(vec![vec!["数据包名称", "PKG-0001"]]),
            testdoc::table(vec![vec!["标题"], vec!["1", "t", "rec1", "d1", "d2"]]),
        ]);
        testdoc::save(&pkg.join("REC-Q680003-A2-01(0001)表单.docx"), a2).unwrap();

        let heads = head_list();
        let lines = RefCell::new(Vec::new());
        let sink = |msg: &str| lines.borrow_mut().push(msg.to_string());
        Pipeline::new(&source, &target, &heads, Some(&sink))
            .run()
            .unwrap();

        let category = target.join("PKG-0002");
        assert!(category.is_dir());
        // Temp artifact gone, evidence folder emptied but kept.
        assert!(!category.join("~$lock.tmp").exists());
        assert!(category.join("证据").is_dir());
        assert!(!category.join("证据/old.png").exists());
        // File renamed via the parenthesised number.
        let renamed = category.join("REC-Q680003-A2-01(0002)表单.docx");
        assert!(renamed.exists());

        // Header advanced by the edit stage.
        let records = crate::extract::extract_a2(&renamed).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].package_name, "PKG-0002");

        let joined = lines.borrow().join("\n");
        assert!(joined.contains("所有操作成功完成"));
        assert!(joined.contains("|-- PKG-0002"));
    }

    #[test]
    fn test_pipeline_halts_on_missing_source() {
        let dir = tempdir().unwrap();
        let heads = head_list();
        let result = Pipeline::new(
            dir.path().join("absent"),
            dir.path().join("new"),
            &heads,
            None,
        )
        .run();
        assert!(result.is_err());
        // COPY failed before creating the target.
        assert!(!dir.path().join("new").exists());
    }

    #[test]
    fn test_directory_tree_lists_nested_entries() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/inner")).unwrap();
        fs::write(dir.path().join("a.txt"), b"").unwrap();
        fs::write(dir.path().join("b/inner/c.txt"), b"").unwrap();

        let tree = directory_tree(dir.path());
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines[0], "|-- a.txt");
        assert_eq!(lines[1], "|-- b");
        assert_eq!(lines[2], "    |-- inner");
        assert_eq!(lines[3], "        |-- c.txt");
    }

    #[test]
    fn test_run_extract_a2_writes_one_csv() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("new/PKG-0002");
        fs::create_dir_all(&target).unwrap();
        let a2 = testdoc::document(vec![
            testdoc::table(vec![vec!["数据包名称", "PKG-0002"]]),
            testdoc::table(vec![vec!["标题"], vec!["1", "t", "rec1", "d1", "d2"]]),
        ]);
        testdoc::save(&target.join("REC-Q680003-A2-01(0002)表单.docx"), a2).unwrap();

        let out_dir = dir.path().join("exports");
        fs::create_dir_all(&out_dir).unwrap();
        let written =
            run_extract(ExtractKind::A2, dir.path().join("new").as_path(), &out_dir, None)
                .unwrap();
        assert_eq!(written.len(), 1);

        let text = fs::read_to_string(&written[0]).unwrap();
        assert!(text.contains("数据包名称"));
        assert!(text.contains("PKG-0002,rec1,d1,d2"));
    }
}

//! Record-level extraction from the package documents into in-memory
//! tuples, ready for tabular export.

use std::path::Path;

use walkdir::WalkDir;

use crate::docedit::{A2_TOKEN, A5_TOKEN, PACKAGE_NAME_HEADER};
use crate::docx::table;
use crate::docx::DocxPackage;
use crate::error::{PackrollError, Result};
use crate::logging::{emit, LogSink};
use crate::numbering::is_numeric_text;

const TEMP_MARKER: &str = "~$";
const DOCX_EXT: &str = "docx";

/// One data row of an A2 migration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A2Record {
    pub package_name: String,
    pub record_name: String,
    pub validation_date: String,
    pub production_date: String,
}

/// The single summary record of an A5 application form (table 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A5Summary {
    pub package_name: String,
    pub justification: String,
    pub related_files: String,
}

/// One matching detail row of an A5 application form (table 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A5Detail {
    pub package_name: String,
    pub record_name: String,
    pub operation_type: String,
    pub classification: String,
    pub risk_assessment: String,
}

/// Parse one A2 form.
///
/// The package-name table is found by header phrase; the *next* table
/// in document order is the data table. Rows after the title row are
/// read until the first non-numeric first cell, which terminates the
/// walk (data rows are contiguous).
pub fn extract_a2(path: &Path) -> Result<Vec<A2Record>> {
    let package = DocxPackage::open(path)?;
    let tables = table::tables(&package.document);

    let Some(header_index) = tables.iter().position(|tbl| {
        table::rows(tbl)
            .first()
            .map(|row| table::cell_text_at(row, 0).contains(PACKAGE_NAME_HEADER))
            .unwrap_or(false)
    }) else {
        return Ok(Vec::new());
    };

    let package_name = table::rows(tables[header_index])
        .first()
        .map(|row| table::cell_text_at(row, 1))
        .unwrap_or_default();

    let Some(data_table) = tables.get(header_index + 1) else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for row in table::rows(data_table).into_iter().skip(1) {
        if !is_numeric_text(&table::cell_text_at(row, 0)) {
            break;
        }
        records.push(A2Record {
            package_name: package_name.clone(),
            record_name: table::cell_text_at(row, 2),
            validation_date: table::cell_text_at(row, 3),
            production_date: table::cell_text_at(row, 4),
        });
    }
    Ok(records)
}

/// Parse one A5 form: the fixed-coordinate summary from table 1 and
/// the detail rows of table 3 whose first cell matches the package
/// identifier (case-insensitive, version suffix stripped).
pub fn extract_a5(path: &Path) -> Result<(Option<A5Summary>, Vec<A5Detail>)> {
    let package = DocxPackage::open(path)?;
    let tables = table::tables(&package.document);

    let Some(main_table) = tables.first() else {
        return Ok((None, Vec::new()));
    };
    let main_rows = table::rows(main_table);
    if main_rows.is_empty() {
        return Ok((None, Vec::new()));
    }

    let package_name = table::cell_text_at(main_rows[0], 2);
    let summary = A5Summary {
        package_name: package_name.clone(),
        justification: main_rows
            .get(3)
            .map(|row| table::cell_text_at(row, 1))
            .unwrap_or_default(),
        related_files: main_rows
            .get(5)
            .map(|row| table::cell_text_at(row, 1))
            .unwrap_or_default(),
    };

    let mut details = Vec::new();
    if let Some(detail_table) = tables.get(2) {
        // "<category>-<NNNN>" minus the 5-char version suffix.
        let key = strip_version_suffix(&package_name).to_lowercase();
        for row in table::rows(detail_table) {
            if table::cell_text_at(row, 0).to_lowercase() != key {
                continue;
            }
            details.push(A5Detail {
                package_name: package_name.clone(),
                record_name: table::cell_text_at(row, 1),
                operation_type: table::cell_text_at(row, 2),
                classification: table::cell_text_at(row, 3),
                risk_assessment: table::cell_text_at(row, 4),
            });
        }
    }

    Ok((Some(summary), details))
}

fn strip_version_suffix(name: &str) -> String {
    let count = name.chars().count();
    name.chars().take(count.saturating_sub(5)).collect()
}

pub struct Extractor<'a> {
    log: LogSink<'a>,
}

impl<'a> Extractor<'a> {
    pub fn new(log: LogSink<'a>) -> Self {
        Self { log }
    }

    /// All A2 records under a rolled-over tree. A document that fails
    /// to parse is logged with its path and contributes nothing.
    pub fn extract_a2_tree(&self, target_dir: &Path) -> Result<Vec<A2Record>> {
        let mut records = Vec::new();
        for path in self.matching_documents(target_dir, A2_TOKEN)? {
            match extract_a2(&path) {
                Ok(mut found) => {
                    emit(
                        self.log,
                        &format!("已提取 {} 条记录: {}", found.len(), path.display()),
                    );
                    records.append(&mut found);
                }
                Err(e) => emit(self.log, &format!("读取《{}》时出错: {e}", path.display())),
            }
        }
        Ok(records)
    }

    /// All A5 summaries and detail rows under a rolled-over tree.
    pub fn extract_a5_tree(
        &self,
        target_dir: &Path,
    ) -> Result<(Vec<A5Summary>, Vec<A5Detail>)> {
        let mut summaries = Vec::new();
        let mut details = Vec::new();
        for path in self.matching_documents(target_dir, A5_TOKEN)? {
            match extract_a5(&path) {
                Ok((summary, mut rows)) => {
                    emit(
                        self.log,
                        &format!("已提取 {} 条明细: {}", rows.len(), path.display()),
                    );
                    summaries.extend(summary);
                    details.append(&mut rows);
                }
                Err(e) => emit(self.log, &format!("读取《{}》时出错: {e}", path.display())),
            }
        }
        Ok((summaries, details))
    }

    fn matching_documents(&self, target_dir: &Path, token: &str) -> Result<Vec<std::path::PathBuf>> {
        if !target_dir.is_dir() {
            return Err(PackrollError::TargetNotFound {
                path: target_dir.to_path_buf(),
            });
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(target_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let is_docx = entry
                .path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(DOCX_EXT))
                .unwrap_or(false);
            if is_docx && !name.starts_with(TEMP_MARKER) && name.contains(token) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }
}

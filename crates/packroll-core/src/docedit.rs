//! In-place field edits of the package documents: cover pages, A2
//! migration forms and A5 application forms.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::docx::table::{self, first_run_fonts};
use crate::docx::{DocxPackage, XmlNode};
use crate::error::{PackrollError, Result};
use crate::logging::{emit, LogSink};
use crate::numbering::{increment_number, is_numeric_text};

/// Filename token of the data-migration form.
pub const A2_TOKEN: &str = "REC-Q680003-A2";
/// Filename token of the master-data application form.
pub const A5_TOKEN: &str = "REC-Q680003-A5";
/// Header phrase that marks the package-name table of an A2 form.
pub const PACKAGE_NAME_HEADER: &str = "数据包名称";

/// Fixed rows of the first A5 table that get the highlight marker.
const A5_HIGHLIGHT_ROWS: [usize; 4] = [2, 3, 5, 7];

const TEMP_MARKER: &str = "~$";
const DOCX_EXT: &str = ".docx";

#[derive(Debug, Default)]
pub struct EditReport {
    pub covers: usize,
    pub a2_forms: usize,
    pub a5_forms: usize,
    pub failed: usize,
}

pub struct DocEditor<'a> {
    head_list: &'a [String],
    log: LogSink<'a>,
}

impl<'a> DocEditor<'a> {
    /// `head_list` is the cover-page allow-list of category labels,
    /// threaded in by the caller (configuration is not the core's
    /// business).
    pub fn new(head_list: &'a [String], log: LogSink<'a>) -> Self {
        Self { head_list, log }
    }

    /// Default per-file edit pass over a rolled-over target tree:
    /// loose root files get the cover treatment, files inside
    /// category folders get the A2/A5 treatment by filename token.
    pub fn edit_tree(&self, target_dir: &Path) -> Result<EditReport> {
        let mut report = EditReport::default();

        for entry in fs::read_dir(target_dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if !path.is_dir() {
                match self.edit_cover(&path, &name) {
                    Ok(true) => {
                        emit(self.log, &format!("已编辑封面: {name}"));
                        report.covers += 1;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        emit(self.log, &format!("编辑封面文件时出错: {e}"));
                        report.failed += 1;
                    }
                }
                continue;
            }

            for child in fs::read_dir(&path)? {
                let child = child?;
                let child_name = child.file_name().to_string_lossy().into_owned();
                if child_name.starts_with(TEMP_MARKER) || !child.path().is_file() {
                    continue;
                }

                let result = if child_name.contains(A2_TOKEN) {
                    self.edit_a2(&child.path()).map(|()| {
                        emit(self.log, &format!("已编辑迁移表: {child_name}"));
                        report.a2_forms += 1;
                    })
                } else if child_name.contains(A5_TOKEN) {
                    self.edit_a5(&child.path()).map(|()| {
                        emit(self.log, &format!("已编辑申请表: {child_name}"));
                        report.a5_forms += 1;
                    })
                } else {
                    Ok(())
                };

                if let Err(e) = result {
                    emit(self.log, &format!("编辑Word文档时出错: {e}"));
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Cover convention: write the filename (extension stripped) into
    /// row 2 / column 0 of the first table. Returns false when the
    /// filename matches no allow-list prefix.
    fn edit_cover(&self, path: &Path, name: &str) -> Result<bool> {
        if !self.head_list.iter().any(|head| name.starts_with(head.as_str())) {
            return Ok(false);
        }

        let mut package = DocxPackage::open(path)?;
        let label = name.strip_suffix(DOCX_EXT).unwrap_or(name).to_string();

        {
            let first = table::tables_mut(&mut package.document)
                .into_iter()
                .next()
                .ok_or_else(|| PackrollError::MissingTable {
                    path: path.to_path_buf(),
                    index: 0,
                })?;
            let cell = table::rows_mut(first)
                .into_iter()
                .nth(2)
                .and_then(|row| table::cells_mut(row).into_iter().next())
                .ok_or_else(|| PackrollError::MissingTable {
                    path: path.to_path_buf(),
                    index: 0,
                })?;
            table::set_cell_text(cell, &label);
        }

        package.save(path)?;
        Ok(true)
    }

    /// A2 convention: increment the version number in the second cell
    /// of the package-name header table; highlight every data row
    /// (numeric first cell) of every other table.
    fn edit_a2(&self, path: &Path) -> Result<()> {
        let mut package = DocxPackage::open(path)?;

        for tbl in table::tables_mut(&mut package.document) {
            if table_is_package_header(tbl) {
                let current = table::rows(tbl)
                    .first()
                    .map(|row| table::cell_text_at(row, 1))
                    .unwrap_or_default();
                let new_text = increment_number(&current, "", "");
                if let Some(row) = table::rows_mut(tbl).into_iter().next() {
                    if let Some(cell) = table::cells_mut(row).into_iter().nth(1) {
                        table::set_cell_text(cell, &new_text);
                    }
                }
            } else {
                for row in table::rows_mut(tbl) {
                    if is_numeric_text(&table::cell_text_at(row, 0)) {
                        table::highlight_row(row);
                    }
                }
            }
        }

        package.save(path)?;
        Ok(())
    }

    /// A5 convention: increment the version number in row 0 / column
    /// 2 of the first table, highlight the fixed rows, and in the
    /// third table (when present) highlight every row whose first
    /// cell equals the new header value.
    fn edit_a5(&self, path: &Path) -> Result<()> {
        let mut package = DocxPackage::open(path)?;

        let current = {
            let tables = table::tables(&package.document);
            let first = tables.first().ok_or_else(|| PackrollError::MissingTable {
                path: path.to_path_buf(),
                index: 0,
            })?;
            table::rows(first)
                .first()
                .map(|row| table::cell_text_at(row, 2))
                .unwrap_or_default()
        };
        let new_text = increment_number(&current, "", "");

        for (index, tbl) in table::tables_mut(&mut package.document)
            .into_iter()
            .enumerate()
        {
            if index == 0 {
                if let Some(row) = table::rows_mut(tbl).into_iter().next() {
                    if let Some(cell) = table::cells_mut(row).into_iter().nth(2) {
                        table::set_cell_text(cell, &new_text);
                    }
                }
                for (row_index, row) in table::rows_mut(tbl).into_iter().enumerate() {
                    if A5_HIGHLIGHT_ROWS.contains(&row_index) {
                        table::highlight_row(row);
                    }
                }
            } else if index == 2 {
                for row in table::rows_mut(tbl) {
                    if table::cell_text_at(row, 0) == new_text {
                        table::highlight_row(row);
                    }
                }
            }
        }

        package.save(path)?;
        Ok(())
    }

    /// Date-propagation batch: for every A2 form under `target_dir`
    /// (recursed), write the validation date into cell 3 and the
    /// production date into cell 4 of every data row, preserving each
    /// cell's alignment and borrowing font formatting from whichever
    /// of the two cells carried any.
    ///
    /// Hard stop before touching any file when the validation date is
    /// empty; an empty production date defaults to the validation
    /// date.
    pub fn apply_dates(
        &self,
        target_dir: &Path,
        validation_date: &str,
        production_date: &str,
    ) -> Result<usize> {
        if validation_date.is_empty() {
            return Err(PackrollError::EmptyValidationDate);
        }
        let production_date = if production_date.is_empty() {
            validation_date
        } else {
            production_date
        };

        if !target_dir.is_dir() {
            return Err(PackrollError::TargetNotFound {
                path: target_dir.to_path_buf(),
            });
        }

        let mut edited = 0;
        for entry in WalkDir::new(target_dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with(TEMP_MARKER) || !name.contains(A2_TOKEN) {
                continue;
            }

            match self.apply_dates_to_file(entry.path(), validation_date, production_date) {
                Ok(()) => {
                    emit(self.log, &format!("已修改: {name}"));
                    edited += 1;
                }
                Err(e) => {
                    emit(self.log, &format!("修改《{name}》时出错: {e}"));
                }
            }
        }

        Ok(edited)
    }

    fn apply_dates_to_file(
        &self,
        path: &Path,
        validation_date: &str,
        production_date: &str,
    ) -> Result<()> {
        let mut package = DocxPackage::open(path)?;

        for tbl in table::tables_mut(&mut package.document) {
            if table_is_package_header(tbl) {
                continue;
            }
            for row in table::rows_mut(tbl) {
                if !is_numeric_text(&table::cell_text_at(row, 0)) {
                    continue;
                }
                let row_cells = table::cells_mut(row);
                if row_cells.len() < 5 {
                    continue;
                }

                let fonts = {
                    let from_val = first_run_fonts(&*row_cells[3]);
                    if from_val.is_empty() {
                        first_run_fonts(&*row_cells[4])
                    } else {
                        from_val
                    }
                };

                let mut it = row_cells.into_iter().skip(3);
                if let Some(val_cell) = it.next() {
                    table::set_cell_text_with_fonts(val_cell, validation_date, &fonts);
                }
                if let Some(prod_cell) = it.next() {
                    table::set_cell_text_with_fonts(prod_cell, production_date, &fonts);
                }
            }
        }

        package.save(path)?;
        Ok(())
    }
}

/// Whether a table's first row starts with the package-name header
/// phrase.
fn table_is_package_header(tbl: &XmlNode) -> bool {
    table::rows(tbl)
        .first()
        .map(|row| table::cell_text_at(row, 0).contains(PACKAGE_NAME_HEADER))
        .unwrap_or(false)
}

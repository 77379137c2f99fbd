//! Delimited export of extracted records.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Write rows to a comma-separated file, UTF-8 with byte-order mark
/// so spreadsheet tools pick the encoding up. Quoting of embedded
/// delimiters, quotes and newlines follows the standard rule; the
/// header row is written first when non-empty.
pub fn write_csv(output_path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut file = fs::File::create(output_path)?;
    file.write_all(b"\xEF\xBB\xBF")?;

    let mut writer = csv::Writer::from_writer(file);
    if !header.is_empty() {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

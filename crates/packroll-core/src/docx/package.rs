//! The docx container: a zip archive whose `word/document.xml` part
//! carries the body tables. Every other part is carried through
//! verbatim on save.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::xml::{self, XmlNode};
use crate::error::{PackrollError, Result};

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug)]
pub struct DocxPackage {
    /// All parts in archive order, original bytes. The document part
    /// keeps its slot; its bytes are re-serialized on save.
    parts: Vec<(String, Vec<u8>)>,
    pub document: XmlNode,
}

impl DocxPackage {
    /// Read the whole package into memory and parse the document
    /// part.
    pub fn open(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut parts = Vec::with_capacity(archive.len());
        let mut document = None;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;

            if name == DOCUMENT_PART {
                let text = String::from_utf8(data.clone())
                    .map_err(|e| PackrollError::Xml(e.to_string()))?;
                document = Some(xml::parse(&text)?);
            }
            parts.push((name, data));
        }

        let document = document.ok_or_else(|| PackrollError::MissingDocPart {
            name: DOCUMENT_PART.to_string(),
        })?;
        Ok(Self { parts, document })
    }

    /// Overwrite the package at `path`. Load, mutate, save is the
    /// whole lifecycle; there is no rename-swap, so a crash mid-save
    /// can truncate the file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)?;
        let mut writer = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            if name == DOCUMENT_PART {
                writer.write_all(&xml::to_bytes(&self.document)?)?;
            } else {
                writer.write_all(data)?;
            }
        }
        writer.finish()?;
        Ok(())
    }
}

#[cfg(test)]
impl DocxPackage {
    /// Build a bare package around a document tree. Enough for the
    /// editor and extractor tests; Word needs more parts than this.
    pub(crate) fn from_document(document: XmlNode) -> Self {
        let parts = vec![
            (
                "[Content_Types].xml".to_string(),
                br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_vec(),
            ),
            (DOCUMENT_PART.to_string(), Vec::new()),
        ];
        Self { parts, document }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_document() -> XmlNode {
        let mut t = XmlNode::new("w:t");
        t.push_text("正文");
        let mut r = XmlNode::new("w:r");
        r.push_element(t);
        let mut p = XmlNode::new("w:p");
        p.push_element(r);
        let mut body = XmlNode::new("w:body");
        body.push_element(p);
        let mut doc = XmlNode::new("w:document");
        doc.set_attr(
            "xmlns:w",
            "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
        );
        doc.push_element(body);
        doc
    }

    #[test]
    fn test_save_open_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.docx");

        let package = DocxPackage::from_document(sample_document());
        package.save(&path).unwrap();

        let reopened = DocxPackage::open(&path).unwrap();
        assert_eq!(reopened.document, sample_document());
        assert_eq!(reopened.document.gather_text("w:t"), "正文");
    }

    #[test]
    fn test_open_without_document_part_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.docx");

        let file = fs::File::create(&path).unwrap();
        let mut writer = ZipWriter::new(file);
        writer
            .start_file("word/other.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        writer.finish().unwrap();

        let err = DocxPackage::open(&path).unwrap_err();
        assert!(matches!(err, PackrollError::MissingDocPart { .. }));
    }
}

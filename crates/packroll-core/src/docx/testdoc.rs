//! Synthetic document fixtures: tables built in memory and saved
//! through the real package writer, so editor and extractor tests
//! exercise the same path Word files take.

use std::path::Path;

use super::package::DocxPackage;
use super::xml::XmlNode;
use crate::error::Result;

pub(crate) fn run(text: &str) -> XmlNode {
    let mut t = XmlNode::new("w:t");
    t.set_attr("xml:space", "preserve");
    t.push_text(text);
    let mut r = XmlNode::new("w:r");
    r.push_element(t);
    r
}

pub(crate) fn cell(text: &str) -> XmlNode {
    let mut p = XmlNode::new("w:p");
    if !text.is_empty() {
        p.push_element(run(text));
    }
    let mut tc = XmlNode::new("w:tc");
    tc.push_element(XmlNode::new("w:tcPr"));
    tc.push_element(p);
    tc
}

/// A cell whose run carries explicit font name/size and whose
/// paragraph carries an alignment.
pub(crate) fn formatted_cell(text: &str, font: &str, size: &str, align: &str) -> XmlNode {
    let mut rfonts = XmlNode::new("w:rFonts");
    rfonts.set_attr("w:ascii", font);
    rfonts.set_attr("w:eastAsia", font);
    let mut sz = XmlNode::new("w:sz");
    sz.set_attr("w:val", size);
    let mut rpr = XmlNode::new("w:rPr");
    rpr.push_element(rfonts);
    rpr.push_element(sz);

    let mut r = run(text);
    r.children.insert(0, super::xml::XmlChild::Element(rpr));

    let mut jc = XmlNode::new("w:jc");
    jc.set_attr("w:val", align);
    let mut ppr = XmlNode::new("w:pPr");
    ppr.push_element(jc);

    let mut p = XmlNode::new("w:p");
    p.push_element(ppr);
    p.push_element(r);

    let mut tc = XmlNode::new("w:tc");
    tc.push_element(XmlNode::new("w:tcPr"));
    tc.push_element(p);
    tc
}

pub(crate) fn row(texts: Vec<&str>) -> XmlNode {
    let mut tr = XmlNode::new("w:tr");
    for text in texts {
        tr.push_element(cell(text));
    }
    tr
}

pub(crate) fn table(rows: Vec<Vec<&str>>) -> XmlNode {
    let mut tbl = XmlNode::new("w:tbl");
    tbl.push_element(XmlNode::new("w:tblPr"));
    for texts in rows {
        tbl.push_element(row(texts));
    }
    tbl
}

pub(crate) fn document(tables: Vec<XmlNode>) -> XmlNode {
    let mut body = XmlNode::new("w:body");
    for tbl in tables {
        body.push_element(tbl);
        body.push_element(XmlNode::new("w:p"));
    }
    let mut doc = XmlNode::new("w:document");
    doc.set_attr(
        "xmlns:w",
        "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    );
    doc.push_element(body);
    doc
}

/// Write a document tree as a docx file on disk.
pub(crate) fn save(path: &Path, doc: XmlNode) -> Result<()> {
    DocxPackage::from_document(doc).save(path)
}

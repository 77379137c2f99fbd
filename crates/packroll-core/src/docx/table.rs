//! Table-level operations over a parsed `word/document.xml` tree:
//! the narrow surface the editors and extractors need.

use super::xml::{XmlChild, XmlNode};

const HIGHLIGHT_COLOR: &str = "red";

/// Body-level tables of a document, in document order. Tables nested
/// inside cells are not listed, matching the flat view the package
/// conventions assume.
pub fn tables(document: &XmlNode) -> Vec<&XmlNode> {
    let mut out = Vec::new();
    if let Some(body) = document.first_child("w:body") {
        collect_tables(body, &mut out);
    }
    out
}

pub fn tables_mut(document: &mut XmlNode) -> Vec<&mut XmlNode> {
    let mut out = Vec::new();
    if let Some(body) = document.first_child_mut("w:body") {
        collect_tables_mut(body, &mut out);
    }
    out
}

fn collect_tables<'a>(node: &'a XmlNode, out: &mut Vec<&'a XmlNode>) {
    for el in node.elements() {
        if el.name == "w:tbl" {
            out.push(el);
        } else {
            collect_tables(el, out);
        }
    }
}

fn collect_tables_mut<'a>(node: &'a mut XmlNode, out: &mut Vec<&'a mut XmlNode>) {
    for el in node.elements_mut() {
        if el.name == "w:tbl" {
            out.push(el);
        } else {
            collect_tables_mut(el, out);
        }
    }
}

pub fn rows(table: &XmlNode) -> Vec<&XmlNode> {
    table.children_named("w:tr").collect()
}

pub fn rows_mut(table: &mut XmlNode) -> Vec<&mut XmlNode> {
    table.children_named_mut("w:tr").collect()
}

pub fn cells(row: &XmlNode) -> Vec<&XmlNode> {
    row.children_named("w:tc").collect()
}

pub fn cells_mut(row: &mut XmlNode) -> Vec<&mut XmlNode> {
    row.children_named_mut("w:tc").collect()
}

/// Plain text of a cell: every `w:t` in document order.
pub fn cell_text(cell: &XmlNode) -> String {
    cell.gather_text("w:t")
}

/// Text of `cells[index]`, or empty when the row is short.
pub fn cell_text_at(row: &XmlNode, index: usize) -> String {
    cells(row)
        .get(index)
        .map(|c| cell_text(c))
        .unwrap_or_default()
}

/// Replace a cell's content with a single paragraph of plain text.
///
/// The first prior run's font name/size and the first prior
/// paragraph's alignment are carried over; non-paragraph children
/// (`w:tcPr`) stay in place.
pub fn set_cell_text(cell: &mut XmlNode, text: &str) {
    let fonts = first_run_fonts(cell);
    set_cell_text_with_fonts(cell, text, &fonts);
}

/// Like [`set_cell_text`] but with font elements supplied by the
/// caller (the date pass borrows formatting from a sibling cell when
/// the target cell was empty).
pub fn set_cell_text_with_fonts(cell: &mut XmlNode, text: &str, fonts: &[XmlNode]) {
    let alignment = first_paragraph_alignment(cell);

    cell.remove_children_named("w:p");

    let mut paragraph = XmlNode::new("w:p");
    if let Some(jc) = alignment {
        let mut ppr = XmlNode::new("w:pPr");
        ppr.push_element(jc);
        paragraph.push_element(ppr);
    }
    paragraph.push_element(make_run(text, fonts));
    cell.push_element(paragraph);
}

/// Clones of the font-defining elements of the first run found in
/// `scope` (a cell, paragraph or row): `w:rFonts`, `w:sz`, `w:szCs`.
pub fn first_run_fonts(scope: &XmlNode) -> Vec<XmlNode> {
    let mut out = Vec::new();
    if let Some(rpr) = first_descendant(scope, "w:r").and_then(|r| r.first_child("w:rPr")) {
        for name in ["w:rFonts", "w:sz", "w:szCs"] {
            if let Some(el) = rpr.first_child(name) {
                out.push(el.clone());
            }
        }
    }
    out
}

fn first_paragraph_alignment(cell: &XmlNode) -> Option<XmlNode> {
    cell.first_child("w:p")?
        .first_child("w:pPr")?
        .first_child("w:jc")
        .cloned()
}

fn first_descendant<'a>(node: &'a XmlNode, name: &str) -> Option<&'a XmlNode> {
    for el in node.elements() {
        if el.name == name {
            return Some(el);
        }
        if let Some(found) = first_descendant(el, name) {
            return Some(found);
        }
    }
    None
}

fn make_run(text: &str, fonts: &[XmlNode]) -> XmlNode {
    let mut run = XmlNode::new("w:r");
    if !fonts.is_empty() {
        let mut rpr = XmlNode::new("w:rPr");
        for font in fonts {
            rpr.push_element(font.clone());
        }
        run.push_element(rpr);
    }
    let mut t = XmlNode::new("w:t");
    t.set_attr("xml:space", "preserve");
    t.push_text(text);
    run.push_element(t);
    run
}

/// Apply the red highlight marker to every run in every cell of a
/// row.
pub fn highlight_row(row: &mut XmlNode) {
    for cell in cells_mut(row) {
        highlight_runs(cell);
    }
}

fn highlight_runs(node: &mut XmlNode) {
    if node.name == "w:r" {
        if node.first_child("w:rPr").is_none() {
            // rPr must be the run's first child.
            node.children
                .insert(0, XmlChild::Element(XmlNode::new("w:rPr")));
        }
        if let Some(rpr) = node.first_child_mut("w:rPr") {
            rpr.remove_children_named("w:highlight");
            let mut highlight = XmlNode::new("w:highlight");
            highlight.set_attr("w:val", HIGHLIGHT_COLOR);
            rpr.push_element(highlight);
        }
        return;
    }
    for el in node.elements_mut() {
        highlight_runs(el);
    }
}

/// Whether any run in the row carries the highlight marker. Test
/// helper; the edit passes only ever set the marker.
pub fn row_is_highlighted(row: &XmlNode) -> bool {
    fn any_highlight(node: &XmlNode) -> bool {
        if node.name == "w:r" {
            return node
                .first_child("w:rPr")
                .and_then(|rpr| rpr.first_child("w:highlight"))
                .and_then(|h| h.attr("w:val"))
                .is_some();
        }
        node.elements().any(any_highlight)
    }
    any_highlight(row)
}

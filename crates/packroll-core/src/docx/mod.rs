//! Read/modify/write access to the structured documents the pipeline
//! edits: only tables, rows, cells, run fonts, paragraph alignment
//! and the highlight marker are touched.

pub mod package;
pub mod table;
pub mod xml;

#[cfg(test)]
pub(crate) mod testdoc;

pub use package::DocxPackage;
pub use xml::{XmlChild, XmlNode};

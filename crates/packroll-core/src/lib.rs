pub mod config;
pub mod docedit;
pub mod docx;
pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod numbering;
pub mod pipeline;
pub mod rename;
pub mod replicate;
pub mod sanitize;
pub mod version;

pub use config::{default_base_dir, Config, DEFAULT_HEAD_LIST};
pub use docedit::{DocEditor, EditReport, A2_TOKEN, A5_TOKEN, PACKAGE_NAME_HEADER};
pub use docx::{DocxPackage, XmlChild, XmlNode};
pub use error::{PackrollError, Result};
pub use export::write_csv;
pub use extract::{extract_a2, extract_a5, A2Record, A5Detail, A5Summary, Extractor};
pub use logging::{emit, ItemOutcome, LogSink};
pub use numbering::{increment_number, is_numeric_text};
pub use pipeline::{directory_tree, run_extract, ExtractKind, Pipeline};
pub use rename::{RenameReport, Renamer};
pub use replicate::{ReplicateReport, Replicator};
pub use sanitize::{SanitizeReport, Sanitizer};
pub use version::VersionIndex;

//! # pdfxml2csv
//!
//! A Rust library (and CLI) that extracts XML attachments embedded in PDF
//! files and flattens them into CSV rows.
//!
//! ## What this crate does
//!
//! 1. **Read attachments** — walks the PDF name tree and page annotations and
//!    returns the raw bytes of every embedded file.
//! 2. **Classify XML** — decides whether an attachment is XML, by filename
//!    extension or by a well-formedness parse, entirely in memory.
//! 3. **Discover tags** — scans a batch of PDFs and aggregates the set of
//!    distinct XML tag names, writing nothing to disk.
//! 4. **Export** — materializes the XML attachments into a timestamped
//!    directory and expands each document into CSV rows through a
//!    tag-to-column mapping. A tag that occurs N times produces N rows; tags
//!    with fewer occurrences repeat their last value on the remaining rows.
//!
//! ## Quick example
//!
//! ```no_run
//! use pdfxml2csv::{discover, ExportLayout, ExportPipeline, FieldMapping};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pdfs = ["invoice1.pdf", "invoice2.pdf"];
//!
//! // Preview the tags available for mapping (in-memory, no files written).
//! let report = discover(&pdfs);
//! for tag in &report.tags {
//!     println!("{tag}");
//! }
//!
//! // Map tags to CSV columns and export.
//! let mut mapping = FieldMapping::new();
//! mapping.insert("InvoiceNumber", "Invoice");
//! mapping.insert("Amount", "Total");
//!
//! let layout = ExportLayout::new(".");
//! let summary = ExportPipeline::new(&mapping).run_to_csv(&pdfs, &layout)?;
//! println!("{} rows -> {}", summary.rows, summary.csv_path.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use thiserror::Error;

mod attachment;
mod classify;
mod discover;
mod expand;
mod export;
mod mapping;
mod materialize;
mod reader;
mod scan;
mod spec_discovery;
mod spec_parsing;
mod xml;

pub use attachment::{Attachment, AttachmentSource};
pub use classify::{classify, Classification};
pub use discover::{discover, DiscoveryReport};
pub use expand::{expand, expand_file, RowRecord};
pub use export::{write_csv, ExportLayout, ExportOutcome, ExportPipeline, ExportSummary};
pub use mapping::FieldMapping;
pub use materialize::{materialize, sanitize_filename};
pub use reader::AttachmentReader;
pub use xml::{XmlDocument, XmlElement};
// SpecDiscovery and SpecParser are intentionally *not* re-exported; they are
// internal plumbing. Callers go through AttachmentReader.

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A filesystem I/O error occurred (e.g. when staging or renaming a file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The path could not be opened as a valid PDF container.
    #[error("cannot open '{}' as a PDF: {source}", path.display())]
    ContainerOpen {
        path: PathBuf,
        source: lopdf::Error,
    },

    /// An individual attachment's bytes could not be retrieved.
    #[error("failed to read attachment '{0}': {1}")]
    AttachmentRead(String, String),

    /// A payload failed the XML well-formedness parse.
    #[error("XML is not well-formed: {0}")]
    XmlParse(String),

    /// Export was requested with no tag-to-column entries configured.
    #[error("no tag-to-column mapping configured")]
    MappingEmpty,

    /// Export was requested with an empty batch.
    #[error("no PDF files selected")]
    NoPdfsSelected,

    /// The persisted mapping file could not be read or written.
    #[error("mapping config error: {0}")]
    MappingConfig(String),

    /// The output CSV could not be serialized.
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    /// The underlying lopdf parser returned an error.
    #[error("PDF parse error: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ExportError>;

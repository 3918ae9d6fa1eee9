use std::path::Path;

// ── AttachmentSource ─────────────────────────────────────────────────────────

/// Where inside the PDF container an attachment was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Declared in the `/Names/EmbeddedFiles` name tree of the catalog.
    DocumentLevel,

    /// Attached through a `/FileAttachment` annotation on a page.
    Annotation {
        /// Zero-based index of the page carrying the annotation.
        page_index: usize,
    },
}

impl AttachmentSource {
    /// The page index for annotation attachments, `None` for document-level
    /// ones.
    pub fn page_index(&self) -> Option<usize> {
        match self {
            AttachmentSource::DocumentLevel => None,
            AttachmentSource::Annotation { page_index } => Some(*page_index),
        }
    }
}

// ── Attachment ───────────────────────────────────────────────────────────────

/// A file embedded inside a PDF container.
///
/// Returned by [`crate::AttachmentReader::attachments`]. Attachments live for
/// one traversal only; they are never persisted directly.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Where the attachment was declared.
    pub source: AttachmentSource,

    /// The suggested filename as declared in the PDF file specification
    /// (Unicode name preferred over ASCII name when both are present).
    pub name: String,

    /// The raw, decompressed file content.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Returns the file extension (lowercase), or `None` if the suggested
    /// name has no extension.
    ///
    /// ```
    /// # use pdfxml2csv::{Attachment, AttachmentSource};
    /// # let att = Attachment { source: AttachmentSource::DocumentLevel, name: "factur-x.xml".into(), data: vec![] };
    /// assert_eq!(att.extension(), Some("xml"));
    /// ```
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|e| e.to_str())
    }

    /// Returns `true` when the suggested name's extension matches `ext`
    /// (case-insensitive comparison).
    ///
    /// ```
    /// # use pdfxml2csv::{Attachment, AttachmentSource};
    /// # let att = Attachment { source: AttachmentSource::DocumentLevel, name: "Factur-X.XML".into(), data: vec![] };
    /// assert!(att.has_extension("xml"));
    /// ```
    pub fn has_extension(&self, ext: &str) -> bool {
        self.extension()
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false)
    }
}

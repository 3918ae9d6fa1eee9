use crate::attachment::Attachment;
use crate::spec_discovery::SpecDiscovery;
use crate::spec_parsing::SpecParser;
use crate::{ExportError, Result};
use lopdf::Document;
use std::path::Path;
use tracing::warn;

// ── AttachmentReader ─────────────────────────────────────────────────────────

/// Read-only view over one PDF container's embedded files.
///
/// Opening a reader parses the whole container; [`attachments`] then yields
/// every embedded file as an in-memory buffer. The reader never writes to
/// storage — materialization is a separate step.
///
/// ```no_run
/// use pdfxml2csv::AttachmentReader;
///
/// # fn main() -> pdfxml2csv::Result<()> {
/// let reader = AttachmentReader::open("invoice.pdf")?;
/// for att in reader.attachments() {
///     println!("{} — {} bytes", att.name, att.data.len());
/// }
/// # Ok(())
/// # }
/// ```
///
/// [`attachments`]: AttachmentReader::attachments
#[derive(Debug)]
pub struct AttachmentReader {
    document: Document,
}

impl AttachmentReader {
    /// Open a PDF container from the file system.
    ///
    /// Returns [`ExportError::ContainerOpen`] when the path cannot be parsed
    /// as a PDF; batch callers skip the file and continue.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let document = Document::load(path).map_err(|e| ExportError::ContainerOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self { document })
    }

    /// Open a PDF container from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self {
            document: Document::load_mem(data)?,
        })
    }

    /// Returns `true` when the container declares at least one embedded file.
    pub fn has_attachments(&self) -> bool {
        !SpecDiscovery::new(&self.document).collect_specs().is_empty()
    }

    /// Returns the number of embedded-file specifications in the container.
    pub fn count_attachments(&self) -> usize {
        SpecDiscovery::new(&self.document).collect_specs().len()
    }

    /// Extract every embedded file, document-level attachments first, then
    /// annotation attachments in page order.
    ///
    /// A specification whose payload cannot be read is logged and skipped —
    /// the other attachments are still returned.
    pub fn attachments(&self) -> Vec<Attachment> {
        let specs = SpecDiscovery::new(&self.document).collect_specs();
        let parser = SpecParser::new(&self.document);

        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            match parser.read_payload(&spec.name, spec.id) {
                Ok((name, data)) => results.push(Attachment {
                    source: spec.source,
                    name,
                    data,
                }),
                Err(e) => {
                    warn!(attachment = %spec.name, "skipping unreadable attachment: {e}");
                }
            }
        }
        results
    }

    /// Returns a reference to the underlying [`lopdf::Document`].
    pub fn document(&self) -> &Document {
        &self.document
    }
}

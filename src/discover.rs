use crate::attachment::Attachment;
use crate::classify::classify;
use crate::scan::{scan_pdf, AttachmentSink};
use crate::xml::XmlDocument;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

// ── DiscoveryReport ──────────────────────────────────────────────────────────

/// Result of one discovery run over a batch of PDFs.
///
/// The tag set grows monotonically during the run and is replaced wholesale
/// by the next run — discovery never merges into earlier results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    /// Distinct qualified tag names across every XML attachment in the batch.
    pub tags: BTreeSet<String>,

    /// PDFs that were opened and traversed.
    pub pdfs_scanned: usize,

    /// PDFs that contained at least one parseable XML attachment.
    pub pdfs_with_xml: usize,

    /// PDFs that could not be opened as PDF containers.
    pub pdfs_failed: usize,
}

// ── Field discovery ──────────────────────────────────────────────────────────

/// Scan a batch of PDFs in memory and aggregate the distinct XML tag names.
///
/// Every attachment classified as XML is parsed and the qualified name of
/// every element in its tree — root and interior nodes included — joins the
/// set. PDFs that fail to open are counted and skipped; the batch always
/// runs to completion.
///
/// Nothing is written to storage during discovery. That is the property
/// separating it from export: the same traversal runs, but its sink only
/// accumulates strings.
pub fn discover<P: AsRef<Path>>(pdf_paths: &[P]) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();

    for path in pdf_paths {
        let path = path.as_ref();
        let mut collector = TagCollector::default();

        match scan_pdf(path, &mut collector) {
            Ok(()) => {
                report.pdfs_scanned += 1;
                if collector.xml_seen > 0 {
                    report.pdfs_with_xml += 1;
                }
                debug!(
                    pdf = %path.display(),
                    xml_attachments = collector.xml_seen,
                    tags = collector.tags.len(),
                    "scanned"
                );
                report.tags.extend(collector.tags);
            }
            Err(e) => {
                warn!(pdf = %path.display(), "skipping PDF: {e}");
                report.pdfs_failed += 1;
            }
        }
    }

    report
}

/// The in-memory discovery sink: classifies, parses, and collects names.
#[derive(Default)]
struct TagCollector {
    tags: BTreeSet<String>,
    xml_seen: usize,
}

impl AttachmentSink for TagCollector {
    fn accept(&mut self, attachment: Attachment) -> Result<()> {
        if !classify(&attachment.name, &attachment.data).is_xml() {
            return Ok(());
        }
        match XmlDocument::parse(&attachment.data) {
            Ok(doc) => {
                doc.collect_tag_names(&mut self.tags);
                self.xml_seen += 1;
            }
            Err(e) => {
                // Classified by its .xml extension but not actually well-formed.
                warn!(attachment = %attachment.name, "XML attachment failed to parse: {e}");
            }
        }
        Ok(())
    }
}

use crate::attachment::Attachment;
use crate::reader::AttachmentReader;
use crate::Result;
use std::path::Path;

/// Receives every attachment found during one container traversal.
///
/// The walk over a PDF is written once; the two side-effect profiles —
/// accumulating tag names in memory during discovery, and materializing
/// files to disk during export — are sinks plugged into it.
pub(crate) trait AttachmentSink {
    fn accept(&mut self, attachment: Attachment) -> Result<()>;
}

/// Open `path` and feed every attachment to `sink`, in traversal order:
/// document-level attachments first, then annotation attachments page by
/// page. The container is owned for the duration of the walk and released
/// before the function returns.
pub(crate) fn scan_pdf(path: &Path, sink: &mut dyn AttachmentSink) -> Result<()> {
    let reader = AttachmentReader::open(path)?;
    for attachment in reader.attachments() {
        sink.accept(attachment)?;
    }
    Ok(())
}

use crate::attachment::Attachment;
use crate::classify::has_xml_extension;
use crate::scan::{scan_pdf, AttachmentSink};
use crate::xml::XmlDocument;
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Replace filesystem-invalid characters with an underscore.
///
/// A run of consecutive invalid characters collapses to a single `_`, so
/// Windows-style names stay readable.
///
/// ```
/// use pdfxml2csv::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a/b:c.xml"), "a_b_c.xml");
/// assert_eq!(sanitize_filename("report??<v2>.xml"), "report_v2_.xml");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    const INVALID: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '\r', '\n'];

    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if INVALID.contains(&c) {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Write every XML attachment of one PDF into `output_dir`.
///
/// The traversal mirrors [`crate::AttachmentReader::attachments`], but each
/// attachment's bytes are staged to disk under
/// `<sanitized-pdf-basename>_<sanitized-attachment-name>`. Attachments whose
/// name lacks the `.xml` extension are classified by content after staging:
/// well-formed ones are renamed with `.xml` appended, everything else is
/// deleted again — the output directory never keeps non-XML debris.
///
/// Returns the final `.xml` paths in traversal order; after the call they
/// are exactly the directory's contents for this PDF.
pub fn materialize(pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;

    let pdf_base = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".into());

    let mut sink = FileSink {
        output_dir: output_dir.to_path_buf(),
        pdf_base: sanitize_filename(&pdf_base),
        written: Vec::new(),
    };
    scan_pdf(pdf_path, &mut sink)?;

    debug!(pdf = %pdf_path.display(), files = sink.written.len(), "materialized");
    Ok(sink.written)
}

/// The on-disk export sink: stages, classifies, renames or removes.
struct FileSink {
    output_dir: PathBuf,
    pdf_base: String,
    written: Vec<PathBuf>,
}

impl AttachmentSink for FileSink {
    fn accept(&mut self, attachment: Attachment) -> Result<()> {
        let safe_name = sanitize_filename(&attachment.name);
        let staged = self
            .output_dir
            .join(format!("{}_{}", self.pdf_base, safe_name));

        // Stage the bytes first; content classification may still reject them.
        fs::write(&staged, &attachment.data)?;

        if has_xml_extension(&safe_name) {
            self.written.push(staged);
        } else if XmlDocument::parse(&attachment.data).is_ok() {
            let mut renamed = staged.clone().into_os_string();
            renamed.push(".xml");
            let renamed = PathBuf::from(renamed);
            fs::rename(&staged, &renamed)?;
            self.written.push(renamed);
        } else {
            fs::remove_file(&staged)?;
        }
        Ok(())
    }
}

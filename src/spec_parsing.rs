use crate::{ExportError, Result};
use lopdf::{Document, ObjectId};

/// Reads the payload behind a file specification.
///
/// Layout of a file specification (PDF spec §7.11.3):
///
/// ```text
/// <<
///   /Type  /Filespec
///   /F     (ascii filename)
///   /UF    (unicode filename)          ← preferred
///   /EF    <<
///              /F   <stream-ref>       ← the actual data stream
///              /UF  <stream-ref>       ← alternative key, same stream
///          >>
/// >>
/// ```
///
/// The `/EF` entry is an inline dictionary per the spec, but some producers
/// incorrectly store it as an indirect reference; both forms are accepted.
pub(crate) struct SpecParser<'a> {
    document: &'a Document,
}

impl<'a> SpecParser<'a> {
    pub(crate) fn new(document: &'a Document) -> Self {
        Self { document }
    }

    fn read_error(&self, name: &str, message: &str) -> ExportError {
        ExportError::AttachmentRead(name.into(), message.into())
    }

    /// Get an object from the document and convert it to a dictionary with
    /// error context.
    fn get_dict_object(
        &self,
        obj_id: ObjectId,
        name: &str,
        context: &str,
    ) -> Result<lopdf::Dictionary> {
        let obj = self.document.get_object(obj_id)?;
        obj.as_dict()
            .map_err(|_| self.read_error(name, context))
            .cloned()
    }

    /// Resolve a file specification into `(suggested_name, payload bytes)`.
    ///
    /// The stream content is decompressed; if decoding fails the raw content
    /// is returned as-is.
    pub(crate) fn read_payload(&self, name: &str, spec_id: ObjectId) -> Result<(String, Vec<u8>)> {
        let spec_dict = self.get_dict_object(spec_id, name, "file spec is not a dictionary")?;
        let ef_dict = self.resolve_ef_dictionary(&spec_dict, name)?;
        let stream = self.resolve_embedded_stream(&ef_dict, name)?;

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        Ok((Self::best_filename(&spec_dict, name), data))
    }

    /// Resolve the /EF dictionary, handling both inline and reference cases.
    fn resolve_ef_dictionary(
        &self,
        spec_dict: &lopdf::Dictionary,
        name: &str,
    ) -> Result<lopdf::Dictionary> {
        let ef_val = spec_dict
            .get(b"EF")
            .map_err(|_| self.read_error(name, "missing /EF entry"))?;

        if let Ok(ef_id) = ef_val.as_reference() {
            self.get_dict_object(ef_id, name, "/EF reference is not a dict")
        } else {
            ef_val
                .as_dict()
                .map_err(|_| self.read_error(name, "/EF is not a dictionary"))
                .cloned()
        }
    }

    /// Follow the stream reference inside the /EF dictionary.
    fn resolve_embedded_stream(
        &self,
        ef_dict: &lopdf::Dictionary,
        name: &str,
    ) -> Result<lopdf::Stream> {
        // /UF preferred over /F (unicode vs. ASCII path)
        let stream_ref = ef_dict
            .get(b"UF")
            .or_else(|_| ef_dict.get(b"F"))
            .map_err(|_| self.read_error(name, "/EF has neither /F nor /UF"))?;

        let stream_id = stream_ref
            .as_reference()
            .map_err(|_| self.read_error(name, "/EF stream entry is not a reference"))?;

        let stream_obj = self.document.get_object(stream_id)?;
        stream_obj
            .as_stream()
            .map_err(|_| self.read_error(name, "embedded stream object is not a stream"))
            .cloned()
    }

    /// Return the best available filename: Unicode (/UF) > ASCII (/F) > fallback.
    fn best_filename(spec_dict: &lopdf::Dictionary, fallback: &str) -> String {
        for key in [b"UF" as &[u8], b"F"] {
            if let Some(name) = dict_string(spec_dict, key) {
                return name;
            }
        }
        fallback.into()
    }
}

/// Extract a non-empty string value from a PDF dictionary for a given key.
pub(crate) fn dict_string(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .ok()
        .and_then(|v| v.as_str().ok())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .filter(|s| !s.is_empty())
}

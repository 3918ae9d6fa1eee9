use crate::attachment::AttachmentSource;
use crate::spec_parsing::dict_string;
use lopdf::{Document, ObjectId};

/// A file specification located inside the container, before its payload has
/// been read.
#[derive(Debug, Clone)]
pub(crate) struct SpecRef {
    pub source: AttachmentSource,
    pub name: String,
    pub id: ObjectId,
}

/// Locates embedded-file specifications inside a PDF document.
///
/// Two sources are searched, in this order:
/// 1. The `/Names/EmbeddedFiles` name tree in the document catalog.
/// 2. `/FileAttachment` annotations, page by page.
pub(crate) struct SpecDiscovery<'a> {
    document: &'a Document,
}

impl<'a> SpecDiscovery<'a> {
    pub(crate) fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Collect every embedded-file specification in the container, in
    /// traversal order: document-level first, then annotations in page order.
    pub(crate) fn collect_specs(&self) -> Vec<SpecRef> {
        let mut specs = self.collect_from_names_tree();
        specs.extend(self.collect_from_annotations());
        specs
    }

    /// Helper to resolve a value that might be inline or a reference to a dictionary.
    fn resolve_dict(&self, value: &lopdf::Object) -> Option<lopdf::Dictionary> {
        if let Ok(id) = value.as_reference() {
            self.document
                .get_object(id)
                .ok()
                .and_then(|o| o.as_dict().ok().cloned())
        } else {
            value.as_dict().ok().cloned()
        }
    }

    /// Helper to resolve a value that might be inline or a reference to an array.
    fn resolve_array(&self, value: &lopdf::Object) -> Option<Vec<lopdf::Object>> {
        if let Ok(id) = value.as_reference() {
            self.document
                .get_object(id)
                .ok()
                .and_then(|o| o.as_array().ok().cloned())
        } else {
            value.as_array().ok().cloned()
        }
    }

    /// Process a `/Names` array of `[key, value, key, value, …]` pairs into
    /// document-level spec refs.
    fn process_names_array(&self, names_array: &[lopdf::Object]) -> Vec<SpecRef> {
        let mut specs = Vec::new();
        let mut i = 0;
        while i + 1 < names_array.len() {
            if let Ok(name_bytes) = names_array[i].as_str() {
                let name = String::from_utf8_lossy(name_bytes).into_owned();
                if let Ok(spec_id) = names_array[i + 1].as_reference() {
                    specs.push(SpecRef {
                        source: AttachmentSource::DocumentLevel,
                        name,
                        id: spec_id,
                    });
                }
            }
            i += 2;
        }
        specs
    }

    // ── Source 1: the names tree ──────────────────────────────────────────────

    fn collect_from_names_tree(&self) -> Vec<SpecRef> {
        let catalog = match self.document.catalog() {
            Ok(cat) => cat,
            Err(_) => return Vec::new(),
        };

        let names_val = match catalog.get(b"Names") {
            Ok(val) => val,
            Err(_) => return Vec::new(),
        };

        let names_dict = match self.resolve_dict(names_val) {
            Some(dict) => dict,
            None => return Vec::new(),
        };

        let ef_val = match names_dict.get(b"EmbeddedFiles") {
            Ok(val) => val,
            Err(_) => return Vec::new(),
        };

        if let Ok(ef_id) = ef_val.as_reference() {
            self.walk_name_tree(ef_id)
        } else if let Ok(ef_dict) = ef_val.as_dict() {
            // Inline /EmbeddedFiles dictionary
            self.collect_from_inline_ef_dict(ef_dict)
        } else {
            Vec::new()
        }
    }

    fn collect_from_inline_ef_dict(&self, ef_dict: &lopdf::Dictionary) -> Vec<SpecRef> {
        if let Ok(names_val) = ef_dict.get(b"Names") {
            if let Ok(names_array) = names_val.as_array() {
                return self.process_names_array(names_array);
            }
        }
        Vec::new()
    }

    /// Recursively walk a PDF name tree, collecting spec refs from the
    /// `/Names` arrays of leaf nodes via the `/Kids` of intermediate nodes.
    fn walk_name_tree(&self, node_id: ObjectId) -> Vec<SpecRef> {
        let mut out = Vec::new();

        let node_obj = match self.document.get_object(node_id) {
            Ok(o) => o,
            Err(_) => return out,
        };

        let node_dict = match node_obj.as_dict() {
            Ok(d) => d,
            Err(_) => return out,
        };

        if let Ok(names_val) = node_dict.get(b"Names") {
            if let Ok(arr) = names_val.as_array() {
                out.extend(self.process_names_array(arr));
            }
        }

        if let Ok(kids_val) = node_dict.get(b"Kids") {
            if let Ok(kids) = kids_val.as_array() {
                for kid in kids {
                    if let Ok(kid_id) = kid.as_reference() {
                        out.extend(self.walk_name_tree(kid_id));
                    }
                }
            }
        }

        out
    }

    // ── Source 2: page FileAttachment annotations ─────────────────────────────

    fn collect_from_annotations(&self) -> Vec<SpecRef> {
        let mut specs = Vec::new();

        // get_pages() keys are 1-based page numbers in page order.
        for (page_no, page_id) in self.document.get_pages() {
            let page_index = page_no.saturating_sub(1) as usize;
            specs.extend(self.process_page_annotations(page_id, page_index));
        }

        specs
    }

    fn process_page_annotations(&self, page_id: ObjectId, page_index: usize) -> Vec<SpecRef> {
        let page_dict = match self
            .document
            .get_object(page_id)
            .ok()
            .and_then(|o| o.as_dict().ok())
        {
            Some(dict) => dict,
            None => return Vec::new(),
        };

        let annots_val = match page_dict.get(b"Annots") {
            Ok(val) => val,
            Err(_) => return Vec::new(),
        };

        let annots_array = match self.resolve_array(annots_val) {
            Some(array) => array,
            None => return Vec::new(),
        };

        let mut specs = Vec::new();
        for item in &annots_array {
            if let Ok(annot_id) = item.as_reference() {
                if let Some(spec) = self.process_file_attachment(annot_id, page_index) {
                    specs.push(spec);
                }
            }
        }
        specs
    }

    /// Process a single annotation; every subtype other than
    /// `/FileAttachment` is skipped.
    fn process_file_attachment(&self, annot_id: ObjectId, page_index: usize) -> Option<SpecRef> {
        let annot_obj = self.document.get_object(annot_id).ok()?;
        let dict = annot_obj.as_dict().ok()?;

        let subtype_name = dict.get(b"Subtype").ok()?.as_name().ok()?;
        if subtype_name != b"FileAttachment" {
            return None;
        }

        let fs_val = dict.get(b"FS").ok()?;
        let fs_id = fs_val.as_reference().ok()?;

        Some(SpecRef {
            source: AttachmentSource::Annotation { page_index },
            name: Self::annotation_name(dict),
            id: fs_id,
        })
    }

    /// Extract a display name from a FileAttachment annotation dictionary.
    /// Falls back to `"attachment"` if neither `/Contents` nor `/T` is set.
    fn annotation_name(dict: &lopdf::Dictionary) -> String {
        for key in [b"Contents" as &[u8], b"T"] {
            if let Some(name) = dict_string(dict, key) {
                return name;
            }
        }
        "attachment".into()
    }
}

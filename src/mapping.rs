use crate::{ExportError, Result};
use std::path::Path;
use tracing::debug;

// ── FieldMapping ─────────────────────────────────────────────────────────────

/// Ordered mapping from XML tag name to CSV column header.
///
/// Tags are unique keys; column headers need not be unique — a duplicate
/// header simply repeats in the CSV. Entry order is the CSV column order,
/// and is preserved through [`load`]/[`save`] round trips.
///
/// The persisted form is a flat JSON object of string pairs:
///
/// ```json
/// {
///   "InvoiceNumber": "Invoice",
///   "Amount": "Total"
/// }
/// ```
///
/// [`load`]: FieldMapping::load
/// [`save`]: FieldMapping::save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(String, String)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `tag` to `column`. Re-inserting an existing tag updates its column
    /// in place without changing its position.
    pub fn insert(&mut self, tag: impl Into<String>, column: impl Into<String>) {
        let tag = tag.into();
        let column = column.into();
        if let Some(entry) = self.entries.iter_mut().find(|(t, _)| *t == tag) {
            entry.1 = column;
        } else {
            self.entries.push((tag, column));
        }
    }

    /// Remove a tag from the mapping; returns `true` when it was present.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(t, _)| t != tag);
        self.entries.len() != before
    }

    /// The column header mapped to `tag`, if any.
    pub fn column_for(&self, tag: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, c)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(tag, column)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, c)| (t.as_str(), c.as_str()))
    }

    /// Column headers in insertion order — the CSV header row.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, c)| c.as_str())
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// Load a mapping from a JSON file.
    ///
    /// A missing file is not an error: it yields an empty mapping, which is
    /// the default before the user has configured anything.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            debug!(config = %path.display(), "no mapping file, starting empty");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)
            .map_err(|e| ExportError::MappingConfig(e.to_string()))?;

        let mut mapping = Self::default();
        for (tag, value) in object {
            match value {
                serde_json::Value::String(column) => mapping.entries.push((tag, column)),
                other => {
                    return Err(ExportError::MappingConfig(format!(
                        "value for tag '{tag}' must be a string, got {other}"
                    )))
                }
            }
        }
        Ok(mapping)
    }

    /// Write the mapping back as pretty-printed JSON, entries in order.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut object = serde_json::Map::new();
        for (tag, column) in &self.entries {
            object.insert(tag.clone(), serde_json::Value::String(column.clone()));
        }
        let text = serde_json::to_string_pretty(&serde_json::Value::Object(object))
            .map_err(|e| ExportError::MappingConfig(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

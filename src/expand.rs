use crate::mapping::FieldMapping;
use crate::xml::XmlDocument;
use std::path::Path;
use tracing::warn;

// ── RowRecord ────────────────────────────────────────────────────────────────

/// One flattened CSV row: a `column → value` cell per mapping entry, in
/// mapping order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    cells: Vec<(String, String)>,
}

impl RowRecord {
    /// The value under `column` (the first cell when headers repeat).
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Cell values in column order — one CSV line.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, v)| v.as_str())
    }

    /// `(column, value)` cells in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ── Row expansion ────────────────────────────────────────────────────────────

/// Expand one parsed XML document into flattened rows.
///
/// For every `(tag, column)` mapping entry, the ordered occurrence list is
/// the trimmed text of each element matching `tag` anywhere below the root;
/// a tag with no matches gets a single empty-string occurrence so the
/// mapping always makes progress. The document expands to `max_count` rows,
/// where `max_count` is the longest occurrence list.
///
/// Row `i` takes occurrence `min(i, M - 1)` from a tag with `M` occurrences:
/// a tag whose occurrences run out repeats its last value on every remaining
/// row (hold-last-value, not zero-fill and not cyclic repetition). A tag
/// with 3 values in a document that otherwise expands to 5 rows contributes
/// its 3rd value to rows 3, 4 and 5.
///
/// An empty mapping expands to no rows.
pub fn expand(doc: &XmlDocument, mapping: &FieldMapping) -> Vec<RowRecord> {
    if mapping.is_empty() {
        return Vec::new();
    }

    let occurrences: Vec<(&str, Vec<String>)> = mapping
        .entries()
        .map(|(tag, column)| {
            let mut values = doc.texts_below(tag);
            if values.is_empty() {
                values.push(String::new());
            }
            (column, values)
        })
        .collect();

    let max_count = occurrences
        .iter()
        .map(|(_, values)| values.len())
        .max()
        .unwrap_or(0);

    (0..max_count)
        .map(|i| RowRecord {
            cells: occurrences
                .iter()
                .map(|(column, values)| {
                    let value = &values[i.min(values.len() - 1)];
                    ((*column).to_string(), value.clone())
                })
                .collect(),
        })
        .collect()
}

/// Read and parse a materialized XML file, then expand it.
///
/// A file that cannot be read or is not well-formed contributes zero rows;
/// the failure is logged and the batch moves on.
pub fn expand_file(path: &Path, mapping: &FieldMapping) -> Vec<RowRecord> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            warn!(file = %path.display(), "cannot read materialized file: {e}");
            return Vec::new();
        }
    };
    match XmlDocument::parse(&data) {
        Ok(doc) => expand(&doc, mapping),
        Err(e) => {
            warn!(file = %path.display(), "materialized file is not well-formed XML: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(xml: &str) -> XmlDocument {
        XmlDocument::parse(xml.as_bytes()).unwrap()
    }

    fn mapping(pairs: &[(&str, &str)]) -> FieldMapping {
        let mut m = FieldMapping::new();
        for (tag, column) in pairs {
            m.insert(*tag, *column);
        }
        m
    }

    #[test]
    fn single_occurrences_expand_to_one_row() {
        let rows = expand(
            &doc("<r><a>x</a><b>z</b></r>"),
            &mapping(&[("a", "ColA"), ("b", "ColB")]),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("ColA"), Some("x"));
        assert_eq!(rows[0].get("ColB"), Some("z"));
    }

    #[test]
    fn repeated_tag_expands_and_shorter_tags_hold_last_value() {
        // <a> twice, <b> once: two rows, b's only value held on row 1.
        let rows = expand(
            &doc("<r><a>x</a><a>y</a><b>z</b></r>"),
            &mapping(&[("a", "ColA"), ("b", "ColB")]),
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("ColA"), Some("x"));
        assert_eq!(rows[0].get("ColB"), Some("z"));
        assert_eq!(rows[1].get("ColA"), Some("y"));
        assert_eq!(rows[1].get("ColB"), Some("z"));
    }

    #[test]
    fn unmatched_tag_contributes_empty_string_to_every_row() {
        // <c> never occurs, yet <a>'s two occurrences still drive two rows.
        let rows = expand(
            &doc("<r><a>x</a><a>y</a><b>z</b></r>"),
            &mapping(&[("a", "ColA"), ("c", "ColC")]),
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("ColA"), Some("x"));
        assert_eq!(rows[0].get("ColC"), Some(""));
        assert_eq!(rows[1].get("ColA"), Some("y"));
        assert_eq!(rows[1].get("ColC"), Some(""));
    }

    #[test]
    fn hold_last_value_not_zero_fill_not_cyclic() {
        // a: 5 occurrences, b: 3 — rows 2,3,4 must all carry b's 3rd value.
        let rows = expand(
            &doc(
                "<r><a>1</a><a>2</a><a>3</a><a>4</a><a>5</a>\
                 <b>p</b><b>q</b><b>r</b></r>",
            ),
            &mapping(&[("a", "A"), ("b", "B")]),
        );
        assert_eq!(rows.len(), 5);
        let b_values: Vec<_> = rows.iter().map(|r| r.get("B").unwrap()).collect();
        assert_eq!(b_values, vec!["p", "q", "r", "r", "r"]);
    }

    #[test]
    fn row_count_is_the_maximum_occurrence_count() {
        let document = doc("<r><a>1</a><a>2</a><a>3</a><b>z</b></r>");
        let rows = expand(&document, &mapping(&[("a", "A"), ("b", "B"), ("c", "C")]));
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn empty_mapping_expands_to_no_rows() {
        let rows = expand(&doc("<r><a>x</a></r>"), &FieldMapping::new());
        assert!(rows.is_empty());
    }

    #[test]
    fn only_unmatched_tags_still_produce_one_row() {
        let rows = expand(&doc("<r><a>x</a></r>"), &mapping(&[("nope", "N")]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("N"), Some(""));
    }

    #[test]
    fn values_are_trimmed() {
        let rows = expand(
            &doc("<r><a>  padded  </a></r>"),
            &mapping(&[("a", "A")]),
        );
        assert_eq!(rows[0].get("A"), Some("padded"));
    }

    #[test]
    fn nested_matches_count_as_occurrences() {
        // Tag matching is by name at any depth, not by path.
        let rows = expand(
            &doc("<r><item><a>1</a></item><item><a>2</a></item></r>"),
            &mapping(&[("a", "A")]),
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("A"), Some("2"));
    }

    #[test]
    fn duplicate_column_headers_keep_both_cells() {
        let rows = expand(
            &doc("<r><a>x</a><b>y</b></r>"),
            &mapping(&[("a", "Col"), ("b", "Col")]),
        );
        assert_eq!(rows[0].values().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn expand_file_on_malformed_file_yields_zero_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xml");
        std::fs::write(&path, b"<r><a>x</a>").unwrap();
        assert!(expand_file(&path, &mapping(&[("a", "A")])).is_empty());
    }

    #[test]
    fn expand_file_reads_well_formed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.xml");
        std::fs::write(&path, b"<r><a>x</a></r>").unwrap();
        let rows = expand_file(&path, &mapping(&[("a", "A")]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("A"), Some("x"));
    }
}

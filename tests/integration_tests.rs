// Integration tests for pdfxml2csv.
//
// Real PDF fixtures are not checked in; instead every test builds a minimal
// PDF container in memory with lopdf — a document-level /EmbeddedFiles name
// tree, optionally a /FileAttachment annotation on page 1 — and saves it into
// a tempfile directory.

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pdfxml2csv::{
    discover, materialize, AttachmentReader, AttachmentSource, ExportError, ExportLayout,
    ExportPipeline, FieldMapping,
};
use std::path::{Path, PathBuf};

// ── Fixture builder ───────────────────────────────────────────────────────────

fn add_filespec(doc: &mut Document, name: &str, data: &[u8]) -> ObjectId {
    let stream_id = doc.add_object(Stream::new(
        dictionary! { "Type" => "EmbeddedFile" },
        data.to_vec(),
    ));
    doc.add_object(dictionary! {
        "Type" => "Filespec",
        "F" => Object::string_literal(name),
        "UF" => Object::string_literal(name),
        "EF" => dictionary! { "F" => stream_id },
    })
}

/// Build a one-page PDF with document-level attachments and page-annotation
/// attachments, and save it under `path`.
fn write_pdf(path: &Path, doc_level: &[(&str, &[u8])], annotations: &[(&str, &[u8])]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut names_array: Vec<Object> = Vec::new();
    for (name, data) in doc_level {
        let spec_id = add_filespec(&mut doc, name, data);
        names_array.push(Object::string_literal(*name));
        names_array.push(spec_id.into());
    }

    let mut annot_ids: Vec<Object> = Vec::new();
    for (name, data) in annotations {
        let spec_id = add_filespec(&mut doc, name, data);
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "FileAttachment",
            "Rect" => vec![0.into(), 0.into(), 20.into(), 20.into()],
            "Contents" => Object::string_literal(*name),
            "FS" => spec_id,
        });
        annot_ids.push(annot_id.into());
    }

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Annots" => annot_ids,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "Names" => dictionary! {
            "EmbeddedFiles" => dictionary! { "Names" => names_array },
        },
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("fixture PDF saves");
}

fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    entries.sort();
    entries
}

// ── AttachmentReader ──────────────────────────────────────────────────────────

#[test]
fn from_bytes_rejects_empty_slice() {
    assert!(AttachmentReader::from_bytes(&[]).is_err());
}

#[test]
fn from_bytes_rejects_non_pdf() {
    assert!(AttachmentReader::from_bytes(b"not a pdf").is_err());
}

#[test]
fn open_reports_container_error_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.pdf");
    std::fs::write(&bogus, b"certainly not a pdf").unwrap();

    let err = AttachmentReader::open(&bogus).unwrap_err();
    assert!(matches!(err, ExportError::ContainerOpen { .. }));
    assert!(err.to_string().contains("bogus.pdf"));
}

#[test]
fn reader_yields_document_level_before_annotations() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("both.pdf");
    write_pdf(
        &pdf,
        &[("doc.xml", b"<d><x>1</x></d>")],
        &[("page.xml", b"<p><y>2</y></p>")],
    );

    let reader = AttachmentReader::open(&pdf).unwrap();
    assert!(reader.has_attachments());
    assert_eq!(reader.count_attachments(), 2);

    let attachments = reader.attachments();
    assert_eq!(attachments.len(), 2);

    assert_eq!(attachments[0].source, AttachmentSource::DocumentLevel);
    assert_eq!(attachments[0].source.page_index(), None);
    assert_eq!(attachments[0].name, "doc.xml");
    assert_eq!(attachments[0].data, b"<d><x>1</x></d>");

    assert_eq!(
        attachments[1].source,
        AttachmentSource::Annotation { page_index: 0 }
    );
    assert_eq!(attachments[1].source.page_index(), Some(0));
    assert_eq!(attachments[1].name, "page.xml");
    assert_eq!(attachments[1].data, b"<p><y>2</y></p>");
}

// ── Field discovery ───────────────────────────────────────────────────────────

#[test]
fn discovery_aggregates_tags_across_the_batch() {
    let dir = tempfile::tempdir().unwrap();

    let with_xml = dir.path().join("invoice.pdf");
    write_pdf(
        &with_xml,
        &[("invoice.xml", b"<inv><id>7</id><amount>10</amount></inv>")],
        // No .xml extension: classified by content after a parse attempt.
        &[("note.bin", b"<note><text>hello</text></note>")],
    );

    let without_xml = dir.path().join("scans.pdf");
    write_pdf(&without_xml, &[("photo.bin", &[0xff, 0xd8, 0x00, 0x12])], &[]);

    let broken = dir.path().join("broken.pdf");
    std::fs::write(&broken, b"garbage").unwrap();

    let report = discover(&[&with_xml, &without_xml, &broken]);

    let expected: Vec<&str> = vec!["amount", "id", "inv", "note", "text"];
    assert_eq!(
        report.tags.iter().map(String::as_str).collect::<Vec<_>>(),
        expected
    );
    assert_eq!(report.pdfs_scanned, 2);
    assert_eq!(report.pdfs_with_xml, 1);
    assert_eq!(report.pdfs_failed, 1);
}

#[test]
fn discovery_writes_nothing_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("invoice.pdf");
    write_pdf(&pdf, &[("invoice.xml", b"<inv><id>7</id></inv>")], &[]);

    let before = dir_entries(dir.path());
    let report = discover(&[&pdf]);
    assert!(!report.tags.is_empty());

    assert_eq!(dir_entries(dir.path()), before);
}

// ── Materializer ──────────────────────────────────────────────────────────────

#[test]
fn materializer_keeps_only_xml_files() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("my invoice.pdf");
    write_pdf(
        &pdf,
        &[
            // Sanitized: '/' becomes '_'.
            ("fac/ture.xml", b"<f><n>1</n></f>"),
            // XML by content: staged, then renamed with .xml appended.
            ("payload.bin", b"<p><v>2</v></p>"),
            // Not XML: staged, then removed again.
            ("junk.bin", &[0x00, 0x01, 0x02]),
        ],
        &[],
    );

    let out = dir.path().join("out");
    let written = materialize(&pdf, &out).unwrap();

    let expected = vec![
        out.join("my invoice.pdf_fac_ture.xml"),
        out.join("my invoice.pdf_payload.bin.xml"),
    ];
    assert_eq!(written, expected);

    // The directory holds exactly the returned paths — no staging debris.
    let mut sorted = written.clone();
    sorted.sort();
    assert_eq!(dir_entries(&out), sorted);
    assert!(written.iter().all(|p| {
        p.extension().map(|e| e == "xml").unwrap_or(false)
    }));
}

#[test]
fn materializer_covers_annotation_attachments_too() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("annotated.pdf");
    write_pdf(&pdf, &[], &[("attached.xml", b"<a><b>1</b></a>")]);

    let out = dir.path().join("out");
    let written = materialize(&pdf, &out).unwrap();
    assert_eq!(written, vec![out.join("annotated.pdf_attached.xml")]);
}

// ── Export pipeline ───────────────────────────────────────────────────────────

fn simple_mapping() -> FieldMapping {
    let mut mapping = FieldMapping::new();
    mapping.insert("a", "ColA");
    mapping.insert("b", "ColB");
    mapping
}

#[test]
fn export_end_to_end_produces_expanded_csv() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("rows.pdf");
    write_pdf(&pdf, &[("rows.xml", b"<r><a>x</a><a>y</a><b>z</b></r>")], &[]);

    let base = dir.path().join("work");
    let mapping = simple_mapping();
    let summary = ExportPipeline::new(&mapping)
        .run_to_csv(&[&pdf], &ExportLayout::new(&base))
        .unwrap();

    assert_eq!(summary.xml_files, 1);
    assert_eq!(summary.rows, 2);
    assert!(summary.run_dir.starts_with(base.join("extracted_xml")));

    let run_key = summary.run_dir.file_name().unwrap().to_str().unwrap();
    assert_eq!(run_key.len(), 14);
    assert!(run_key.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(
        summary.csv_path.file_name().unwrap().to_str().unwrap(),
        format!("output_{run_key}.csv")
    );

    let csv = std::fs::read_to_string(&summary.csv_path).unwrap();
    assert_eq!(csv, "ColA,ColB\nx,z\ny,z\n");
}

#[test]
fn export_combines_pdfs_in_batch_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.pdf");
    let second = dir.path().join("second.pdf");
    write_pdf(&first, &[("one.xml", b"<r><a>1</a><b>u</b></r>")], &[]);
    write_pdf(&second, &[("two.xml", b"<r><a>2</a><b>v</b></r>")], &[]);

    let mapping = simple_mapping();
    let run_dir = dir.path().join("run");
    let outcome = ExportPipeline::new(&mapping)
        .run(&[&first, &second], &run_dir)
        .unwrap();

    assert_eq!(outcome.xml_files.len(), 2);
    let a_values: Vec<_> = outcome
        .rows
        .iter()
        .map(|row| row.get("ColA").unwrap())
        .collect();
    assert_eq!(a_values, vec!["1", "2"]);
}

#[test]
fn export_skips_pdfs_that_fail_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.pdf");
    std::fs::write(&broken, b"garbage").unwrap();
    let good = dir.path().join("good.pdf");
    write_pdf(&good, &[("ok.xml", b"<r><a>x</a><b>y</b></r>")], &[]);

    let mapping = simple_mapping();
    let run_dir = dir.path().join("run");
    let outcome = ExportPipeline::new(&mapping)
        .run(&[&broken, &good], &run_dir)
        .unwrap();

    assert_eq!(outcome.rows.len(), 1);
    assert_eq!(outcome.rows[0].get("ColA"), Some("x"));
}

#[test]
fn export_with_empty_mapping_is_refused_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("rows.pdf");
    write_pdf(&pdf, &[("rows.xml", b"<r><a>x</a></r>")], &[]);

    let base = dir.path().join("work");
    let mapping = FieldMapping::new();
    let err = ExportPipeline::new(&mapping)
        .run_to_csv(&[&pdf], &ExportLayout::new(&base))
        .unwrap_err();

    assert!(matches!(err, ExportError::MappingEmpty));
    assert!(!base.exists());
}

#[test]
fn malformed_xml_attachment_contributes_zero_rows() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("mixed.pdf");
    write_pdf(
        &pdf,
        &[
            // Named .xml so it materializes, but truncated: expands to nothing.
            ("broken.xml", b"<r><a>x</a>"),
            ("good.xml", b"<r><a>y</a><b>z</b></r>"),
        ],
        &[],
    );

    let mapping = simple_mapping();
    let run_dir = dir.path().join("run");
    let outcome = ExportPipeline::new(&mapping).run(&[&pdf], &run_dir).unwrap();

    assert_eq!(outcome.xml_files.len(), 2);
    assert_eq!(outcome.rows.len(), 1);
    assert_eq!(outcome.rows[0].get("ColA"), Some("y"));
}

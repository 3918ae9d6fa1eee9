use crate::expand::{expand_file, RowRecord};
use crate::mapping::FieldMapping;
use crate::materialize::materialize;
use crate::{ExportError, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ── ExportLayout ─────────────────────────────────────────────────────────────

/// Filesystem layout of one export run under a base directory.
///
/// Each run is keyed by a 14-digit local timestamp:
///
/// ```text
/// <base>/extracted_xml/<YYYYMMDDHHMMSS>/   materialized .xml files
/// <base>/output_<YYYYMMDDHHMMSS>.csv       the flattened CSV
/// ```
#[derive(Debug, Clone)]
pub struct ExportLayout {
    base: PathBuf,
}

impl ExportLayout {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base: base.into() }
    }

    /// The current local time as a 14-digit run key.
    pub fn timestamp() -> String {
        Local::now().format("%Y%m%d%H%M%S").to_string()
    }

    /// Directory receiving this run's materialized files.
    pub fn run_dir(&self, timestamp: &str) -> PathBuf {
        self.base.join("extracted_xml").join(timestamp)
    }

    /// This run's CSV file, sibling of `extracted_xml`.
    pub fn csv_path(&self, timestamp: &str) -> PathBuf {
        self.base.join(format!("output_{timestamp}.csv"))
    }
}

// ── Pipeline results ─────────────────────────────────────────────────────────

/// Rows and files produced by [`ExportPipeline::run`].
#[derive(Debug)]
pub struct ExportOutcome {
    /// Flattened rows in PDF order, then materialized-file order.
    pub rows: Vec<RowRecord>,

    /// Every `.xml` file written, in the same order.
    pub xml_files: Vec<PathBuf>,

    /// The directory the files were written into.
    pub run_dir: PathBuf,
}

/// What [`ExportPipeline::run_to_csv`] reports back to the caller.
#[derive(Debug)]
pub struct ExportSummary {
    pub csv_path: PathBuf,
    pub run_dir: PathBuf,
    pub xml_files: usize,
    pub rows: usize,
}

// ── ExportPipeline ───────────────────────────────────────────────────────────

/// Orchestrates materialization and row expansion over a batch of PDFs.
pub struct ExportPipeline<'a> {
    mapping: &'a FieldMapping,
}

impl<'a> ExportPipeline<'a> {
    pub fn new(mapping: &'a FieldMapping) -> Self {
        Self { mapping }
    }

    /// Materialize every PDF's XML attachments into `run_dir` and expand each
    /// materialized file into rows.
    ///
    /// Preconditions are checked before any I/O: an empty mapping refuses
    /// with [`ExportError::MappingEmpty`], an empty batch with
    /// [`ExportError::NoPdfsSelected`]. A PDF that fails to open contributes
    /// zero rows and the batch continues; only filesystem errors abort.
    pub fn run<P: AsRef<Path>>(&self, pdf_paths: &[P], run_dir: &Path) -> Result<ExportOutcome> {
        if self.mapping.is_empty() {
            return Err(ExportError::MappingEmpty);
        }
        if pdf_paths.is_empty() {
            return Err(ExportError::NoPdfsSelected);
        }

        let mut rows = Vec::new();
        let mut xml_files = Vec::new();

        for path in pdf_paths {
            let path = path.as_ref();
            let written = match materialize(path, run_dir) {
                Ok(files) => files,
                Err(e @ ExportError::ContainerOpen { .. }) => {
                    warn!(pdf = %path.display(), "skipping PDF: {e}");
                    continue;
                }
                Err(e) => return Err(e),
            };
            for file in &written {
                rows.extend(expand_file(file, self.mapping));
            }
            xml_files.extend(written);
        }

        Ok(ExportOutcome {
            rows,
            xml_files,
            run_dir: run_dir.to_path_buf(),
        })
    }

    /// Full export: stamp a run, materialize, expand, and write the CSV.
    ///
    /// The CSV is written even when zero rows were produced (header only).
    /// A serialization failure is terminal for the run; already-materialized
    /// XML files are left in place, not rolled back.
    pub fn run_to_csv<P: AsRef<Path>>(
        &self,
        pdf_paths: &[P],
        layout: &ExportLayout,
    ) -> Result<ExportSummary> {
        let timestamp = ExportLayout::timestamp();
        let run_dir = layout.run_dir(&timestamp);

        let outcome = self.run(pdf_paths, &run_dir)?;

        let csv_path = layout.csv_path(&timestamp);
        write_csv(&csv_path, self.mapping, &outcome.rows)?;

        info!(
            csv = %csv_path.display(),
            rows = outcome.rows.len(),
            xml_files = outcome.xml_files.len(),
            "export complete"
        );

        Ok(ExportSummary {
            csv_path,
            run_dir: outcome.run_dir,
            xml_files: outcome.xml_files.len(),
            rows: outcome.rows.len(),
        })
    }
}

// ── CSV serialization ────────────────────────────────────────────────────────

/// Write the header row (the mapping's columns, in order) and one line per
/// [`RowRecord`].
pub fn write_csv(path: &Path, mapping: &FieldMapping, rows: &[RowRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(mapping.columns())?;
    for row in rows {
        writer.write_record(row.values())?;
    }
    writer.flush()?;
    Ok(())
}

//! CLI front-end for the pdfxml2csv library.
//!
//! The three subcommands mirror the interactive workflow: `discover` previews
//! the XML tags available in a batch of PDFs (in memory, nothing written),
//! `mapping` edits the persisted tag-to-column configuration, and `export`
//! materializes the attachments and writes the flattened CSV.

use clap::{Parser, Subcommand};
use pdfxml2csv::{discover, ExportLayout, ExportPipeline, FieldMapping, Result};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "pdfxml2csv",
    version,
    about = "Extract embedded XML attachments from PDFs and flatten them into CSV"
)]
struct Cli {
    /// Path to the tag-to-column mapping file
    #[arg(
        short,
        long,
        global = true,
        default_value = "mapping_config.json",
        value_name = "FILE"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan PDFs in memory and list the distinct XML tags found
    Discover {
        /// PDF files to scan
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,

        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Extract XML attachments to disk and write the flattened CSV
    Export {
        /// PDF files to export
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,

        /// Base directory for extracted files and the CSV
        #[arg(short, long, default_value = ".", value_name = "DIR")]
        out_dir: PathBuf,
    },
    /// Inspect or edit the tag-to-column mapping
    Mapping {
        #[command(subcommand)]
        action: MappingAction,
    },
}

#[derive(Subcommand)]
enum MappingAction {
    /// Print the current mapping
    Show,
    /// Map an XML tag to a CSV column header
    Set { tag: String, column: String },
    /// Remove a tag from the mapping
    Unset { tag: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Discover { pdfs, json } => run_discover(&pdfs, &cli.config, json),
        Commands::Export { pdfs, out_dir } => run_export(&pdfs, &cli.config, out_dir),
        Commands::Mapping { action } => run_mapping(action, &cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_discover(pdfs: &[PathBuf], config: &Path, json: bool) -> Result<()> {
    let mapping = FieldMapping::load(config)?;
    let report = discover(pdfs);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("report serializes to JSON")
        );
        return Ok(());
    }

    if report.tags.is_empty() {
        println!("No XML attachments found in the selected PDF(s).");
    } else {
        println!("{:<40} CSV column", "XML tag");
        for tag in &report.tags {
            println!("{:<40} {}", tag, mapping.column_for(tag).unwrap_or(""));
        }
        println!();
    }

    println!(
        "Discovered {} unique tag(s); {} of {} PDF(s) contained XML.",
        report.tags.len(),
        report.pdfs_with_xml,
        report.pdfs_scanned
    );
    if report.pdfs_failed > 0 {
        println!("{} PDF(s) could not be opened.", report.pdfs_failed);
    }
    Ok(())
}

fn run_export(pdfs: &[PathBuf], config: &Path, out_dir: PathBuf) -> Result<()> {
    let mapping = FieldMapping::load(config)?;
    let layout = ExportLayout::new(out_dir);

    let summary = ExportPipeline::new(&mapping).run_to_csv(pdfs, &layout)?;

    println!(
        "Extracted {} XML file(s) into {}",
        summary.xml_files,
        summary.run_dir.display()
    );
    println!(
        "Wrote {} row(s) to {}",
        summary.rows,
        summary.csv_path.display()
    );
    Ok(())
}

fn run_mapping(action: MappingAction, config: &Path) -> Result<()> {
    match action {
        MappingAction::Show => {
            let mapping = FieldMapping::load(config)?;
            if mapping.is_empty() {
                println!("(no mapping configured)");
            } else {
                for (tag, column) in mapping.entries() {
                    println!("{tag} -> {column}");
                }
            }
        }
        MappingAction::Set { tag, column } => {
            let mut mapping = FieldMapping::load(config)?;
            mapping.insert(tag.as_str(), column.as_str());
            mapping.save(config)?;
            println!("Mapped '{tag}' -> '{column}'");
        }
        MappingAction::Unset { tag } => {
            let mut mapping = FieldMapping::load(config)?;
            if mapping.remove(&tag) {
                mapping.save(config)?;
                println!("Removed '{tag}'");
            } else {
                println!("'{tag}' was not mapped");
            }
        }
    }
    Ok(())
}

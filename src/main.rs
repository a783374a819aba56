//! Main entry point for the iconzip CLI application.
//!
//! This binary loads a source image from a local path or HTTP URL, renders
//! the configured icon sizes and writes them as a ZIP archive or as
//! individual PNG files.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use iconzip::icon::GeneratedIcon;
use iconzip::io::open_source;
use iconzip::{BulkExport, Cli, ExportedFile, IconPipeline, ZipParser};

/// Application entry point.
///
/// Parses command-line arguments, loads the source image and dispatches to
/// the requested export mode.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let source = open_source(&cli.input)?;
    let bytes = source
        .fetch()
        .await
        .with_context(|| format!("Failed to load {}", source.describe()))?;

    let mut pipeline = IconPipeline::new(cli.pipeline_config()?)?;
    let quiet = cli.is_quiet();
    let icons = pipeline
        .generate_from_bytes(&bytes, |progress| {
            if !quiet {
                eprintln!("[{:>3.0}%] {}", progress.percent(), progress.label());
            }
        })
        .await
        .with_context(|| format!("Failed to generate icons from {}", source.describe()))?;

    if !quiet {
        print_summary(&icons);
    }

    let output_dir = cli.output_dir();

    // Single icon mode: write just the requested size
    if let Some(size) = cli.export {
        let file = pipeline.export_one(size)?;
        write_file(&output_dir, &file, &cli).await?;
        return Ok(());
    }

    // Separate mode: one PNG per size, no archive
    if cli.separate {
        let files: Vec<ExportedFile> = icons.iter().map(ExportedFile::from).collect();
        return write_files(&output_dir, &files, &cli).await;
    }

    match pipeline.export_archive()? {
        BulkExport::Archive { bytes, entries } => {
            let archive_path = output_dir.join(&cli.archive_name);
            let written = write_output(&archive_path, &bytes, &cli).await?;

            if written && !quiet {
                println!(
                    "Created: {} ({} icons, {})",
                    archive_path.display(),
                    entries,
                    format_size(bytes.len() as u64)
                );
            }

            // Only an archive that reached the disk is tested
            if cli.test {
                if written {
                    test_archive(&bytes, &cli.archive_name, cli.is_very_quiet())?;
                } else if !cli.is_very_quiet() {
                    eprintln!(
                        "Not testing: {} was not written",
                        archive_path.display()
                    );
                }
            }
        }
        BulkExport::Individual { files, cause } => {
            // Degraded path: the archive could not be built, so write
            // every icon on its own in the configured order
            if !cli.is_very_quiet() {
                eprintln!("Packing failed ({cause}), writing icons individually");
            }
            write_files(&output_dir, &files, &cli).await?;
        }
    }

    Ok(())
}

/// Print one line per generated icon.
fn print_summary(icons: &[GeneratedIcon]) {
    for icon in icons {
        println!(
            "  generated: {:<14} {:>10}",
            icon.file_name(),
            format_size(icon.bytes.len() as u64)
        );
    }
}

/// Write several exported files into `dir`, in order.
async fn write_files(dir: &Path, files: &[ExportedFile], cli: &Cli) -> Result<()> {
    for file in files {
        write_file(dir, file, cli).await?;
    }
    Ok(())
}

/// Write one exported file into `dir`.
async fn write_file(dir: &Path, file: &ExportedFile, cli: &Cli) -> Result<()> {
    let path: PathBuf = dir.join(&file.name);
    if write_output(&path, &file.bytes, cli).await? && !cli.is_quiet() {
        println!("  writing: {}", path.display());
    }
    Ok(())
}

/// Write bytes to `path`, honoring the overwrite options.
///
/// # Arguments
///
/// * `path` - Destination file
/// * `bytes` - File contents
/// * `cli` - Parsed command-line arguments (overwrite and quiet flags)
///
/// # Returns
///
/// Returns `Ok(true)` if the file was written, `Ok(false)` if an existing
/// file was left alone.
async fn write_output(path: &Path, bytes: &[u8], cli: &Cli) -> Result<bool> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        if cli.never_overwrite {
            // -n flag: never overwrite, skip silently (unless quiet)
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", path.display());
            }
            return Ok(false);
        }

        if !cli.overwrite {
            // Default behavior: skip with suggestion to use -o
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", path.display());
            }
            return Ok(false);
        }
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(true)
}

/// Re-read an archive and check every entry against its CRC-32.
///
/// Output follows `unzip -t`: one line per entry, then a summary.
fn test_archive(bytes: &[u8], name: &str, silent: bool) -> Result<()> {
    let parser = ZipParser::new(bytes);
    let entries = parser
        .list_files()
        .with_context(|| format!("Failed to read back {name}"))?;

    for entry in &entries {
        parser
            .read_file(entry)
            .with_context(|| format!("Archive test failed for {}", entry.file_name))?;
        if !silent {
            println!("    testing: {:<20} OK", entry.file_name);
        }
    }

    if !silent {
        println!("No errors detected in {name} ({} entries).", entries.len());
    }
    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

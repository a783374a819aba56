//! # iconzip
//!
//! Turn one source image into a set of square PNG icons and pack them into
//! a ZIP archive.
//!
//! Every icon is the source scaled to fit with its aspect ratio preserved
//! and centered on a transparent canvas. The archive is written by hand as
//! a stored (uncompressed) ZIP, with its own table-driven CRC-32, and opens
//! in any standard unzip tool.
//!
//! ## Features
//!
//! - Aspect-fit rasterization to any set of sizes (default 128, 48, 32, 16)
//! - Stored ZIP writer with streaming output and format-limit checks
//! - Per-file export fallback when the archive cannot be built
//! - Source images from the local filesystem or HTTP/HTTPS URLs
//!
//! ## Example
//!
//! ```no_run
//! use iconzip::{BulkExport, IconPipeline, ImageSource, LocalFileSource, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bytes = LocalFileSource::new("logo.png").fetch().await?;
//!
//!     let mut pipeline = IconPipeline::new(PipelineConfig::default())?;
//!     pipeline
//!         .generate_from_bytes(&bytes, |progress| println!("{progress}"))
//!         .await?;
//!
//!     if let BulkExport::Archive { bytes, .. } = pipeline.export_archive()? {
//!         std::fs::write("icons.zip", bytes)?;
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod icon;
pub mod io;
pub mod pipeline;
pub mod zip;

pub use cli::Cli;
pub use error::{IconError, Result};
pub use icon::{GeneratedIcon, SourceImage};
pub use io::{HttpImageSource, ImageSource, LocalFileSource};
pub use pipeline::{BulkExport, ExportedFile, IconPipeline, PipelineConfig};
pub use zip::{ZipParser, ZipWriter};

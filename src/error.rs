//! Error type shared by the rasterizer, the archive writer and the pipeline.

use thiserror::Error;

/// Errors surfaced by icon generation and export.
///
/// Each stage fails with its own variant so a caller can tell a bad source
/// image apart from a failed size, a failed archive or a missing icon.
#[derive(Debug, Error)]
pub enum IconError {
    /// The source bytes are not an image we can decode.
    #[error("failed to decode source image: {0}")]
    ImageDecode(String),

    /// Rendering or encoding one icon size failed.
    #[error("failed to rasterize {size}x{size} icon: {reason}")]
    Rasterize { size: u32, reason: String },

    /// The archive could not be built from the generated icons.
    #[error("failed to assemble archive: {0}")]
    ArchiveAssembly(String),

    /// No icon of the requested size exists in the current run.
    #[error("no icon generated for size {0}")]
    ExportTargetMissing(u32),

    /// Bulk export requested before any icon was generated.
    #[error("no icons available to export")]
    NothingToExport,

    /// The configured size list cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IconError>;

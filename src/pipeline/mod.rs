//! Icon generation and export pipeline.
//!
//! [`IconPipeline`] owns the icons of one run. A run moves through
//! [`PipelineState::Idle`] → [`PipelineState::Generating`] →
//! [`PipelineState::Ready`]; starting a new run or calling
//! [`reset`](IconPipeline::reset) drops everything from the previous one.
//!
//! Sizes are processed strictly one after another in configured order, and
//! that same order is used for progress, for the archive and for the
//! per-file fallback export.

mod config;
mod progress;

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{IconError, Result};
use crate::icon::{GeneratedIcon, PngRasterizer, Rasterizer, SourceImage};
use crate::zip;

pub use config::{DEFAULT_SIZES, PipelineConfig, RasterizePolicy};
pub use progress::Progress;

/// File name for the bulk export archive.
pub const ARCHIVE_NAME: &str = "icons.zip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Generating,
    Ready,
}

/// A named file ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl From<&GeneratedIcon> for ExportedFile {
    fn from(icon: &GeneratedIcon) -> Self {
        Self {
            name: icon.file_name(),
            bytes: icon.preview(),
        }
    }
}

/// Result of a bulk export.
#[derive(Debug)]
pub enum BulkExport {
    /// All icons packed into one stored ZIP archive.
    Archive { bytes: Vec<u8>, entries: usize },
    /// The archive could not be built; every icon is exported on its own,
    /// in configured order.
    Individual {
        files: Vec<ExportedFile>,
        cause: IconError,
    },
}

/// Generates icons for a configured set of sizes and exports them.
///
/// ## Example
///
/// ```no_run
/// use iconzip::pipeline::{BulkExport, IconPipeline, PipelineConfig};
///
/// # async fn run(bytes: Vec<u8>) -> iconzip::Result<()> {
/// let mut pipeline = IconPipeline::new(PipelineConfig::default())?;
/// pipeline
///     .generate_from_bytes(&bytes, |p| eprintln!("{}", p.label()))
///     .await?;
///
/// match pipeline.export_archive()? {
///     BulkExport::Archive { bytes, .. } => std::fs::write("icons.zip", bytes)?,
///     BulkExport::Individual { files, .. } => {
///         for file in files {
///             std::fs::write(&file.name, &file.bytes)?;
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct IconPipeline<R: Rasterizer = PngRasterizer> {
    config: PipelineConfig,
    rasterizer: R,
    state: PipelineState,
    icons: HashMap<u32, GeneratedIcon>,
}

impl IconPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_rasterizer(config, PngRasterizer)
    }
}

impl<R: Rasterizer> IconPipeline<R> {
    pub fn with_rasterizer(config: PipelineConfig, rasterizer: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rasterizer,
            state: PipelineState::Idle,
            icons: HashMap::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sizes(&self) -> &[u32] {
        &self.config.sizes
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Decode `bytes` and generate every configured size.
    ///
    /// Icons from a previous run are dropped before decoding, so a decode
    /// failure leaves the pipeline idle and empty.
    ///
    /// # Errors
    ///
    /// [`IconError::ImageDecode`] if the bytes are not a decodable image,
    /// otherwise as [`generate_all`](Self::generate_all).
    pub async fn generate_from_bytes<F>(
        &mut self,
        bytes: &[u8],
        on_progress: F,
    ) -> Result<Vec<GeneratedIcon>>
    where
        F: FnMut(&Progress),
    {
        self.reset();
        let source = SourceImage::decode(bytes)?;
        debug!(
            "Decoded {}x{} {:?} source image",
            source.width(),
            source.height(),
            source.format()
        );
        self.generate_all(&source, on_progress).await
    }

    /// Generate every configured size from `source`.
    ///
    /// `on_progress` is called before each size is rendered. Returns the
    /// generated icons in configured order.
    ///
    /// # Errors
    ///
    /// With [`RasterizePolicy::Abort`], the first rasterization error is
    /// returned and the pipeline is left idle with no icons. With
    /// [`RasterizePolicy::Skip`] failed sizes are left out and the run
    /// still completes.
    pub async fn generate_all<F>(
        &mut self,
        source: &SourceImage,
        mut on_progress: F,
    ) -> Result<Vec<GeneratedIcon>>
    where
        F: FnMut(&Progress),
    {
        self.reset();
        self.state = PipelineState::Generating;

        let total = self.config.sizes.len();
        for (index, &size) in self.config.sizes.iter().enumerate() {
            on_progress(&Progress {
                step: index + 1,
                total,
                size,
            });

            match self.rasterizer.rasterize(source, size) {
                Ok(bytes) => {
                    debug!("Rasterized {size}x{size} icon ({} bytes)", bytes.len());
                    self.icons.insert(size, GeneratedIcon::new(size, bytes));
                }
                Err(e) => match self.config.policy {
                    RasterizePolicy::Abort => {
                        warn!("Aborting run at {size}x{size}: {e}");
                        self.icons.clear();
                        self.state = PipelineState::Idle;
                        return Err(e);
                    }
                    RasterizePolicy::Skip => {
                        warn!("Skipping {size}x{size} icon: {e}");
                    }
                },
            }

            if index + 1 < total {
                if self.config.yield_between_steps {
                    tokio::task::yield_now().await;
                }
                if let Some(delay) = self.config.step_delay {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        self.state = PipelineState::Ready;
        info!("Generated {} of {} icon sizes", self.icons.len(), total);
        Ok(self.icons())
    }

    /// Generated icons in configured order.
    pub fn icons(&self) -> Vec<GeneratedIcon> {
        self.config
            .sizes
            .iter()
            .filter_map(|size| self.icons.get(size).cloned())
            .collect()
    }

    pub fn icon(&self, size: u32) -> Option<&GeneratedIcon> {
        self.icons.get(&size)
    }

    /// Export a single icon as `icon{size}.png`.
    ///
    /// # Errors
    ///
    /// [`IconError::ExportTargetMissing`] if no icon of that size exists in
    /// the current run. The pipeline is not changed.
    pub fn export_one(&self, size: u32) -> Result<ExportedFile> {
        self.icons
            .get(&size)
            .map(ExportedFile::from)
            .ok_or(IconError::ExportTargetMissing(size))
    }

    /// Export all icons as one archive.
    ///
    /// If the archive cannot be assembled this falls back to
    /// [`BulkExport::Individual`] instead of failing.
    ///
    /// # Errors
    ///
    /// [`IconError::NothingToExport`] unless a run has completed with at
    /// least one icon.
    pub fn export_archive(&self) -> Result<BulkExport> {
        if self.state != PipelineState::Ready || self.icons.is_empty() {
            return Err(IconError::NothingToExport);
        }

        let icons = self.icons();
        let entries = icons
            .iter()
            .map(|icon| (icon.file_name(), icon.bytes.as_ref()));

        match zip::assemble_with_limits(entries, self.config.archive_limits) {
            Ok(bytes) => Ok(BulkExport::Archive {
                bytes,
                entries: icons.len(),
            }),
            Err(cause) => {
                warn!("Archive export failed, exporting icons individually: {cause}");
                Ok(BulkExport::Individual {
                    files: icons.iter().map(ExportedFile::from).collect(),
                    cause,
                })
            }
        }
    }

    /// Drop all generated icons and return to [`PipelineState::Idle`].
    pub fn reset(&mut self) {
        if !self.icons.is_empty() {
            debug!("Releasing {} generated icons", self.icons.len());
        }
        self.icons.clear();
        self.state = PipelineState::Idle;
    }
}

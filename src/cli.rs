use clap::Parser;
use std::path::PathBuf;

use crate::error::Result;
use crate::pipeline::{ARCHIVE_NAME, DEFAULT_SIZES, PipelineConfig, RasterizePolicy};

#[derive(Parser, Debug)]
#[command(name = "iconzip")]
#[command(version)]
#[command(about = "Generate square PNG icons from an image and pack them into a ZIP", long_about = None)]
#[command(after_help = "Examples:\n  \
  iconzip logo.png                       write icons.zip with 128/48/32/16 px icons\n  \
  iconzip logo.png -s 256,64 -d out      write out/icons.zip with 256 and 64 px icons\n  \
  iconzip logo.png -e 48                 write only icon48.png\n  \
  iconzip -t https://example.com/a.png   fetch the source over HTTP, test the archive")]
pub struct Cli {
    /// Source image path or HTTP URL
    #[arg(value_name = "IMAGE")]
    pub input: String,

    /// Icon sizes in pixels, comma separated
    #[arg(
        short = 's',
        long = "sizes",
        value_name = "SIZES",
        value_delimiter = ',',
        default_values_t = DEFAULT_SIZES,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub sizes: Vec<u32>,

    /// Write files into DIR
    #[arg(short = 'd', value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Archive file name
    #[arg(short = 'a', value_name = "NAME", default_value = ARCHIVE_NAME)]
    pub archive_name: String,

    /// Export only the icon of this size
    #[arg(
        short = 'e',
        value_name = "SIZE",
        conflicts_with = "separate",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub export: Option<u32>,

    /// Write each icon as its own file instead of an archive
    #[arg(long)]
    pub separate: bool,

    /// Leave out sizes that fail to render instead of stopping
    #[arg(long)]
    pub skip_failed: bool,

    /// Test the archive after writing it
    #[arg(short = 't')]
    pub test: bool,

    /// Never overwrite existing files
    #[arg(short = 'n', conflicts_with = "overwrite")]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Pipeline settings for the requested sizes and failure handling.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let policy = if self.skip_failed {
            RasterizePolicy::Skip
        } else {
            RasterizePolicy::Abort
        };
        Ok(PipelineConfig::with_sizes(self.sizes.clone())?.policy(policy))
    }
}

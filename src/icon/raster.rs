//! Aspect-fit rendering of a source image onto a square transparent canvas.

use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::{IconError, Result};

use super::SourceImage;

/// Where the scaled source lands on a square canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Fit a `src_width × src_height` image into a `size × size` box.
///
/// The scale factor is `min(size / src_width, size / src_height)`: the
/// longer axis becomes exactly `size`, the shorter one is rounded down
/// (never below one pixel), and the result is centered.
///
/// Returns `None` if any dimension or `size` is zero.
///
/// # Examples
///
/// ```
/// use iconzip::icon::{Placement, fit_within};
///
/// let p = fit_within(200, 100, 128);
/// assert_eq!(p, Some(Placement { x: 0, y: 32, width: 128, height: 64 }));
/// assert_eq!(fit_within(0, 100, 128), None);
/// ```
pub fn fit_within(src_width: u32, src_height: u32, size: u32) -> Option<Placement> {
    if src_width == 0 || src_height == 0 || size == 0 {
        return None;
    }

    let scale_axis = |short: u32, long: u32| -> u32 {
        let scaled = short as u64 * size as u64 / long as u64;
        (scaled as u32).max(1)
    };

    let (width, height) = if src_width >= src_height {
        (size, scale_axis(src_height, src_width))
    } else {
        (scale_axis(src_width, src_height), size)
    };

    Some(Placement {
        x: (size - width) / 2,
        y: (size - height) / 2,
        width,
        height,
    })
}

/// Render `source` centered on a transparent `size × size` canvas.
pub fn render(source: &SourceImage, size: u32) -> Result<RgbaImage> {
    let placement =
        fit_within(source.width(), source.height(), size).ok_or_else(|| IconError::Rasterize {
            size,
            reason: "icon size must be positive".to_string(),
        })?;
    let scaled = imageops::resize(
        source.pixels(),
        placement.width,
        placement.height,
        FilterType::Triangle,
    );

    let mut canvas = RgbaImage::new(size, size);
    imageops::replace(&mut canvas, &scaled, placement.x as i64, placement.y as i64);
    Ok(canvas)
}

/// Render `source` at `size` and encode the canvas as PNG.
pub fn rasterize(source: &SourceImage, size: u32) -> Result<Vec<u8>> {
    let canvas = render(source, size)?;

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(canvas.as_raw(), size, size, ExtendedColorType::Rgba8)
        .map_err(|e| IconError::Rasterize {
            size,
            reason: e.to_string(),
        })?;

    Ok(png)
}

/// Turns a decoded source into the encoded bytes of one icon size.
///
/// [`IconPipeline`](crate::pipeline::IconPipeline) is generic over this so
/// the rendering backend can be swapped.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, source: &SourceImage, size: u32) -> Result<Vec<u8>>;
}

/// The default backend: bilinear resampling, PNG output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngRasterizer;

impl Rasterizer for PngRasterizer {
    fn rasterize(&self, source: &SourceImage, size: u32) -> Result<Vec<u8>> {
        rasterize(source, size)
    }
}

//! Source image decoding and icon rasterization.
//!
//! A [`SourceImage`] is decoded once and then rendered at every configured
//! size by [`rasterize`]: scaled to fit with its aspect ratio preserved,
//! centered on a transparent square canvas, and encoded as PNG.

mod raster;

use std::fmt;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use crate::error::{IconError, Result};

pub use raster::{Placement, PngRasterizer, Rasterizer, fit_within, rasterize, render};

/// File name used for an icon of `size` pixels, e.g. `icon128.png`.
pub fn icon_file_name(size: u32) -> String {
    format!("icon{size}.png")
}

/// A decoded, immutable RGBA source image.
#[derive(Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
    format: Option<ImageFormat>,
}

impl SourceImage {
    /// Decode an encoded image (PNG, JPEG, GIF, WebP, ...).
    ///
    /// The container format is sniffed from the leading bytes first, so
    /// non-image input is rejected before any decoding is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`IconError::ImageDecode`] if the bytes are not a supported
    /// image or the image cannot be decoded.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)
            .map_err(|_| IconError::ImageDecode("unrecognized image format".to_string()))?;

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| IconError::ImageDecode(format!("{format:?}: {e}")))?;

        let mut source = Self::from_rgba(decoded.into_rgba8())?;
        source.format = Some(format);
        Ok(source)
    }

    /// Wrap an already decoded RGBA buffer.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(IconError::ImageDecode(format!(
                "image has no pixels ({}x{})",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self {
            pixels,
            format: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Container format the image was decoded from, if any.
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("format", &self.format)
            .finish()
    }
}

/// One rendered icon.
///
/// The encoded bytes are shared: cloning the icon or taking a
/// [`preview`](GeneratedIcon::preview) handle does not copy them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedIcon {
    pub size: u32,
    pub bytes: Arc<[u8]>,
}

impl GeneratedIcon {
    pub fn new(size: u32, bytes: Vec<u8>) -> Self {
        Self {
            size,
            bytes: bytes.into(),
        }
    }

    pub fn file_name(&self) -> String {
        icon_file_name(self.size)
    }

    /// Shared handle to the encoded bytes, e.g. for a live preview.
    pub fn preview(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn decodes_png() {
        let source = SourceImage::decode(&png_bytes(20, 10)).unwrap();
        assert_eq!((source.width(), source.height()), (20, 10));
        assert_eq!(source.format(), Some(ImageFormat::Png));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = SourceImage::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, IconError::ImageDecode(_)));
    }

    #[test]
    fn rejects_truncated_image() {
        let png = png_bytes(20, 10);
        let err = SourceImage::decode(&png[..png.len() / 2]).unwrap_err();
        assert!(matches!(err, IconError::ImageDecode(_)));
    }

    #[test]
    fn rejects_empty_buffer() {
        let err = SourceImage::from_rgba(RgbaImage::new(0, 5)).unwrap_err();
        assert!(matches!(err, IconError::ImageDecode(_)));
    }

    #[test]
    fn file_names() {
        assert_eq!(icon_file_name(16), "icon16.png");
        assert_eq!(GeneratedIcon::new(128, vec![1]).file_name(), "icon128.png");
    }

    #[test]
    fn preview_shares_bytes() {
        let icon = GeneratedIcon::new(32, vec![1, 2, 3]);
        let handle = icon.preview();
        assert!(Arc::ptr_eq(&handle, &icon.bytes));
        assert_eq!(Arc::strong_count(&icon.bytes), 2);
        drop(handle);
        assert_eq!(Arc::strong_count(&icon.bytes), 1);
    }
}

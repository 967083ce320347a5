//! # Masking - Alpha-Channel Pixel Transforms
//!
//! Converts exported layer images into the grayscale masks the inpainting
//! backend consumes. Two transforms are provided:
//!
//! - **[`alpha_to_mask`]**: write each pixel's alpha into its RGB channels
//!   and force alpha fully opaque, so layer coverage becomes a grayscale
//!   mask
//! - **[`flatten_alpha`]**: discard transparency without touching RGB,
//!   optionally re-encoding as JPEG for bandwidth
//!
//! Both operate on [`ImagePayload`] data URIs at the boundary and on raw
//! `RgbaImage` buffers internally, so the pixel loops stay pure and
//! synchronous.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inpaint_common::ImagePayload;
//!
//! # fn run(layer: ImagePayload) -> masking::Result<()> {
//! let mask = masking::alpha_to_mask(&layer)?;
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::{MaskError, Result};

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use inpaint_common::ImagePayload;
use tracing::debug;

/// Output encoding for [`flatten_alpha`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlattenFormat {
    /// Lossless PNG
    #[default]
    Png,
    /// Lossy JPEG at the given quality (1-100)
    Jpeg { quality: u8 },
}

/// Convert a layer export's alpha channel into a grayscale mask image.
///
/// Every pixel's alpha value is written into its red, green, and blue
/// channels, and the alpha channel is forced fully opaque. The result is a
/// PNG payload whose brightness encodes the source's coverage.
///
/// Pixels are read as straight (non-premultiplied) RGBA; a premultiplied
/// source codec would yield a subtly wrong mask. See DESIGN.md.
pub fn alpha_to_mask(payload: &ImagePayload) -> Result<ImagePayload> {
    let mut pixels = decode_rgba(payload)?;
    alpha_to_mask_pixels(&mut pixels);
    debug!(
        width = pixels.width(),
        height = pixels.height(),
        "extracted alpha mask"
    );
    encode_png(&pixels)
}

/// The pure pixel loop behind [`alpha_to_mask`]. A zero-sized buffer is a
/// zero-sized result, not an error.
pub fn alpha_to_mask_pixels(pixels: &mut RgbaImage) {
    for pixel in pixels.pixels_mut() {
        let alpha = pixel[3];
        *pixel = Rgba([alpha, alpha, alpha, u8::MAX]);
    }
}

/// Force every pixel opaque without altering RGB, re-encoding in the
/// requested format.
pub fn flatten_alpha(payload: &ImagePayload, format: FlattenFormat) -> Result<ImagePayload> {
    let mut pixels = decode_rgba(payload)?;
    flatten_alpha_pixels(&mut pixels);
    match format {
        FlattenFormat::Png => encode_png(&pixels),
        FlattenFormat::Jpeg { quality } => encode_jpeg(pixels, quality),
    }
}

/// The pure pixel loop behind [`flatten_alpha`].
pub fn flatten_alpha_pixels(pixels: &mut RgbaImage) {
    for pixel in pixels.pixels_mut() {
        pixel[3] = u8::MAX;
    }
}

fn decode_rgba(payload: &ImagePayload) -> Result<RgbaImage> {
    let bytes = payload.decode_bytes()?;
    let image = image::load_from_memory(&bytes)?;
    Ok(image.into_rgba8())
}

fn encode_png(pixels: &RgbaImage) -> Result<ImagePayload> {
    let mut buffer = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(MaskError::ImageEncodeFailed)?;
    Ok(ImagePayload::from_png_bytes(&buffer))
}

fn encode_jpeg(pixels: RgbaImage, quality: u8) -> Result<ImagePayload> {
    // JPEG carries no alpha channel; drop it after flattening.
    let rgb = DynamicImage::ImageRgba8(pixels).into_rgb8();
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode_image(&rgb)
        .map_err(MaskError::ImageEncodeFailed)?;
    Ok(ImagePayload::from_bytes(&buffer, "image/jpeg"))
}

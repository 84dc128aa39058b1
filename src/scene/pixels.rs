//! Pixel-decoding capability for GCT0 textures.
//!
//! GameCube-family pixel formats (CMPR, RGB5A3, C8, ...) are decoded by the
//! host; this crate only locates the pixel buffer and hands it over.

use image::{Rgba, RgbaImage};

use crate::error::Result;

/// Decodes a raw GameCube-format pixel buffer into an RGBA image.
pub trait PixelDecoder {
    /// Decode `raw` as a `width`×`height` texture in the given format.
    /// `raw` runs from the texture's pixel-buffer offset to the end of the
    /// record's bounded view; implementations take the bytes they need.
    fn decode_texture(&self, raw: &[u8], width: u16, height: u16, format: u32) -> Result<RgbaImage>;
}

/// A decoder that produces a flat mid-gray image of the declared size.
///
/// For tooling that only cares about structure (inspection, tests, the
/// CLI); real viewers supply a GameCube pixel decoder instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderPixelDecoder;

impl PixelDecoder for PlaceholderPixelDecoder {
    fn decode_texture(
        &self,
        _raw: &[u8],
        width: u16,
        height: u16,
        _format: u32,
    ) -> Result<RgbaImage> {
        Ok(RgbaImage::from_pixel(
            u32::from(width),
            u32::from(height),
            Rgba([128, 128, 128, 255]),
        ))
    }
}

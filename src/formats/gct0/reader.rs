//! GCT0 texture record reading.
//!
//! A GCT0 record is a fixed big-endian header followed, at
//! `record start + data_offset`, by raw pixel data in a GameCube pixel
//! format. Pixel decoding itself is delegated to the host's
//! [`PixelDecoder`].

use super::GCT0_MAGIC;
use crate::error::{Error, Result};
use crate::formats::common::{ByteCursor, Endianness};
use crate::scene::{PixelDecoder, SceneTexture};

/// Fixed GCT0 header, minus the leading tag.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct Gct0Header {
    /// GameCube pixel format code.
    pub format: u32,
    pub width: u16,
    pub height: u16,
    pub reserved: u32,
    /// Pixel buffer offset relative to the record start.
    pub data_offset: u32,
}

/// Read a GCT0 header at the cursor's current position. The leading tag
/// must read "GCT0"; a mismatch is a local precondition failure the caller
/// is expected to tolerate, not a container-level abort.
pub fn read_gct0_header(cur: &mut ByteCursor<'_>) -> Result<Gct0Header> {
    let start = cur.position();
    let prev_endian = cur.endian();
    cur.set_endian(Endianness::Big);

    let result = (|| {
        if cur.read_tag(4)? != GCT0_MAGIC {
            return Err(Error::MissingGct0Magic { offset: start });
        }
        Ok(Gct0Header {
            format: cur.read_u32()?,
            width: cur.read_u16()?,
            height: cur.read_u16()?,
            reserved: cur.read_u32()?,
            data_offset: cur.read_u32()?,
        })
    })();

    cur.set_endian(prev_endian);
    result
}

/// Read one texture at the cursor's current position and decode its pixels.
///
/// When `name` is absent a synthetic `tex_<ordinal>` name is assigned.
/// Produces exactly one texture; the cursor's endianness is restored before
/// returning.
pub fn read_texture(
    cur: &mut ByteCursor<'_>,
    decoder: &dyn PixelDecoder,
    name: Option<String>,
    ordinal: usize,
) -> Result<SceneTexture> {
    let start = cur.position();
    let header = read_gct0_header(cur)?;

    let raw = cur.slice_from(start + u64::from(header.data_offset))?;
    let image = decoder.decode_texture(raw, header.width, header.height, header.format)?;

    Ok(SceneTexture {
        name: name.unwrap_or_else(|| format!("tex_{ordinal}")),
        format: header.format,
        width: header.width,
        height: header.height,
        image,
    })
}

/// A texture found by [`scan_textures`], with its record offset.
#[derive(Debug, Clone)]
pub struct ScannedTexture {
    /// Absolute offset of the GCT0 record in the scanned buffer.
    pub offset: u64,
    pub header: Gct0Header,
    pub texture: SceneTexture,
}

/// Scan a whole buffer for GCT0 records at 16-byte boundaries.
///
/// GCT0 records are 32-byte aligned in practice but the scan checks every
/// 16-byte stop to be safe. Records that fail to decode are skipped with a
/// diagnostic; this never fails outright.
pub fn scan_textures(data: &[u8], decoder: &dyn PixelDecoder) -> Vec<ScannedTexture> {
    let mut found = Vec::new();
    let mut cur = ByteCursor::new(data, Endianness::Big);

    let mut offset = 0u64;
    while offset + 16 <= cur.len() {
        if cur.slice(offset, offset + 4).is_ok_and(|b| b == b"GCT0") {
            match scan_one(&mut cur, offset, decoder, found.len()) {
                Ok(scanned) => found.push(scanned),
                Err(e) => tracing::warn!("skipping GCT0 record at {offset:#x}: {e}"),
            }
        }
        offset += 0x10;
    }

    found
}

fn scan_one(
    cur: &mut ByteCursor<'_>,
    offset: u64,
    decoder: &dyn PixelDecoder,
    ordinal: usize,
) -> Result<ScannedTexture> {
    cur.seek(offset)?;
    let header = read_gct0_header(cur)?;
    cur.seek(offset)?;
    let texture = read_texture(cur, decoder, None, ordinal)?;
    Ok(ScannedTexture {
        offset,
        header,
        texture,
    })
}

//! Per-attribute vertex codec table.
//!
//! Each vertex attribute type has a fixed encoded size and decode rule,
//! used both for attributes embedded in the triangle-strip stream and for
//! attributes fetched by index from a side buffer (where the size doubles
//! as the table stride).

use crate::error::{Error, Result};
use crate::formats::common::ByteCursor;

/// How one vertex attribute is stored relative to the strip stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Attribute bytes are inline in the strip stream.
    Embedded,
    /// The stream holds an 8-bit index into a side table.
    Indexed8,
    /// The stream holds a 16-bit index into a side table.
    Indexed16,
}

impl StorageMode {
    pub fn from_raw(mode: u8) -> Result<Self> {
        match mode {
            1 => Ok(Self::Embedded),
            2 => Ok(Self::Indexed8),
            3 => Ok(Self::Indexed16),
            _ => Err(Error::UnknownStorageMode { mode }),
        }
    }
}

/// Known vertex attribute types.
///
/// `ByteQuad`/`ByteQuadAlt` and `ShortPair` appear in real files but their
/// meaning is unconfirmed; they are decoded (so the stream stays in sync)
/// and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Raw bone-weight-group selector (divided by 3 to pick a group).
    BoneWeight,
    /// Single unknown byte, always present alongside type 0x1E streams.
    Filler,
    /// 3×f32 position.
    Position,
    /// 3×i8 normal, fixed-point /64.
    Normal,
    /// 4 signed bytes, unconfirmed meaning.
    ByteQuad,
    /// 4 signed bytes, sometimes identical to `ByteQuad`.
    ByteQuadAlt,
    /// 2×u16 texture coordinates, fixed-point mod 0x400 / 0x400.
    TexCoord,
    /// Second UV set, same encoding; feeds the lightmap channel.
    LightmapTexCoord,
    /// 2 signed shorts, unconfirmed meaning.
    ShortPair,
}

/// A decoded attribute value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    /// Bone-weight-group selector.
    Selector(u8),
    Byte(u8),
    Vec3([f32; 3]),
    Vec2([f32; 2]),
    Bytes4([i8; 4]),
    Shorts2([i16; 2]),
}

impl AttributeKind {
    /// Map the on-disk attribute type byte.
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::BoneWeight),
            1 => Some(Self::Filler),
            9 => Some(Self::Position),
            10 => Some(Self::Normal),
            11 => Some(Self::ByteQuad),
            12 => Some(Self::ByteQuadAlt),
            13 => Some(Self::TexCoord),
            14 => Some(Self::LightmapTexCoord),
            15 => Some(Self::ShortPair),
            _ => None,
        }
    }

    /// Encoded size in bytes; also the stride of this type's side tables.
    #[must_use]
    pub fn byte_size(self) -> u64 {
        match self {
            Self::BoneWeight | Self::Filler => 1,
            Self::Position => 12,
            Self::Normal => 3,
            Self::ByteQuad | Self::ByteQuadAlt | Self::TexCoord | Self::LightmapTexCoord
            | Self::ShortPair => 4,
        }
    }

    /// Decode one value of this type at the cursor's current position.
    pub fn decode(self, cur: &mut ByteCursor<'_>) -> Result<AttributeValue> {
        Ok(match self {
            Self::BoneWeight => AttributeValue::Selector(cur.read_u8()?),
            Self::Filler => AttributeValue::Byte(cur.read_u8()?),
            Self::Position => {
                AttributeValue::Vec3([cur.read_f32()?, cur.read_f32()?, cur.read_f32()?])
            }
            Self::Normal => {
                let mut n = [0.0f32; 3];
                for v in &mut n {
                    *v = f32::from(cur.read_i8()?) / 64.0;
                }
                AttributeValue::Vec3(n)
            }
            Self::ByteQuad | Self::ByteQuadAlt => {
                let mut q = [0i8; 4];
                for v in &mut q {
                    *v = cur.read_i8()?;
                }
                AttributeValue::Bytes4(q)
            }
            Self::TexCoord | Self::LightmapTexCoord => {
                let mut uv = [0.0f32; 2];
                for v in &mut uv {
                    *v = f32::from(cur.read_u16()? % 0x400) / 1024.0;
                }
                AttributeValue::Vec2(uv)
            }
            Self::ShortPair => AttributeValue::Shorts2([cur.read_i16()?, cur.read_i16()?]),
        })
    }
}

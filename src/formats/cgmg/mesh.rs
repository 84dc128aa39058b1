//! Per-bone mesh data: buffer headers, chunk headers, bone groups, morph
//! targets and the triangle-strip vertex stream.

use crate::error::{Error, Result};
use crate::formats::common::{AddressTable, ByteCursor, read_linked_list};
use crate::scene::{MeshBuilder, MorphFrame, VertexBoneGroup};

use super::vertex::{AttributeKind, AttributeValue, StorageMode};

/// Control byte opening one triangle-strip run; any other value ends the
/// chunk's vertex stream.
pub const STRIP_SENTINEL: u8 = 0x9F;

/// Describes where one vertex attribute lives and how it is encoded.
#[derive(Debug, Clone, Copy)]
pub struct BufferHeader {
    /// Side-table base address for indexed storage.
    pub address: u32,
    pub storage: StorageMode,
    /// Raw attribute type byte; mapped through [`AttributeKind::from_raw`]
    /// at decode time so an unknown type skips the chunk, not the model.
    pub kind_raw: u8,
    pub reserved: [u8; 6],
}

/// Associates a run of triangle-strip data with a material and an optional
/// bone-weight group list.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    pub triangle_addr: u32,
    pub material_addr: u32,
    /// Length of the strip data in 32-byte units.
    pub vertex_data_len: u16,
    pub reserved: u16,
    pub bone_group_addr: u32,
}

/// One morph-target descriptor.
#[derive(Debug, Clone, Copy)]
pub struct MorphHeader {
    pub weight: f32,
    pub id: u8,
    pub reserved: [u8; 3],
    pub data_addr: u32,
    pub junk: u32,
}

/// Read the flat (singly linked, untagged) buffer header list at the
/// cursor's current position.
pub fn read_buffer_headers(cur: &mut ByteCursor<'_>) -> Result<Vec<BufferHeader>> {
    read_linked_list(cur, false, None, None, |cur| {
        let address = cur.read_u32()?;
        let storage = StorageMode::from_raw(cur.read_u8()?)?;
        let kind_raw = cur.read_u8()?;
        let mut reserved = [0u8; 6];
        for slot in &mut reserved {
            *slot = cur.read_u8()?;
        }
        Ok(BufferHeader {
            address,
            storage,
            kind_raw,
            reserved,
        })
    })
}

/// Read the bidirectional chunk header list at the cursor's current
/// position.
pub fn read_chunk_headers(cur: &mut ByteCursor<'_>) -> Result<Vec<ChunkHeader>> {
    read_linked_list(cur, true, None, None, |cur| {
        Ok(ChunkHeader {
            triangle_addr: cur.read_u32()?,
            material_addr: cur.read_u32()?,
            vertex_data_len: cur.read_u16()?,
            reserved: cur.read_u16()?,
            bone_group_addr: cur.read_u32()?,
        })
    })
}

/// Read a bone's per-vertex bone-group table.
///
/// Three nested bidirectional lists: group-list addresses (whose node
/// addresses are the keys chunk headers reference), then bone-group
/// addresses, then `{bone address, weight}` pairs. Bone addresses resolve
/// through the skeleton table; a dangling one fails the load.
pub fn read_bone_groups(
    cur: &mut ByteCursor<'_>,
    addr: u32,
    bone_table: &AddressTable,
) -> Result<(AddressTable, Vec<Vec<VertexBoneGroup>>)> {
    let mut node_addresses = Vec::new();
    let mut group_lists = Vec::new();

    if addr != 0 {
        cur.seek(u64::from(addr))?;
        let list_addrs =
            read_linked_list(cur, true, Some(&mut node_addresses), None, ByteCursor::read_u32)?;

        let mut inner_addrs = Vec::with_capacity(list_addrs.len());
        for list_addr in list_addrs {
            cur.seek(u64::from(list_addr))?;
            inner_addrs.push(read_linked_list(cur, true, None, None, ByteCursor::read_u32)?);
        }

        for group_addrs in inner_addrs {
            let mut groups = Vec::with_capacity(group_addrs.len());
            for group_addr in group_addrs {
                cur.seek(u64::from(group_addr))?;
                let pairs = read_linked_list(cur, true, None, None, |cur| {
                    Ok((cur.read_u32()?, cur.read_f32()?))
                })?;

                let mut group = VertexBoneGroup::default();
                for (bone_addr, weight) in pairs {
                    group.bone_indices.push(bone_table.resolve(bone_addr)? as i32);
                    group.bone_weights.push(weight);
                }
                groups.push(group);
            }
            group_lists.push(groups);
        }
    }

    Ok((AddressTable::new("bone group", node_addresses), group_lists))
}

/// Read a bone's morph table: a count word, the header-list address, then
/// the bidirectional, tagged morph descriptor list.
pub fn read_morph_headers(
    cur: &mut ByteCursor<'_>,
    morph_addr: u32,
    names: &mut Vec<String>,
) -> Result<Vec<MorphHeader>> {
    cur.seek(u64::from(morph_addr))?;
    let declared = cur.read_u16()?;
    cur.seek_relative(6)?;
    let headers_addr = cur.read_u32()?;

    cur.seek(u64::from(headers_addr))?;
    let headers = read_linked_list(cur, true, None, Some(names), |cur| {
        let weight = cur.read_f32()?;
        let id = cur.read_u8()?;
        let mut reserved = [0u8; 3];
        for slot in &mut reserved {
            *slot = cur.read_u8()?;
        }
        Ok(MorphHeader {
            weight,
            id,
            reserved,
            data_addr: cur.read_u32()?,
            junk: cur.read_u32()?,
        })
    })?;

    if usize::from(declared) != headers.len() {
        tracing::warn!(
            "morph count mismatch: declared {declared}, parsed {}",
            headers.len()
        );
    }

    Ok(headers)
}

/// Vertex count of a morph-target position buffer.
///
/// The format stores no explicit length; the buffer is assumed to run from
/// its data address to the end of the model view in 12-byte (3×f32)
/// strides. Kept as the single place to fix should an exact length turn up
/// elsewhere in the format.
#[must_use]
pub fn morph_frame_len(remaining_bytes: u64) -> u64 {
    remaining_bytes / 12
}

/// Read one morph frame's literal position buffer.
pub fn read_morph_frame(cur: &mut ByteCursor<'_>, header: &MorphHeader) -> Result<MorphFrame> {
    cur.seek(u64::from(header.data_addr))?;
    let count = morph_frame_len(cur.remaining());
    let mut positions = Vec::with_capacity(count as usize);
    for _ in 0..count {
        positions.push([cur.read_f32()?, cur.read_f32()?, cur.read_f32()?]);
    }
    Ok(MorphFrame {
        weight: header.weight,
        id: header.id,
        positions,
    })
}

/// Counters from one chunk's strip decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripStats {
    pub strips: usize,
    /// Highest position index seen (diagnostic only).
    pub max_position_index: i64,
}

/// Decode one chunk's triangle-strip vertex stream at the cursor's current
/// position, streaming vertices to `builder`.
///
/// The stream is `vertex_data_len × 32` bytes long. Each strip opens with
/// the [`STRIP_SENTINEL`] control byte and a 16-bit vertex count; any other
/// control byte ends the chunk (trailing padding, not an error). Per vertex
/// the buffer headers are visited in declared order: embedded attributes
/// decode inline, indexed ones read an index and fetch the value from the
/// header's side table with the cursor restored afterwards. Positions are
/// submitted last because the builder completes a vertex on position
/// submission.
pub fn decode_chunk(
    cur: &mut ByteCursor<'_>,
    headers: &[BufferHeader],
    vertex_data_len: u16,
    bone_groups: Option<&[VertexBoneGroup]>,
    builder: &mut dyn MeshBuilder,
) -> Result<StripStats> {
    let mut stats = StripStats {
        strips: 0,
        max_position_index: -1,
    };
    let end = cur.position() + u64::from(vertex_data_len) * 32;

    while cur.position() < end {
        if cur.read_u8()? != STRIP_SENTINEL {
            break;
        }
        stats.strips += 1;
        let count = cur.read_u16()?;

        builder.begin_strip();
        for _ in 0..count {
            decode_vertex(cur, headers, bone_groups, builder, &mut stats)?;
        }
        builder.end_strip();
    }

    Ok(stats)
}

fn decode_vertex(
    cur: &mut ByteCursor<'_>,
    headers: &[BufferHeader],
    bone_groups: Option<&[VertexBoneGroup]>,
    builder: &mut dyn MeshBuilder,
    stats: &mut StripStats,
) -> Result<()> {
    let mut position = None;

    for header in headers {
        let kind = AttributeKind::from_raw(header.kind_raw)
            .ok_or(Error::UnknownAttributeType {
                raw: header.kind_raw,
            })?;

        let value = match header.storage {
            StorageMode::Embedded => kind.decode(cur)?,
            StorageMode::Indexed8 | StorageMode::Indexed16 => {
                let index = if header.storage == StorageMode::Indexed8 {
                    u32::from(cur.read_u8()?)
                } else {
                    u32::from(cur.read_u16()?)
                };

                // The position index is shared with the morph system.
                if kind == AttributeKind::Position {
                    builder.morph_index(index);
                    stats.max_position_index = stats.max_position_index.max(i64::from(index));
                }

                let saved = cur.position();
                cur.seek(u64::from(header.address) + u64::from(index) * kind.byte_size())?;
                let value = kind.decode(cur);
                cur.seek(saved)?;
                value?
            }
        };

        match (kind, value) {
            (AttributeKind::Position, AttributeValue::Vec3(p)) => position = Some(p),
            (AttributeKind::Normal, AttributeValue::Vec3(n)) => builder.normal(n),
            (AttributeKind::TexCoord, AttributeValue::Vec2(uv)) => builder.uv(uv),
            (AttributeKind::LightmapTexCoord, AttributeValue::Vec2(uv)) => builder.lightmap_uv(uv),
            (AttributeKind::BoneWeight, AttributeValue::Selector(raw)) => {
                // Raw selector over 3 picks the group; a format quirk
                // preserved as-is.
                let selection = usize::from(raw) / 3;
                match bone_groups.and_then(|groups| groups.get(selection)) {
                    Some(group) => builder.skin(group),
                    None => {
                        tracing::warn!(
                            "bone group {selection} (selector {raw}) out of range at {:#x}; \
                             dropping this vertex's skin binding",
                            cur.position()
                        );
                    }
                }
            }
            // Unconfirmed attribute kinds are decoded for stream sync and
            // dropped.
            _ => {}
        }
    }

    if let Some(p) = position {
        builder.position(p);
    } else {
        tracing::warn!("vertex without a position attribute at {:#x}", cur.position());
    }

    Ok(())
}

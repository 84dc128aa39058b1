//! CGMG model decoding pipeline.
//!
//! A model is decoded in file order: header, texture list, material list,
//! skeleton, then per-bone geometry. Cross-references between sections are
//! raw file offsets keyed on list-node start addresses, so each section's
//! node addresses are frozen into an [`AddressTable`] as it is read.

use crate::error::{Error, Result};
use crate::formats::common::{
    AddressTable, ByteCursor, Endianness, dedupe_names, read_linked_list,
};
use crate::formats::gct0;
use crate::scene::{
    ChunkContext, MeshBuilder, PixelDecoder, SceneBone, SceneMaterial, SceneTexture,
};

use super::header::{ModelHeader, read_model_header};
use super::mesh::{
    decode_chunk, read_bone_groups, read_buffer_headers, read_chunk_headers, read_morph_frame,
    read_morph_headers,
};
use super::skeleton::{read_skeleton, resolve_bones};

/// Which material record shape a file uses. CGMG models carry the extended
/// shape; the short one exists for related container variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialLayout {
    /// Four words per record.
    Simple,
    /// Four words plus eight extra words per record.
    #[default]
    Complex,
}

/// One texture list record. `addr` locates the GCT0 record; `size` is zero
/// in later revisions of the format.
#[derive(Debug, Clone, Copy)]
pub struct TextureRecord {
    pub addr: u32,
    pub reserved0: u32,
    pub size: u32,
    pub reserved1: u32,
}

/// One material list record. Binding data lives at `data_addr`.
#[derive(Debug, Clone, Copy)]
pub struct MaterialRecord {
    pub id: u32,
    pub data_addr: u32,
    pub reserved: [u32; 2],
    /// Only present on disk in the [`MaterialLayout::Complex`] shape.
    pub extra: [u32; 8],
}

/// One material-to-texture binding record.
#[derive(Debug, Clone, Copy)]
pub struct TextureBinding {
    /// Node address of the bound texture in the texture list, or zero.
    pub texture_addr: u32,
    pub reserved: u32,
    pub reserved_words: [i32; 8],
}

/// Everything decoded from one CGMG child except the geometry, which is
/// streamed to the caller's [`MeshBuilder`] during the parse.
#[derive(Debug, Clone)]
pub struct ModelDocument {
    pub header: ModelHeader,
    pub bones: Vec<SceneBone>,
    pub materials: Vec<SceneMaterial>,
    pub textures: Vec<SceneTexture>,
}

/// Decode a CGMG model from its raw bytes.
///
/// Geometry and morph frames are streamed to `builder`; structural results
/// come back in the [`ModelDocument`]. Texture pixel decoding failures are
/// tolerated (the texture is dropped, its name slot is kept so material
/// bindings still resolve); dangling cross-references and malformed
/// structure are not.
pub fn parse_cgmg_bytes(
    data: &[u8],
    layout: MaterialLayout,
    pixels: &dyn PixelDecoder,
    builder: &mut dyn MeshBuilder,
) -> Result<ModelDocument> {
    let mut cur = ByteCursor::new(data, Endianness::Big);
    let header = read_model_header(&mut cur)?;

    let (tex_table, tex_names, textures) = load_textures(&mut cur, &header, pixels)?;
    let (mat_table, materials) = load_materials(&mut cur, &header, layout, &tex_table, &tex_names)?;

    let mut bone_addrs = Vec::new();
    let mut bone_records = Vec::new();
    if header.skeleton_addr != 0 {
        cur.seek(u64::from(header.skeleton_addr))?;
        bone_records = read_skeleton(&mut cur, header.bone_count, &mut bone_addrs)?;
    }
    let skl_table = AddressTable::new("bone", bone_addrs);
    let bones = resolve_bones(&bone_records, &skl_table)?;

    for (index, rec) in bone_records.iter().enumerate() {
        if rec.chunk_headers_addr == 0 {
            continue;
        }
        let bone = &bones[index];

        let (group_table, group_lists) =
            read_bone_groups(&mut cur, rec.bone_groups_addr, &skl_table)?;

        cur.seek(u64::from(rec.buffer_headers_addr))?;
        let buffer_headers = read_buffer_headers(&mut cur)?;

        cur.seek(u64::from(rec.chunk_headers_addr))?;
        let chunk_headers = read_chunk_headers(&mut cur)?;

        if rec.morph_addr != 0 {
            let mut morph_names = Vec::new();
            let morph_headers = read_morph_headers(&mut cur, rec.morph_addr, &mut morph_names)?;
            for morph_header in &morph_headers {
                builder.morph_frame(read_morph_frame(&mut cur, morph_header)?);
            }
            builder.end_morph_set(&bone.name);
        }

        for chunk in &chunk_headers {
            let material = &materials[mat_table.resolve(chunk.material_addr)?];

            let groups = if chunk.bone_group_addr != 0 {
                Some(group_lists[group_table.resolve(chunk.bone_group_addr)?].as_slice())
            } else {
                None
            };

            builder.begin_chunk(&ChunkContext {
                node_name: &bone.name,
                material: &material.name,
                transform: bone.global_transform,
            });

            cur.seek(u64::from(chunk.triangle_addr))?;
            match decode_chunk(&mut cur, &buffer_headers, chunk.vertex_data_len, groups, builder) {
                Ok(stats) => {
                    tracing::debug!(
                        "bone '{}': {} strips from chunk at {:#x}",
                        bone.name,
                        stats.strips,
                        chunk.triangle_addr
                    );
                }
                Err(e @ Error::UnknownAttributeType { .. }) => {
                    tracing::warn!(
                        "skipping chunk at {:#x} on bone '{}': {e}",
                        chunk.triangle_addr,
                        bone.name
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok(ModelDocument {
        header,
        bones,
        materials,
        textures,
    })
}

/// Read the texture list and decode each referenced GCT0 record.
///
/// Names are de-duplicated with a bare ordinal suffix before any decode so
/// a texture that fails to decode still holds its (deduped) name slot and
/// downstream material bindings keep resolving by index.
fn load_textures(
    cur: &mut ByteCursor<'_>,
    header: &ModelHeader,
    pixels: &dyn PixelDecoder,
) -> Result<(AddressTable, Vec<String>, Vec<SceneTexture>)> {
    let mut node_addresses = Vec::new();
    let mut names = Vec::new();
    let mut textures = Vec::new();

    if header.texture_addr != 0 {
        cur.seek(u64::from(header.texture_addr))?;
        let records =
            read_linked_list(cur, true, Some(&mut node_addresses), Some(&mut names), |cur| {
                Ok(TextureRecord {
                    addr: cur.read_u32()?,
                    reserved0: cur.read_u32()?,
                    size: cur.read_u32()?,
                    reserved1: cur.read_u32()?,
                })
            })?;

        dedupe_names(&mut names, "");

        if usize::from(header.texture_count) != records.len() {
            tracing::warn!(
                "texture count mismatch: header says {}, list has {}",
                header.texture_count,
                records.len()
            );
        }

        for (i, record) in records.iter().enumerate() {
            cur.seek(u64::from(record.addr))?;
            match gct0::read_texture(cur, pixels, Some(names[i].clone()), i) {
                Ok(texture) => textures.push(texture),
                Err(e) => tracing::warn!("dropping texture '{}': {e}", names[i]),
            }
        }
    }

    Ok((AddressTable::new("texture", node_addresses), names, textures))
}

/// Read the material list and resolve each material's display name from its
/// first texture binding.
fn load_materials(
    cur: &mut ByteCursor<'_>,
    header: &ModelHeader,
    layout: MaterialLayout,
    tex_table: &AddressTable,
    tex_names: &[String],
) -> Result<(AddressTable, Vec<SceneMaterial>)> {
    let mut node_addresses = Vec::new();
    let mut names = Vec::new();
    let mut materials = Vec::new();

    if header.material_addr != 0 {
        cur.seek(u64::from(header.material_addr))?;
        let records =
            read_linked_list(cur, true, Some(&mut node_addresses), Some(&mut names), |cur| {
                let id = cur.read_u32()?;
                let data_addr = cur.read_u32()?;
                let reserved = [cur.read_u32()?, cur.read_u32()?];
                let mut extra = [0u32; 8];
                if layout == MaterialLayout::Complex {
                    for slot in &mut extra {
                        *slot = cur.read_u32()?;
                    }
                }
                Ok(MaterialRecord {
                    id,
                    data_addr,
                    reserved,
                    extra,
                })
            })?;

        if usize::from(header.material_count) != records.len() {
            tracing::warn!(
                "material count mismatch: header says {}, list has {}",
                header.material_count,
                records.len()
            );
        }

        for (i, record) in records.iter().enumerate() {
            let texture = first_bound_texture(cur, record, tex_table, tex_names)?;
            // Display names may legitimately collide; they are not keys.
            let name = match &texture {
                Some(tex) => format!("{}_{tex}", names[i]),
                None => format!("{}_no_texture", names[i]),
            };
            materials.push(SceneMaterial { name, texture });
        }
    }

    Ok((AddressTable::new("material", node_addresses), materials))
}

fn first_bound_texture(
    cur: &mut ByteCursor<'_>,
    record: &MaterialRecord,
    tex_table: &AddressTable,
    tex_names: &[String],
) -> Result<Option<String>> {
    if record.data_addr == 0 {
        return Ok(None);
    }

    cur.seek(u64::from(record.data_addr))?;
    let bindings = read_linked_list(cur, true, None, None, |cur| {
        let texture_addr = cur.read_u32()?;
        let reserved = cur.read_u32()?;
        let mut reserved_words = [0i32; 8];
        for slot in &mut reserved_words {
            *slot = cur.read_i32()?;
        }
        Ok(TextureBinding {
            texture_addr,
            reserved,
            reserved_words,
        })
    })?;

    match bindings.first() {
        Some(binding) if binding.texture_addr != 0 => {
            let index = tex_table.resolve(binding.texture_addr)?;
            Ok(Some(tex_names[index].clone()))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{GeometryCollector, PlaceholderPixelDecoder};
    use pretty_assertions::assert_eq;

    fn pad_to(buf: &mut Vec<u8>, offset: usize) {
        assert!(buf.len() <= offset, "fixture overlap at {offset:#x}");
        buf.resize(offset, 0);
    }

    fn put_u32s(buf: &mut Vec<u8>, values: &[u32]) {
        for v in values {
            buf.extend_from_slice(&v.to_be_bytes());
        }
    }

    fn put_f32s(buf: &mut Vec<u8>, values: &[f32]) {
        for v in values {
            buf.extend_from_slice(&v.to_be_bytes());
        }
    }

    fn put_tag(buf: &mut Vec<u8>, name: &str) {
        let mut tag = [0u8; 8];
        tag[..name.len()].copy_from_slice(name.as_bytes());
        buf.extend_from_slice(&tag);
    }

    /// Header with the given counts and section addresses, name "box".
    fn model_header(
        buf: &mut Vec<u8>,
        counts: [u16; 4],
        skel: u32,
        tex: u32,
        mat: u32,
    ) {
        buf.extend_from_slice(b"CGMG");
        put_u32s(buf, &[0; 5]);
        for c in counts {
            buf.extend_from_slice(&c.to_be_bytes());
        }
        put_u32s(buf, &[skel, tex, 0, mat, 0, 0]);
        buf.extend_from_slice(b"box\0");
    }

    /// One bone record anchoring geometry.
    fn mesh_bone(buf: &mut Vec<u8>, buffers: u32, chunks: u32, morphs: u32) {
        put_tag(buf, "root");
        put_u32s(buf, &[0]); // flags
        put_u32s(buf, &[buffers, 0, 0, 0, 0, chunks, morphs, 0]);
        put_f32s(buf, &[0.0; 3]); // position
        put_f32s(buf, &[0.0; 3]); // rotation
        put_f32s(buf, &[1.0; 3]); // scale
        put_f32s(buf, &[0.0; 6]);
        put_u32s(buf, &[0; 6]);
    }

    #[test]
    fn full_model_pipeline() {
        let mut buf = Vec::new();
        model_header(&mut buf, [1, 0, 0, 1], 0x40, 0, 0x200);

        pad_to(&mut buf, 0x40);
        mesh_bone(&mut buf, 0x100, 0x140, 0x1C0);

        // buffer headers: one embedded position attribute
        pad_to(&mut buf, 0x100);
        put_u32s(&mut buf, &[0, 0]); // next = 0, addr = 0
        buf.extend_from_slice(&[1, 9, 0, 0, 0, 0, 0, 0]);

        // one chunk: strip data at 0x180, material node at 0x200
        pad_to(&mut buf, 0x140);
        put_u32s(&mut buf, &[0, 0, 0x180, 0x200]);
        buf.extend_from_slice(&2u16.to_be_bytes()); // data length, 32-byte units
        buf.extend_from_slice(&0u16.to_be_bytes());
        put_u32s(&mut buf, &[0]); // no bone groups

        // strip data: one strip of three vertices
        pad_to(&mut buf, 0x180);
        buf.push(0x9F);
        buf.extend_from_slice(&3u16.to_be_bytes());
        put_f32s(
            &mut buf,
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        );

        // morph table: one frame of one position at the end of the file
        pad_to(&mut buf, 0x1C0);
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&[0; 6]);
        put_u32s(&mut buf, &[0x1D0]);
        pad_to(&mut buf, 0x1D0);
        put_tag(&mut buf, "smile");
        put_u32s(&mut buf, &[0, 0]); // back, next
        put_f32s(&mut buf, &[0.75]);
        buf.extend_from_slice(&[1, 0, 0, 0]); // id + reserved
        put_u32s(&mut buf, &[0x3F4, 0]);

        // material: no binding data
        pad_to(&mut buf, 0x200);
        put_tag(&mut buf, "skin");
        put_u32s(&mut buf, &[0, 0]); // back, next
        put_u32s(&mut buf, &[7, 0, 0, 0]);
        put_u32s(&mut buf, &[0; 8]); // extra words

        pad_to(&mut buf, 0x3F4);
        put_f32s(&mut buf, &[4.0, 5.0, 6.0]);

        let mut col = GeometryCollector::new();
        let doc = parse_cgmg_bytes(
            &buf,
            MaterialLayout::Complex,
            &PlaceholderPixelDecoder,
            &mut col,
        )
        .unwrap();

        assert_eq!(doc.header.name, "box");
        assert_eq!(doc.bones.len(), 1);
        assert_eq!(doc.bones[0].name, "root_Mesh");
        assert_eq!(doc.materials.len(), 1);
        assert_eq!(doc.materials[0].name, "skin_no_texture");
        assert_eq!(doc.materials[0].texture, None);
        assert!(doc.textures.is_empty());

        let (meshes, morph_sets) = col.finish();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].name, "root_Mesh");
        assert_eq!(meshes[0].material, "skin_no_texture");
        assert_eq!(meshes[0].vertices.len(), 3);
        assert_eq!(meshes[0].triangles, vec![[1, 0, 2]]);

        assert_eq!(morph_sets.len(), 1);
        assert_eq!(morph_sets[0].node, "root_Mesh");
        assert_eq!(morph_sets[0].frames.len(), 1);
        assert_eq!(morph_sets[0].frames[0].weight, 0.75);
        assert_eq!(morph_sets[0].frames[0].positions, vec![[4.0, 5.0, 6.0]]);
    }

    #[test]
    fn material_binding_resolves_texture_name() {
        let mut buf = Vec::new();
        model_header(&mut buf, [0, 1, 0, 1], 0, 0x60, 0x200);

        // texture list: one record pointing at the GCT0 record
        pad_to(&mut buf, 0x60);
        put_tag(&mut buf, "hull");
        put_u32s(&mut buf, &[0, 0]); // back, next
        put_u32s(&mut buf, &[0x300, 0, 0, 0]);

        // material with one binding back to the texture node at 0x60
        pad_to(&mut buf, 0x200);
        put_tag(&mut buf, "paint");
        put_u32s(&mut buf, &[0, 0]);
        put_u32s(&mut buf, &[1, 0x240, 0, 0]);
        put_u32s(&mut buf, &[0; 8]);
        pad_to(&mut buf, 0x240);
        put_u32s(&mut buf, &[0, 0, 0x60, 0]);
        put_u32s(&mut buf, &[0; 8]);

        // the GCT0 record itself
        pad_to(&mut buf, 0x300);
        buf.extend_from_slice(b"GCT0");
        put_u32s(&mut buf, &[14]); // pixel format
        buf.extend_from_slice(&2u16.to_be_bytes());
        buf.extend_from_slice(&2u16.to_be_bytes());
        put_u32s(&mut buf, &[0, 0x20]);
        pad_to(&mut buf, 0x330);

        let mut col = GeometryCollector::new();
        let doc = parse_cgmg_bytes(
            &buf,
            MaterialLayout::Complex,
            &PlaceholderPixelDecoder,
            &mut col,
        )
        .unwrap();

        assert_eq!(doc.textures.len(), 1);
        assert_eq!(doc.textures[0].name, "hull");
        assert_eq!(doc.materials[0].name, "paint_hull");
        assert_eq!(doc.materials[0].texture.as_deref(), Some("hull"));
    }

    #[test]
    fn failed_texture_keeps_its_name_slot() {
        let mut buf = Vec::new();
        model_header(&mut buf, [0, 2, 0, 1], 0, 0x60, 0x200);

        // two texture records; the first points at garbage
        pad_to(&mut buf, 0x60);
        put_tag(&mut buf, "bad");
        put_u32s(&mut buf, &[0, 0xA0]); // back, next -> second node
        put_u32s(&mut buf, &[0x2C0, 0, 0, 0]);
        pad_to(&mut buf, 0xA0);
        put_tag(&mut buf, "good");
        put_u32s(&mut buf, &[0x60, 0]);
        put_u32s(&mut buf, &[0x300, 0, 0, 0]);

        // material bound to the second texture node
        pad_to(&mut buf, 0x200);
        put_tag(&mut buf, "paint");
        put_u32s(&mut buf, &[0, 0]);
        put_u32s(&mut buf, &[1, 0x240, 0, 0]);
        put_u32s(&mut buf, &[0; 8]);
        pad_to(&mut buf, 0x240);
        put_u32s(&mut buf, &[0, 0, 0xA0, 0]);
        put_u32s(&mut buf, &[0; 8]);

        // 0x2C0 holds zeros, not a GCT0 record
        pad_to(&mut buf, 0x300);
        buf.extend_from_slice(b"GCT0");
        put_u32s(&mut buf, &[14]);
        buf.extend_from_slice(&2u16.to_be_bytes());
        buf.extend_from_slice(&2u16.to_be_bytes());
        put_u32s(&mut buf, &[0, 0x20]);
        pad_to(&mut buf, 0x330);

        let mut col = GeometryCollector::new();
        let doc = parse_cgmg_bytes(
            &buf,
            MaterialLayout::Complex,
            &PlaceholderPixelDecoder,
            &mut col,
        )
        .unwrap();

        // one texture decoded, but the binding by node address still lands
        // on the right name
        assert_eq!(doc.textures.len(), 1);
        assert_eq!(doc.textures[0].name, "good");
        assert_eq!(doc.materials[0].texture.as_deref(), Some("good"));
    }
}

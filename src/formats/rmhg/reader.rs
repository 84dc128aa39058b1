//! RMHG container directory parsing and recursive child dispatch.
//!
//! The directory words are little-endian; child payloads carry their own
//! byte order. Children are decoded over a bounded sub-view of the parent
//! buffer, so a corrupt child cannot read past its declared extent.

use std::path::Path;

use crate::error::{Error, Result};
use crate::formats::cgmg::{self, MaterialLayout};
use crate::formats::gct0;
use crate::scene::{GeometryCollector, PixelDecoder, SceneMaterial, SceneModel};

use super::RMHG_MAGIC;
use crate::formats::common::{ByteCursor, Endianness};

/// Fixed container header words, minus the leading tag.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ContainerHeader {
    pub record_count: u32,
    /// Offset of the record table.
    pub records_addr: u32,
    pub reserved: u32,
    /// Declared total size, rounded up to a 32-byte boundary.
    pub data_size: u32,
}

/// One directory entry: a child blob's extent plus six reserved words
/// (the first is 1 for nested containers in known files, but this is not
/// relied on; dispatch goes by the tag at the child's address).
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ContainerRecord {
    pub addr: u32,
    pub size: u32,
    pub reserved: [u32; 6],
}

/// Read the container header and its record table.
pub fn read_directory(
    cur: &mut ByteCursor<'_>,
) -> Result<(ContainerHeader, Vec<ContainerRecord>)> {
    cur.seek(0)?;
    let tag = cur.read_tag(4)?;
    if tag != RMHG_MAGIC {
        return Err(Error::InvalidRmhgMagic(tag));
    }

    let header = ContainerHeader {
        record_count: cur.read_u32()?,
        records_addr: cur.read_u32()?,
        reserved: cur.read_u32()?,
        data_size: cur.read_u32()?,
    };

    cur.seek(u64::from(header.records_addr))?;
    // the count is untrusted; let the reads bound it instead of the
    // allocation
    let mut records = Vec::new();
    for _ in 0..header.record_count {
        let addr = cur.read_u32()?;
        let size = cur.read_u32()?;
        let mut reserved = [0u32; 6];
        for slot in &mut reserved {
            *slot = cur.read_u32()?;
        }
        records.push(ContainerRecord {
            addr,
            size,
            reserved,
        });
    }

    Ok((header, records))
}

/// The trailing consistency relation: the last record's end, rounded up to
/// a 32-byte boundary, must equal the declared size (which must fit in the
/// buffer); a record-less container must declare size zero.
pub(crate) fn size_relation_holds(
    header: &ContainerHeader,
    records: &[ContainerRecord],
    len: u64,
) -> bool {
    match records.last() {
        None => header.data_size == 0,
        Some(last) => {
            let end = last.addr.wrapping_add(last.size).wrapping_add(0x1F) & 0xFFFF_FFE0;
            end == header.data_size && u64::from(header.data_size) <= len
        }
    }
}

/// Whether the buffer is an RMHG container: the tag reads "RMHG" and the
/// trailing-size relation holds. Never fails; malformed input is simply not
/// this format.
#[must_use]
pub fn check_rmhg_bytes(data: &[u8]) -> bool {
    let mut cur = ByteCursor::new(data, Endianness::Little);
    match read_directory(&mut cur) {
        Ok((header, records)) => size_relation_holds(&header, &records, cur.len()),
        Err(_) => false,
    }
}

/// Decode a whole RMHG container, recursively, into scene models.
///
/// Every CGMG child yields one model (an empty one when it carries no
/// geometry); every standalone GCT0 child yields a texture-only model, the
/// way a host viewer presents loose textures. Unrecognized child tags are
/// reported and left alone.
pub fn parse_rmhg_bytes(data: &[u8], pixels: &dyn PixelDecoder) -> Result<Vec<SceneModel>> {
    let mut models = Vec::new();
    load_container(data, pixels, &mut models)?;
    Ok(models)
}

/// Read and decode an RSL file from disk.
pub fn read_rsl(path: &Path, pixels: &dyn PixelDecoder) -> Result<Vec<SceneModel>> {
    tracing::info!("loading {}", path.display());
    let data = std::fs::read(path)?;
    parse_rmhg_bytes(&data, pixels)
}

fn load_container(
    data: &[u8],
    pixels: &dyn PixelDecoder,
    models: &mut Vec<SceneModel>,
) -> Result<()> {
    let mut cur = ByteCursor::new(data, Endianness::Little);
    let (header, records) = read_directory(&mut cur)?;
    if !size_relation_holds(&header, &records, cur.len()) {
        return Err(Error::ContainerSizeCheck {
            declared: header.data_size,
            records: records.len(),
        });
    }

    for record in &records {
        if record.addr == 0 || record.size == 0 {
            tracing::debug!("empty record at {:#x}", record.addr);
            continue;
        }

        cur.seek(u64::from(record.addr))?;
        let tag = cur.read_tag(4)?;
        let child = cur.slice(
            u64::from(record.addr),
            u64::from(record.addr) + u64::from(record.size),
        )?;

        match tag.as_str() {
            RMHG_MAGIC => load_container(child, pixels, models)?,
            cgmg::CGMG_MAGIC => load_model(child, pixels, models)?,
            gct0::GCT0_MAGIC => load_loose_texture(child, pixels, models),
            other => {
                tracing::warn!("unrecognized child tag {other:?} at {:#x}", record.addr);
            }
        }
    }

    Ok(())
}

fn load_model(
    data: &[u8],
    pixels: &dyn PixelDecoder,
    models: &mut Vec<SceneModel>,
) -> Result<()> {
    let mut collector = GeometryCollector::new();
    let doc = cgmg::parse_cgmg_bytes(data, MaterialLayout::Complex, pixels, &mut collector)?;
    let (meshes, morph_sets) = collector.finish();

    models.push(SceneModel {
        name: doc.header.name,
        bones: doc.bones,
        materials: doc.materials,
        textures: doc.textures,
        meshes,
        morph_sets,
    });
    Ok(())
}

/// A GCT0 record sitting directly in a container, outside any model. It is
/// surfaced as a texture-only model with a matching single material.
fn load_loose_texture(data: &[u8], pixels: &dyn PixelDecoder, models: &mut Vec<SceneModel>) {
    let mut cur = ByteCursor::new(data, Endianness::Big);
    match gct0::read_texture(&mut cur, pixels, None, models.len()) {
        Ok(texture) => {
            let name = texture.name.clone();
            models.push(SceneModel {
                name: name.clone(),
                materials: vec![SceneMaterial {
                    name: name.clone(),
                    texture: Some(name),
                }],
                textures: vec![texture],
                ..SceneModel::default()
            });
        }
        Err(e) => tracing::warn!("skipping loose texture child: {e}"),
    }
}

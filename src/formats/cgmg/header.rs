//! CGMG model header.

use crate::error::Result;
use crate::formats::common::ByteCursor;

/// Fixed-layout model header: record counts, section addresses and a
/// trailing model name. Section addresses of zero mean the section is
/// absent.
#[derive(Debug, Clone)]
pub struct ModelHeader {
    pub reserved0: [u32; 5],
    pub bone_count: u16,
    pub texture_count: u16,
    pub reserved_count: u16,
    pub material_count: u16,
    pub skeleton_addr: u32,
    pub texture_addr: u32,
    pub reserved_addr: u32,
    pub material_addr: u32,
    pub reserved1: u32,
    pub reserved2: u32,
    pub name: String,
}

/// Read the model header. The cursor view starts at the CGMG tag; the
/// header proper begins right after it.
pub fn read_model_header(cur: &mut ByteCursor<'_>) -> Result<ModelHeader> {
    cur.seek(4)?;

    let mut reserved0 = [0u32; 5];
    for slot in &mut reserved0 {
        *slot = cur.read_u32()?;
    }

    let header = ModelHeader {
        reserved0,
        bone_count: cur.read_u16()?,
        texture_count: cur.read_u16()?,
        reserved_count: cur.read_u16()?,
        material_count: cur.read_u16()?,
        skeleton_addr: cur.read_u32()?,
        texture_addr: cur.read_u32()?,
        reserved_addr: cur.read_u32()?,
        material_addr: cur.read_u32()?,
        reserved1: cur.read_u32()?,
        reserved2: cur.read_u32()?,
        name: cur.read_cstring()?,
    };

    tracing::debug!(
        "model '{}': {} bones, {} textures, {} materials",
        header.name,
        header.bone_count,
        header.texture_count,
        header.material_count
    );

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::common::Endianness;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_layout() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"CGMG");
        for _ in 0..5 {
            buf.extend_from_slice(&0u32.to_be_bytes());
        }
        for count in [2u16, 3, 0, 4] {
            buf.extend_from_slice(&count.to_be_bytes());
        }
        for addr in [0x100u32, 0x200, 0, 0x300, 0, 0] {
            buf.extend_from_slice(&addr.to_be_bytes());
        }
        buf.extend_from_slice(b"body\0");

        let mut cur = ByteCursor::new(&buf, Endianness::Big);
        let header = read_model_header(&mut cur).unwrap();
        assert_eq!(header.bone_count, 2);
        assert_eq!(header.texture_count, 3);
        assert_eq!(header.material_count, 4);
        assert_eq!(header.skeleton_addr, 0x100);
        assert_eq!(header.texture_addr, 0x200);
        assert_eq!(header.material_addr, 0x300);
        assert_eq!(header.name, "body");
    }
}

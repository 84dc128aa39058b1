//! Skeleton reading and pointer resolution.
//!
//! Bones are stored as a contiguous array of fixed-size records whose
//! structural references (parent, left, right, child) are raw file offsets
//! of other bone records. Resolution is two-pass: the whole array is read
//! and its start addresses frozen into an address table before any pointer
//! is looked up, because forward references are common.

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::error::Result;
use crate::formats::common::{AddressTable, ByteCursor, dedupe_names};
use crate::scene::{BoneLink, SceneBone};

/// One on-disk bone record.
#[derive(Debug, Clone)]
pub struct BoneRecord {
    /// 8-character on-disk name.
    pub name: String,
    pub flags: i32,
    /// Vertex buffer header list for this bone's geometry.
    pub buffer_headers_addr: u32,
    pub parent_addr: u32,
    /// Separate "child" pointer whose exact semantics are unconfirmed.
    pub child_addr: u32,
    pub left_addr: u32,
    pub right_addr: u32,
    /// Mesh chunk header list; non-zero means the bone anchors geometry.
    pub chunk_headers_addr: u32,
    pub morph_addr: u32,
    /// Per-vertex bone-group table for skinning.
    pub bone_groups_addr: u32,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub reserved_floats: [f32; 6],
    pub reserved_tail: [u32; 6],
    /// Composed rotation·scale·translation local transform.
    pub local_transform: Mat4,
}

/// Convert the on-disk 3-float Euler-like rotation to a quaternion.
///
/// The axes are permuted `(x, y, z) → (−x, z, y)` before conversion; this
/// is a property of the format's coordinate convention.
pub fn rotation_from_euler(x: f32, y: f32, z: f32) -> Quat {
    Quat::from_euler(EulerRot::XYZ, -x, z, y)
}

/// Compose a bone's local transform.
///
/// The composition order rotation·scale·translation (scale applied *after*
/// rotation) is a format property; reordering it misplaces geometry.
pub fn compose_local_transform(rotation: Quat, scale: Vec3, position: Vec3) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_scale(scale) * Mat4::from_quat(rotation)
}

/// Read `bone_count` contiguous bone records at the cursor's current
/// position, recording each record's start address.
pub fn read_skeleton(
    cur: &mut ByteCursor<'_>,
    bone_count: u16,
    addresses: &mut Vec<u32>,
) -> Result<Vec<BoneRecord>> {
    let mut records = Vec::with_capacity(usize::from(bone_count));

    for _ in 0..bone_count {
        addresses.push(cur.position() as u32);

        let name = cur.read_tag(8)?;
        let flags = cur.read_i32()?;
        let buffer_headers_addr = cur.read_u32()?;
        let parent_addr = cur.read_u32()?;
        let child_addr = cur.read_u32()?;
        let left_addr = cur.read_u32()?;
        let right_addr = cur.read_u32()?;
        let chunk_headers_addr = cur.read_u32()?;
        let morph_addr = cur.read_u32()?;
        let bone_groups_addr = cur.read_u32()?;

        let position = Vec3::new(cur.read_f32()?, cur.read_f32()?, cur.read_f32()?);
        let rotation = rotation_from_euler(cur.read_f32()?, cur.read_f32()?, cur.read_f32()?);
        let scale = Vec3::new(cur.read_f32()?, cur.read_f32()?, cur.read_f32()?);

        let mut reserved_floats = [0.0f32; 6];
        for slot in &mut reserved_floats {
            *slot = cur.read_f32()?;
        }
        let mut reserved_tail = [0u32; 6];
        for slot in &mut reserved_tail {
            *slot = cur.read_u32()?;
        }

        let local_transform = compose_local_transform(rotation, scale, position);

        records.push(BoneRecord {
            name,
            flags,
            buffer_headers_addr,
            parent_addr,
            child_addr,
            left_addr,
            right_addr,
            chunk_headers_addr,
            morph_addr,
            bone_groups_addr,
            position,
            rotation,
            scale,
            reserved_floats,
            reserved_tail,
            local_transform,
        });
    }

    Ok(records)
}

fn resolve_link(records: &[BoneRecord], table: &AddressTable, address: u32) -> Result<BoneLink> {
    let index = table.resolve_optional(address)?;
    let name = if index >= 0 {
        records[index as usize].name.clone()
    } else {
        String::new()
    };
    Ok(BoneLink { index, name })
}

/// Resolve pointer fields to indices and names and build the final bone
/// list: `_Mesh` working-name suffix for geometry-anchoring bones, global
/// transforms multiplied through the parent chain, and ordinal name
/// de-duplication (mesh-transform bones legitimately share names).
///
/// Any non-zero pointer that does not land on a record in `table` fails the
/// whole load.
pub fn resolve_bones(records: &[BoneRecord], table: &AddressTable) -> Result<Vec<SceneBone>> {
    let mut bones = Vec::with_capacity(records.len());
    for (index, rec) in records.iter().enumerate() {
        let anchors_mesh = rec.chunk_headers_addr != 0;
        let name = if anchors_mesh {
            format!("{}_Mesh", rec.name)
        } else {
            rec.name.clone()
        };
        bones.push(SceneBone {
            index,
            name,
            parent: resolve_link(records, table, rec.parent_addr)?,
            left: resolve_link(records, table, rec.left_addr)?,
            right: resolve_link(records, table, rec.right_addr)?,
            child: resolve_link(records, table, rec.child_addr)?,
            flags: rec.flags,
            local_transform: rec.local_transform,
            global_transform: rec.local_transform,
            anchors_mesh,
        });
    }

    let globals = global_transforms(&bones);
    for (bone, global) in bones.iter_mut().zip(globals) {
        bone.global_transform = global;
    }

    let mut names: Vec<String> = bones.iter().map(|b| b.name.clone()).collect();
    dedupe_names(&mut names, "_");
    for (bone, name) in bones.iter_mut().zip(names) {
        bone.name = name;
    }

    Ok(bones)
}

fn global_transforms(bones: &[SceneBone]) -> Vec<Mat4> {
    fn global(
        i: usize,
        bones: &[SceneBone],
        memo: &mut [Option<Mat4>],
        visiting: &mut [bool],
    ) -> Mat4 {
        if let Some(m) = memo[i] {
            return m;
        }
        let parent = bones[i].parent.index;
        let m = if parent >= 0 && !visiting[i] {
            visiting[i] = true;
            let pm = global(parent as usize, bones, memo, visiting);
            visiting[i] = false;
            pm * bones[i].local_transform
        } else {
            if parent >= 0 {
                tracing::warn!("bone {i} is part of a parent cycle; treating as root");
            }
            bones[i].local_transform
        };
        memo[i] = Some(m);
        m
    }

    let mut memo = vec![None; bones.len()];
    let mut visiting = vec![false; bones.len()];
    (0..bones.len())
        .map(|i| global(i, bones, &mut memo, &mut visiting))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pure_translation_composes_to_a_translation_matrix() {
        let m = compose_local_transform(Quat::IDENTITY, Vec3::ONE, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m, Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn scale_applies_after_rotation() {
        let rot = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let m = compose_local_transform(rot, Vec3::new(2.0, 1.0, 1.0), Vec3::ZERO);
        // unit x rotates onto +y, then the post-rotation scale stretches x
        let v = m.transform_point3(Vec3::X);
        assert!((v - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn zero_euler_is_identity() {
        let q = rotation_from_euler(0.0, 0.0, 0.0);
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn euler_axes_are_permuted_and_x_negated() {
        let half_pi = std::f32::consts::FRAC_PI_2;
        let q = rotation_from_euler(half_pi, 0.0, 0.0);
        let expect = Quat::from_euler(EulerRot::XYZ, -half_pi, 0.0, 0.0);
        assert!(q.abs_diff_eq(expect, 1e-6));

        let q = rotation_from_euler(0.0, half_pi, 0.0);
        let expect = Quat::from_euler(EulerRot::XYZ, 0.0, 0.0, half_pi);
        assert!(q.abs_diff_eq(expect, 1e-6));
    }

    fn bone_record_bytes(
        name: &str,
        parent_addr: u32,
        chunk_headers_addr: u32,
        pos: [f32; 3],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut tag = [0u8; 8];
        tag[..name.len()].copy_from_slice(name.as_bytes());
        buf.extend_from_slice(&tag);
        buf.extend_from_slice(&0i32.to_be_bytes()); // flags
        buf.extend_from_slice(&0u32.to_be_bytes()); // buffer headers
        buf.extend_from_slice(&parent_addr.to_be_bytes());
        for _ in 0..3 {
            buf.extend_from_slice(&0u32.to_be_bytes()); // child/left/right
        }
        buf.extend_from_slice(&chunk_headers_addr.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes()); // morph
        buf.extend_from_slice(&0u32.to_be_bytes()); // bone groups
        for v in pos {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        for _ in 0..3 {
            buf.extend_from_slice(&0f32.to_be_bytes()); // rotation
        }
        for v in [1.0f32; 3] {
            buf.extend_from_slice(&v.to_be_bytes()); // scale
        }
        for _ in 0..6 {
            buf.extend_from_slice(&0f32.to_be_bytes());
        }
        for _ in 0..6 {
            buf.extend_from_slice(&0u32.to_be_bytes());
        }
        buf
    }

    #[test]
    fn two_pass_resolution_handles_forward_references() {
        // root at offset 0 referencing nothing; child at record 1
        // referencing the root by address 0 would read as null, so lay the
        // skeleton out with the child first at offset 0.
        let record_len = bone_record_bytes("x", 0, 0, [0.0; 3]).len() as u32;
        let mut buf = bone_record_bytes("child", record_len, 0, [1.0, 0.0, 0.0]);
        buf.extend_from_slice(&bone_record_bytes("root", 0, 0, [0.0, 2.0, 0.0]));

        let mut cur = ByteCursor::new(&buf, crate::formats::common::Endianness::Big);
        let mut addrs = Vec::new();
        let records = read_skeleton(&mut cur, 2, &mut addrs).unwrap();
        let table = AddressTable::new("bone", addrs);
        let bones = resolve_bones(&records, &table).unwrap();

        assert_eq!(bones[0].parent.index, 1);
        assert_eq!(bones[0].parent.name, "root");
        assert_eq!(bones[1].parent, BoneLink::none());

        // child's global transform stacks the root translation
        let p = bones[0].global_transform.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn mesh_bones_are_suffixed_then_deduped() {
        let mut buf = bone_record_bytes("part", 0, 0x1000, [0.0; 3]);
        buf.extend_from_slice(&bone_record_bytes("part", 0, 0x2000, [0.0; 3]));

        let mut cur = ByteCursor::new(&buf, crate::formats::common::Endianness::Big);
        let mut addrs = Vec::new();
        let records = read_skeleton(&mut cur, 2, &mut addrs).unwrap();
        let table = AddressTable::new("bone", addrs);
        let bones = resolve_bones(&records, &table).unwrap();

        assert_eq!(bones[0].name, "part_Mesh");
        assert_eq!(bones[1].name, "part_Mesh_1");
        assert!(bones[0].anchors_mesh);
    }

    #[test]
    fn dangling_pointer_fails_the_load() {
        let buf = bone_record_bytes("solo", 0xDEAD, 0, [0.0; 3]);
        let mut cur = ByteCursor::new(&buf, crate::formats::common::Endianness::Big);
        let mut addrs = Vec::new();
        let records = read_skeleton(&mut cur, 1, &mut addrs).unwrap();
        let table = AddressTable::new("bone", addrs);
        assert!(resolve_bones(&records, &table).is_err());
    }
}

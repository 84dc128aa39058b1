//! Decoded scene-graph types produced by the format readers.

pub mod builder;
pub mod pixels;

pub use builder::{ChunkContext, GeometryCollector, MeshBuilder};
pub use pixels::{PixelDecoder, PlaceholderPixelDecoder};

use glam::Mat4;
use image::RgbaImage;

/// A fully reconstructed model: bone hierarchy, materials, textures and
/// triangle geometry. One is appended to the output list per CGMG child (or
/// per standalone GCT0 child, which yields a texture-only model).
#[derive(Debug, Clone, Default)]
pub struct SceneModel {
    pub name: String,
    pub bones: Vec<SceneBone>,
    pub materials: Vec<SceneMaterial>,
    pub textures: Vec<SceneTexture>,
    pub meshes: Vec<TriangleMesh>,
    pub morph_sets: Vec<MorphFrameSet>,
}

/// A resolved reference to another bone: parse-order index plus the
/// referenced bone's on-disk name. A null pointer resolves to index −1 and
/// an empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoneLink {
    pub index: i32,
    pub name: String,
}

impl BoneLink {
    /// The resolved form of a null pointer.
    #[must_use]
    pub fn none() -> Self {
        Self {
            index: crate::formats::common::NO_INDEX,
            name: String::new(),
        }
    }

    /// Whether this link references a bone.
    #[must_use]
    pub fn is_some(&self) -> bool {
        self.index >= 0
    }
}

/// One bone of the skeleton, with its structural pointers resolved.
///
/// Only `parent` drives the hierarchy and the global-transform pass.
/// `left`, `right` and `child` are carried through resolved because the
/// format stores them, but their exact semantics are unconfirmed; consumers
/// should not assume a meaning for them.
#[derive(Debug, Clone)]
pub struct SceneBone {
    pub index: usize,
    /// Working name: the on-disk name, suffixed `_Mesh` when the bone
    /// anchors geometry, then de-duplicated with an ordinal suffix.
    pub name: String,
    pub parent: BoneLink,
    pub left: BoneLink,
    pub right: BoneLink,
    pub child: BoneLink,
    pub flags: i32,
    /// Composed rotation·scale·translation local transform.
    pub local_transform: Mat4,
    /// Local transform multiplied through the parent chain.
    pub global_transform: Mat4,
    /// Whether the bone carries mesh chunks (a mesh transform node rather
    /// than a true skeletal joint, in most files).
    pub anchors_mesh: bool,
}

/// A material with its display name resolved from the first bound texture.
#[derive(Debug, Clone)]
pub struct SceneMaterial {
    /// Display name: `<material>_<texture>` or `<material>_no_texture`.
    /// Display names are allowed to collide.
    pub name: String,
    /// Name of the first bound texture, when one is bound.
    pub texture: Option<String>,
}

/// A decoded GCT0 texture.
#[derive(Debug, Clone)]
pub struct SceneTexture {
    pub name: String,
    /// GameCube pixel format code, preserved from the header.
    pub format: u32,
    pub width: u16,
    pub height: u16,
    pub image: RgbaImage,
}

/// Skinning weights shared by one or more vertices: parallel bone index and
/// weight sequences of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBoneGroup {
    pub bone_indices: Vec<i32>,
    pub bone_weights: Vec<f32>,
}

/// One vertex emitted by the triangle-strip decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: Option<[f32; 3]>,
    pub uv: Option<[f32; 2]>,
    pub lightmap_uv: Option<[f32; 2]>,
    pub skin: Option<VertexBoneGroup>,
    /// Position index shared with the morph system, for indexed positions.
    pub morph_index: Option<u32>,
}

/// Indexed triangle geometry for one mesh chunk.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    /// Name of the bone the chunk hangs off.
    pub name: String,
    /// Display name of the chunk's material.
    pub material: String,
    /// The owning bone's global transform.
    pub transform: Mat4,
    pub vertices: Vec<MeshVertex>,
    pub triangles: Vec<[u32; 3]>,
}

/// One morph target: a literal vertex-position buffer driven by the
/// vertices' morph indices.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphFrame {
    pub weight: f32,
    pub id: u8,
    pub positions: Vec<[f32; 3]>,
}

/// All morph frames committed for one mesh node.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphFrameSet {
    /// Name of the bone the morphs belong to.
    pub node: String,
    pub frames: Vec<MorphFrame>,
}

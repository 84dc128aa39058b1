//! Immediate-mode mesh-building capability.
//!
//! The CGMG decoder streams geometry vertex by vertex; [`MeshBuilder`] is
//! the seam between that stream and whatever the host does with it.
//! [`GeometryCollector`] is the crate's own implementation, turning strips
//! into indexed triangle lists.

use glam::Mat4;

use super::{MeshVertex, MorphFrame, MorphFrameSet, TriangleMesh, VertexBoneGroup};

/// Rendering state for one mesh chunk, threaded explicitly instead of being
/// held as ambient builder state.
#[derive(Debug, Clone, Copy)]
pub struct ChunkContext<'a> {
    /// Name of the bone the chunk hangs off.
    pub node_name: &'a str,
    /// Display name of the chunk's material.
    pub material: &'a str,
    /// The owning bone's global transform.
    pub transform: Mat4,
}

/// Consumer of the decoder's immediate-mode vertex stream.
///
/// Per-vertex attributes arrive in buffer-header order; `position` arrives
/// last and completes the vertex. Attribute calls between `position`
/// submissions belong to the vertex the next `position` call will close.
pub trait MeshBuilder {
    /// A new chunk begins; all strips until the next `begin_chunk` use this
    /// material and transform.
    fn begin_chunk(&mut self, ctx: &ChunkContext<'_>);

    /// A triangle-strip run begins.
    fn begin_strip(&mut self);

    fn normal(&mut self, normal: [f32; 3]);

    fn uv(&mut self, uv: [f32; 2]);

    fn lightmap_uv(&mut self, uv: [f32; 2]);

    /// Bind the pending vertex to a bone group.
    fn skin(&mut self, group: &VertexBoneGroup);

    /// Register the pending vertex's shared position index for the morph
    /// system.
    fn morph_index(&mut self, index: u32);

    /// Submit the position and complete the pending vertex.
    fn position(&mut self, position: [f32; 3]);

    /// The current triangle-strip run ended.
    fn end_strip(&mut self);

    /// Submit one morph-target position buffer.
    fn morph_frame(&mut self, frame: MorphFrame);

    /// Commit all frames submitted since the last set as one frame set.
    fn end_morph_set(&mut self, node_name: &str);
}

/// Collects the immediate-mode stream into indexed triangle meshes.
///
/// Strips are triangulated with backward winding, which is what this
/// format family's data expects.
#[derive(Debug, Default)]
pub struct GeometryCollector {
    meshes: Vec<TriangleMesh>,
    morph_sets: Vec<MorphFrameSet>,
    pending_frames: Vec<MorphFrame>,
    pending: MeshVertex,
    strip_start: usize,
}

impl GeometryCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish collecting. Returns the accumulated meshes and morph sets;
    /// both are empty when no geometry was ever emitted.
    #[must_use]
    pub fn finish(self) -> (Vec<TriangleMesh>, Vec<MorphFrameSet>) {
        (self.meshes, self.morph_sets)
    }

    fn current_mesh(&mut self) -> &mut TriangleMesh {
        // begin_chunk is always called before any vertex data; an empty
        // mesh list here means a misbehaving caller, not a format error.
        debug_assert!(!self.meshes.is_empty(), "vertex data before begin_chunk");
        if self.meshes.is_empty() {
            self.meshes.push(TriangleMesh {
                name: String::new(),
                material: String::new(),
                transform: Mat4::IDENTITY,
                vertices: Vec::new(),
                triangles: Vec::new(),
            });
        }
        let last = self.meshes.len() - 1;
        &mut self.meshes[last]
    }
}

impl MeshBuilder for GeometryCollector {
    fn begin_chunk(&mut self, ctx: &ChunkContext<'_>) {
        self.meshes.push(TriangleMesh {
            name: ctx.node_name.to_string(),
            material: ctx.material.to_string(),
            transform: ctx.transform,
            vertices: Vec::new(),
            triangles: Vec::new(),
        });
    }

    fn begin_strip(&mut self) {
        self.strip_start = self.current_mesh().vertices.len();
        self.pending = MeshVertex::default();
    }

    fn normal(&mut self, normal: [f32; 3]) {
        self.pending.normal = Some(normal);
    }

    fn uv(&mut self, uv: [f32; 2]) {
        self.pending.uv = Some(uv);
    }

    fn lightmap_uv(&mut self, uv: [f32; 2]) {
        self.pending.lightmap_uv = Some(uv);
    }

    fn skin(&mut self, group: &VertexBoneGroup) {
        self.pending.skin = Some(group.clone());
    }

    fn morph_index(&mut self, index: u32) {
        self.pending.morph_index = Some(index);
    }

    fn position(&mut self, position: [f32; 3]) {
        let mut vertex = std::mem::take(&mut self.pending);
        vertex.position = position;
        self.current_mesh().vertices.push(vertex);
    }

    fn end_strip(&mut self) {
        let start = self.strip_start;
        let mesh = self.current_mesh();
        let count = mesh.vertices.len() - start;
        if count < 3 {
            return;
        }
        for i in 0..count - 2 {
            let (a, b, c) = (start + i, start + i + 1, start + i + 2);
            // backward winding: flip the even triangles of the strip
            let tri = if i % 2 == 0 { [b, a, c] } else { [a, b, c] };
            mesh.triangles.push(tri.map(|v| v as u32));
        }
    }

    fn morph_frame(&mut self, frame: MorphFrame) {
        self.pending_frames.push(frame);
    }

    fn end_morph_set(&mut self, node_name: &str) {
        let frames = std::mem::take(&mut self.pending_frames);
        if !frames.is_empty() {
            self.morph_sets.push(MorphFrameSet {
                node: node_name.to_string(),
                frames,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx<'a>() -> ChunkContext<'a> {
        ChunkContext {
            node_name: "node",
            material: "mat",
            transform: Mat4::IDENTITY,
        }
    }

    #[test]
    fn strip_of_three_yields_one_triangle() {
        let mut col = GeometryCollector::new();
        col.begin_chunk(&ctx());
        col.begin_strip();
        for i in 0..3 {
            col.position([i as f32, 0.0, 0.0]);
        }
        col.end_strip();
        let (meshes, _) = col.finish();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].vertices.len(), 3);
        assert_eq!(meshes[0].triangles, vec![[1, 0, 2]]);
    }

    #[test]
    fn strip_winding_alternates_backward() {
        let mut col = GeometryCollector::new();
        col.begin_chunk(&ctx());
        col.begin_strip();
        for i in 0..4 {
            col.position([i as f32, 0.0, 0.0]);
        }
        col.end_strip();
        let (meshes, _) = col.finish();
        assert_eq!(meshes[0].triangles, vec![[1, 0, 2], [1, 2, 3]]);
    }

    #[test]
    fn attributes_attach_to_the_next_closed_vertex() {
        let mut col = GeometryCollector::new();
        col.begin_chunk(&ctx());
        col.begin_strip();
        col.normal([0.0, 1.0, 0.0]);
        col.uv([0.25, 0.5]);
        col.morph_index(7);
        col.position([1.0, 2.0, 3.0]);
        col.end_strip();
        let (meshes, _) = col.finish();
        let v = &meshes[0].vertices[0];
        assert_eq!(v.position, [1.0, 2.0, 3.0]);
        assert_eq!(v.normal, Some([0.0, 1.0, 0.0]));
        assert_eq!(v.uv, Some([0.25, 0.5]));
        assert_eq!(v.morph_index, Some(7));
        assert_eq!(v.skin, None);
    }

    #[test]
    fn short_strips_emit_no_triangles() {
        let mut col = GeometryCollector::new();
        col.begin_chunk(&ctx());
        col.begin_strip();
        col.position([0.0; 3]);
        col.position([1.0; 3]);
        col.end_strip();
        let (meshes, _) = col.finish();
        assert!(meshes[0].triangles.is_empty());
    }

    #[test]
    fn morph_frames_commit_per_node() {
        let mut col = GeometryCollector::new();
        col.morph_frame(MorphFrame {
            weight: 1.0,
            id: 0,
            positions: vec![[0.0; 3]],
        });
        col.end_morph_set("head");
        col.end_morph_set("tail"); // nothing pending, no empty set
        let (_, sets) = col.finish();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].node, "head");
        assert_eq!(sets[0].frames.len(), 1);
    }
}

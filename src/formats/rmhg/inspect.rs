//! Container structure inspection.
//!
//! Walks the directory tree without decoding child payloads (beyond model
//! names), producing a serializable summary for tooling and a plain-text
//! tree rendering.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Result;
use crate::formats::cgmg;
use crate::formats::common::{ByteCursor, Endianness};
use crate::formats::gct0;

use super::RMHG_MAGIC;
use super::reader::read_directory;

/// What a directory record turned out to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Container,
    Model,
    Texture,
    /// Zero address or zero size.
    Empty,
    Unrecognized,
}

/// One inspected directory record.
#[derive(Debug, Clone, Serialize)]
pub struct RecordNode {
    pub address: u32,
    pub size: u32,
    pub tag: String,
    pub kind: RecordKind,
    /// Header summary of the child, for model records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RecordNode>,
}

/// Declared counts from a model child's own header.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub bones: u16,
    pub textures: u16,
    pub materials: u16,
}

/// Inspect a container's directory tree. Nested containers are walked
/// recursively; other children are identified by tag only.
pub fn inspect_bytes(data: &[u8]) -> Result<Vec<RecordNode>> {
    let mut cur = ByteCursor::new(data, Endianness::Little);
    let (_, records) = read_directory(&mut cur)?;

    let mut nodes = Vec::with_capacity(records.len());
    for record in &records {
        if record.addr == 0 || record.size == 0 {
            nodes.push(RecordNode {
                address: record.addr,
                size: record.size,
                tag: String::new(),
                kind: RecordKind::Empty,
                model: None,
                children: Vec::new(),
            });
            continue;
        }

        cur.seek(u64::from(record.addr))?;
        let tag = cur.read_tag(4)?;
        let child = cur.slice(
            u64::from(record.addr),
            u64::from(record.addr) + u64::from(record.size),
        )?;

        let (kind, model, children) = match tag.as_str() {
            RMHG_MAGIC => (RecordKind::Container, None, inspect_bytes(child)?),
            cgmg::CGMG_MAGIC => (RecordKind::Model, model_summary(child), Vec::new()),
            gct0::GCT0_MAGIC => (RecordKind::Texture, None, Vec::new()),
            _ => (RecordKind::Unrecognized, None, Vec::new()),
        };

        nodes.push(RecordNode {
            address: record.addr,
            size: record.size,
            tag,
            kind,
            model,
            children,
        });
    }

    Ok(nodes)
}

fn model_summary(data: &[u8]) -> Option<ModelSummary> {
    let mut cur = ByteCursor::new(data, Endianness::Big);
    let header = cgmg::read_model_header(&mut cur).ok()?;
    Some(ModelSummary {
        name: header.name,
        bones: header.bone_count,
        textures: header.texture_count,
        materials: header.material_count,
    })
}

/// Render an inspected tree as indented text, one record per line.
#[must_use]
pub fn render_tree(nodes: &[RecordNode]) -> String {
    let mut out = String::new();
    render_into(nodes, 0, &mut out);
    out
}

fn render_into(nodes: &[RecordNode], depth: usize, out: &mut String) {
    for node in nodes {
        for _ in 0..depth {
            out.push('\t');
        }
        let label = if node.tag.is_empty() { "----" } else { &node.tag };
        let _ = write!(out, "{label} {:#x} bytes at {:#x}", node.size, node.address);
        if let Some(model) = &node.model {
            let _ = write!(
                out,
                " '{}' ({} bones, {} textures, {} materials)",
                model.name, model.bones, model.textures, model.materials
            );
        }
        out.push('\n');
        render_into(&node.children, depth + 1, out);
    }
}

//! GCT0 texture records.

pub mod reader;

pub use reader::{Gct0Header, ScannedTexture, read_gct0_header, read_texture, scan_textures};

/// 4-character tag identifying a GCT0 texture record.
pub const GCT0_MAGIC: &str = "GCT0";

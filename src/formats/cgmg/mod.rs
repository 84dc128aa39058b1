//! CGMG model records: skeleton, materials, textures, triangle-strip
//! geometry and morph targets.

pub mod header;
pub mod mesh;
pub mod reader;
pub mod skeleton;
pub mod vertex;

pub use header::{ModelHeader, read_model_header};
pub use reader::{MaterialLayout, ModelDocument, parse_cgmg_bytes};

/// 4-character tag identifying a CGMG model record.
pub const CGMG_MAGIC: &str = "CGMG";

//! RMHG container records: the recursive top-level directory of an RSL
//! file.

pub mod inspect;
pub mod reader;

pub use inspect::{ModelSummary, RecordKind, RecordNode, inspect_bytes, render_tree};
pub use reader::{
    ContainerHeader, ContainerRecord, check_rmhg_bytes, parse_rmhg_bytes, read_rsl,
};

/// 4-character tag identifying an RMHG container record.
pub const RMHG_MAGIC: &str = "RMHG";

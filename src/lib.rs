//! # rslkit
//!
//! A pure-Rust library for decoding RSL containers, the Wii-era game
//! archive format built from recursive "RMHG" directories.
//!
//! ## Supported Records
//!
//! - **RMHG containers** - Recursive directories of typed child blobs
//! - **CGMG models** - Skeletons, materials, triangle-strip geometry,
//!   skinning and morph targets
//! - **GCT0 textures** - GameCube-family texture records
//!
//! ## Quick Start
//!
//! ```no_run
//! use rslkit::formats::rmhg;
//! use rslkit::scene::PlaceholderPixelDecoder;
//!
//! let data = std::fs::read("stage.rsl")?;
//! if rmhg::check_rmhg_bytes(&data) {
//!     let models = rmhg::parse_rmhg_bytes(&data, &PlaceholderPixelDecoder)?;
//!     println!("decoded {} models", models.len());
//! }
//! # Ok::<(), rslkit::Error>(())
//! ```
//!
//! Geometry decoding is streamed through the [`scene::MeshBuilder`] trait,
//! and pixel decoding goes through [`scene::PixelDecoder`], so hosts with
//! their own renderers or GameCube pixel codecs can plug in directly.
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `rslkit` command-line binary

pub mod error;
pub mod formats;
pub mod scene;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::formats::cgmg::{MaterialLayout, ModelDocument, parse_cgmg_bytes};
    pub use crate::formats::common::{AddressTable, ByteCursor, Endianness};
    pub use crate::formats::gct0::{read_texture, scan_textures};
    pub use crate::formats::rmhg::{
        check_rmhg_bytes, inspect_bytes, parse_rmhg_bytes, read_rsl,
    };
    pub use crate::scene::{
        GeometryCollector, MeshBuilder, PixelDecoder, PlaceholderPixelDecoder, SceneModel,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;

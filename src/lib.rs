//! # DTS
//!
//! Rust implementation of the DTS versioned binary 3D shape format: a node
//! hierarchy, render objects with per-detail-level meshes (standard, skinned
//! and depth-sorted), animation sequences and materials.
//!
//! Versions 19 through 24 are read; version 24 is written.
//!
//! ## Modules
//!
//! - [`util`] - Errors, endian conversion and packed math types
//! - [`packed`] - Packed region lanes, two-pass reader, writer and arena
//! - [`mesh`] - Mesh types, normal codebook and mesh field order
//! - [`shape`] - The [`Model`], its field order, sequences and lookups
//! - [`material`] - Material list
//!
//! ## Example
//!
//! ```ignore
//! use dts::Model;
//!
//! let model = Model::open("player.dts")?;
//! println!("{} nodes, {} meshes", model.nodes.len(), model.meshes.len());
//! assert_eq!(Model::decode(&model.encode()?)?.names, model.names);
//! ```

pub mod util;
pub mod packed;
pub mod mesh;
pub mod shape;
pub mod material;

// Re-export commonly used types
pub use util::{Error, Result};
pub use shape::{DecodeOptions, Model};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Box3F, Error, MatrixF, Quat16, Result};
    pub use crate::packed::{Arena, Array, CheckpointPolicy, Version};
    pub use crate::mesh::{DrawPrimitive, Mesh, MeshData, MeshType, SkinMesh, SortedMesh};
    pub use crate::shape::{DecodeOptions, Detail, IntegerSet, Model, Node, Object, Sequence};
    pub use crate::material::{Material, MaterialList};
}

/// Library version string with build date.
pub fn library_version() -> String {
    let date = option_env!("DTS_BUILD_DATE").unwrap_or("unknown");
    let time = option_env!("DTS_BUILD_TIME").unwrap_or("unknown");
    format!(
        "dts {} (format {}..={}, built {} {})",
        env!("CARGO_PKG_VERSION"),
        packed::MIN_VERSION,
        packed::CURRENT_VERSION,
        date,
        time
    )
}

//! Procedural mesh generation.
//!
//! Generators are pure: identical parameters produce identical output.
//! Colors are kept as `[0, 1]` floats; packing converts them to bytes.

mod mesh;
mod pyramid;
mod ring;

pub use mesh::{MeshData, VertexRecord};
pub use pyramid::{generate_pyramid, PyramidParams};
pub use ring::{generate_ring, RingParams};

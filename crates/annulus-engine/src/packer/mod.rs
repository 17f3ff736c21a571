//! Typed little-endian writers over the byte images that get uploaded.

mod buffer;
mod mesh;

pub use buffer::{PackedBuffer, PackedBuffers, SoaBytes};
pub use mesh::pack_mesh;

//! Annulus engine crate.
//!
//! Procedural meshes, attribute layout planning, little-endian buffer
//! packing, instance data strategies and a frame driver that feeds them to a
//! graphics device. The device is either wgpu on a winit window or an
//! in-memory headless implementation.

pub mod error;

pub mod geometry;
pub mod layout;
pub mod math;
pub mod packer;

pub mod device;
pub mod frame;
pub mod instance;

pub mod core;
pub mod logging;
pub mod window;

pub use error::{EngineError, EngineResult};

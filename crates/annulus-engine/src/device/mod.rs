//! Graphics device abstraction and its two implementations.
//!
//! This module is responsible for:
//! - the [`GraphicsDevice`] / [`Presentation`] contracts the frame driver talks to
//! - recorded draw commands ([`CommandRecorder`]) replayed at submit
//! - the wgpu-backed [`Gpu`] bound to a window surface
//! - the in-memory [`HeadlessDevice`] used without a GPU

mod error;
mod gpu;
mod headless;
mod init;
mod surface;
mod traits;
mod types;

pub use error::{DeviceError, SurfaceErrorAction};
pub use gpu::Gpu;
pub use headless::HeadlessDevice;
pub use init::GpuInit;
pub use traits::{GraphicsDevice, Presentation};
pub use types::{
    BindGroupEntry, BindGroupHandle, BufferHandle, BufferUsage, CommandRecorder, ImageViewHandle,
    PipelineDesc, PipelineHandle, RenderCommand, ShaderHandle,
};

use super::{
    BindGroupEntry, BindGroupHandle, BufferHandle, BufferUsage, CommandRecorder, DeviceError,
    ImageViewHandle, PipelineDesc, PipelineHandle, ShaderHandle,
};

/// Resource creation, uploads and frame submission.
///
/// Object safe: scenes receive `&mut dyn GraphicsDevice`.
pub trait GraphicsDevice {
    /// `false` once the device is missing or lost.
    fn is_available(&self) -> bool;

    fn create_buffer(
        &mut self,
        size: u64,
        usage: BufferUsage,
        label: &str,
    ) -> Result<BufferHandle, DeviceError>;

    /// Copies `bytes` into the buffer at `offset`.
    fn write_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        bytes: &[u8],
    ) -> Result<(), DeviceError>;

    fn create_shader(&mut self, label: &str, wgsl: &str) -> Result<ShaderHandle, DeviceError>;

    fn create_render_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle, DeviceError>;

    /// Creates a bind group for layout `group` of `pipeline`.
    fn create_bind_group(
        &mut self,
        pipeline: PipelineHandle,
        group: u32,
        entries: &[BindGroupEntry],
    ) -> Result<BindGroupHandle, DeviceError>;

    /// Starts recording a frame that clears `target` to `clear`.
    fn begin_frame(
        &mut self,
        target: ImageViewHandle,
        clear: [f32; 4],
    ) -> Result<CommandRecorder, DeviceError>;

    /// Replays the recorded commands and presents.
    fn submit(&mut self, recorder: CommandRecorder) -> Result<(), DeviceError>;
}

/// Hands out the image to draw into this frame.
pub trait Presentation {
    fn current_frame_target(&mut self) -> Result<ImageViewHandle, DeviceError>;
}

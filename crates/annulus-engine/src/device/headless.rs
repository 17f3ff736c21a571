//! Device without a GPU.
//!
//! Validates handles and write ranges the way a real backend would, keeps
//! buffer contents in memory and stores every submitted frame for inspection.
//! Used by the studio's `--headless` mode and by tests.

use super::{
    BindGroupEntry, BindGroupHandle, BufferHandle, BufferUsage, CommandRecorder, DeviceError,
    GraphicsDevice, ImageViewHandle, PipelineDesc, PipelineHandle, Presentation, RenderCommand,
    ShaderHandle,
};

#[derive(Debug, Clone)]
struct HeadlessBuffer {
    label: String,
    usage: BufferUsage,
    bytes: Vec<u8>,
    writes: usize,
}

#[derive(Debug, Clone)]
struct HeadlessBindGroup {
    pipeline: PipelineHandle,
    group: u32,
    entries: Vec<BindGroupEntry>,
}

/// In-memory [`GraphicsDevice`].
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    lost: bool,
    frames_to_skip: u32,
    buffers: Vec<HeadlessBuffer>,
    shaders: Vec<String>,
    pipelines: Vec<PipelineDesc>,
    bind_groups: Vec<HeadlessBindGroup>,
    frames: Vec<CommandRecorder>,
    next_target: u32,
    pending_target: Option<ImageViewHandle>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call fail with [`DeviceError::Unavailable`].
    pub fn lose_device(&mut self) {
        log::warn!("HeadlessDevice: simulating device loss");
        self.lost = true;
        self.pending_target = None;
    }

    pub fn restore_device(&mut self) {
        self.lost = false;
    }

    /// The next `frames` calls to `current_frame_target` report a skipped frame.
    pub fn skip_frames(&mut self, frames: u32) {
        self.frames_to_skip = frames;
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn bind_group_count(&self) -> usize {
        self.bind_groups.len()
    }

    pub fn shader_labels(&self) -> impl Iterator<Item = &str> {
        self.shaders.iter().map(String::as_str)
    }

    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer.index()).map(|b| b.bytes.as_slice())
    }

    pub fn buffer_label(&self, buffer: BufferHandle) -> Option<&str> {
        self.buffers.get(buffer.index()).map(|b| b.label.as_str())
    }

    pub fn buffer_usage(&self, buffer: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(buffer.index()).map(|b| b.usage)
    }

    /// Number of `write_buffer` calls that landed in `buffer`.
    pub fn buffer_write_count(&self, buffer: BufferHandle) -> usize {
        self.buffers.get(buffer.index()).map_or(0, |b| b.writes)
    }

    pub fn pipeline_desc(&self, pipeline: PipelineHandle) -> Option<&PipelineDesc> {
        self.pipelines.get(pipeline.index())
    }

    /// Pipeline, group index and entries a bind group was created with.
    pub fn bind_group(
        &self,
        group: BindGroupHandle,
    ) -> Option<(PipelineHandle, u32, &[BindGroupEntry])> {
        self.bind_groups
            .get(group.index())
            .map(|g| (g.pipeline, g.group, g.entries.as_slice()))
    }

    /// Every frame accepted by `submit`, oldest first.
    pub fn submitted_frames(&self) -> &[CommandRecorder] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&CommandRecorder> {
        self.frames.last()
    }

    fn ensure_available(&self) -> Result<(), DeviceError> {
        if self.lost {
            return Err(DeviceError::Unavailable("headless device lost".to_string()));
        }
        Ok(())
    }

    fn check_buffer(&self, buffer: BufferHandle) -> Result<&HeadlessBuffer, DeviceError> {
        self.buffers
            .get(buffer.index())
            .ok_or(DeviceError::InvalidHandle { kind: "buffer", index: buffer.0 })
    }

    fn check_pipeline(&self, pipeline: PipelineHandle) -> Result<&PipelineDesc, DeviceError> {
        self.pipelines
            .get(pipeline.index())
            .ok_or(DeviceError::InvalidHandle { kind: "pipeline", index: pipeline.0 })
    }

    fn check_bind_group(&self, group: BindGroupHandle) -> Result<&HeadlessBindGroup, DeviceError> {
        self.bind_groups
            .get(group.index())
            .ok_or(DeviceError::InvalidHandle { kind: "bind group", index: group.0 })
    }

    /// Walks the commands the way a render pass would.
    fn validate_commands(&self, commands: &[RenderCommand]) -> Result<(), DeviceError> {
        let mut pipeline: Option<&PipelineDesc> = None;
        let mut index_bound = false;

        for command in commands {
            match *command {
                RenderCommand::SetPipeline(p) => pipeline = Some(self.check_pipeline(p)?),
                RenderCommand::SetVertexBuffer { slot, buffer } => {
                    let b = self.check_buffer(buffer)?;
                    if !b.usage.contains(BufferUsage::VERTEX) {
                        return Err(DeviceError::Backend(format!(
                            "buffer `{}` bound to vertex slot {slot} without VERTEX usage",
                            b.label
                        )));
                    }
                }
                RenderCommand::SetIndexBuffer(buffer) => {
                    let b = self.check_buffer(buffer)?;
                    if !b.usage.contains(BufferUsage::INDEX) {
                        return Err(DeviceError::Backend(format!(
                            "buffer `{}` bound as index buffer without INDEX usage",
                            b.label
                        )));
                    }
                    index_bound = true;
                }
                RenderCommand::SetBindGroup { group, .. } => {
                    self.check_bind_group(group)?;
                }
                RenderCommand::Draw { .. } | RenderCommand::DrawIndexed { .. } => {
                    if pipeline.is_none() {
                        return Err(DeviceError::Backend("draw without a pipeline".to_string()));
                    }
                    if matches!(command, RenderCommand::DrawIndexed { .. }) && !index_bound {
                        return Err(DeviceError::Backend(
                            "indexed draw without an index buffer".to_string(),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn is_available(&self) -> bool {
        !self.lost
    }

    fn create_buffer(
        &mut self,
        size: u64,
        usage: BufferUsage,
        label: &str,
    ) -> Result<BufferHandle, DeviceError> {
        self.ensure_available()?;
        log::trace!("HeadlessDevice: creating buffer {label:?} (size: {size})");
        self.buffers.push(HeadlessBuffer {
            label: label.to_string(),
            usage,
            bytes: vec![0; size as usize],
            writes: 0,
        });
        Ok(BufferHandle(self.buffers.len() as u32 - 1))
    }

    fn write_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        self.ensure_available()?;
        let size = self.check_buffer(buffer)?.bytes.len() as u64;
        let len = bytes.len() as u64;
        if offset + len > size {
            return Err(DeviceError::OutOfRange { offset, len, size });
        }

        let target = &mut self.buffers[buffer.index()];
        target.bytes[offset as usize..(offset + len) as usize].copy_from_slice(bytes);
        target.writes += 1;
        Ok(())
    }

    fn create_shader(&mut self, label: &str, wgsl: &str) -> Result<ShaderHandle, DeviceError> {
        self.ensure_available()?;
        if wgsl.trim().is_empty() {
            return Err(DeviceError::Backend(format!("shader `{label}` is empty")));
        }
        self.shaders.push(label.to_string());
        Ok(ShaderHandle(self.shaders.len() as u32 - 1))
    }

    fn create_render_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle, DeviceError> {
        self.ensure_available()?;
        if desc.shader.index() >= self.shaders.len() {
            return Err(DeviceError::InvalidHandle { kind: "shader", index: desc.shader.0 });
        }
        self.pipelines.push(desc.clone());
        Ok(PipelineHandle(self.pipelines.len() as u32 - 1))
    }

    fn create_bind_group(
        &mut self,
        pipeline: PipelineHandle,
        group: u32,
        entries: &[BindGroupEntry],
    ) -> Result<BindGroupHandle, DeviceError> {
        self.ensure_available()?;
        self.check_pipeline(pipeline)?;
        for entry in entries {
            self.check_buffer(entry.buffer)?;
        }
        self.bind_groups.push(HeadlessBindGroup { pipeline, group, entries: entries.to_vec() });
        Ok(BindGroupHandle(self.bind_groups.len() as u32 - 1))
    }

    fn begin_frame(
        &mut self,
        target: ImageViewHandle,
        clear: [f32; 4],
    ) -> Result<CommandRecorder, DeviceError> {
        self.ensure_available()?;
        if self.pending_target != Some(target) {
            return Err(DeviceError::InvalidHandle { kind: "image view", index: target.0 });
        }
        Ok(CommandRecorder::new(target, clear))
    }

    fn submit(&mut self, recorder: CommandRecorder) -> Result<(), DeviceError> {
        self.ensure_available()?;
        if self.pending_target.take() != Some(recorder.target()) {
            return Err(DeviceError::InvalidHandle {
                kind: "image view",
                index: recorder.target().0,
            });
        }
        self.validate_commands(recorder.commands())?;

        log::trace!(
            "HeadlessDevice: frame {} with {} commands",
            self.frames.len(),
            recorder.commands().len()
        );
        self.frames.push(recorder);
        Ok(())
    }
}

impl Presentation for HeadlessDevice {
    fn current_frame_target(&mut self) -> Result<ImageViewHandle, DeviceError> {
        self.ensure_available()?;
        if self.frames_to_skip > 0 {
            self.frames_to_skip -= 1;
            return Err(DeviceError::FrameSkipped("simulated surface timeout".to_string()));
        }

        let target = ImageViewHandle(self.next_target);
        self.next_target = self.next_target.wrapping_add(1);
        self.pending_target = Some(target);
        Ok(target)
    }
}

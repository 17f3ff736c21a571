use bitflags::bitflags;

use crate::layout::BufferLayout;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(
    /// Handle to a device buffer.
    BufferHandle
);
handle!(
    /// Handle to a compiled WGSL module.
    ShaderHandle
);
handle!(
    /// Handle to a render pipeline.
    PipelineHandle
);
handle!(
    /// Handle to a bind group created against a pipeline's layout.
    BindGroupHandle
);
handle!(
    /// Handle to the frame's color target.
    ImageViewHandle
);

bitflags! {
    /// Buffer usage flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const UNIFORM = 1 << 2;
        const STORAGE = 1 << 3;
        const COPY_DST = 1 << 4;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Render pipeline description.
///
/// Bind group layouts are derived from the shader; vertex buffer slots follow
/// the order of `vertex_buffers`.
#[derive(Debug, Clone)]
pub struct PipelineDesc {
    pub label: String,
    pub shader: ShaderHandle,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub vertex_buffers: Vec<BufferLayout>,
    pub depth_test: bool,
}

impl PipelineDesc {
    pub fn new(label: impl Into<String>, shader: ShaderHandle) -> Self {
        Self {
            label: label.into(),
            shader,
            vertex_entry: "vs_main".to_string(),
            fragment_entry: "fs_main".to_string(),
            vertex_buffers: Vec::new(),
            depth_test: false,
        }
    }

    pub fn with_vertex_buffers<'a>(mut self, layouts: impl IntoIterator<Item = &'a BufferLayout>) -> Self {
        self.vertex_buffers = layouts.into_iter().cloned().collect();
        self
    }

    pub fn with_depth_test(mut self) -> Self {
        self.depth_test = true;
        self
    }
}

/// Whole-buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindGroupEntry {
    pub binding: u32,
    pub buffer: BufferHandle,
}

/// One recorded command, replayed by the device at submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderCommand {
    SetPipeline(PipelineHandle),
    SetVertexBuffer { slot: u32, buffer: BufferHandle },
    SetIndexBuffer(BufferHandle),
    SetBindGroup { index: u32, group: BindGroupHandle },
    Draw { vertices: u32, instances: u32 },
    DrawIndexed { indices: u32, instances: u32 },
}

impl RenderCommand {
    #[inline]
    pub fn is_draw(&self) -> bool {
        matches!(self, RenderCommand::Draw { .. } | RenderCommand::DrawIndexed { .. })
    }
}

/// Commands for one frame, in call order.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecorder {
    target: ImageViewHandle,
    clear: [f32; 4],
    commands: Vec<RenderCommand>,
}

impl CommandRecorder {
    pub fn new(target: ImageViewHandle, clear: [f32; 4]) -> Self {
        Self { target, clear, commands: Vec::new() }
    }

    #[inline]
    pub fn target(&self) -> ImageViewHandle {
        self.target
    }

    #[inline]
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear
    }

    #[inline]
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn draw_call_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    pub fn set_pipeline(&mut self, pipeline: PipelineHandle) {
        self.commands.push(RenderCommand::SetPipeline(pipeline));
    }

    pub fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle) {
        self.commands.push(RenderCommand::SetVertexBuffer { slot, buffer });
    }

    /// Indices are always `u32`.
    pub fn set_index_buffer(&mut self, buffer: BufferHandle) {
        self.commands.push(RenderCommand::SetIndexBuffer(buffer));
    }

    pub fn set_bind_group(&mut self, index: u32, group: BindGroupHandle) {
        self.commands.push(RenderCommand::SetBindGroup { index, group });
    }

    pub fn draw(&mut self, vertices: u32, instances: u32) {
        self.commands.push(RenderCommand::Draw { vertices, instances });
    }

    pub fn draw_indexed(&mut self, indices: u32, instances: u32) {
        self.commands.push(RenderCommand::DrawIndexed { indices, instances });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_flags_combine() {
        let usage = BufferUsage::VERTEX | BufferUsage::COPY_DST;
        assert!(usage.contains(BufferUsage::VERTEX));
        assert!(usage.contains(BufferUsage::COPY_DST));
        assert!(!usage.contains(BufferUsage::UNIFORM));
        assert_eq!(usage - BufferUsage::COPY_DST, BufferUsage::VERTEX);
        assert!(BufferUsage::default().is_empty());
    }

    #[test]
    fn recorder_keeps_call_order() {
        let mut rec = CommandRecorder::new(ImageViewHandle(0), [0.0; 4]);
        rec.set_pipeline(PipelineHandle(1));
        rec.set_bind_group(0, BindGroupHandle(2));
        rec.draw(6, 1);
        rec.draw_indexed(12, 3);
        assert_eq!(rec.commands().len(), 4);
        assert_eq!(rec.commands()[0], RenderCommand::SetPipeline(PipelineHandle(1)));
        assert_eq!(rec.draw_call_count(), 2);
    }
}

use crate::device::{BufferHandle, CommandRecorder, GraphicsDevice};
use crate::error::EngineResult;

use super::FrameState;

/// Resources the driver owns and hands to its scene.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SceneResources {
    /// Uniform buffer holding model, view and projection (`3 × mat4x4f`).
    pub transforms: BufferHandle,
}

/// What a [`FrameDriver`](super::FrameDriver) draws.
pub trait Scene {
    fn name(&self) -> &str;

    /// Creates pipelines, buffers and bind groups. Called once, before the
    /// first frame.
    fn setup(&mut self, device: &mut dyn GraphicsDevice, resources: &SceneResources) -> EngineResult<()>;

    /// Runs after the transform uniform for `frame` is written and before
    /// recording. Scenes re-upload their dirty data here.
    fn update(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameState) -> EngineResult<()> {
        let _ = (device, frame);
        Ok(())
    }

    /// Records pipeline, bind and draw commands.
    fn record(&self, recorder: &mut CommandRecorder) -> EngineResult<()>;
}

impl<S: Scene + ?Sized> Scene for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn setup(&mut self, device: &mut dyn GraphicsDevice, resources: &SceneResources) -> EngineResult<()> {
        (**self).setup(device, resources)
    }

    fn update(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameState) -> EngineResult<()> {
        (**self).update(device, frame)
    }

    fn record(&self, recorder: &mut CommandRecorder) -> EngineResult<()> {
        (**self).record(recorder)
    }
}

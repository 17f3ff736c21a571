use std::f64::consts::TAU;

use crate::device::{BufferHandle, BufferUsage, DeviceError, GraphicsDevice, Presentation};
use crate::error::{EngineError, EngineResult};
use crate::math::{TransformParams, TransformSet};
use crate::packer::PackedBuffer;

use super::{Scene, SceneResources};

/// Frame driver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDriverConfig {
    /// Radians added to the angle each frame.
    pub angle_increment: f64,
    /// Reduce the angle modulo 2π. Off: the angle grows without bound.
    pub wrap_angle: bool,
    pub clear_color: [f32; 4],
    pub transforms: TransformParams,
}

impl Default for FrameDriverConfig {
    fn default() -> Self {
        Self {
            angle_increment: 0.01,
            wrap_angle: false,
            clear_color: [1.0, 1.0, 1.0, 1.0],
            transforms: TransformParams::default(),
        }
    }
}

/// Animation state committed after each presented frame.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameState {
    /// Rotation angle in radians.
    pub angle: f64,
    /// Presented frames so far.
    pub frame_index: u64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverState {
    /// Scene not set up yet.
    Idle,
    Running,
    /// The device was lost or scene setup failed. Terminal.
    Halted,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Presented { frame_index: u64, draw_calls: usize },
    /// The surface had no image this time; nothing was committed.
    Skipped,
}

/// Advances the rotation and renders one scene per call.
///
/// Each call writes the transform uniform, lets the scene update and
/// record, then submits. The angle and frame index change only once the
/// device accepted the frame.
pub struct FrameDriver<S> {
    config: FrameDriverConfig,
    transforms: TransformSet,
    uniform: PackedBuffer,
    uniform_buffer: Option<BufferHandle>,
    state: FrameState,
    driver_state: DriverState,
    scene: S,
}

impl<S: Scene> FrameDriver<S> {
    pub fn new(config: FrameDriverConfig, scene: S) -> EngineResult<Self> {
        let transforms = TransformSet::new(config.transforms)?;
        let uniform = PackedBuffer::new(TransformSet::uniform_layout()?, 1);
        Ok(Self {
            config,
            transforms,
            uniform,
            uniform_buffer: None,
            state: FrameState::default(),
            driver_state: DriverState::Idle,
            scene,
        })
    }

    #[inline]
    pub fn config(&self) -> &FrameDriverConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    #[inline]
    pub fn driver_state(&self) -> DriverState {
        self.driver_state
    }

    #[inline]
    pub fn transforms(&self) -> &TransformSet {
        &self.transforms
    }

    #[inline]
    pub fn uniform_buffer(&self) -> Option<BufferHandle> {
        self.uniform_buffer
    }

    #[inline]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    fn next_angle(&self) -> f64 {
        let angle = self.state.angle + self.config.angle_increment;
        if self.config.wrap_angle { angle.rem_euclid(TAU) } else { angle }
    }

    fn halt(&mut self, reason: &str) {
        if self.driver_state != DriverState::Halted {
            log::error!("frame driver halted ({}): {reason}", self.scene.name());
        }
        self.driver_state = DriverState::Halted;
    }

    /// Renders one frame.
    ///
    /// Returns [`EngineError::DeviceUnavailable`] without touching any state
    /// once the device is gone; the driver then stays halted. A failing
    /// [`Scene::setup`] also halts it, after returning that error once.
    pub fn advance_frame<D>(&mut self, device: &mut D) -> EngineResult<FrameOutcome>
    where
        D: GraphicsDevice + Presentation,
    {
        if self.driver_state == DriverState::Halted {
            return Err(EngineError::DeviceUnavailable("frame driver halted".to_string()));
        }
        if !device.is_available() {
            self.halt("device reported unavailable");
            return Err(EngineError::DeviceUnavailable("device reported unavailable".to_string()));
        }

        match self.render(device) {
            Err(EngineError::DeviceUnavailable(reason)) => {
                self.halt(&reason);
                Err(EngineError::DeviceUnavailable(reason))
            }
            other => other,
        }
    }

    fn render<D>(&mut self, device: &mut D) -> EngineResult<FrameOutcome>
    where
        D: GraphicsDevice + Presentation,
    {
        let uniform_buffer = match self.uniform_buffer {
            Some(buffer) => buffer,
            None => {
                let size = self.uniform.len() as u64;
                let buffer = device.create_buffer(
                    size,
                    BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                    "transform uniform",
                )?;
                self.uniform_buffer = Some(buffer);
                buffer
            }
        };

        if self.driver_state == DriverState::Idle {
            // Setup runs at most once; a failed setup leaves the driver halted.
            if let Err(err) = self.scene.setup(device, &SceneResources { transforms: uniform_buffer }) {
                self.halt(&format!("scene setup failed: {err}"));
                return Err(err);
            }
            self.driver_state = DriverState::Running;
            log::info!("scene `{}` ready", self.scene.name());
        }

        let pending = FrameState {
            angle: self.next_angle(),
            frame_index: self.state.frame_index + 1,
        };
        let mut transforms = self.transforms;
        transforms.set_angle(pending.angle as f32);

        transforms.write_uniform(&mut self.uniform)?;
        device.write_buffer(uniform_buffer, 0, self.uniform.materialize())?;
        self.scene.update(device, &pending)?;

        // A skipped frame leaves the angle where it was; the next frame
        // rewrites the uniform with the same pending state.
        let target = match device.current_frame_target() {
            Ok(target) => target,
            Err(DeviceError::FrameSkipped(reason)) => {
                log::debug!("frame {} skipped: {reason}", pending.frame_index);
                return Ok(FrameOutcome::Skipped);
            }
            Err(err) => return Err(err.into()),
        };

        let mut recorder = device.begin_frame(target, self.config.clear_color)?;
        self.scene.record(&mut recorder)?;
        let draw_calls = recorder.draw_call_count();
        device.submit(recorder)?;

        self.state = pending;
        self.transforms = transforms;
        log::trace!(
            "frame {} presented at angle {:.4} ({draw_calls} draws)",
            pending.frame_index,
            pending.angle
        );

        Ok(FrameOutcome::Presented { frame_index: pending.frame_index, draw_calls })
    }
}

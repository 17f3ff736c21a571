use annulus_engine::device::{CommandRecorder, GraphicsDevice, PipelineDesc, PipelineHandle};
use annulus_engine::frame::{FrameState, Scene, SceneResources};
use annulus_engine::geometry::generate_ring;
use annulus_engine::instance::{allocate, InstanceGpu, InstanceSet, InstanceStrategy, MeshDraw};
use annulus_engine::EngineResult;

use super::DemoOptions;

const SHADER: &str = include_str!("../shaders/storage.wgsl");

/// Frames between two recolors.
const RECOLOR_PERIOD: u64 = 30;

struct Resources {
    pipeline: PipelineHandle,
    instances: InstanceGpu,
}

/// Every ring, vertex positions included, in one storage buffer.
pub struct StorageScene {
    set: InstanceSet,
    gpu: Option<Resources>,
}

impl StorageScene {
    pub fn new(options: &DemoOptions) -> EngineResult<Self> {
        let mesh = generate_ring(options.ring(), true)?;
        let mut set = allocate(InstanceStrategy::SharedStorage, options.count, options.seed)?;
        set.attach_vertices(&mesh)?;
        Ok(Self { set, gpu: None })
    }

    /// WGSL arrays cannot be empty, so an empty set still declares one slot.
    fn shader_source(&self) -> String {
        let n = self.set.len().max(1);
        let v = self.set.vertices_per_instance().unwrap_or(1).max(1);
        SHADER.replace("{{N}}", &n.to_string()).replace("{{V}}", &v.to_string())
    }
}

/// Fully saturated color for a hue angle in radians.
fn hue(angle: f64) -> [f32; 4] {
    let h = (angle.rem_euclid(std::f64::consts::TAU) / std::f64::consts::TAU * 6.0) as f32;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let [r, g, b] = match h as u32 {
        0 => [1.0, x, 0.0],
        1 => [x, 1.0, 0.0],
        2 => [0.0, 1.0, x],
        3 => [0.0, x, 1.0],
        4 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    };
    [r, g, b, 1.0]
}

impl Scene for StorageScene {
    fn name(&self) -> &str {
        "storage"
    }

    fn setup(&mut self, device: &mut dyn GraphicsDevice, _resources: &SceneResources) -> EngineResult<()> {
        let shader = device.create_shader("storage rings", &self.shader_source())?;
        let pipeline = device.create_render_pipeline(&PipelineDesc::new("storage rings", shader))?;
        let instances = self.set.create_gpu_resources(device, pipeline, 0)?;
        self.gpu = Some(Resources { pipeline, instances });
        Ok(())
    }

    /// Recolors one ring every few frames and re-uploads the buffer.
    fn update(&mut self, device: &mut dyn GraphicsDevice, frame: &FrameState) -> EngineResult<()> {
        let Some(gpu) = &self.gpu else { return Ok(()) };
        if self.set.is_empty() || frame.frame_index % RECOLOR_PERIOD != 0 {
            return Ok(());
        }

        let index = (frame.frame_index / RECOLOR_PERIOD) as usize % self.set.len();
        self.set.set_color(index, hue(frame.angle))?;
        let written = self.set.upload(device, &gpu.instances)?;
        log::trace!("recolored ring {index}, {written} buffer(s) uploaded");
        Ok(())
    }

    fn record(&self, recorder: &mut CommandRecorder) -> EngineResult<()> {
        let Some(gpu) = &self.gpu else { return Ok(()) };
        recorder.set_pipeline(gpu.pipeline);
        let mesh = MeshDraw { vertex_buffer: None, index_buffer: None, elements: 0 };
        self.set.record_draws(&gpu.instances, recorder, &mesh)
    }
}

use annulus_engine::device::{CommandRecorder, GraphicsDevice, PipelineDesc, PipelineHandle};
use annulus_engine::frame::{Scene, SceneResources};
use annulus_engine::geometry::{generate_ring, MeshData, RingParams};
use annulus_engine::instance::{allocate, InstanceGpu, InstanceSet, InstanceStrategy, MeshDraw};
use annulus_engine::layout::{plan, BufferLayout, BufferSpec, FieldSpec, StepRate};
use annulus_engine::EngineResult;

use super::{upload_mesh, DemoOptions};

const SHADER: &str = include_str!("../shaders/uniform.wgsl");

struct Resources {
    pipeline: PipelineHandle,
    mesh: MeshDraw,
    instances: InstanceGpu,
}

/// One disc per instance, each with its own uniform buffer.
pub struct UniformScene {
    mesh: MeshData,
    layout: BufferLayout,
    set: InstanceSet,
    gpu: Option<Resources>,
}

impl UniformScene {
    pub fn new(options: &DemoOptions) -> EngineResult<Self> {
        let mesh = generate_ring(RingParams::disc(0.5, options.subdivisions, [1.0; 4]), true)?;
        let layout = plan(&[BufferSpec::new(StepRate::Vertex, vec![FieldSpec::float32("position", 0, 2)])])?
            .buffers
            .remove(0);
        let set = allocate(InstanceStrategy::PerObjectUniform, options.count, options.seed)?;
        Ok(Self { mesh, layout, set, gpu: None })
    }
}

impl Scene for UniformScene {
    fn name(&self) -> &str {
        "uniform"
    }

    fn setup(&mut self, device: &mut dyn GraphicsDevice, _resources: &SceneResources) -> EngineResult<()> {
        let shader = device.create_shader("uniform discs", SHADER)?;
        let pipeline = device.create_render_pipeline(
            &PipelineDesc::new("uniform discs", shader).with_vertex_buffers([&self.layout]),
        )?;

        let mesh = upload_mesh(device, &self.mesh, &self.layout, "disc")?;
        let instances = self.set.create_gpu_resources(device, pipeline, 0)?;
        log::debug!("{} uniform buffers bound", instances.bind_groups().len());
        self.gpu = Some(Resources { pipeline, mesh, instances });
        Ok(())
    }

    fn record(&self, recorder: &mut CommandRecorder) -> EngineResult<()> {
        let Some(gpu) = &self.gpu else { return Ok(()) };
        recorder.set_pipeline(gpu.pipeline);
        self.set.record_draws(&gpu.instances, recorder, &gpu.mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::testing::{draws, run_headless};
    use annulus_engine::device::{BufferUsage, RenderCommand};

    #[test]
    fn one_bind_and_draw_per_disc() {
        let scene = UniformScene::new(&DemoOptions { count: 10, seed: Some(3), subdivisions: 12 }).unwrap();
        let (driver, device) = run_headless(scene, 1);

        let frame = device.last_frame().unwrap();
        assert_eq!(draws(frame), vec![RenderCommand::DrawIndexed { indices: 72, instances: 1 }; 10]);
        assert_eq!(device.bind_group_count(), 10);

        let gpu = driver.scene().gpu.as_ref().unwrap();
        let first = gpu.instances.buffers()[0];
        assert_eq!(device.buffer_contents(first).unwrap().len(), 32);
        assert!(device.buffer_usage(first).unwrap().contains(BufferUsage::UNIFORM));
    }
}

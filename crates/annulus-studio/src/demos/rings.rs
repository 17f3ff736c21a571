use annulus_engine::device::{CommandRecorder, GraphicsDevice, PipelineDesc, PipelineHandle};
use annulus_engine::frame::{Scene, SceneResources};
use annulus_engine::geometry::{generate_ring, MeshData};
use annulus_engine::instance::{allocate, InstanceGpu, InstanceSet, InstanceStrategy, MeshDraw};
use annulus_engine::layout::{plan, BufferLayoutPlan, BufferSpec, FieldSpec, StepRate};
use annulus_engine::EngineResult;

use super::{upload_mesh, DemoOptions};

const SHADER: &str = include_str!("../shaders/rings.wgsl");

struct Resources {
    pipeline: PipelineHandle,
    mesh: MeshDraw,
    instances: InstanceGpu,
}

/// Indexed ring mesh in slot 0, instance data in slots 1 and 2.
pub struct RingsScene {
    mesh: MeshData,
    layouts: BufferLayoutPlan,
    set: InstanceSet,
    gpu: Option<Resources>,
}

impl RingsScene {
    pub fn new(options: &DemoOptions) -> EngineResult<Self> {
        let mesh = generate_ring(options.ring(), true)?;

        let strategy = InstanceStrategy::VertexAttributes;
        let mut specs = vec![BufferSpec::new(
            StepRate::Vertex,
            vec![FieldSpec::float32("position", 0, 2), FieldSpec::unorm8x4("color", 4)],
        )];
        specs.extend(strategy.buffer_specs());
        let layouts = plan(&specs)?;

        let set = allocate(strategy, options.count, options.seed)?;
        Ok(Self { mesh, layouts, set, gpu: None })
    }
}

impl Scene for RingsScene {
    fn name(&self) -> &str {
        "rings"
    }

    fn setup(&mut self, device: &mut dyn GraphicsDevice, _resources: &SceneResources) -> EngineResult<()> {
        let shader = device.create_shader("rings", SHADER)?;
        let pipeline = device.create_render_pipeline(
            &PipelineDesc::new("rings", shader).with_vertex_buffers(self.layouts.vertex_buffers()),
        )?;

        let mesh = upload_mesh(device, &self.mesh, &self.layouts.buffers[0], "ring")?;
        let instances = self.set.create_gpu_resources(device, pipeline, 0)?;
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
    use annulus_engine::device::RenderCommand;

    #[test]
    fn hundred_rings_in_one_instanced_draw() {
        let scene = RingsScene::new(&DemoOptions { seed: Some(42), ..DemoOptions::default() }).unwrap();
        let (driver, device) = run_headless(scene, 2);

        let frame = device.last_frame().unwrap();
        assert_eq!(draws(frame), vec![RenderCommand::DrawIndexed { indices: 144, instances: 100 }]);

        let gpu = driver.scene().gpu.as_ref().unwrap();
        let desc = device.pipeline_desc(gpu.pipeline).unwrap();
        let strides: Vec<u32> = desc.vertex_buffers.iter().map(|b| b.stride).collect();
        assert_eq!(strides, vec![12, 12, 8]);
        assert_eq!(device.buffer_label(gpu.mesh.vertex_buffer.unwrap()), Some("ring vertices"));
    }

    #[test]
    fn instance_buffers_match_packed_images() {
        let scene = RingsScene::new(&DemoOptions { count: 3, seed: Some(7), subdivisions: 6 }).unwrap();
        let (driver, device) = run_headless(scene, 1);

        let scene = driver.scene();
        let gpu = scene.gpu.as_ref().unwrap();
        for (i, &buffer) in gpu.instances.buffers().iter().enumerate() {
            assert_eq!(device.buffer_contents(buffer).unwrap(), scene.set.buffer_image(i).unwrap().as_slice());
        }
    }
}

use annulus_engine::device::{
    BindGroupEntry, BindGroupHandle, CommandRecorder, GraphicsDevice, PipelineDesc, PipelineHandle,
};
use annulus_engine::frame::{Scene, SceneResources};
use annulus_engine::geometry::{generate_pyramid, MeshData, PyramidParams};
use annulus_engine::instance::MeshDraw;
use annulus_engine::layout::{plan, BufferLayout, BufferSpec, FieldSpec, StepRate};
use annulus_engine::EngineResult;

use super::upload_mesh;

const SHADER: &str = include_str!("../shaders/pyramid.wgsl");

struct Resources {
    pipeline: PipelineHandle,
    transforms: BindGroupHandle,
    mesh: MeshDraw,
}

/// Flat-shaded pyramid spun by the driver's model matrix.
pub struct PyramidScene {
    mesh: MeshData,
    layout: BufferLayout,
    gpu: Option<Resources>,
}

impl PyramidScene {
    pub fn new() -> EngineResult<Self> {
        let mesh = generate_pyramid(PyramidParams::default(), false)?;
        let layout = plan(&[BufferSpec::new(
            StepRate::Vertex,
            vec![
                FieldSpec::float32("position", 0, 3),
                FieldSpec::float32("color", 1, 4),
                FieldSpec::float32("normal", 2, 3),
            ],
        )])?
        .buffers
        .remove(0);
        Ok(Self { mesh, layout, gpu: None })
    }
}

impl Scene for PyramidScene {
    fn name(&self) -> &str {
        "pyramid"
    }

    fn setup(&mut self, device: &mut dyn GraphicsDevice, resources: &SceneResources) -> EngineResult<()> {
        let shader = device.create_shader("pyramid", SHADER)?;
        let pipeline = device.create_render_pipeline(
            &PipelineDesc::new("pyramid", shader)
                .with_vertex_buffers([&self.layout])
                .with_depth_test(),
        )?;
        let transforms = device.create_bind_group(
            pipeline,
            0,
            &[BindGroupEntry { binding: 0, buffer: resources.transforms }],
        )?;
        let mesh = upload_mesh(device, &self.mesh, &self.layout, "pyramid")?;
        self.gpu = Some(Resources { pipeline, transforms, mesh });
        Ok(())
    }

    fn record(&self, recorder: &mut CommandRecorder) -> EngineResult<()> {
        let Some(gpu) = &self.gpu else { return Ok(()) };
        recorder.set_pipeline(gpu.pipeline);
        recorder.set_bind_group(0, gpu.transforms);
        if let Some(vb) = gpu.mesh.vertex_buffer {
            recorder.set_vertex_buffer(0, vb);
        }
        recorder.draw(gpu.mesh.elements, 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demos::testing::{draws, run_headless};
    use annulus_engine::device::RenderCommand;
    use annulus_engine::math::{TransformParams, TransformSet};

    #[test]
    fn draws_eighteen_flat_vertices() {
        let (driver, device) = run_headless(PyramidScene::new().unwrap(), 2);
        let frame = device.last_frame().unwrap();
        assert_eq!(draws(frame), vec![RenderCommand::Draw { vertices: 18, instances: 1 }]);

        let gpu = driver.scene().gpu.as_ref().unwrap();
        let desc = device.pipeline_desc(gpu.pipeline).unwrap();
        assert!(desc.depth_test);
        assert_eq!(desc.vertex_buffers[0].stride, 40);

        let vertices = device.buffer_contents(gpu.mesh.vertex_buffer.unwrap()).unwrap();
        assert_eq!(vertices.len(), 18 * 40);
    }

    #[test]
    fn binds_the_driver_transforms() {
        let (driver, device) = run_headless(PyramidScene::new().unwrap(), 5);
        let gpu = driver.scene().gpu.as_ref().unwrap();
        let (_, group, entries) = device.bind_group(gpu.transforms).unwrap();
        assert_eq!(group, 0);
        assert_eq!(entries[0].buffer, driver.uniform_buffer().unwrap());

        let mut expected = TransformSet::new(TransformParams::default()).unwrap();
        expected.set_angle(0.05);
        let bytes = device.buffer_contents(entries[0].buffer).unwrap();
        let model = expected.model.to_column_major();
        let stored = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert!((stored - model[0]).abs() < 1e-6);
    }
}

//! Concrete scenes launched by the studio.

mod pyramid;
mod rings;
mod storage;
mod uniform;

use annulus_engine::device::{BufferUsage, GraphicsDevice};
use annulus_engine::frame::Scene;
use annulus_engine::geometry::{MeshData, RingParams};
use annulus_engine::instance::MeshDraw;
use annulus_engine::layout::BufferLayout;
use annulus_engine::packer::pack_mesh;
use annulus_engine::EngineResult;

use pyramid::PyramidScene;
use rings::RingsScene;
use storage::StorageScene;
use uniform::UniformScene;

#[derive(Debug, Copy, Clone, Eq, PartialEq, clap::ValueEnum)]
pub enum Demo {
    /// Instanced rings fed through per-instance vertex attributes.
    Rings,
    /// Rings read from one shared storage buffer.
    Storage,
    /// Discs with one uniform buffer and bind group each.
    Uniform,
    /// Rotating flat-shaded pyramid with depth testing.
    Pyramid,
}

/// Inputs shared by every demo.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoOptions {
    pub count: usize,
    pub seed: Option<u64>,
    pub subdivisions: u32,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self { count: 100, seed: None, subdivisions: 24 }
    }
}

impl DemoOptions {
    fn ring(&self) -> RingParams {
        RingParams { subdivisions: self.subdivisions, ..RingParams::default() }
    }
}

pub fn build(demo: Demo, options: &DemoOptions) -> EngineResult<Box<dyn Scene>> {
    let scene: Box<dyn Scene> = match demo {
        Demo::Rings => Box::new(RingsScene::new(options)?),
        Demo::Storage => Box::new(StorageScene::new(options)?),
        Demo::Uniform => Box::new(UniformScene::new(options)?),
        Demo::Pyramid => Box::new(PyramidScene::new()?),
    };
    Ok(scene)
}

/// Packs `mesh` by `layout` and uploads its vertices (and indices, if any).
fn upload_mesh(
    device: &mut dyn GraphicsDevice,
    mesh: &MeshData,
    layout: &BufferLayout,
    label: &str,
) -> EngineResult<MeshDraw> {
    let packed = pack_mesh(mesh, layout)?;
    let vertex_buffer = device.create_buffer(
        packed.len() as u64,
        BufferUsage::VERTEX | BufferUsage::COPY_DST,
        &format!("{label} vertices"),
    )?;
    device.write_buffer(vertex_buffer, 0, packed.materialize())?;

    let index_buffer = if mesh.is_indexed() {
        let bytes = mesh.index_bytes();
        let buffer = device.create_buffer(
            bytes.len() as u64,
            BufferUsage::INDEX | BufferUsage::COPY_DST,
            &format!("{label} indices"),
        )?;
        device.write_buffer(buffer, 0, bytes)?;
        Some(buffer)
    } else {
        None
    };

    Ok(MeshDraw::for_mesh(mesh, Some(vertex_buffer), index_buffer))
}

#[cfg(test)]
pub(crate) mod testing {
    use annulus_engine::device::{CommandRecorder, HeadlessDevice, RenderCommand};
    use annulus_engine::frame::{FrameDriver, FrameDriverConfig, FrameOutcome, Scene};

    /// Runs `frames` frames of `scene` on a fresh headless device.
    pub fn run_headless<S: Scene>(scene: S, frames: u64) -> (FrameDriver<S>, HeadlessDevice) {
        let mut device = HeadlessDevice::new();
        let mut driver = FrameDriver::new(FrameDriverConfig::default(), scene).unwrap();
        for i in 1..=frames {
            let outcome = driver.advance_frame(&mut device).unwrap();
            assert!(matches!(outcome, FrameOutcome::Presented { frame_index, .. } if frame_index == i));
        }
        (driver, device)
    }

    pub fn draws(frame: &CommandRecorder) -> Vec<RenderCommand> {
        frame.commands().iter().copied().filter(RenderCommand::is_draw).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_demo_builds_and_runs() {
        let options = DemoOptions { count: 4, seed: Some(1), subdivisions: 8 };
        for demo in [Demo::Rings, Demo::Storage, Demo::Uniform, Demo::Pyramid] {
            let scene = build(demo, &options).unwrap();
            let (driver, device) = testing::run_headless(scene, 3);
            assert_eq!(driver.state().frame_index, 3, "{demo:?}");
            assert_eq!(device.submitted_frames().len(), 3);
            assert_eq!(device.shader_labels().count(), 1);
        }
    }

    #[test]
    fn too_few_subdivisions_rejected() {
        let options = DemoOptions { subdivisions: 2, ..DemoOptions::default() };
        assert!(build(Demo::Rings, &options).is_err());
    }
}
